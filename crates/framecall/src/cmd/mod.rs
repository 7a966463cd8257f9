use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod demo;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a method call into its wire payload.
    Encode(EncodeArgs),
    /// Decode a wire payload and print the call.
    Decode(DecodeArgs),
    /// Run a parent and child messenger in memory and print delivered calls.
    Demo(DemoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Demo(args) => demo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Method name.
    #[arg(long, short = 'm')]
    pub method: String,
    /// Call argument as JSON text. Repeat for each argument.
    #[arg(long = "arg", value_name = "JSON")]
    pub args: Vec<String>,
    /// Maximum payload size in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire payload text.
    #[arg(conflicts_with = "file")]
    pub payload: Option<String>,
    /// Read the payload from a file.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Validate arguments against `<method>.schema.json` files in DIR.
    #[arg(long, value_name = "DIR")]
    pub validate: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Messenger config file (JSON) for the parent side.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Never signal readiness; let the fallback timer deliver the calls.
    #[arg(long)]
    pub skip_ready: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
