use std::path::Path;

use framecall_envelope::{decode_envelope, CallEnvelope};
use framecall_schema::MethodSchemaRegistry;

use crate::cmd::DecodeArgs;
use crate::exit::{envelope_error, io_error, schema_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_call, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = read_payload(&args)?;
    let call = decode_envelope(&payload).map_err(|err| envelope_error("decode failed", err))?;

    if let Some(dir) = &args.validate {
        validate(&call, dir)?;
    }

    print_call(&call, "-", format);
    Ok(SUCCESS)
}

fn read_payload(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    match (&args.payload, &args.file) {
        (Some(text), None) => Ok(text.clone().into_bytes()),
        (None, Some(path)) => std::fs::read(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err)),
        _ => Err(CliError::new(USAGE, "provide a payload or --file")),
    }
}

fn validate(call: &CallEnvelope, dir: &Path) -> CliResult<()> {
    let registry = MethodSchemaRegistry::from_directory(dir)
        .map_err(|err| schema_error("load schemas", err))?;
    registry
        .validate_envelope(call)
        .map_err(|err| schema_error("validation failed", err))
}
