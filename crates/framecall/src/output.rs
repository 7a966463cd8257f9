use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framecall_envelope::CallEnvelope;
use serde::Serialize;
use serde_json::Value;

const CALL_SCHEMA_ID: &str = "https://schemas.3leaps.dev/framecall/cli/v1/call.schema.json";
const PAYLOAD_SCHEMA_ID: &str = "https://schemas.3leaps.dev/framecall/cli/v1/payload.schema.json";

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CallOutput<'a> {
    schema_id: &'a str,
    peer: &'a str,
    method: &'a str,
    arg_count: usize,
    args: &'a [Value],
}

#[derive(Serialize)]
struct PayloadOutput<'a> {
    schema_id: &'a str,
    size: usize,
    payload: String,
}

/// Print a call received from (or addressed to) `peer`.
pub fn print_call(call: &CallEnvelope, peer: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = CallOutput {
                schema_id: CALL_SCHEMA_ID,
                peer,
                method: &call.method,
                arg_count: call.args.len(),
                args: &call.args,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "METHOD", "ARGS"])
                .add_row(vec![peer.to_string(), call.method.clone(), args_preview(&call.args)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{peer} -> {}({})", call.method, args_preview(&call.args));
        }
        OutputFormat::Raw => {
            let line = serde_json::to_vec(call).unwrap_or_default();
            print_raw(&line);
            println!();
        }
    }
}

/// Print an encoded wire payload.
pub fn print_payload(payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PayloadOutput {
                schema_id: PAYLOAD_SCHEMA_ID,
                size: payload.len(),
                payload: payload_preview(payload),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SIZE", "PAYLOAD"])
                .add_row(vec![payload.len().to_string(), payload_preview(payload)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("size={} payload={}", payload.len(), payload_preview(payload));
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn args_preview(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn args_render_as_json_list() {
        assert_eq!(args_preview(&[json!("Alice"), json!(3)]), "\"Alice\", 3");
        assert_eq!(args_preview(&[]), "");
    }

    #[test]
    fn binary_payloads_are_summarized() {
        assert_eq!(payload_preview(b"{}"), "{}");
        assert_eq!(payload_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }
}
