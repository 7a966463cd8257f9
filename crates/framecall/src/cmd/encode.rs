use framecall_envelope::{encode_envelope_with_config, CallEnvelope, EnvelopeConfig};
use serde_json::Value;
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{envelope_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_payload, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.method.is_empty() {
        return Err(CliError::new(USAGE, "method must not be empty"));
    }

    let call_args = parse_args(&args.args)?;
    let config = match args.max_payload {
        Some(max_payload_size) => EnvelopeConfig { max_payload_size },
        None => EnvelopeConfig::default(),
    };

    let envelope = CallEnvelope::new(args.method, call_args);
    let payload = encode_envelope_with_config(&envelope, &config)
        .map_err(|err| envelope_error("encode failed", err))?;
    debug!(method = %envelope.method, size = payload.len(), "encoded call");

    print_payload(&payload, format);
    Ok(SUCCESS)
}

fn parse_args(raw: &[String]) -> CliResult<Vec<Value>> {
    raw.iter()
        .enumerate()
        .map(|(index, text)| {
            serde_json::from_str(text).map_err(|err| {
                CliError::new(
                    DATA_INVALID,
                    format!("argument {} is not valid JSON: {err}", index + 1),
                )
            })
        })
        .collect()
}
