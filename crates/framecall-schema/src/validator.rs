use jsonschema::Validator;
use serde_json::Value;

use crate::error::{Result, SchemaError};

const MAX_REPORTED_ERRORS: usize = 4;

pub(crate) fn validate_args(method: &str, args: &[Value], validator: &Validator) -> Result<()> {
    let value = Value::Array(args.to_vec());

    let messages: Vec<String> = validator
        .iter_errors(&value)
        .take(MAX_REPORTED_ERRORS)
        .map(|err| err.to_string())
        .collect();
    if messages.is_empty() {
        return Ok(());
    }

    Err(SchemaError::ValidationFailed {
        method: method.to_string(),
        message: messages.join("; "),
    })
}
