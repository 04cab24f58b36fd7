use serde_json::Value;
use tracing::warn;

use crate::{directory::AddressDirectory, pipeline::DeploymentAction};

/// Returns the name inside a `<NAME>` placeholder.
fn placeholder_name(text: &str) -> Option<&str> {
    text.strip_prefix('<')?.strip_suffix('>')
}

/// Substitutes every `<NAME>` string leaf of `value` with the checksummed
/// address bound to `NAME`.
///
/// Mappings and sequences are walked element-wise; other scalars and plain
/// strings are copied as they are. A placeholder whose name is unknown is
/// kept verbatim, so it surfaces later as an encoding error.
pub(crate) fn resolve(directory: &AddressDirectory, value: &Value) -> Value {
    match value {
        Value::String(text) => {
            let Some(name) = placeholder_name(text) else {
                return value.clone();
            };
            match directory.get(name) {
                Some(address) => Value::String(address.to_checksum(None)),
                None => {
                    warn!(placeholder = %text, "unresolved placeholder");
                    value.clone()
                }
            }
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| resolve(directory, item)).collect())
        }
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), resolve(directory, field)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

/// Resolved copy of an action's constructor arguments.
pub(crate) fn resolve_arguments(directory: &AddressDirectory, action: &DeploymentAction) -> Vec<Value> {
    action
        .constructor_arguments
        .iter()
        .map(|argument| resolve(directory, argument))
        .collect()
}
