//! Structured-config drift analysis
//!
//! Compares only the declared key-paths of two parsed documents, so a
//! reformatted or locally extended file is not reported as drifted as long
//! as the keys that matter still carry the reference values.

use devscaffold_fs::KeyPath;
use serde::Serialize;
use serde_json::Value;

use crate::drift::InstallState;

/// One declared key-path whose value differs between reference and target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPathMismatch {
    pub key_path: String,
    pub reference_value: Option<Value>,
    /// `None` when the key is missing from the installed copy
    pub target_value: Option<Value>,
}

/// Compare `target` against `reference` at each declared key-path.
///
/// Wildcards in `key_paths` are expanded against the reference document,
/// so keys that exist only in the target are never reported. A key that
/// is present but empty (`null`, `""`, `[]`, `{}`) in the target counts as
/// missing.
pub fn evaluate(
    key_paths: &[KeyPath],
    reference: &Value,
    target: Option<&Value>,
) -> (InstallState, Vec<KeyPathMismatch>) {
    let Some(target) = target else {
        return (InstallState::Absent, Vec::new());
    };

    let mut mismatches = Vec::new();
    for declared in key_paths {
        for path in declared.expand(reference) {
            let expected = path.resolve(reference);
            let actual = path.resolve(target).filter(|v| !is_empty(v));

            let matches = match (expected, actual) {
                (Some(expected), Some(actual)) => expected == actual,
                (None, None) => true,
                // An empty reference value is satisfied by an empty target
                (Some(expected), None) => is_empty(expected),
                (None, Some(_)) => false,
            };

            if !matches {
                tracing::debug!(key_path = %path, "Structured key differs from reference");
                mismatches.push(KeyPathMismatch {
                    key_path: path.to_string(),
                    reference_value: expected.cloned(),
                    target_value: actual.cloned(),
                });
            }
        }
    }

    let state = if mismatches.is_empty() {
        InstallState::Identical
    } else {
        InstallState::Drifted
    };
    (state, mismatches)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
