//! Response validation.
//!
//! Controllers report the outcome of a configuration write inside an
//! otherwise successful (HTTP 200) response. The overall status lives in a
//! `_global_result` envelope; each sub-object of a multi-part write gets its
//! own `_result` somewhere inside the body. A write only succeeded if every
//! one of those statuses is zero.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::httpapi::ResponseBody;

/// Key of the top-level status envelope
pub const GLOBAL_RESULT_KEY: &str = "_global_result";

/// Key of a per-object status envelope
pub const RESULT_KEY: &str = "_result";

/// Key of a flat error response
pub const ERROR_KEY: &str = "Error";

/// Outcome of validating one response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// Whether every status in the body was zero
    pub success: bool,
    /// Changes applied but not yet written to startup configuration
    pub pending: u64,
    /// Every failure message found, in document order, joined by ", "
    pub message: String,
}

impl ValidationOutcome {
    fn passed(pending: u64) -> Self {
        Self {
            success: true,
            pending,
            message: String::new(),
        }
    }

    fn failed(pending: u64, messages: Vec<String>) -> Self {
        Self {
            success: false,
            pending,
            message: messages.join(", "),
        }
    }

    /// Validate a decoded response body. Bodies that are not JSON carry no
    /// status information and are accepted.
    pub fn from_body(body: &ResponseBody) -> Self {
        match body {
            ResponseBody::Json(value) => validate(value),
            ResponseBody::Raw(_) => Self::passed(0),
        }
    }
}

/// Validate a response body.
///
/// - `_global_result` present: every nested `_result` is checked. A non-zero
///   global status fails the body and its `status_str` leads the message.
/// - a bare `Error` key: failure with that message.
/// - anything else: success.
pub fn validate(body: &Value) -> ValidationOutcome {
    let Value::Object(map) = body else {
        return ValidationOutcome::passed(0);
    };

    if let Some(global) = map.get(GLOBAL_RESULT_KEY) {
        let pending = global.get("_pending").map(pending_count).unwrap_or(0);
        let mut messages = Vec::new();
        let global_ok = is_zero_status(global.get("status"));
        if !global_ok {
            messages.push(status_message(global));
        }
        if collect_failures(body, &mut messages) && global_ok {
            ValidationOutcome::passed(pending)
        } else {
            ValidationOutcome::failed(pending, messages)
        }
    } else if let Some(error) = map.get(ERROR_KEY) {
        ValidationOutcome::failed(0, vec![message_text(error)])
    } else {
        ValidationOutcome::passed(0)
    }
}

/// Walk `value`, pushing the message of every failing `_result`. Returns
/// false if any was found. The walk never stops early.
fn collect_failures(value: &Value, messages: &mut Vec<String>) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .fold(true, |ok, item| collect_failures(item, messages) && ok),
        Value::Object(map) => {
            let mut ok = check_result(map, messages);
            for member in map.values() {
                if member.is_object() || member.is_array() {
                    ok = collect_failures(member, messages) && ok;
                }
            }
            ok
        }
        _ => true,
    }
}

fn check_result(map: &Map<String, Value>, messages: &mut Vec<String>) -> bool {
    match map.get(RESULT_KEY) {
        Some(result) if !is_zero_status(result.get("status")) => {
            messages.push(status_message(result));
            false
        }
        _ => true,
    }
}

/// Status values arrive both as numbers and as numeric strings. A missing
/// status says nothing about failure.
pub fn is_zero_status(status: Option<&Value>) -> bool {
    match status {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.trim().parse::<i64>() == Ok(0),
        Some(_) => false,
    }
}

fn status_message(envelope: &Value) -> String {
    match envelope.get("status_str") {
        Some(text) => message_text(text),
        None => format!(
            "status {}",
            envelope.get("status").map(message_text).unwrap_or_default()
        ),
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pending_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_response_reports_pending() {
        let body = json!({
            "_global_result": {"status": 0, "status_str": "Success", "_pending": 2},
            "vlan_id": [{"id": 5, "_result": {"status": 0, "status_str": "ok"}}]
        });
        let outcome = validate(&body);
        assert!(outcome.success);
        assert_eq!(outcome.pending, 2);
        assert_eq!(outcome.message, "");
    }

    #[test]
    fn test_pending_defaults_to_zero() {
        let outcome = validate(&json!({"_global_result": {"status": 0}}));
        assert!(outcome.success);
        assert_eq!(outcome.pending, 0);
    }

    #[test]
    fn test_nested_failures_are_all_collected_in_order() {
        let body = json!({
            "_global_result": {"status": 0, "status_str": "Success", "_pending": 1},
            "_list": [
                {"vlan_id": {"id": 5, "_result": {"status": 1, "status_str": "first"}}},
                {"vlan_id": {"id": 6, "_result": {"status": 0, "status_str": "fine"}}},
                {"vlan_name": [{"name": "x", "_result": {"status": 2, "status_str": "second"}}]}
            ]
        });
        let outcome = validate(&body);
        assert!(!outcome.success);
        assert_eq!(outcome.pending, 1);
        assert_eq!(outcome.message, "first, second");
    }

    #[test]
    fn test_failure_inside_failed_object_is_still_collected() {
        let body = json!({
            "_global_result": {"status": 0},
            "outer": {
                "_result": {"status": 1, "status_str": "outer failed"},
                "inner": {"_result": {"status": 1, "status_str": "inner failed"}}
            }
        });
        assert_eq!(validate(&body).message, "outer failed, inner failed");
    }

    #[test]
    fn test_global_failure() {
        let body = json!({
            "_global_result": {"status": 1, "status_str": "Invalid config_path", "_pending": 3},
            "x": {"_result": {"status": 1, "status_str": "bad vlan"}}
        });
        let outcome = validate(&body);
        assert!(!outcome.success);
        assert_eq!(outcome.pending, 3);
        assert_eq!(outcome.message, "Invalid config_path, bad vlan");
    }

    #[test]
    fn test_global_failure_without_nested_results() {
        let body = json!({"_global_result": {"status": 2, "status_str": "G"}});
        assert_eq!(validate(&body).message, "G");
    }

    #[test]
    fn test_zero_status_forms() {
        assert!(is_zero_status(None));
        assert!(is_zero_status(Some(&json!(0))));
        assert!(is_zero_status(Some(&json!(0.0))));
        assert!(is_zero_status(Some(&json!(" 0 "))));
        assert!(!is_zero_status(Some(&json!(1))));
        assert!(!is_zero_status(Some(&json!("busy"))));
        assert!(!is_zero_status(Some(&json!(true))));
    }

    #[test]
    fn test_string_status_values() {
        assert!(validate(&json!({"_global_result": {"status": "0"}})).success);
        assert!(!validate(&json!({"_global_result": {"status": "1", "status_str": "no"}})).success);
    }

    #[test]
    fn test_flat_error() {
        let outcome = validate(&json!({"Error": "disk full"}));
        assert_eq!(
            outcome,
            ValidationOutcome {
                success: false,
                pending: 0,
                message: "disk full".to_string()
            }
        );
    }

    #[test]
    fn test_unrecognized_shapes_pass() {
        assert!(validate(&json!({"_data": {"vlan_id": []}})).success);
        assert!(validate(&json!([1, 2, 3])).success);
        assert!(validate(&json!("text")).success);
        assert!(ValidationOutcome::from_body(&ResponseBody::Raw("oops".into())).success);
    }
}
