use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result shape handed to callers that speak JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn success(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(error: &Error) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_result<T: Serialize>(result: &Result<T>) -> Self {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(payload) => Self::success(payload),
                Err(e) => Self::failure(&Error::from(e)),
            },
            Err(e) => Self::failure(e),
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.success { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let outcome = CommandOutcome::from_result(&Ok(vec!["App"]));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "success": true, "payload": ["App"] })
        );
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_failure_shape() {
        let outcome = CommandOutcome::from_result::<()>(&Err(Error::ProjectNotFound("Foo".into())));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "success": false, "error": "No project matches 'Foo'" })
        );
        assert_eq!(outcome.exit_code(), 1);
    }
}
