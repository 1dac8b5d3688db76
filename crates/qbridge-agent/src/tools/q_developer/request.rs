use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// Model names advertised in the tool schema. Other values pass through untouched.
pub const ADVERTISED_MODELS: [&str; 3] = ["claude-3.5-sonnet", "claude-3.7-sonnet", "claude-sonnet-4"];

/// Parameters of one `q-developer-agent` call, as sent over the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct QDeveloperRequest {
    pub prompt: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub resume: bool,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub override_model: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub yolo_mode: bool,
    #[serde(default)]
    pub trust_tools: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub verbose: bool,
}

impl QDeveloperRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Parse and validate tool input.
    pub fn from_value(input: Value) -> Result<Self, ToolError> {
        let req: Self =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> Result<(), ToolError> {
        if self.prompt.trim().is_empty() {
            return Err(ToolError::Validation(
                "prompt is required and must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn agent(&self) -> Option<&str> {
        non_blank(&self.agent)
    }

    pub fn model(&self) -> Option<&str> {
        non_blank(&self.override_model)
    }

    pub fn trust_tools(&self) -> Option<&str> {
        non_blank(&self.trust_tools)
    }
}

// Blank strings count as unset; anything else is kept verbatim.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_request() {
        let req = QDeveloperRequest::from_value(json!({"prompt": "hello"})).unwrap();
        assert_eq!(req, QDeveloperRequest::new("hello"));
    }

    #[test]
    fn kebab_case_fields() {
        let req = QDeveloperRequest::from_value(json!({
            "prompt": "p",
            "override-model": "claude-sonnet-4",
            "yolo-mode": true,
            "trust-tools": "fs_read,fs_write",
            "resume": null,
        }))
        .unwrap();
        assert_eq!(req.model(), Some("claude-sonnet-4"));
        assert!(req.yolo_mode);
        assert_eq!(req.trust_tools(), Some("fs_read,fs_write"));
        assert!(!req.resume);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = QDeveloperRequest::from_value(json!({"prompt": "p", "shell": "sh"})).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMS");
        assert!(err.to_string().contains("shell"));
    }

    #[test]
    fn rejects_missing_or_blank_prompt() {
        for input in [json!({}), json!({"prompt": ""}), json!({"prompt": "  \n"})] {
            let err = QDeveloperRequest::from_value(input).unwrap_err();
            assert!(matches!(err, ToolError::Validation(_)));
        }
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(QDeveloperRequest::from_value(json!({"prompt": 5})).is_err());
        assert!(QDeveloperRequest::from_value(json!({"prompt": "p", "resume": "yes"})).is_err());
        assert!(QDeveloperRequest::from_value(json!("just a string")).is_err());
    }

    #[test]
    fn blank_strings_are_unset() {
        let mut req = QDeveloperRequest::new("p");
        req.agent = Some("   ".into());
        req.override_model = Some(String::new());
        assert_eq!(req.agent(), None);
        assert_eq!(req.model(), None);
    }

    #[test]
    fn unknown_model_passes_through() {
        let req =
            QDeveloperRequest::from_value(json!({"prompt": "p", "override-model": "gpt-x"})).unwrap();
        assert_eq!(req.model(), Some("gpt-x"));
        assert!(!ADVERTISED_MODELS.contains(&"gpt-x"));
    }
}
