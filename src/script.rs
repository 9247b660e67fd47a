/// Script objects as produced by the script generator, reduced to the two
/// text fields the scheduler draws keywords from.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::Result;

/// Where a script template keeps its title and spoken body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptTemplate {
    /// `fact_title` / `fact_spoken`
    Fact,
    /// `tip_title` / `tip_spoken`
    Tip,
    Custom { title_field: String, body_field: String },
}

impl ScriptTemplate {
    pub fn fields(&self) -> (&str, &str) {
        match self {
            ScriptTemplate::Fact => ("fact_title", "fact_spoken"),
            ScriptTemplate::Tip => ("tip_title", "tip_spoken"),
            ScriptTemplate::Custom { title_field, body_field } => (title_field.as_str(), body_field.as_str()),
        }
    }
}

/// Title and body text of one script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptText {
    pub title: String,
    pub body: String,
}

impl ScriptText {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Missing or non-string fields become empty text
    pub fn from_json(value: &Value, template: &ScriptTemplate) -> Self {
        let (title_field, body_field) = template.fields();
        let field = |name: &str| value.get(name).and_then(Value::as_str).unwrap_or_default().to_string();

        Self {
            title: field(title_field),
            body: field(body_field),
        }
    }

    /// Read a script JSON file
    pub async fn load(path: &Path, template: &ScriptTemplate) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let value: Value = serde_json::from_str(&content)?;
        Ok(Self::from_json(&value, template))
    }
}
