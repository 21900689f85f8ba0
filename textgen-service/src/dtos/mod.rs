use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub query: Option<Value>,
}

impl GenerateRequest {
    /// The prompt, if one was supplied.
    ///
    /// Falsy values (`null`, `""`, `0`, `false`, `[]`, `{}`) count as absent.
    /// Any other non-string value is an error.
    pub fn prompt(&self) -> anyhow::Result<Option<&str>> {
        let Some(query) = self.query.as_ref() else {
            return Ok(None);
        };
        if is_falsy(query) {
            return Ok(None);
        }
        match query {
            Value::String(s) => Ok(Some(s.as_str())),
            other => Err(anyhow::anyhow!(
                "query must be a string, got {}",
                type_name(other)
            )),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub response: String,
}
