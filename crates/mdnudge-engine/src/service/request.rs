use std::fmt;

use serde::{Deserialize, Serialize};

/// A percentage as sent by a preview: a JSON number or a string.
///
/// The value is kept verbatim so that `"10"` and `10` both match an
/// attribute written as `10%`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PercentValue {
    Number(serde_json::Number),
    Text(String),
}

impl PercentValue {
    /// The value as it would appear before `%` in an attribute
    ///
    /// Numbers that serde_json prints in exponent form (`1e-7`) are spelled
    /// out as plain decimals, since attributes never carry exponents.
    pub fn as_text(&self) -> String {
        match self {
            PercentValue::Number(n) => {
                let text = n.to_string();
                match n.as_f64() {
                    Some(value) if text.contains(['e', 'E']) => value.to_string(),
                    _ => text,
                }
            }
            PercentValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for PercentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<i64> for PercentValue {
    fn from(value: i64) -> Self {
        PercentValue::Number(value.into())
    }
}

impl From<&str> for PercentValue {
    fn from(value: &str) -> Self {
        PercentValue::Text(value.to_string())
    }
}

/// Body of `POST /update-position`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionRequest {
    pub file_name: Option<String>,
    /// Ordinal hint from the preview; a number or a numeric string.
    pub md_index: Option<serde_json::Value>,
    pub top: Option<PercentValue>,
    pub left: Option<PercentValue>,
    pub current_top: Option<PercentValue>,
    pub current_left: Option<PercentValue>,
    pub current_bottom: Option<PercentValue>,
    pub current_right: Option<PercentValue>,
    pub class_list: Option<Vec<String>>,
}

/// Body of `POST /update-size`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSizeRequest {
    pub file_name: Option<String>,
    /// Ordinal hint from the preview; a number or a numeric string.
    pub md_index: Option<serde_json::Value>,
    pub top: Option<PercentValue>,
    pub left: Option<PercentValue>,
    pub width: Option<PercentValue>,
    pub height: Option<PercentValue>,
    pub current_top: Option<PercentValue>,
    pub current_left: Option<PercentValue>,
    pub current_bottom: Option<PercentValue>,
    pub current_right: Option<PercentValue>,
    pub current_width: Option<PercentValue>,
    pub current_height: Option<PercentValue>,
    pub class_list: Option<Vec<String>>,
}

/// Body of `POST /undo`, `/redo` and `/save`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
}

impl UpdateResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
