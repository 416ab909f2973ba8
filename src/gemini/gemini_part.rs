use crate::gemini::{GeminiFunctionCall, GeminiInlineData};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(rename = "thoughtSignature")]
        thought_signature: Option<String>,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(rename = "thoughtSignature")]
        thought_signature: Option<String>,
    },
    /// Any part shape not modelled above (code execution, file data, ...).
    Other(Value),
}

impl GeminiPart {
    pub fn text(text: impl Into<String>) -> Self {
        GeminiPart::Text { text: text.into(), thought: None, thought_signature: None }
    }

    pub fn inline_data(data: &[u8], mime_type: &str) -> Self {
        GeminiPart::InlineData { inline_data: GeminiInlineData::from_bytes(data, mime_type) }
    }

    /// The part's text, when it carries a non-empty one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GeminiPart::Text { text, .. } if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_part_shapes() {
        let parts: Vec<GeminiPart> = serde_json::from_value(json!([
            {"text": "hi", "thoughtSignature": "sig"},
            {"inlineData": {"mimeType": "image/png", "data": "AAEC"}},
            {"functionCall": {"name": "lookup", "args": {"q": 1}}},
            {"executableCode": {"language": "PYTHON", "code": "print(1)"}}
        ]))
        .unwrap();

        assert!(matches!(&parts[0], GeminiPart::Text { text, .. } if text == "hi"));
        assert!(matches!(&parts[1], GeminiPart::InlineData { inline_data } if inline_data.mime_type == "image/png"));
        assert!(matches!(&parts[2], GeminiPart::FunctionCall { function_call, .. } if function_call.name == "lookup"));
        assert!(matches!(&parts[3], GeminiPart::Other(_)));
    }

    #[test]
    fn test_only_non_empty_text_is_exposed() {
        assert_eq!(GeminiPart::text("abc").as_text(), Some("abc"));
        assert_eq!(GeminiPart::text("").as_text(), None);
        assert_eq!(GeminiPart::inline_data(b"x", "image/jpeg").as_text(), None);
    }

    #[test]
    fn test_serialize_inline_data_as_base64() {
        let value = serde_json::to_value(GeminiPart::inline_data(&[0xff, 0xd8, 0xff], "image/jpeg")).unwrap();
        assert_eq!(value, json!({"inlineData": {"mimeType": "image/jpeg", "data": "/9j/"}}));
    }
}
