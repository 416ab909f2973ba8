use crate::gemini::{GeminiCandidate, GeminiPromptFeedback, GeminiUsage};
use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiResponse {
    // Omitted by the API when the prompt itself was blocked
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<GeminiUsage>,
    #[serde(rename = "modelVersion")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(rename = "promptFeedback")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(rename = "responseId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GeminiResponse {
    /// Concatenates every text part of every candidate, in order.
    /// Parts without text are skipped.
    ///
    /// Fails when there is nothing to traverse: no candidates, a candidate
    /// without content, or content without parts.
    pub fn text(&self) -> Result<String> {
        if self.candidates.is_empty() {
            match self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
                Some(reason) => bail!(
                    "response has no candidates: prompt blocked ({:?}) {}",
                    reason,
                    self.prompt_feedback
                        .as_ref()
                        .and_then(|f| f.block_reason_message.as_deref())
                        .unwrap_or_default()
                ),
                None => bail!("response has no candidates"),
            }
        }

        let mut text = String::new();
        for (i, candidate) in self.candidates.iter().enumerate() {
            let parts = candidate
                .content
                .as_ref()
                .ok_or_else(|| anyhow!("candidate {} has no content (finish reason {:?})", i, candidate.finish_reason))?
                .parts
                .as_ref()
                .ok_or_else(|| anyhow!("candidate {} content has no parts", i))?;
            parts.iter().filter_map(|part| part.as_text()).for_each(|t| text.push_str(t));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeminiFinishReason;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GeminiResponse {
        serde_json::from_value(value).expect("valid gemini response")
    }

    #[test]
    fn test_text_joins_parts_in_order() {
        let resp = parse(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world."}]},
                "finishReason": "STOP",
                "index": 0
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 3, "totalTokenCount": 7},
            "modelVersion": "gemini-2.5-flash",
            "responseId": "abc"
        }));
        assert_eq!(resp.text().unwrap(), "Hello, world.");
        assert_eq!(resp.candidates[0].finish_reason, Some(GeminiFinishReason::Stop));
    }

    #[test]
    fn test_text_spans_candidates_and_skips_non_text() {
        let resp = parse(json!({
            "candidates": [
                {"content": {"parts": [
                    {"text": "a"},
                    {"functionCall": {"name": "f", "args": {}}},
                    {"inlineData": {"mimeType": "image/png", "data": "AA=="}},
                    {"text": ""}
                ]}},
                {"content": {"parts": [{"text": "b"}]}}
            ]
        }));
        assert_eq!(resp.text().unwrap(), "ab");
    }

    #[test]
    fn test_text_is_repeatable() {
        let resp = parse(json!({"candidates": [{"content": {"parts": [{"text": "x"}, {"text": "y"}]}}]}));
        let first = resp.text().unwrap();
        assert_eq!(first, resp.text().unwrap());
        assert_eq!(first, "xy");
    }

    #[test]
    fn test_blocked_prompt_is_an_error() {
        let resp = parse(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        let err = resp.text().unwrap_err();
        assert!(err.to_string().starts_with("response has no candidates: prompt blocked (Safety)"));
    }

    #[test]
    fn test_empty_candidates_is_an_error() {
        assert!(parse(json!({"candidates": []})).text().is_err());
    }

    #[test]
    fn test_candidate_without_content_is_an_error() {
        let resp = parse(json!({"candidates": [{"finishReason": "SOMETHING_NEW"}]}));
        assert_eq!(resp.candidates[0].finish_reason, Some(GeminiFinishReason::Unrecognized));
        let err = resp.text().unwrap_err();
        assert_eq!(err.to_string(), "candidate 0 has no content (finish reason Some(Unrecognized))");
    }

    #[test]
    fn test_content_without_parts_is_an_error() {
        let resp = parse(json!({"candidates": [{"content": {"role": "model"}, "finishReason": "MAX_TOKENS"}]}));
        assert_eq!(resp.text().unwrap_err().to_string(), "candidate 0 content has no parts");
    }
}
