use crate::gemini::{GeminiContent, GeminiPart};
use crate::models::InboundRequest;
use serde::{Deserialize, Serialize};

/// Body of a `models/{model}:generateContent` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

impl GeminiRequest {
    /// All parts of the submission, query first and images in upload order.
    pub fn parts(&self) -> impl Iterator<Item = &GeminiPart> {
        self.contents.iter().flat_map(|c| c.parts.iter().flatten())
    }
}

impl From<&InboundRequest> for GeminiRequest {
    fn from(inbound: &InboundRequest) -> Self {
        let mut parts = Vec::with_capacity(inbound.images.len() + 1);
        if let Some(query) = &inbound.query {
            parts.push(GeminiPart::text(query.clone()));
        }
        for image in &inbound.images {
            parts.push(GeminiPart::inline_data(&image.data, &image.mime_type));
        }

        // A flat list of parts is a single user turn
        GeminiRequest { contents: vec![GeminiContent::user(parts)] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageUpload;
    use bytes::Bytes;
    use serde_json::json;

    fn image(mime_type: &str, data: &'static [u8]) -> ImageUpload {
        ImageUpload { mime_type: mime_type.to_string(), data: Bytes::from_static(data) }
    }

    #[test]
    fn test_query_only() {
        let request = GeminiRequest::from(&InboundRequest::new(Some("  what is this? "), vec![]));
        let parts: Vec<_> = request.parts().collect();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].as_text(), Some("what is this?"));
    }

    #[test]
    fn test_images_only_keep_upload_order() {
        let inbound = InboundRequest::new(None, vec![image("image/png", b"first"), image("image/jpeg", b"second")]);
        let request = GeminiRequest::from(&inbound);
        let mimes: Vec<_> = request
            .parts()
            .map(|p| match p {
                GeminiPart::InlineData { inline_data } => inline_data.mime_type.as_str(),
                other => panic!("unexpected part: {:?}", other),
            })
            .collect();
        assert_eq!(mimes, vec!["image/png", "image/jpeg"]);
    }

    #[test]
    fn test_query_goes_before_images() {
        let inbound = InboundRequest::new(Some("compare"), vec![image("image/png", b"a"), image("image/png", b"b")]);
        let body = serde_json::to_value(GeminiRequest::from(&inbound)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "compare"},
                        {"inlineData": {"mimeType": "image/png", "data": "YQ=="}},
                        {"inlineData": {"mimeType": "image/png", "data": "Yg=="}}
                    ]
                }]
            })
        );
    }
}
