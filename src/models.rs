use bytes::Bytes;
use serde::Serialize;

pub const DEFAULT_IMAGE_MIME_TYPE: &str = "application/octet-stream";

/// One uploaded file from the `images` form field.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub mime_type: String,
    pub data: Bytes,
}

/// The multipart submission after field extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRequest {
    /// Trimmed query text; `None` when missing or blank.
    pub query: Option<String>,
    pub images: Vec<ImageUpload>,
}

impl InboundRequest {
    pub fn new(query: Option<&str>, images: Vec<ImageUpload>) -> Self {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        Self { query, images }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.images.is_empty()
    }

    pub fn image_bytes(&self) -> usize {
        self.images.iter().map(|i| i.data.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyResponse {
    pub result_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_trimmed() {
        let req = InboundRequest::new(Some("  describe this \n"), vec![]);
        assert_eq!(req.query.as_deref(), Some("describe this"));
        assert!(!req.is_empty());
    }

    #[test]
    fn test_blank_query_counts_as_absent() {
        let req = InboundRequest::new(Some(" \t "), vec![]);
        assert_eq!(req.query, None);
        assert!(req.is_empty());
    }

    #[test]
    fn test_images_alone_are_enough() {
        let image = ImageUpload { mime_type: "image/png".to_string(), data: Bytes::from_static(b"png") };
        let req = InboundRequest::new(None, vec![image]);
        assert!(!req.is_empty());
        assert_eq!(req.image_bytes(), 3);
    }

    #[test]
    fn test_error_response_omits_missing_details() {
        let body = ErrorResponse { error: "bad".to_string(), details: None };
        assert_eq!(serde_json::to_value(&body).unwrap(), serde_json::json!({"error": "bad"}));
    }
}
