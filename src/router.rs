use crate::config::Config;
use crate::error::ProxyError;
use crate::gemini::GeminiRequest;
use crate::llm_client::ContentGenerator;
use crate::models::{DEFAULT_IMAGE_MIME_TYPE, ImageUpload, InboundRequest, ProxyResponse};
use crate::request_id::{RequestId, inject_request_id};
use axum::{
    Extension, Form, Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::{HeaderMap, header::CONTENT_TYPE},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

pub const PROXY_ROUTE: &str = "/api/gemini-proxy";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn ContentGenerator>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // uploads are forwarded as-is, so no body cap on this route
        .route(PROXY_ROUTE, post(gemini_proxy).layer(DefaultBodyLimit::disable()))
        .route("/health", get(|| async { "OK" }))
        .layer(middleware::from_fn(inject_request_id))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[axum_macros::debug_handler]
pub async fn gemini_proxy(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    request: Request,
) -> Result<Json<ProxyResponse>, ProxyError> {
    let inbound = match FormKind::of(request.headers()) {
        FormKind::Multipart => {
            let multipart = Multipart::from_request(request, &state).await.map_err(|rejection| {
                info!("Rejected multipart request: {}", rejection.body_text());
                ProxyError::InvalidForm(rejection.body_text())
            })?;
            read_multipart(multipart).await?
        }
        FormKind::UrlEncoded => read_urlencoded(request, &state).await,
        FormKind::Other => {
            // no form data at all, so neither a query nor images
            debug!("Request carries no form data");
            InboundRequest::default()
        }
    };

    relay(&state, &inbound, &request_id).await.map(Json)
}

#[derive(Debug, PartialEq, Eq)]
enum FormKind {
    Multipart,
    UrlEncoded,
    Other,
}

impl FormKind {
    fn of(headers: &HeaderMap) -> Self {
        let essence = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());
        match essence.as_deref() {
            Some("multipart/form-data") => FormKind::Multipart,
            Some("application/x-www-form-urlencoded") => FormKind::UrlEncoded,
            _ => FormKind::Other,
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<InboundRequest, ProxyError> {
    let mut query: Option<String> = None;
    let mut images = Vec::new();

    let invalid = |e: MultipartError| {
        info!("Failed to read multipart form: {}", e);
        ProxyError::InvalidForm(e.body_text())
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().map(str::to_string);
        let is_file = field.file_name().is_some();

        match (name.as_deref(), is_file) {
            (Some("query"), false) => {
                let text = field.text().await.map_err(invalid)?;
                // first occurrence wins
                query.get_or_insert(text);
            }
            (Some("images"), true) => {
                let mime_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME_TYPE.to_string());
                let data = field.bytes().await.map_err(invalid)?;
                images.push(ImageUpload { mime_type, data });
            }
            (other, _) => debug!("Ignoring form field {:?}", other),
        }
    }

    Ok(InboundRequest::new(query.as_deref(), images))
}

/// A url-encoded body can only carry the query; an unreadable one counts as empty.
async fn read_urlencoded(request: Request, state: &AppState) -> InboundRequest {
    match Form::<Vec<(String, String)>>::from_request(request, state).await {
        Ok(Form(pairs)) => {
            let query = pairs.iter().find(|(k, _)| k == "query").map(|(_, v)| v.as_str());
            InboundRequest::new(query, Vec::new())
        }
        Err(rejection) => {
            info!("Unreadable url-encoded form: {}", rejection.body_text());
            InboundRequest::default()
        }
    }
}

/// Validates the submission, calls the vendor once and extracts the text.
pub async fn relay(
    state: &AppState,
    inbound: &InboundRequest,
    request_id: &RequestId,
) -> Result<ProxyResponse, ProxyError> {
    if inbound.is_empty() {
        info!("Rejecting request without query or images");
        return Err(ProxyError::MissingInput);
    }

    let request = GeminiRequest::from(inbound);
    info!(
        "Relaying to {}: query={} images={} image_bytes={}",
        state.config.model,
        inbound.query.is_some(),
        inbound.images.len(),
        inbound.image_bytes()
    );

    let vendor_failed = |e: anyhow::Error| {
        warn!("Vendor request failed: {:#}", e);
        ProxyError::vendor(&e)
    };

    let response = state
        .generator
        .generate_content(&request, request_id)
        .await
        .map_err(vendor_failed)?;

    debug!(
        "Vendor response {:?} from {:?}: finish reasons {:?}",
        response.response_id,
        response.model_version,
        response.candidates.iter().map(|c| (c.index, &c.finish_reason)).collect::<Vec<_>>()
    );
    if let Some(usage) = &response.usage_metadata {
        info!(
            "Token usage: prompt={:?} candidates={:?} thoughts={:?} total={:?}",
            usage.prompt_token_count, usage.candidates_token_count, usage.thoughts_token_count, usage.total_token_count
        );
    }

    let result_text = response.text().map_err(vendor_failed)?;
    Ok(ProxyResponse { result_text })
}
