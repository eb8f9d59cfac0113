//! Public JSON API for the quote funnel.
//!
//! Endpoints (camelCase wire format):
//! - `GET  /api/service-types`            — active catalog entries
//! - `POST /api/quotes`                   — multipart photo submission
//! - `GET  /api/quotes/search?email=&name=` — customer quote lookup
//! - `GET  /api/quotes/{id}`              — quote by id
//! - `GET  /api/chat/{session_id}`        — chat history for one session
//!
//! The admin API and the WebSocket relay are merged into the same
//! router; the health endpoint runs on its own port.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use refineai_agent::{EstimateError, PricingEstimator};
use refineai_core::domain::quote::{Quote, QuoteId, QuoteStatus};
use refineai_core::domain::service::{ServiceType, ServiceTypeId};
use refineai_core::errors::{ApplicationError, DomainError, InterfaceError};
use refineai_core::ChatMessage;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::state::AppState;
use crate::uploads::{self, UploadError};
use crate::webhook;
use crate::{admin, ws};

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub(crate) fn new_correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Maps a typed interface error onto the HTTP envelope.
///
/// Validation-style errors echo their message; infrastructure failures
/// only expose the generic user-safe text, the detail stays in the log.
pub(crate) fn error_reply(error: InterfaceError) -> (StatusCode, Json<ApiError>) {
    let (status, detail) = match &error {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
        InterfaceError::Unauthorized { message, .. } => {
            (StatusCode::UNAUTHORIZED, message.clone())
        }
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, error.user_message().to_string())
        }
        InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, error.user_message().to_string())
        }
    };

    tracing::warn!(
        event_name = "api.request_failed",
        correlation_id = %error.correlation_id(),
        error = %error,
        "request failed"
    );

    (
        status,
        Json(ApiError { error: detail, correlation_id: error.correlation_id().to_string() }),
    )
}

pub(crate) fn bad_request(
    message: impl Into<String>,
    correlation_id: &str,
) -> (StatusCode, Json<ApiError>) {
    error_reply(InterfaceError::BadRequest {
        message: message.into(),
        correlation_id: correlation_id.to_string(),
    })
}

pub(crate) fn not_found(
    message: impl Into<String>,
    correlation_id: &str,
) -> (StatusCode, Json<ApiError>) {
    error_reply(InterfaceError::NotFound {
        message: message.into(),
        correlation_id: correlation_id.to_string(),
    })
}

pub(crate) fn repository_failure(
    error: refineai_db::repositories::RepositoryError,
    correlation_id: &str,
) -> (StatusCode, Json<ApiError>) {
    error_reply(ApplicationError::Persistence(error.to_string()).into_interface(correlation_id))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeDto {
    pub id: String,
    pub name: String,
    pub base_price: i64,
    pub price_per_sqft: i64,
    pub complexity_multiplier: i64,
    pub active: bool,
}

impl From<ServiceType> for ServiceTypeDto {
    fn from(service: ServiceType) -> Self {
        Self {
            id: service.id.0,
            name: service.name,
            base_price: service.base_price,
            price_per_sqft: service.price_per_sqft,
            complexity_multiplier: service.complexity_multiplier,
            active: service.active,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDto {
    pub id: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub service_type_id: Option<String>,
    pub photo_path: Option<String>,
    pub ai_analysis: Option<serde_json::Value>,
    pub total_price: Option<i64>,
    pub status: String,
    pub created_at: String,
}

impl From<Quote> for QuoteDto {
    fn from(quote: Quote) -> Self {
        Self {
            id: quote.id.0,
            customer_email: quote.customer_email,
            customer_name: quote.customer_name,
            service_type_id: quote.service_type_id.map(|id| id.0),
            photo_path: quote.photo_path,
            ai_analysis: quote.ai_analysis,
            total_price: quote.total_price,
            status: quote.status.as_str().to_string(),
            created_at: quote.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

impl From<ChatMessage> for ChatMessageDto {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id.0,
            session_id: message.session_id,
            role: message.role.as_str().to_string(),
            content: message.content,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub email: Option<String>,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    let router = Router::new()
        .route("/api/service-types", get(list_service_types))
        .route("/api/quotes", post(create_quote))
        .route("/api/quotes/search", get(search_quotes))
        .route("/api/quotes/{id}", get(get_quote))
        .route("/api/chat/{session_id}", get(chat_history))
        .merge(admin::router())
        .route("/ws", get(ws::upgrade))
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn list_service_types(State(state): State<AppState>) -> ApiResult<Vec<ServiceTypeDto>> {
    let correlation_id = new_correlation_id();
    let services = state
        .service_types
        .list_active()
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    Ok(Json(services.into_iter().map(ServiceTypeDto::from).collect()))
}

pub async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<QuoteDto> {
    let correlation_id = new_correlation_id();
    let quote = state
        .quotes
        .find_by_id(&QuoteId(id.clone()))
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?
        .ok_or_else(|| not_found(format!("quote `{id}` was not found"), &correlation_id))?;

    Ok(Json(QuoteDto::from(quote)))
}

pub async fn search_quotes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<QuoteDto>> {
    let correlation_id = new_correlation_id();
    let email = query.email.as_deref().map(str::trim).filter(|value| !value.is_empty());
    let name = query.name.as_deref().map(str::trim).filter(|value| !value.is_empty());

    if email.is_none() && name.is_none() {
        return Err(bad_request(
            "provide at least one of `email` or `name` to search",
            &correlation_id,
        ));
    }

    let quotes = state
        .quotes
        .search(email, name)
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    Ok(Json(quotes.into_iter().map(QuoteDto::from).collect()))
}

pub async fn chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Vec<ChatMessageDto>> {
    let correlation_id = new_correlation_id();
    let messages = state
        .chat_messages
        .list_for_session(&session_id)
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    Ok(Json(messages.into_iter().map(ChatMessageDto::from).collect()))
}

pub async fn create_quote(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<QuoteDto>), (StatusCode, Json<ApiError>)> {
    let correlation_id = new_correlation_id();
    let submission = parse_submission(multipart)
        .await
        .map_err(|message| bad_request(message, &correlation_id))?;

    let quote = submit_quote(&state, submission, &correlation_id).await.map_err(error_reply)?;
    Ok((StatusCode::CREATED, Json(QuoteDto::from(quote))))
}

// ---------------------------------------------------------------------------
// Quote submission pipeline
// ---------------------------------------------------------------------------

/// One parsed multipart submission from the quote form.
#[derive(Debug)]
pub struct QuoteSubmission {
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub service_type_id: String,
    pub photo: Vec<u8>,
    pub photo_mime: String,
}

async fn parse_submission(mut multipart: Multipart) -> Result<QuoteSubmission, String> {
    let mut customer_email = None;
    let mut customer_name = None;
    let mut service_type_id = None;
    let mut photo = None;

    while let Some(field) =
        multipart.next_field().await.map_err(|error| format!("invalid multipart body: {error}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "customerEmail" => {
                customer_email = Some(read_text(field, "customerEmail").await?);
            }
            "customerName" => {
                customer_name = Some(read_text(field, "customerName").await?);
            }
            "serviceTypeId" => {
                service_type_id = Some(read_text(field, "serviceTypeId").await?);
            }
            "photo" => {
                let mime = field
                    .content_type()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|error| format!("could not read `photo`: {error}"))?;
                photo = Some((bytes.to_vec(), mime));
            }
            _ => {}
        }
    }

    let (photo, photo_mime) = photo.ok_or_else(|| "`photo` is required".to_string())?;
    let service_type_id = service_type_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| "`serviceTypeId` is required".to_string())?;

    Ok(QuoteSubmission {
        customer_email: customer_email.filter(|value| !value.trim().is_empty()),
        customer_name: customer_name.filter(|value| !value.trim().is_empty()),
        service_type_id,
        photo,
        photo_mime,
    })
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, String> {
    field.text().await.map_err(|error| format!("could not read `{name}`: {error}"))
}

/// Runs the full submission pipeline: catalog validation, photo
/// preprocessing, model analysis, persistence, webhook notification.
///
/// A missing or invalid model analysis rejects the submission; no quote
/// is ever persisted with placeholder numbers.
pub async fn submit_quote(
    state: &AppState,
    submission: QuoteSubmission,
    correlation_id: &str,
) -> Result<Quote, InterfaceError> {
    let service_type = state
        .service_types
        .find_by_id(&ServiceTypeId(submission.service_type_id.clone()))
        .await
        .map_err(|error| {
            ApplicationError::Persistence(error.to_string()).into_interface(correlation_id)
        })?
        .filter(|service| service.active)
        .ok_or_else(|| {
            ApplicationError::from(DomainError::UnknownServiceType(
                submission.service_type_id.clone(),
            ))
            .into_interface(correlation_id)
        })?;

    let photo = uploads::preprocess(
        &submission.photo,
        &submission.photo_mime,
        state.config.uploads.max_bytes,
    )
    .map_err(|error| upload_error_reply(error, correlation_id))?;

    let llm = state
        .vision_llm()
        .await
        .map_err(|error| {
            ApplicationError::Persistence(error.to_string()).into_interface(correlation_id)
        })?
        .ok_or_else(|| InterfaceError::ServiceUnavailable {
            message: "no vision model credential is configured".to_string(),
            correlation_id: correlation_id.to_string(),
        })?;

    let analysis = PricingEstimator::new(llm)
        .estimate(&photo.jpeg_base64, "image/jpeg", &service_type.name)
        .await
        .map_err(|error| match error {
            EstimateError::Llm(source) => {
                ApplicationError::Integration(source.to_string()).into_interface(correlation_id)
            }
            EstimateError::Analysis(source) => {
                ApplicationError::Analysis(source).into_interface(correlation_id)
            }
        })?;

    let quote_id = Uuid::new_v4().simple().to_string();
    let photo_path = store_original(state, &quote_id, &submission).await.map_err(|error| {
        ApplicationError::Persistence(format!("could not store upload: {error}"))
            .into_interface(correlation_id)
    })?;

    let ai_analysis = serde_json::to_value(&analysis).map_err(|error| {
        ApplicationError::Integration(format!("analysis serialization failed: {error}"))
            .into_interface(correlation_id)
    })?;

    let quote = Quote {
        id: QuoteId(quote_id),
        customer_email: submission.customer_email,
        customer_name: submission.customer_name,
        service_type_id: Some(service_type.id.clone()),
        photo_path: Some(photo_path),
        ai_analysis: Some(ai_analysis),
        total_price: Some(analysis.total_price_dollars()),
        status: QuoteStatus::Pending,
        created_at: Utc::now(),
    };

    state.quotes.create(quote.clone()).await.map_err(|error| {
        ApplicationError::Persistence(error.to_string()).into_interface(correlation_id)
    })?;

    tracing::info!(
        event_name = "quote.created",
        correlation_id = %correlation_id,
        quote_id = %quote.id.0,
        service_type = %service_type.name,
        total_price = analysis.total_price,
        "quote persisted"
    );

    notify_webhook(state, &quote).await;

    Ok(quote)
}

fn upload_error_reply(error: UploadError, correlation_id: &str) -> InterfaceError {
    InterfaceError::BadRequest {
        message: error.to_string(),
        correlation_id: correlation_id.to_string(),
    }
}

async fn store_original(
    state: &AppState,
    quote_id: &str,
    submission: &QuoteSubmission,
) -> std::io::Result<String> {
    let extension = uploads::extension_for_mime(&submission.photo_mime);
    let file_name = format!("{quote_id}.{extension}");
    let dir = &state.config.uploads.dir;

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&file_name), &submission.photo).await?;

    Ok(dir.join(file_name).to_string_lossy().into_owned())
}

async fn notify_webhook(state: &AppState, quote: &Quote) {
    let webhook_url = match state.admin_settings().await {
        Ok(settings) => settings
            .and_then(|settings| settings.webhook_url)
            .filter(|url| !url.trim().is_empty()),
        Err(error) => {
            tracing::warn!(
                event_name = "webhook.settings_unavailable",
                error = %error,
                "skipping webhook, admin settings could not be read"
            );
            None
        }
    };

    if let Some(url) = webhook_url {
        match serde_json::to_value(QuoteDto::from(quote.clone())) {
            Ok(payload) => {
                webhook::notify_quote_created(state.http.clone(), url, payload);
            }
            Err(error) => tracing::warn!(
                event_name = "webhook.payload_failed",
                error = %error,
                "skipping webhook, quote payload could not be serialized"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::{Path, Query, State};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use refineai_core::domain::chat::{ChatMessage, ChatMessageId, ChatRole};
    use refineai_core::domain::quote::{Quote, QuoteId, QuoteStatus};
    use tower::util::ServiceExt;

    use super::{
        chat_history, get_quote, list_service_types, search_quotes, submit_quote, QuoteSubmission,
        SearchQuery,
    };
    use crate::testing::{new_correlation, setup_state, MockVisionLlm, GOOD_ANALYSIS_REPLY};

    fn png_bytes() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).expect("encode png");
        bytes
    }

    fn submission(service_type_id: &str) -> QuoteSubmission {
        QuoteSubmission {
            customer_email: Some("sam@example.com".to_string()),
            customer_name: Some("Sam".to_string()),
            service_type_id: service_type_id.to_string(),
            photo: png_bytes(),
            photo_mime: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn list_service_types_returns_active_catalog_in_camel_case() {
        let state = setup_state().await;

        let result = list_service_types(State(state)).await.expect("should succeed");
        assert_eq!(result.0.len(), 4);

        let json = serde_json::to_value(&result.0).expect("serialize");
        assert_eq!(json[0]["basePrice"], 450);
        assert!(json[0].get("base_price").is_none(), "wire format must be camelCase");
    }

    #[tokio::test]
    async fn submit_quote_persists_validated_analysis() {
        let state = setup_state()
            .await
            .with_llm(Arc::new(MockVisionLlm::replying(GOOD_ANALYSIS_REPLY)));

        let quote = submit_quote(&state, submission("svc-bathtub"), &new_correlation())
            .await
            .expect("submission should succeed");

        assert_eq!(quote.status, QuoteStatus::Pending);
        assert_eq!(quote.total_price, Some(725));
        assert!(quote.photo_path.as_deref().is_some_and(|path| path.ends_with(".png")));

        let stored = state
            .quotes
            .find_by_id(&quote.id)
            .await
            .expect("lookup")
            .expect("quote should be stored");
        assert_eq!(stored.total_price, Some(725));
        let analysis = stored.ai_analysis.expect("analysis should be stored");
        assert_eq!(analysis["totalPrice"], 725.0);
    }

    #[tokio::test]
    async fn submit_quote_rejects_unknown_service_type() {
        let state = setup_state()
            .await
            .with_llm(Arc::new(MockVisionLlm::replying(GOOD_ANALYSIS_REPLY)));

        let error = submit_quote(&state, submission("svc-nope"), &new_correlation())
            .await
            .expect_err("should fail");
        assert!(matches!(error, refineai_core::InterfaceError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn submit_quote_rejects_inactive_service_type() {
        let state = setup_state()
            .await
            .with_llm(Arc::new(MockVisionLlm::replying(GOOD_ANALYSIS_REPLY)));

        use refineai_db::repositories::ServiceTypeUpdate;
        state
            .service_types
            .update(
                &refineai_core::ServiceTypeId("svc-tile".to_string()),
                ServiceTypeUpdate { active: Some(false), ..ServiceTypeUpdate::default() },
            )
            .await
            .expect("deactivate");

        let error = submit_quote(&state, submission("svc-tile"), &new_correlation())
            .await
            .expect_err("should fail");
        assert!(matches!(error, refineai_core::InterfaceError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn submit_quote_hard_fails_on_unusable_analysis() {
        let state =
            setup_state().await.with_llm(Arc::new(MockVisionLlm::replying("no json here")));

        let error = submit_quote(&state, submission("svc-bathtub"), &new_correlation())
            .await
            .expect_err("should fail");
        assert!(matches!(error, refineai_core::InterfaceError::ServiceUnavailable { .. }));

        let quotes = state.quotes.list_all().await.expect("list");
        assert!(quotes.is_empty(), "failed analysis must not persist a quote");
    }

    #[tokio::test]
    async fn submit_quote_without_model_credential_is_unavailable() {
        let state = setup_state().await;

        let error = submit_quote(&state, submission("svc-bathtub"), &new_correlation())
            .await
            .expect_err("should fail");
        assert!(matches!(error, refineai_core::InterfaceError::ServiceUnavailable { .. }));
    }

    #[tokio::test]
    async fn get_quote_returns_not_found_for_unknown_id() {
        let state = setup_state().await;

        let result = get_quote(State(state), Path("missing".to_string())).await;
        let (status, _) = result.expect_err("should be a miss");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_requires_at_least_one_criterion() {
        let state = setup_state().await;

        let result = search_quotes(State(state), Query(SearchQuery::default())).await;
        let (status, _) = result.expect_err("should be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_matches_email_substring_case_insensitively() {
        let state = setup_state().await;
        state
            .quotes
            .create(Quote {
                id: QuoteId("q-search".to_string()),
                customer_email: Some("Pat.Lee@Example.com".to_string()),
                customer_name: Some("Pat Lee".to_string()),
                service_type_id: None,
                photo_path: None,
                ai_analysis: None,
                total_price: Some(450),
                status: QuoteStatus::Pending,
                created_at: Utc::now(),
            })
            .await
            .expect("seed quote");

        let result = search_quotes(
            State(state),
            Query(SearchQuery { email: Some("pat.lee".to_string()), name: None }),
        )
        .await
        .expect("search should succeed");

        assert_eq!(result.0.len(), 1);
        assert_eq!(result.0[0].id, "q-search");
    }

    #[tokio::test]
    async fn chat_history_is_returned_in_timestamp_order() {
        let state = setup_state().await;
        let base = Utc::now();
        for (index, content) in ["hello", "hi there"].iter().enumerate() {
            state
                .chat_messages
                .append(ChatMessage {
                    id: ChatMessageId(format!("m-{index}")),
                    session_id: "session-1".to_string(),
                    role: if index == 0 { ChatRole::User } else { ChatRole::Assistant },
                    content: content.to_string(),
                    created_at: base + chrono::Duration::seconds(index as i64),
                })
                .await
                .expect("append");
        }

        let result = chat_history(State(state), Path("session-1".to_string()))
            .await
            .expect("history should succeed");
        assert_eq!(result.0.len(), 2);
        assert_eq!(result.0[0].content, "hello");
        assert_eq!(result.0[1].role, "assistant");
    }

    #[tokio::test]
    async fn multipart_submission_round_trips_through_the_router() {
        let state = setup_state()
            .await
            .with_llm(Arc::new(MockVisionLlm::replying(GOOD_ANALYSIS_REPLY)));
        let app = super::router(state);

        let boundary = "refineai-test-boundary";
        let mut body = Vec::new();
        for (name, value) in
            [("customerEmail", "sam@example.com"), ("serviceTypeId", "svc-bathtub")]
        {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; \
                 filename=\"tub.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png_bytes());
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/quotes")
                    .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["status"], "pending");
        assert_eq!(payload["totalPrice"], 725);
        assert_eq!(payload["customerEmail"], "sam@example.com");
    }

    #[tokio::test]
    async fn multipart_submission_without_photo_is_rejected() {
        let state = setup_state()
            .await
            .with_llm(Arc::new(MockVisionLlm::replying(GOOD_ANALYSIS_REPLY)));
        let app = super::router(state.clone());

        let boundary = "refineai-test-boundary";
        let mut body = Vec::new();
        for (name, value) in
            [("customerEmail", "sam@example.com"), ("serviceTypeId", "svc-bathtub")]
        {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/quotes")
                    .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("router call");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let quotes = state.quotes.list_all().await.expect("list");
        assert!(quotes.is_empty(), "a photoless submission must not persist a quote");
    }
}
