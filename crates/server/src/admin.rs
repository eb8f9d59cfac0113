//! Admin API: login, quote management, catalog CRUD, runtime settings.
//!
//! All routes except `/api/admin/login` require a bearer token issued by
//! the login handler. Tokens are random, expire after the configured
//! session TTL, and live only in process memory.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use refineai_core::config::LlmProvider;
use refineai_core::domain::admin::AdminSettings;
use refineai_core::domain::quote::{QuoteId, QuoteStatus};
use refineai_core::domain::service::{ServiceType, ServiceTypeId};
use refineai_core::errors::{ApplicationError, DomainError, InterfaceError};
use refineai_db::repositories::{QuoteUpdate, ServiceTypeUpdate};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{
    bad_request, error_reply, new_correlation_id, not_found, repository_failure, ApiError,
    ApiResult, QuoteDto, ServiceTypeDto,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/quotes", get(list_quotes))
        .route("/api/admin/quotes/{id}", put(update_quote))
        .route("/api/admin/service-types", get(list_service_types).post(create_service_type))
        .route("/api/admin/service-types/{id}", put(update_service_type))
        .route("/api/admin/config", get(get_settings).put(update_settings))
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let correlation_id = new_correlation_id();
    let admin = &state.config.admin;

    if body.username != admin.username || body.password != admin.password.expose_secret() {
        tracing::warn!(
            event_name = "admin.login_rejected",
            correlation_id = %correlation_id,
            "admin login rejected"
        );
        return Err(unauthorized("invalid credentials", &correlation_id));
    }

    let (token, expires_at) = state.sessions.issue(admin.session_ttl_secs);
    tracing::info!(
        event_name = "admin.login",
        correlation_id = %correlation_id,
        "admin session issued"
    );

    Ok(Json(LoginResponse { token, expires_at: expires_at.to_rfc3339() }))
}

fn unauthorized(message: &str, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    error_reply(InterfaceError::Unauthorized {
        message: message.to_string(),
        correlation_id: correlation_id.to_string(),
    })
}

fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
    correlation_id: &str,
) -> Result<(), (StatusCode, Json<ApiError>)> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if state.sessions.is_valid(token) => Ok(()),
        _ => Err(unauthorized("a valid admin bearer token is required", correlation_id)),
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteRequest {
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub status: Option<String>,
    pub total_price: Option<i64>,
}

pub async fn list_quotes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<QuoteDto>> {
    let correlation_id = new_correlation_id();
    require_admin(&state, &headers, &correlation_id)?;

    let quotes = state
        .quotes
        .list_all()
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    Ok(Json(quotes.into_iter().map(QuoteDto::from).collect()))
}

pub async fn update_quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateQuoteRequest>,
) -> ApiResult<QuoteDto> {
    let correlation_id = new_correlation_id();
    require_admin(&state, &headers, &correlation_id)?;

    let quote_id = QuoteId(id.clone());
    let current = state
        .quotes
        .find_by_id(&quote_id)
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?
        .ok_or_else(|| not_found(format!("quote `{id}` was not found"), &correlation_id))?;

    let status = match body.status.as_deref() {
        Some(raw) => {
            let next = QuoteStatus::parse(raw).ok_or_else(|| {
                bad_request(format!("unknown quote status `{raw}`"), &correlation_id)
            })?;
            if next != current.status && !current.can_transition_to(next) {
                return Err(error_reply(
                    ApplicationError::from(DomainError::InvalidQuoteTransition {
                        from: current.status,
                        to: next,
                    })
                    .into_interface(&*correlation_id),
                ));
            }
            Some(next)
        }
        None => None,
    };

    if body.total_price.is_some_and(|price| price <= 0) {
        return Err(bad_request("`totalPrice` must be a positive amount", &correlation_id));
    }

    let update = QuoteUpdate {
        customer_email: body.customer_email,
        customer_name: body.customer_name,
        status,
        total_price: body.total_price,
    };

    let updated = state
        .quotes
        .update(&quote_id, update)
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?
        .ok_or_else(|| not_found(format!("quote `{id}` was not found"), &correlation_id))?;

    tracing::info!(
        event_name = "admin.quote_updated",
        correlation_id = %correlation_id,
        quote_id = %id,
        status = updated.status.as_str(),
        "quote updated"
    );

    Ok(Json(QuoteDto::from(updated)))
}

// ---------------------------------------------------------------------------
// Service-type catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceTypeRequest {
    pub name: String,
    pub base_price: i64,
    #[serde(default)]
    pub price_per_sqft: Option<i64>,
    #[serde(default)]
    pub complexity_multiplier: Option<i64>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceTypeRequest {
    pub name: Option<String>,
    pub base_price: Option<i64>,
    pub price_per_sqft: Option<i64>,
    pub complexity_multiplier: Option<i64>,
    pub active: Option<bool>,
}

pub async fn list_service_types(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<ServiceTypeDto>> {
    let correlation_id = new_correlation_id();
    require_admin(&state, &headers, &correlation_id)?;

    let services = state
        .service_types
        .list_all()
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    Ok(Json(services.into_iter().map(ServiceTypeDto::from).collect()))
}

pub async fn create_service_type(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateServiceTypeRequest>,
) -> Result<(StatusCode, Json<ServiceTypeDto>), (StatusCode, Json<ApiError>)> {
    let correlation_id = new_correlation_id();
    require_admin(&state, &headers, &correlation_id)?;

    if body.name.trim().is_empty() {
        return Err(bad_request("`name` must not be empty", &correlation_id));
    }
    if body.base_price <= 0 {
        return Err(bad_request("`basePrice` must be a positive amount", &correlation_id));
    }

    let service = ServiceType {
        id: ServiceTypeId(format!("svc-{}", Uuid::new_v4().simple())),
        name: body.name.trim().to_string(),
        base_price: body.base_price,
        price_per_sqft: body.price_per_sqft.unwrap_or(0),
        complexity_multiplier: body.complexity_multiplier.unwrap_or(100),
        active: body.active.unwrap_or(true),
    };

    state
        .service_types
        .create(service.clone())
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    tracing::info!(
        event_name = "admin.service_type_created",
        correlation_id = %correlation_id,
        service_type_id = %service.id.0,
        "service type created"
    );

    Ok((StatusCode::CREATED, Json(ServiceTypeDto::from(service))))
}

pub async fn update_service_type(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateServiceTypeRequest>,
) -> ApiResult<ServiceTypeDto> {
    let correlation_id = new_correlation_id();
    require_admin(&state, &headers, &correlation_id)?;

    if body.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(bad_request("`name` must not be empty", &correlation_id));
    }
    if body.base_price.is_some_and(|price| price <= 0) {
        return Err(bad_request("`basePrice` must be a positive amount", &correlation_id));
    }

    let update = ServiceTypeUpdate {
        name: body.name.map(|name| name.trim().to_string()),
        base_price: body.base_price,
        price_per_sqft: body.price_per_sqft,
        complexity_multiplier: body.complexity_multiplier,
        active: body.active,
    };

    let updated = state
        .service_types
        .update(&ServiceTypeId(id.clone()), update)
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?
        .ok_or_else(|| {
            not_found(format!("service type `{id}` was not found"), &correlation_id)
        })?;

    Ok(Json(ServiceTypeDto::from(updated)))
}

// ---------------------------------------------------------------------------
// Runtime settings
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfigDto {
    pub webhook_url: Option<String>,
    pub llm_provider: String,
    pub has_llm_api_key: bool,
    pub assistant_prompt: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminConfigRequest {
    pub webhook_url: Option<String>,
    pub llm_provider: Option<String>,
    pub llm_api_key: Option<String>,
    pub assistant_prompt: Option<String>,
}

fn settings_dto(state: &AppState, settings: Option<AdminSettings>) -> AdminConfigDto {
    let config_key_present = state.config.llm.api_key.is_some();
    match settings {
        Some(settings) => AdminConfigDto {
            webhook_url: settings.webhook_url,
            llm_provider: settings.llm_provider,
            has_llm_api_key: settings.llm_api_key.is_some() || config_key_present,
            assistant_prompt: settings.assistant_prompt,
            updated_at: Some(settings.updated_at.to_rfc3339()),
        },
        None => AdminConfigDto {
            webhook_url: None,
            llm_provider: state.config.llm.provider.as_str().to_string(),
            has_llm_api_key: config_key_present,
            assistant_prompt: None,
            updated_at: None,
        },
    }
}

pub async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<AdminConfigDto> {
    let correlation_id = new_correlation_id();
    require_admin(&state, &headers, &correlation_id)?;

    let settings = state
        .admin_config
        .get()
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    Ok(Json(settings_dto(&state, settings)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateAdminConfigRequest>,
) -> ApiResult<AdminConfigDto> {
    let correlation_id = new_correlation_id();
    require_admin(&state, &headers, &correlation_id)?;

    if let Some(provider) = body.llm_provider.as_deref() {
        provider
            .parse::<LlmProvider>()
            .map_err(|error| bad_request(error.to_string(), &correlation_id))?;
    }

    let current = state
        .admin_config
        .get()
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    let mut settings = current.unwrap_or_else(|| AdminSettings {
        id: format!("cfg-{}", Uuid::new_v4().simple()),
        webhook_url: None,
        llm_provider: state.config.llm.provider.as_str().to_string(),
        llm_api_key: None,
        assistant_prompt: None,
        updated_at: Utc::now(),
    });

    // A provided field overwrites; a blank value clears; absence keeps
    // the stored value.
    apply_optional(&mut settings.webhook_url, body.webhook_url);
    apply_optional(&mut settings.llm_api_key, body.llm_api_key);
    apply_optional(&mut settings.assistant_prompt, body.assistant_prompt);
    if let Some(provider) = body.llm_provider {
        settings.llm_provider = provider.trim().to_ascii_lowercase();
    }
    settings.updated_at = Utc::now();

    let stored = state
        .admin_config
        .upsert(settings)
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    tracing::info!(
        event_name = "admin.config_updated",
        correlation_id = %correlation_id,
        provider = %stored.llm_provider,
        webhook_configured = stored.webhook_url.is_some(),
        "runtime settings updated"
    );

    Ok(Json(settings_dto(&state, Some(stored))))
}

fn apply_optional(target: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming {
        let trimmed = value.trim();
        *target = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::{Path, State};
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::Json;
    use chrono::Utc;
    use refineai_core::domain::quote::{Quote, QuoteId, QuoteStatus};

    use super::{
        create_service_type, get_settings, list_quotes, login, update_quote, update_settings,
        CreateServiceTypeRequest, LoginRequest, UpdateAdminConfigRequest, UpdateQuoteRequest,
    };
    use crate::state::AppState;
    use crate::testing::setup_state;

    fn bearer(state: &AppState) -> HeaderMap {
        let (token, _) = state.sessions.issue(3600);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().expect("header value"),
        );
        headers
    }

    async fn seed_quote(state: &AppState, id: &str, status: QuoteStatus) {
        state
            .quotes
            .create(Quote {
                id: QuoteId(id.to_string()),
                customer_email: Some("sam@example.com".to_string()),
                customer_name: Some("Sam".to_string()),
                service_type_id: None,
                photo_path: None,
                ai_analysis: None,
                total_price: Some(450),
                status,
                created_at: Utc::now(),
            })
            .await
            .expect("seed quote");
    }

    #[tokio::test]
    async fn login_issues_token_for_configured_credentials() {
        let state = setup_state().await;

        let result = login(
            State(state.clone()),
            Json(LoginRequest { username: "owner".to_string(), password: "hunter2".to_string() }),
        )
        .await
        .expect("login should succeed");

        assert!(state.sessions.is_valid(&result.0.token));
    }

    #[tokio::test]
    async fn login_rejects_wrong_credentials() {
        let state = setup_state().await;

        let result = login(
            State(state),
            Json(LoginRequest { username: "owner".to_string(), password: "wrong".to_string() }),
        )
        .await;

        let (status, _) = result.expect_err("should be rejected");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_routes_reject_missing_and_expired_tokens() {
        let state = setup_state().await;

        let result = list_quotes(State(state.clone()), HeaderMap::new()).await;
        let (status, _) = result.expect_err("missing token should be rejected");
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (token, _) = state.sessions.issue(3600);
        state.sessions.expire(&token);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().expect("header value"),
        );
        let result = list_quotes(State(state), headers).await;
        let (status, _) = result.expect_err("expired token should be rejected");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_quote_applies_a_legal_transition() {
        let state = setup_state().await;
        seed_quote(&state, "q-1", QuoteStatus::Pending).await;
        let headers = bearer(&state);

        let result = update_quote(
            State(state.clone()),
            headers,
            Path("q-1".to_string()),
            Json(UpdateQuoteRequest {
                status: Some("approved".to_string()),
                total_price: Some(500),
                ..UpdateQuoteRequest::default()
            }),
        )
        .await
        .expect("update should succeed");

        assert_eq!(result.0.status, "approved");
        assert_eq!(result.0.total_price, Some(500));

        let stored = state
            .quotes
            .find_by_id(&QuoteId("q-1".to_string()))
            .await
            .expect("lookup")
            .expect("stored");
        assert_eq!(stored.status, QuoteStatus::Approved);
    }

    #[tokio::test]
    async fn update_quote_blocks_an_illegal_transition() {
        let state = setup_state().await;
        seed_quote(&state, "q-2", QuoteStatus::Rejected).await;
        let headers = bearer(&state);

        let result = update_quote(
            State(state),
            headers,
            Path("q-2".to_string()),
            Json(UpdateQuoteRequest {
                status: Some("completed".to_string()),
                ..UpdateQuoteRequest::default()
            }),
        )
        .await;

        let (status, _) = result.expect_err("illegal transition should be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn service_type_create_validates_and_persists() {
        let state = setup_state().await;
        let headers = bearer(&state);

        let (status, created) = create_service_type(
            State(state.clone()),
            headers.clone(),
            Json(CreateServiceTypeRequest {
                name: "Vanity Refinishing".to_string(),
                base_price: 250,
                price_per_sqft: None,
                complexity_multiplier: None,
                active: None,
            }),
        )
        .await
        .expect("create should succeed");

        assert_eq!(status, StatusCode::CREATED);
        assert!(created.0.active);
        assert_eq!(created.0.complexity_multiplier, 100);

        let result = create_service_type(
            State(state),
            headers,
            Json(CreateServiceTypeRequest {
                name: "  ".to_string(),
                base_price: 250,
                price_per_sqft: None,
                complexity_multiplier: None,
                active: None,
            }),
        )
        .await;
        let (status, _) = result.expect_err("blank name should be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn settings_round_trip_without_echoing_the_key() {
        let state = setup_state().await;
        let headers = bearer(&state);

        let updated = update_settings(
            State(state.clone()),
            headers.clone(),
            Json(UpdateAdminConfigRequest {
                webhook_url: Some("https://hooks.example.com/quotes".to_string()),
                llm_provider: Some("gemini".to_string()),
                llm_api_key: Some("super-secret-key".to_string()),
                assistant_prompt: Some("You are a refinishing expert.".to_string()),
            }),
        )
        .await
        .expect("update should succeed");

        assert!(updated.0.has_llm_api_key);
        let json = serde_json::to_value(&updated.0).expect("serialize");
        assert!(
            !json.to_string().contains("super-secret-key"),
            "the stored key must never be echoed"
        );

        let fetched = get_settings(State(state), headers).await.expect("get should succeed");
        assert_eq!(
            fetched.0.webhook_url.as_deref(),
            Some("https://hooks.example.com/quotes")
        );
        assert_eq!(fetched.0.assistant_prompt.as_deref(), Some("You are a refinishing expert."));
    }

    #[tokio::test]
    async fn settings_update_rejects_unknown_provider() {
        let state = setup_state().await;
        let headers = bearer(&state);

        let result = update_settings(
            State(state),
            headers,
            Json(UpdateAdminConfigRequest {
                llm_provider: Some("skynet".to_string()),
                ..UpdateAdminConfigRequest::default()
            }),
        )
        .await;

        let (status, _) = result.expect_err("unknown provider should be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
