use crate::{
    error::{ApiError, ApiResult},
    repository_from_request,
    state::AppState,
};
use axum::{
    extract::{FromRequest as _, FromRequestParts},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Json, RequestPartsExt,
};
use http::{header::CONTENT_TYPE, request::Parts};
use scubaclub_dal::user::{User, UserRepository};
use scubaclub_types::claim::{Authorization, UserClaim};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::{debug, error, info, warn};

pub mod register;

pub const SESSION_COOKIE_NAME: &str = "scubaclub";
const SESSION_USER_KEY: &str = "user";
const SESSION_EXPIRY_SECS: i64 = 14 * 24 * 3600;

repository_from_request!(UserRepository);

pub fn session_layer(secure: bool) -> SessionManagerLayer<MemoryStore> {
    let session_store = MemoryStore::default();
    SessionManagerLayer::new(session_store)
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            SESSION_EXPIRY_SECS,
        )))
}

async fn session_from_parts(parts: &mut Parts) -> ApiResult<Session> {
    parts.extract::<Session>().await.map_err(|(_, msg)| {
        error!("Missing session: {msg}");
        ApiError::InternalError(msg.to_string())
    })
}

/// Logged in user, requests without login are rejected with 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserClaim);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    /// Fails with 403 for users without superuser role
    pub fn require_superuser(&self) -> ApiResult<()> {
        if self.0.is_superuser() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("superuser role required".into()))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> ApiResult<Self> {
        let session = session_from_parts(parts).await?;
        match session.get::<UserClaim>(SESSION_USER_KEY).await? {
            Some(claim) => Ok(CurrentUser(claim)),
            None => {
                debug!("No user in session");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// Logged in user if there is one
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserClaim>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> ApiResult<Self> {
        let session = session_from_parts(parts).await?;
        let claim = session.get::<UserClaim>(SESSION_USER_KEY).await?;
        Ok(MaybeUser(claim))
    }
}

#[derive(serde::Deserialize)]
struct LoginCredentials {
    username: String,
    password: String,
}

pub async fn after_ok_login(session: &Session, known_user: User) -> ApiResult<impl IntoResponse> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_KEY, known_user.claim()).await?;
    info!("User {} logged in", known_user.username);
    Ok(Redirect::to("/"))
}

pub async fn login(
    user_registry: UserRepository,
    session: Session,
    request: axum::extract::Request,
) -> ApiResult<impl IntoResponse> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidRequest("Missing content type".into()))?
        .to_string();
    let credentials = if content_type.starts_with("application/json") {
        let Json(data) = Json::<LoginCredentials>::from_request(request, &())
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid login credentials: {e}")))?;
        data
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(data) = Form::<LoginCredentials>::from_request(request, &())
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid login credentials: {e}")))?;
        data
    } else {
        return Err(ApiError::InvalidRequest(format!(
            "Unsupported content type {content_type}"
        )));
    };

    let user = user_registry
        .check_password(&credentials.username, &credentials.password)
        .await
        .map_err(|e| {
            debug!("User check error: {e}");
            ApiError::Unauthorized
        })?;

    after_ok_login(&session, user).await
}

pub async fn logout(session: Session) -> impl IntoResponse {
    session
        .flush()
        .await
        .unwrap_or_else(|e| warn!("Failed to delete session: {e}"));
    Redirect::to("/")
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/login", axum::routing::post(login))
        .route("/logout", get(logout).post(logout))
        .merge(register::router())
}
