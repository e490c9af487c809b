use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Json,
};
use axum_valid::Garde;
use garde::Validate;
use scubaclub_auth::token::{decode_uid, encode_uid, TokenSubject};
use scubaclub_dal::user::{CreateUser, UserAuthState, UserRepository};
use scubaclub_types::general::{Username, ValidEmail};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    mailer::Message,
    state::AppState,
};

const ACTIVATION_SUBJECT: &str = "Activate your scubaclub account";

#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationForm {
    #[garde(dive)]
    pub username: Username,
    #[garde(dive)]
    pub email: ValidEmail,
    #[garde(length(min = 8, max = 255))]
    pub password1: String,
    #[garde(matches(password1))]
    pub password2: String,
}

fn subject(state: &UserAuthState) -> TokenSubject<'_> {
    TokenSubject {
        user_id: state.id,
        is_active: state.is_active,
        password_hash: state.password.as_deref(),
    }
}

fn activation_path(user_id: i64, token: &str) -> String {
    format!("activate/{}/{}/", encode_uid(user_id), token)
}

pub async fn register(
    State(state): State<AppState>,
    user_registry: UserRepository,
    Garde(Form(form)): Garde<Form<RegistrationForm>>,
) -> ApiResult<impl IntoResponse> {
    if user_registry.exists(form.username.as_ref()).await? {
        return Err(ApiError::Conflict(format!(
            "User {} already exists",
            form.username
        )));
    }
    let email = form.email.to_string();
    let user = user_registry
        .create(CreateUser {
            username: form.username,
            email: form.email,
            password: form.password1,
            is_active: false,
            is_superuser: false,
        })
        .await?;

    let auth_state = user_registry.auth_state(user.id).await?;
    let token = state.tokens().issue(&subject(&auth_state))?;
    let link = state.build_url(&activation_path(user.id, &token))?;
    let message = Message {
        from: state.config().default_from_email.clone(),
        to: email,
        subject: ACTIVATION_SUBJECT.to_string(),
        body: format!(
            "Hello {},\n\nplease activate your account by visiting:\n{link}\n\nThe link is valid for {} hours.\n",
            user.username,
            state.tokens().validity().as_secs() / 3600
        ),
    };
    state.mailer().send(message).await?;
    info!("Registered user {} ({}), activation mail sent", user.username, user.id);

    Ok(Redirect::to("/registration_complete/"))
}

pub async fn registration_complete() -> impl IntoResponse {
    Json(json!({
        "message": "Registration complete, check your mailbox for the activation link"
    }))
}

pub async fn activate(
    State(state): State<AppState>,
    user_registry: UserRepository,
    Path((uid, token)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let invalid = || ApiError::InvalidRequest("activation invalid".to_string());
    let user_id = decode_uid(&uid).map_err(|e| {
        debug!("Invalid activation uid {uid}: {e}");
        invalid()
    })?;
    let auth_state = match user_registry.auth_state(user_id).await {
        Ok(s) => s,
        Err(e) => {
            debug!("Activation for unknown user {user_id}: {e}");
            return Err(invalid());
        }
    };
    if let Err(e) = state.tokens().check(&subject(&auth_state), &token) {
        warn!("Invalid activation token for user {user_id}: {e}");
        return Err(invalid());
    }
    user_registry.activate(user_id).await?;
    info!("Activated user {user_id}");
    Ok(Redirect::to("/login"))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/register", post(register))
        .route("/registration_complete/", get(registration_complete))
        .route("/activate/{uid}/{token}/", get(activate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_form_validation() {
        let form = RegistrationForm {
            username: "diver1".parse().unwrap(),
            email: "diver@example.com".parse().unwrap(),
            password1: "longenough".into(),
            password2: "longenough".into(),
        };
        assert!(form.validate().is_ok());

        let form = RegistrationForm {
            password2: "different!".into(),
            ..form
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_activation_path() {
        assert_eq!(activation_path(17, "123-abc"), "activate/MTc/123-abc/");
    }
}
