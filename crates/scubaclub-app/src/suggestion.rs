use axum::{
    extract::Path,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json,
};
use scubaclub_dal::{location::LocationRepository, suggestion::SuggestionRepository};
use tracing::info;

use crate::{
    auth::CurrentUser, error::ApiResult, lang::Lang, repository_from_request, state::AppState,
};

repository_from_request!(SuggestionRepository);

const REVIEW_URL: &str = "/review_location_suggestions/";

async fn review(
    suggestions: SuggestionRepository,
    user: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    user.require_superuser()?;
    let pending = suggestions.list_pending().await?;
    Ok(Json(pending))
}

async fn approve(
    suggestions: SuggestionRepository,
    locations: LocationRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    user.require_superuser()?;
    let location_id = suggestions.approve(id).await?;
    info!("User {} approved suggestion {id}", user.id());
    let location = locations.get(location_id).await?;
    let target = match location.slug(lang) {
        Some(slug) if !slug.is_empty() => format!("/location/{slug}/"),
        _ => REVIEW_URL.to_string(),
    };
    Ok(Redirect::to(&target))
}

async fn reject(
    suggestions: SuggestionRepository,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    user.require_superuser()?;
    suggestions.reject(id).await?;
    info!("User {} rejected suggestion {id}", user.id());
    Ok(Redirect::to(REVIEW_URL))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(REVIEW_URL, get(review))
        .route("/approve_suggestion/{id}/", post(approve))
        .route("/reject_suggestion/{id}/", post(reject))
}
