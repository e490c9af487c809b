use axum::{extract::State, response::IntoResponse, routing::get, Json};
use scubaclub_dal::club::ClubRepository;
use scubaclub_types::language::LanguageCode;
use serde_json::json;

use crate::{auth::MaybeUser, club::ClubView, error::ApiResult, lang::Lang, state::AppState};

async fn home(
    clubs: ClubRepository,
    Lang(lang): Lang,
    MaybeUser(user): MaybeUser,
) -> ApiResult<impl IntoResponse> {
    let my_clubs: Vec<ClubView> = match &user {
        Some(user) => clubs
            .list_for_user(user.id)
            .await?
            .iter()
            .map(|c| ClubView::new(c, lang))
            .collect(),
        None => Vec::new(),
    };
    Ok(Json(json!({
        "message": greeting(lang),
        "language": lang,
        "user": user,
        "clubs": my_clubs,
    })))
}

fn greeting(lang: LanguageCode) -> &'static str {
    match lang {
        LanguageCode::En => "Welcome to the dive club network",
        LanguageCode::Nl => "Welkom bij het duikclubnetwerk",
    }
}

async fn privacy(Lang(lang): Lang) -> impl IntoResponse {
    Json(json!({
        "page": "privacy",
        "language": lang,
    }))
}

async fn contact(State(state): State<AppState>, Lang(lang): Lang) -> impl IntoResponse {
    Json(json!({
        "page": "contact",
        "language": lang,
        "email": state.config().default_from_email,
    }))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(home))
        .route("/privacy/", get(privacy))
        .route("/contact/", get(contact))
}
