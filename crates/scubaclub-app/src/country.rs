use axum::{response::IntoResponse, routing::get, Json};
use scubaclub_dal::country::CountryRepository;

use crate::{error::ApiResult, lang::Lang, repository_from_request, state::AppState};

repository_from_request!(CountryRepository);

async fn list_countries(
    repository: CountryRepository,
    Lang(lang): Lang,
) -> ApiResult<impl IntoResponse> {
    let countries = repository.list(lang).await?;
    Ok(Json(countries))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/countries/", get(list_countries))
}
