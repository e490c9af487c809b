use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json,
};
use axum_valid::Garde;
use http::StatusCode;
use scubaclub_dal::{
    location::{CreateLocation, DiveLocation, LocationRepository},
    suggestion::{CreateSuggestion, SuggestionRepository},
    translation::FailedTranslation,
};
use scubaclub_types::language::LanguageCode;
use serde::Serialize;
use tracing::info;

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    lang::Lang,
    repository_from_request,
    state::AppState,
};

repository_from_request!(LocationRepository);

const LOCATION_LIST_URL: &str = "/dive_locations/";

#[derive(Debug, Serialize)]
pub struct LocationView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub facilities: String,
    pub parking: String,
    pub directions: String,
    pub slug: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country_id: Option<i64>,
    pub language: LanguageCode,
    /// Languages with a translation
    pub available_languages: Vec<LanguageCode>,
}

impl LocationView {
    pub fn new(location: &DiveLocation, lang: LanguageCode) -> Self {
        LocationView {
            id: location.id,
            name: location.name(lang),
            description: location.text(lang, |t| t.description.as_str()),
            facilities: location.text(lang, |t| t.facilities.as_str()),
            parking: location.text(lang, |t| t.parking.as_str()),
            directions: location.text(lang, |t| t.directions.as_str()),
            slug: location.slug(lang).map(str::to_string),
            latitude: location.latitude,
            longitude: location.longitude,
            country_id: location.country_id,
            language: location.language,
            available_languages: location.translations.languages().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LocationSaved {
    location: LocationView,
    warnings: Vec<FailedTranslation>,
}

async fn list_locations(
    repository: LocationRepository,
    Lang(lang): Lang,
) -> ApiResult<impl IntoResponse> {
    let locations = repository.list_for_language(lang).await?;
    let locations: Vec<_> = locations
        .iter()
        .map(|l| LocationView::new(l, lang))
        .collect();
    Ok(Json(locations))
}

async fn location_detail(
    repository: LocationRepository,
    Lang(lang): Lang,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    match repository.find_by_slug(&slug, lang).await? {
        Some(location) => Ok(Json(LocationView::new(&location, lang)).into_response()),
        None => {
            info!("No dive location with slug {slug}");
            Ok(Redirect::to(LOCATION_LIST_URL).into_response())
        }
    }
}

async fn create_location(
    repository: LocationRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Garde(Json(payload)): Garde<Json<CreateLocation>>,
) -> ApiResult<impl IntoResponse> {
    let (location, report) = repository.create(payload, user.id()).await?;
    Ok((
        StatusCode::CREATED,
        Json(LocationSaved {
            location: LocationView::new(&location, lang),
            warnings: report.failed,
        }),
    ))
}

async fn suggest_edit(
    repository: LocationRepository,
    suggestions: SuggestionRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Path(slug): Path<String>,
    Garde(Json(mut payload)): Garde<Json<CreateSuggestion>>,
) -> ApiResult<impl IntoResponse> {
    payload.language.get_or_insert(lang);
    let location = repository
        .find_by_slug(&slug, lang)
        .await?
        .ok_or_else(|| ApiError::ResourceNotFound(format!("Dive location {slug}")))?;
    let suggestion = suggestions.create(location.id, payload, user.id()).await?;
    Ok((StatusCode::CREATED, Json(suggestion)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(LOCATION_LIST_URL, get(list_locations))
        .route("/create_dive_location/", post(create_location))
        .route("/location/{slug}/", get(location_detail))
        .route("/location/{slug}/suggest_edit/", post(suggest_edit))
}
