use axum::{
    extract::Path,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json,
};
use axum_valid::Garde;
use http::StatusCode;
use scubaclub_dal::{
    club::ClubRepository,
    event::{CreateEvent, DiveEvent, EventRepository, UpdateEvent},
    location::LocationRepository,
    user::UserShort,
};
use scubaclub_types::language::LanguageCode;
use serde::Serialize;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info};

use crate::{
    auth::{CurrentUser, MaybeUser},
    error::{ApiError, ApiResult},
    lang::Lang,
    repository_from_request,
    state::AppState,
};

repository_from_request!(EventRepository);

#[derive(Debug, Serialize)]
struct EventPage {
    event: DiveEvent,
    free_slots: i64,
    participants: Vec<UserShort>,
    is_participant: bool,
    can_edit: bool,
}

fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

fn event_url(id: i64) -> String {
    format!("/dive/{id}/")
}

/// Event can be tied only to a club where the user belongs
async fn check_club(clubs: &ClubRepository, club_id: Option<i64>, user: &CurrentUser) -> ApiResult<()> {
    if let Some(club_id) = club_id {
        let membership = clubs.membership(club_id, user.id()).await?;
        if !(membership.is_member || membership.is_admin) {
            return Err(ApiError::Forbidden(format!(
                "User {} does not belong to club {club_id}",
                user.id()
            )));
        }
    }
    Ok(())
}

async fn check_location(locations: &LocationRepository, location_id: i64) -> ApiResult<()> {
    if locations.exists(location_id).await? {
        Ok(())
    } else {
        Err(ApiError::UnprocessableRequest(format!(
            "Unknown dive location {location_id}"
        )))
    }
}

/// Organizer or admin of the event's club
async fn can_manage(clubs: &ClubRepository, event: &DiveEvent, user_id: i64) -> ApiResult<bool> {
    if event.organizer_id == user_id {
        return Ok(true);
    }
    match event.club_id {
        Some(club_id) => Ok(clubs.is_admin(club_id, user_id).await?),
        None => Ok(false),
    }
}

async fn require_manager(clubs: &ClubRepository, event: &DiveEvent, user: &CurrentUser) -> ApiResult<()> {
    if can_manage(clubs, event, user.id()).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "User {} cannot manage event {}",
            user.id(),
            event.id
        )))
    }
}

async fn upcoming(events: EventRepository, Lang(lang): Lang) -> ApiResult<impl IntoResponse> {
    let list = events.list_upcoming(lang, now()).await?;
    Ok(Json(list))
}

async fn create(
    events: &EventRepository,
    clubs: &ClubRepository,
    locations: &LocationRepository,
    user: &CurrentUser,
    lang: LanguageCode,
    mut payload: CreateEvent,
) -> ApiResult<DiveEvent> {
    payload.language.get_or_insert(lang);
    check_club(clubs, payload.club_id, user).await?;
    check_location(locations, payload.location_id).await?;
    let event = events.create(payload, user.id()).await?;
    Ok(event)
}

async fn create_event(
    events: EventRepository,
    clubs: ClubRepository,
    locations: LocationRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Garde(Json(payload)): Garde<Json<CreateEvent>>,
) -> ApiResult<impl IntoResponse> {
    let event = create(&events, &clubs, &locations, &user, lang, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn create_club_event(
    events: EventRepository,
    clubs: ClubRepository,
    locations: LocationRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Path(club_id): Path<i64>,
    Garde(Json(mut payload)): Garde<Json<CreateEvent>>,
) -> ApiResult<impl IntoResponse> {
    payload.club_id = Some(club_id);
    let event = create(&events, &clubs, &locations, &user, lang, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn event_detail(
    events: EventRepository,
    clubs: ClubRepository,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let event = events.get(id).await?;
    let (is_participant, can_edit) = match &user {
        Some(user) => (
            events.is_participant(id, user.id).await?,
            can_manage(&clubs, &event, user.id).await?,
        ),
        None => (false, false),
    };
    let page = EventPage {
        free_slots: event.free_slots(),
        participants: events.participants(id).await?,
        is_participant,
        can_edit,
        event,
    };
    Ok(Json(page))
}

async fn edit_event(
    events: EventRepository,
    clubs: ClubRepository,
    locations: LocationRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Path(id): Path<i64>,
    Garde(Json(mut payload)): Garde<Json<UpdateEvent>>,
) -> ApiResult<impl IntoResponse> {
    payload.language.get_or_insert(lang);
    let event = events.get(id).await?;
    require_manager(&clubs, &event, &user).await?;
    if payload.club_id != event.club_id {
        check_club(&clubs, payload.club_id, &user).await?;
    }
    check_location(&locations, payload.location_id).await?;
    let event = events.update(id, payload).await?;
    Ok(Json(event))
}

async fn cancel_event(
    events: EventRepository,
    clubs: ClubRepository,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let event = events.get(id).await?;
    require_manager(&clubs, &event, &user).await?;
    events.cancel(id).await?;
    Ok(Redirect::to(&event_url(id)))
}

async fn join_event(
    events: EventRepository,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if events.join(id, user.id()).await? {
        info!("User {} joined dive {id}", user.id());
    } else {
        debug!("User {} already on dive {id}", user.id());
    }
    Ok(Redirect::to(&event_url(id)))
}

async fn leave_event(
    events: EventRepository,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    events.get(id).await?;
    if events.leave(id, user.id()).await? {
        info!("User {} left dive {id}", user.id());
    }
    Ok(Redirect::to(&event_url(id)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/upcoming_dives/", get(upcoming))
        .route("/create_dive_event/", post(create_event))
        .route("/create_dive_event/{club_id}/", post(create_club_event))
        .route("/dive/{id}/", get(event_detail))
        .route("/dive/{id}/edit/", post(edit_event))
        .route("/dive/{id}/cancel/", post(cancel_event))
        .route("/dive/{id}/join/", post(join_event))
        .route("/dive/{id}/leave/", post(leave_event))
}
