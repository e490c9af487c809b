use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json,
};
use axum_valid::Garde;
use http::StatusCode;
use scubaclub_dal::{
    club::{ClubRepository, CreateClub, DiveClub, JoinRequest, Membership, UpdateClub},
    event::{DiveEvent, EventRepository},
    translation::FailedTranslation,
    user::UserShort,
    Error as DalError,
};
use scubaclub_types::language::LanguageCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::{CurrentUser, MaybeUser},
    error::{ApiError, ApiResult},
    lang::Lang,
    repository_from_request,
    state::AppState,
};

repository_from_request!(ClubRepository);

const CLUB_LIST_URL: &str = "/dive_clubs/";

/// Club as presented in one language
#[derive(Debug, Serialize)]
pub struct ClubView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub slug: Option<String>,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country_id: Option<i64>,
    pub website: String,
    pub email: String,
    pub created_by: i64,
}

impl ClubView {
    pub fn new(club: &DiveClub, lang: LanguageCode) -> Self {
        ClubView {
            id: club.id,
            name: club.name(lang),
            description: club.description(lang),
            slug: club.slug(lang).map(str::to_string),
            street: club.street.clone(),
            postal_code: club.postal_code.clone(),
            city: club.city.clone(),
            country_id: club.country_id,
            website: club.website.clone(),
            email: club.email.clone(),
            created_by: club.created_by,
        }
    }
}

#[derive(Debug, Serialize)]
struct ClubPage {
    club: ClubView,
    members: Vec<UserShort>,
    admins: Vec<UserShort>,
    /// Visible to club admins only
    pending_members: Vec<UserShort>,
    membership: Membership,
    events: Vec<DiveEvent>,
}

#[derive(Debug, Serialize)]
struct ClubSaved {
    club: ClubView,
    warnings: Vec<FailedTranslation>,
}

/// Club page url in `lang`, list of clubs when club has no slug yet
pub fn club_url(club: &DiveClub, lang: LanguageCode) -> String {
    match club.slug(lang) {
        Some(slug) if !slug.is_empty() => format!("/club/{slug}/"),
        _ => CLUB_LIST_URL.to_string(),
    }
}

async fn list_clubs(repository: ClubRepository, Lang(lang): Lang) -> ApiResult<impl IntoResponse> {
    let clubs = repository.list_for_language(lang).await?;
    let clubs: Vec<_> = clubs.iter().map(|c| ClubView::new(c, lang)).collect();
    Ok(Json(clubs))
}

async fn club_detail(
    repository: ClubRepository,
    event_repository: EventRepository,
    Lang(lang): Lang,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    let Some(club) = repository.find_by_slug(&slug, lang).await? else {
        info!("No club with slug {slug}");
        return Ok(Redirect::to(CLUB_LIST_URL).into_response());
    };
    let membership = match &user {
        Some(user) => repository.membership(club.id, user.id).await?,
        None => Membership::default(),
    };
    let pending_members = if membership.is_admin {
        repository.pending_members(club.id).await?
    } else {
        Vec::new()
    };
    let page = ClubPage {
        club: ClubView::new(&club, lang),
        members: repository.members(club.id).await?,
        admins: repository.admins(club.id).await?,
        pending_members,
        membership,
        events: event_repository.list_for_club(club.id).await?,
    };
    Ok(Json(page).into_response())
}

async fn create_club(
    repository: ClubRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Garde(Json(payload)): Garde<Json<CreateClub>>,
) -> ApiResult<impl IntoResponse> {
    let (club, report) = repository.create(payload, user.id()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ClubSaved {
            club: ClubView::new(&club, lang),
            warnings: report.failed,
        }),
    ))
}

async fn edit_club(
    repository: ClubRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Path(slug): Path<String>,
    Garde(Json(payload)): Garde<Json<UpdateClub>>,
) -> ApiResult<impl IntoResponse> {
    let club = repository
        .find_by_slug(&slug, lang)
        .await?
        .ok_or_else(|| ApiError::ResourceNotFound(format!("Club {slug}")))?;
    require_admin(&repository, club.id, &user).await?;
    let (club, report) = repository.update(club.id, payload).await?;
    Ok(Json(ClubSaved {
        club: ClubView::new(&club, lang),
        warnings: report.failed,
    }))
}

async fn require_admin(repository: &ClubRepository, club_id: i64, user: &CurrentUser) -> ApiResult<()> {
    if repository.is_admin(club_id, user.id()).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "User {} is not admin of club {club_id}",
            user.id()
        )))
    }
}

async fn request_join(
    repository: ClubRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Path(club_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let club = repository.get(club_id).await?;
    match repository.request_join(club_id, user.id()).await? {
        JoinRequest::Requested => info!("User {} asked to join club {club_id}", user.id()),
        other => info!("Join request of user {} to club {club_id}: {other:?}", user.id()),
    }
    Ok(Redirect::to(&club_url(&club, lang)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAction {
    Approve,
    Reject,
    Remove,
    Promote,
    RemoveAdmin,
}

async fn manage_member(
    repository: ClubRepository,
    Lang(lang): Lang,
    user: CurrentUser,
    Path((club_id, action, member_id)): Path<(i64, MemberAction, i64)>,
) -> ApiResult<impl IntoResponse> {
    let club = repository.get(club_id).await?;
    require_admin(&repository, club_id, &user).await?;
    let res = match action {
        MemberAction::Approve => repository.approve_member(club_id, member_id).await,
        MemberAction::Reject => repository.reject_member(club_id, member_id).await,
        MemberAction::Remove => repository.remove_member(club_id, member_id).await,
        MemberAction::Promote => repository.promote(club_id, member_id).await,
        MemberAction::RemoveAdmin => repository.remove_admin(club_id, member_id).await,
    };
    match res {
        Ok(changed) => info!(
            "{action:?} of user {member_id} in club {club_id} by {}: changed {changed}",
            user.id()
        ),
        Err(DalError::LastAdmin(_)) => {
            warn!("Declined {action:?} of last admin {member_id} of club {club_id}")
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(&club_url(&club, lang)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(CLUB_LIST_URL, get(list_clubs))
        .route("/create-club/", post(create_club))
        .route("/club/{club}/", get(club_detail))
        .route("/club/{club}/edit/", post(edit_club))
        .route("/club/{club}/request_join/", post(request_join))
        .route("/club/{club}/{action}/{user_id}/", post(manage_member))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_action_from_path() {
        let action: MemberAction = serde_json::from_str("\"remove_admin\"").unwrap();
        assert_eq!(action, MemberAction::RemoveAdmin);
        let action: MemberAction = serde_json::from_str("\"approve\"").unwrap();
        assert_eq!(action, MemberAction::Approve);
        assert!(serde_json::from_str::<MemberAction>("\"delete\"").is_err());
    }
}
