mod common;

use scubaclub_dal::{
    Error,
    event::{CreateEvent, EventRepositoryImpl},
    location::{CreateLocation, LocationDetails, LocationRepositoryImpl, LocationTranslationInput},
};
use scubaclub_types::language::LanguageCode;
use time::macros::datetime;

async fn prepare_location(conn: &sqlx::Pool<sqlx::Sqlite>) -> i64 {
    let repo = LocationRepositoryImpl::new(conn.clone());
    let (location, _) = repo
        .create(
            CreateLocation {
                language: LanguageCode::Nl,
                details: LocationDetails::default(),
                translations: vec![LocationTranslationInput {
                    language: LanguageCode::Nl,
                    name: "Zeeland Brouwersdam".to_string(),
                    description: String::new(),
                    facilities: String::new(),
                    parking: String::new(),
                    directions: String::new(),
                }],
            },
            1,
        )
        .await
        .unwrap();
    location.id
}

fn event(location_id: i64, title: &str, max_participants: i64) -> CreateEvent {
    CreateEvent {
        title: title.to_string(),
        description: String::new(),
        location_id,
        date: datetime!(2030-06-01 10:00),
        max_participants,
        language: Some(LanguageCode::Nl),
        club_id: None,
    }
}

#[tokio::test]
async fn test_join_respects_capacity() {
    let conn = common::init_db().await;
    let location_id = prepare_location(&conn).await;
    let repo = EventRepositoryImpl::new(conn);

    let created = repo
        .create(event(location_id, "Ochtendduik", 2), 1)
        .await
        .unwrap();
    assert_eq!(created.participants_count, 0);
    assert_eq!(created.free_slots(), 2);

    assert!(repo.join(created.id, 1).await.unwrap());
    assert!(!repo.join(created.id, 1).await.unwrap());
    assert!(repo.join(created.id, 2).await.unwrap());
    assert!(matches!(
        repo.join(created.id, 3).await,
        Err(Error::EventFull(_))
    ));

    let full = repo.get(created.id).await.unwrap();
    assert!(full.is_full());
    assert_eq!(repo.participants(created.id).await.unwrap().len(), 2);

    assert!(repo.leave(created.id, 2).await.unwrap());
    assert!(!repo.is_participant(created.id, 2).await.unwrap());
    assert!(repo.join(created.id, 3).await.unwrap());
}

#[tokio::test]
async fn test_cancelled_event_cannot_be_joined() {
    let conn = common::init_db().await;
    let location_id = prepare_location(&conn).await;
    let repo = EventRepositoryImpl::new(conn);

    let created = repo
        .create(event(location_id, "Nachtduik", 10), 1)
        .await
        .unwrap();
    repo.cancel(created.id).await.unwrap();
    assert!(repo.get(created.id).await.unwrap().is_cancelled);
    assert!(matches!(
        repo.join(created.id, 2).await,
        Err(Error::EventCancelled(_))
    ));
}

#[tokio::test]
async fn test_upcoming_events() {
    let conn = common::init_db().await;
    let location_id = prepare_location(&conn).await;
    let repo = EventRepositoryImpl::new(conn);

    let mut past = event(location_id, "Vorig jaar", 10);
    past.date = datetime!(2020-01-01 10:00);
    repo.create(past, 1).await.unwrap();
    let later = repo
        .create(event(location_id, "Later", 10), 1)
        .await
        .unwrap();
    let mut sooner = event(location_id, "Eerder", 10);
    sooner.date = datetime!(2029-01-01 10:00);
    let sooner = repo.create(sooner, 1).await.unwrap();
    let mut english = event(location_id, "English dive", 10);
    english.language = Some(LanguageCode::En);
    repo.create(english, 1).await.unwrap();

    let upcoming = repo
        .list_upcoming(LanguageCode::Nl, datetime!(2025-01-01 0:00))
        .await
        .unwrap();
    let ids: Vec<_> = upcoming.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);
}

#[tokio::test]
async fn test_update_event() {
    let conn = common::init_db().await;
    let location_id = prepare_location(&conn).await;
    let repo = EventRepositoryImpl::new(conn);

    let created = repo
        .create(event(location_id, "Ochtendduik", 10), 1)
        .await
        .unwrap();
    let updated = repo
        .update(created.id, event(location_id, "Middagduik", 12))
        .await
        .unwrap();
    assert_eq!(updated.title, "Middagduik");
    assert_eq!(updated.max_participants, 12);
    assert_eq!(updated.organizer_id, 1);

    assert!(matches!(
        repo.update(999, event(location_id, "Nergens", 1)).await,
        Err(Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_capacity_not_below_participants() {
    let conn = common::init_db().await;
    let location_id = prepare_location(&conn).await;
    let repo = EventRepositoryImpl::new(conn);

    let created = repo
        .create(event(location_id, "Wrakduik", 5), 1)
        .await
        .unwrap();
    repo.join(created.id, 1).await.unwrap();
    repo.join(created.id, 2).await.unwrap();
    repo.join(created.id, 3).await.unwrap();

    assert!(matches!(
        repo.update(created.id, event(location_id, "Wrakduik", 2)).await,
        Err(Error::InvalidValue(_))
    ));
    let unchanged = repo.get(created.id).await.unwrap();
    assert_eq!(unchanged.max_participants, 5);

    let updated = repo
        .update(created.id, event(location_id, "Wrakduik", 3))
        .await
        .unwrap();
    assert!(updated.is_full());
}
