mod common;

use scubaclub_dal::{
    Error,
    location::{
        CreateLocation, LocationDetails, LocationRepositoryImpl, LocationTranslationInput,
    },
    suggestion::{CreateSuggestion, SuggestionRepositoryImpl, SuggestionStatus},
};
use scubaclub_types::language::LanguageCode;

fn translation(language: LanguageCode, name: &str) -> LocationTranslationInput {
    LocationTranslationInput {
        language,
        name: name.to_string(),
        description: "Zoetwater plas".to_string(),
        facilities: "Toiletten".to_string(),
        parking: "Gratis".to_string(),
        directions: String::new(),
    }
}

fn location_payload(name: &str) -> CreateLocation {
    CreateLocation {
        language: LanguageCode::Nl,
        details: LocationDetails {
            latitude: Some(52.27),
            longitude: Some(4.93),
            country_id: Some(1),
        },
        translations: vec![translation(LanguageCode::Nl, name)],
    }
}

#[tokio::test]
async fn test_create_and_find_location() {
    let conn = common::init_db().await;
    let repo = LocationRepositoryImpl::new(conn);

    let (location, report) = repo.create(location_payload("Vinkeveen"), 1).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(location.slug(LanguageCode::Nl), Some("vinkeveen"));
    assert_eq!(location.name(LanguageCode::En), "Vinkeveen");
    assert_eq!(
        location.text(LanguageCode::En, |t| t.facilities.as_str()),
        "Toiletten"
    );

    let (other, _) = repo.create(location_payload("Vinkeveen"), 2).await.unwrap();
    assert_eq!(other.slug(LanguageCode::Nl), Some("vinkeveen-1"));

    let found = repo
        .find_by_slug("vinkeveen-1", LanguageCode::En)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, other.id);

    assert_eq!(repo.list_for_language(LanguageCode::Nl).await.unwrap().len(), 2);
    assert!(repo.list_for_language(LanguageCode::En).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_placeholder_name() {
    let conn = common::init_db().await;
    let repo = LocationRepositoryImpl::new(conn);
    let payload = CreateLocation {
        language: LanguageCode::En,
        details: LocationDetails::default(),
        translations: vec![translation(LanguageCode::En, "Blue Hole")],
    };
    let (location, _) = repo.create(payload, 1).await.unwrap();
    assert_eq!(location.name(LanguageCode::En), "Blue Hole");
    assert_eq!(
        location.name(LanguageCode::Nl),
        format!("Location {}", location.id)
    );
}

#[tokio::test]
async fn test_approve_blank_suggestion_keeps_values() {
    let conn = common::init_db().await;
    let locations = LocationRepositoryImpl::new(conn.clone());
    let suggestions = SuggestionRepositoryImpl::new(conn);
    let (location, _) = locations
        .create(location_payload("Vinkeveen"), 1)
        .await
        .unwrap();

    let suggestion = suggestions
        .create(
            location.id,
            CreateSuggestion {
                language: Some(LanguageCode::Nl),
                suggested_parking: "Betaald parkeren".to_string(),
                ..Default::default()
            },
            2,
        )
        .await
        .unwrap();
    assert_eq!(suggestion.status, SuggestionStatus::Pending);
    assert_eq!(suggestions.list_pending().await.unwrap().len(), 1);

    let location_id = suggestions.approve(suggestion.id).await.unwrap();
    assert_eq!(location_id, location.id);

    let updated = locations.get(location.id).await.unwrap();
    let nl = updated.translations.get(LanguageCode::Nl).unwrap();
    assert_eq!(nl.name, "Vinkeveen");
    assert_eq!(nl.slug, "vinkeveen");
    assert_eq!(nl.facilities, "Toiletten");
    assert_eq!(nl.parking, "Betaald parkeren");
    assert_eq!(updated.latitude, Some(52.27));

    assert!(matches!(
        suggestions.get(suggestion.id).await,
        Err(Error::RecordNotFound(_))
    ));
    assert!(suggestions.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_approve_suggestion_overwrites_name_and_slug() {
    let conn = common::init_db().await;
    let locations = LocationRepositoryImpl::new(conn.clone());
    let suggestions = SuggestionRepositoryImpl::new(conn);
    let (location, _) = locations
        .create(location_payload("Vinkeveen"), 1)
        .await
        .unwrap();
    locations
        .create(location_payload("Vinkeveense Plassen"), 1)
        .await
        .unwrap();

    let suggestion = suggestions
        .create(
            location.id,
            CreateSuggestion {
                language: Some(LanguageCode::Nl),
                suggested_name: "Vinkeveense Plassen".to_string(),
                suggested_latitude: Some(52.25),
                suggested_country_id: Some(2),
                ..Default::default()
            },
            2,
        )
        .await
        .unwrap();
    suggestions.approve(suggestion.id).await.unwrap();

    let updated = locations.get(location.id).await.unwrap();
    let nl = updated.translations.get(LanguageCode::Nl).unwrap();
    assert_eq!(nl.name, "Vinkeveense Plassen");
    assert_eq!(nl.slug, "vinkeveense-plassen-1");
    assert_eq!(nl.description, "Zoetwater plas");
    assert_eq!(updated.latitude, Some(52.25));
    assert_eq!(updated.longitude, Some(4.93));
    assert_eq!(updated.country_id, Some(2));
}

#[tokio::test]
async fn test_suggestion_in_new_language_creates_translation() {
    let conn = common::init_db().await;
    let locations = LocationRepositoryImpl::new(conn.clone());
    let suggestions = SuggestionRepositoryImpl::new(conn);
    let (location, _) = locations
        .create(location_payload("Vinkeveen"), 1)
        .await
        .unwrap();

    let suggestion = suggestions
        .create(
            location.id,
            CreateSuggestion {
                language: Some(LanguageCode::En),
                suggested_directions: "Take the A2 exit 4".to_string(),
                ..Default::default()
            },
            2,
        )
        .await
        .unwrap();
    suggestions.approve(suggestion.id).await.unwrap();

    let updated = locations.get(location.id).await.unwrap();
    let en = updated.translations.get(LanguageCode::En).unwrap();
    let placeholder = format!("Location {}", location.id);
    assert_eq!(en.name, placeholder);
    assert_eq!(en.slug, format!("location-{}", location.id));
    assert_eq!(en.directions, "Take the A2 exit 4");
    assert_eq!(updated.name(LanguageCode::Nl), "Vinkeveen");
}

#[tokio::test]
async fn test_rejected_suggestion_never_changes_location() {
    let conn = common::init_db().await;
    let locations = LocationRepositoryImpl::new(conn.clone());
    let suggestions = SuggestionRepositoryImpl::new(conn.clone());
    let (location, _) = locations
        .create(location_payload("Vinkeveen"), 1)
        .await
        .unwrap();

    let suggestion = suggestions
        .create(
            location.id,
            CreateSuggestion {
                language: Some(LanguageCode::Nl),
                suggested_name: "Gaasperplas".to_string(),
                suggested_longitude: Some(5.0),
                ..Default::default()
            },
            2,
        )
        .await
        .unwrap();
    let rejected = suggestions.reject(suggestion.id).await.unwrap();
    assert_eq!(rejected.status, SuggestionStatus::Rejected);

    // applying rejected suggestion is no-op
    let mut conn = conn.acquire().await.unwrap();
    let applied = scubaclub_dal::suggestion::apply_changes(&mut conn, &rejected)
        .await
        .unwrap();
    assert!(!applied);
    drop(conn);

    let unchanged = locations.get(location.id).await.unwrap();
    assert_eq!(unchanged.name(LanguageCode::Nl), "Vinkeveen");
    assert_eq!(unchanged.longitude, Some(4.93));

    assert!(matches!(
        suggestions.approve(suggestion.id).await,
        Err(Error::InvalidStatusTransition { .. })
    ));
    let unchanged = locations.get(location.id).await.unwrap();
    assert_eq!(unchanged.name(LanguageCode::Nl), "Vinkeveen");
}

#[tokio::test]
async fn test_failed_language_keeps_other_location_translations() {
    let conn = common::init_db().await;
    sqlx::query("DELETE FROM language WHERE code = 'en'")
        .execute(&conn)
        .await
        .unwrap();
    let repo = LocationRepositoryImpl::new(conn);

    let mut payload = location_payload("Vinkeveen");
    payload
        .translations
        .insert(0, translation(LanguageCode::En, "Vinkeveen Lakes"));
    let (location, report) = repo.create(payload, 1).await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].language, LanguageCode::En);
    assert_eq!(location.slug(LanguageCode::Nl), Some("vinkeveen"));
    assert!(location.translations.get(LanguageCode::En).is_none());
}
