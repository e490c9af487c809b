use reqwest::StatusCode;
use scubaclub_e2e_tests::{create_location, location, prepare_env, spawn_server, user_client};
use serde_json::{Value, json};
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_suggestion_review() {
    let (args, _config_guard) = prepare_env("server-suggestions").unwrap();
    let server = spawn_server(args).await.unwrap();
    let (karel, _) = user_client(&server, "karel", false).await.unwrap();
    let (root, _) = user_client(&server, "root", true).await.unwrap();

    let created = create_location(&karel, &server, "Vinkeveen").await.unwrap();
    assert_eq!(created["location"]["slug"], "vinkeveen");

    let suggest = |name: &'static str| {
        let karel = karel.clone();
        let url = server.url("location/vinkeveen/suggest_edit/");
        async move {
            let response = karel
                .post(url)
                .json(&json!({"language": "nl", "suggested_name": name, "suggested_parking": ""}))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            let suggestion: Value = response.json().await.unwrap();
            suggestion["id"].as_i64().unwrap()
        }
    };

    let rejected = suggest("Vinkeveense Plassen").await;

    let response = karel
        .get(server.url("review_location_suggestions/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = karel
        .post(server.url(&format!("approve_suggestion/{rejected}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let pending: Vec<Value> = root
        .get(server.url("review_location_suggestions/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);

    let response = root
        .post(server.url(&format!("reject_suggestion/{rejected}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).unwrap(), "/review_location_suggestions/");

    let page: Value = root
        .get(server.url("location/vinkeveen/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["name"], "Vinkeveen");

    let response = root
        .post(server.url(&format!("approve_suggestion/{rejected}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let approved = suggest("Vinkeveense Plassen").await;
    let response = root
        .post(server.url(&format!("approve_suggestion/{approved}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).unwrap(),
        "/location/vinkeveense-plassen/"
    );

    let page: Value = root
        .get(server.url("location/vinkeveense-plassen/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["name"], "Vinkeveense Plassen");
    // blank suggested fields keep old values
    assert_eq!(page["parking"], "Gratis");
    assert_eq!(page["description"], "Zoetwater");

    let response = root
        .get(server.url("location/vinkeveen/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).unwrap(), "/dive_locations/");

    let pending: Vec<Value> = root
        .get(server.url("review_location_suggestions/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_suggestion_targets_request_language() {
    let (args, _config_guard) = prepare_env("server-suggestions-lang").unwrap();
    let server = spawn_server(args).await.unwrap();
    let (karel, _) = user_client(&server, "karel", false).await.unwrap();
    let (root, _) = user_client(&server, "root", true).await.unwrap();

    create_location(&karel, &server, "Blauwe Gat").await.unwrap();

    let response = karel
        .post(server.url("location/blauwe-gat/suggest_edit/?lang=en"))
        .json(&json!({"suggested_name": "Blue Hole"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let suggestion: Value = response.json().await.unwrap();
    assert_eq!(suggestion["language"], "en");
    let id = suggestion["id"].as_i64().unwrap();

    let response = root
        .post(server.url(&format!("approve_suggestion/{id}/?lang=en")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).unwrap(), "/location/blue-hole/");

    let english: Value = root
        .get(server.url("location/blue-hole/?lang=en"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(english["name"], "Blue Hole");

    // Dutch translation untouched
    let dutch: Value = root
        .get(server.url("location/blauwe-gat/?lang=nl"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dutch["name"], "Blauwe Gat");
    assert_eq!(dutch["slug"], "blauwe-gat");
    assert_eq!(dutch["parking"], "Gratis");
}
