use scubaclub_e2e_tests::{client, prepare_env, spawn_server};
use serde_json::Value;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_health() {
    let (args, _config_guard) = prepare_env("server-health").unwrap();
    let server = spawn_server(args).await.unwrap();
    let client = client();

    let response = client.get(server.url("health")).send().await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");

    let response = client
        .get(server.url("/"))
        .header("Accept-Language", "en-GB,en;q=0.9")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let home: Value = response.json().await.unwrap();
    assert_eq!(home["language"], "en");
    assert!(home["user"].is_null());

    let response = client.get(server.url("/privacy/")).send().await.unwrap();
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["language"], "nl");
}
