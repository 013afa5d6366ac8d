//! Integration tests for pet endpoints

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_create_and_list_pets() {
    let app = TestApp::new();
    let user = app.create_test_user().await;

    let response = app
        .post("/api/v1/pets")
        .bearer(&user.access_token)
        .json(json!({ "name": "Biscuit", "breed": "Corgi", "age": 2, "weight": 11.2 }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.message(), "Pet created successfully");
    assert_eq!(response.body["data"]["pet"]["name"], "Biscuit");
    assert_eq!(response.body["data"]["pet"]["owner"], user.id.as_str());

    app.create_pet(&user, "Pepper").await;

    let list = app.get("/api/v1/pets").bearer(&user.access_token).send().await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["count"], 2);

    let mut names: Vec<&str> = list.body["data"]["pets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|pet| pet["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Biscuit", "Pepper"]);
}

#[tokio::test]
async fn test_pets_are_private_to_their_owner() {
    let app = TestApp::new();
    let owner = app.create_test_user().await;
    let other = app.create_test_user().await;
    let pet_id = app.create_pet(&owner, "Rex").await;

    let list = app.get("/api/v1/pets").bearer(&other.access_token).send().await;
    assert_eq!(list.body["count"], 0);

    let update = app
        .put(&format!("/api/v1/pets/{}", pet_id))
        .bearer(&other.access_token)
        .json(json!({ "name": "Stolen" }))
        .send()
        .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let delete = app
        .delete(&format!("/api/v1/pets/{}", pet_id))
        .bearer(&other.access_token)
        .send()
        .await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_pet() {
    let app = TestApp::new();
    let user = app.create_test_user().await;
    let pet_id = app.create_pet(&user, "Rex").await;

    let response = app
        .put(&format!("/api/v1/pets/{}", pet_id))
        .bearer(&user.access_token)
        .json(json!({ "age": 4 }))
        .send()
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Pet updated successfully");
    assert_eq!(response.body["data"]["pet"]["name"], "Rex");
    assert_eq!(response.body["data"]["pet"]["age"], 4.0);
}

#[tokio::test]
async fn test_client_cannot_choose_owner() {
    let app = TestApp::new();
    let user = app.create_test_user().await;
    let pet_id = app.create_pet(&user, "Rex").await;

    let create = app
        .post("/api/v1/pets")
        .bearer(&user.access_token)
        .json(json!({ "name": "Ghost", "owner": uuid::Uuid::new_v4() }))
        .send()
        .await;
    assert_eq!(create.status, StatusCode::UNPROCESSABLE_ENTITY);

    let update = app
        .put(&format!("/api/v1/pets/{}", pet_id))
        .bearer(&user.access_token)
        .json(json!({ "owner": uuid::Uuid::new_v4() }))
        .send()
        .await;
    assert_eq!(update.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_pet_validation() {
    let app = TestApp::new();
    let user = app.create_test_user().await;

    let response = app
        .post("/api/v1/pets")
        .bearer(&user.access_token)
        .json(json!({ "name": "Rex", "weight": 900 }))
        .send()
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"][0]["field"], "weight");
}

#[tokio::test]
async fn test_delete_pet() {
    let app = TestApp::new();
    let user = app.create_test_user().await;
    let pet_id = app.create_pet(&user, "Rex").await;

    let response = app
        .delete(&format!("/api/v1/pets/{}", pet_id))
        .bearer(&user.access_token)
        .send()
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Pet deleted successfully");
    assert_eq!(response.body["data"], json!({}));

    let again = app
        .delete(&format!("/api/v1/pets/{}", pet_id))
        .bearer(&user.access_token)
        .send()
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_pet_id() {
    let app = TestApp::new();
    let user = app.create_test_user().await;

    let response = app
        .delete("/api/v1/pets/not-a-uuid")
        .bearer(&user.access_token)
        .send()
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid pet ID format");
}
