//! Integration tests for the generative blend routes.
//!
//! A wiremock server stands in for the Gradio blend endpoint so these
//! tests exercise the full request path without a real model behind it.

mod common;

use common::TestServer;
use montage_render::ImageData;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_data_uri(width: u32, height: u32) -> String {
    ImageData::solid_color(width, height, 0, 128, 255, 255)
        .to_data_uri()
        .expect("png data uri")
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn blend_returns_service_image() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run/predict"))
        .and(body_string_contains("make it pop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": ["data:image/png;base64,QUJD"]
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = TestServer::start_with_blend(Some(&mock.uri())).await;
    let client = reqwest::Client::new();

    client
        .post(server.url("/api/sessions/default/layers/sticker"))
        .json(&json!({ "kind": "crown" }))
        .send()
        .await
        .expect("sticker request");

    let resp = client
        .post(server.url("/api/sessions/default/blend"))
        .json(&json!({ "instruction": "make it pop" }))
        .send()
        .await
        .expect("blend request");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["image"], "data:image/png;base64,QUJD");

    server.shutdown().await;
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn blend_without_instruction_uses_the_default() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run/predict"))
        .and(body_string_contains("single photograph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": ["data:image/png;base64,T0s="]
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = TestServer::start_with_blend(Some(&mock.uri())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/api/sessions/default/blend"))
        .json(&json!({}))
        .send()
        .await
        .expect("blend request");
    assert_eq!(resp.status(), 200);

    server.shutdown().await;
}

#[tokio::test]
async fn blend_without_endpoint_is_unavailable() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/api/sessions/default/blend"))
        .json(&json!({}))
        .send()
        .await
        .expect("blend request");
    assert_eq!(resp.status(), 503);

    // Background removal needs the same endpoint
    let ghost = uuid::Uuid::new_v4();
    let resp = client
        .post(server.url(&format!(
            "/api/sessions/default/layers/{ghost}/remove-background"
        )))
        .send()
        .await
        .expect("remove request");
    assert_eq!(resp.status(), 503);

    server.shutdown().await;
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn service_rejection_maps_to_bad_gateway() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "blocked by safety filter"
        })))
        .mount(&mock)
        .await;

    let server = TestServer::start_with_blend(Some(&mock.uri())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/api/sessions/default/blend"))
        .json(&json!({}))
        .send()
        .await
        .expect("blend request");
    assert_eq!(resp.status(), 502);

    let body: Value = resp.json().await.expect("json");
    assert!(body["error"]
        .as_str()
        .is_some_and(|e| e.contains("safety filter")));

    server.shutdown().await;
}

#[tokio::test]
async fn unreachable_service_maps_to_unavailable() {
    // Nothing listens on the discard port; retries burn out quickly
    let server = TestServer::start_with_blend(Some("http://127.0.0.1:9")).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/api/sessions/default/blend"))
        .json(&json!({}))
        .send()
        .await
        .expect("blend request");
    assert_eq!(resp.status(), 503);

    server.shutdown().await;
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn remove_background_swaps_the_layer_source() {
    let cutout_uri = ImageData::solid_color(2, 2, 255, 0, 255, 255)
        .to_data_uri()
        .expect("cutout uri");

    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [cutout_uri.clone()]
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = TestServer::start_with_blend(Some(&mock.uri())).await;
    let client = reqwest::Client::new();

    let layer: Value = client
        .post(server.url("/api/sessions/default/layers/image"))
        .json(&json!({ "data": png_data_uri(300, 200) }))
        .send()
        .await
        .expect("upload request")
        .json()
        .await
        .expect("upload json");
    let id = layer["id"].as_str().expect("id").to_string();

    let resp = client
        .post(server.url(&format!(
            "/api/sessions/default/layers/{id}/remove-background"
        )))
        .send()
        .await
        .expect("remove request");
    assert_eq!(resp.status(), 200);

    let updated: Value = resp.json().await.expect("json");
    // The source is swapped for the cutout; transform and base size stay
    assert_eq!(updated["kind"]["data"]["src"], cutout_uri);
    assert_eq!(updated["id"], layer["id"]);
    assert_eq!(updated["width"], 150.0);
    assert_eq!(updated["height"], 100.0);
    assert_eq!(updated["position"]["x"], 50.0);
    assert_eq!(updated["position"]["y"], 50.0);

    server.shutdown().await;
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn remove_background_rejects_non_image_layers() {
    let mock = MockServer::start().await;

    let server = TestServer::start_with_blend(Some(&mock.uri())).await;
    let client = reqwest::Client::new();

    let layer: Value = client
        .post(server.url("/api/sessions/default/layers/text"))
        .send()
        .await
        .expect("text request")
        .json()
        .await
        .expect("text json");
    let id = layer["id"].as_str().expect("id").to_string();

    let resp = client
        .post(server.url(&format!(
            "/api/sessions/default/layers/{id}/remove-background"
        )))
        .send()
        .await
        .expect("remove request");
    assert_eq!(resp.status(), 400);

    server.shutdown().await;
}
