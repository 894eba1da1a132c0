// tests/api_test.rs
mod common;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use common::{Fakes, Outcome};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zimage_api::config::AppConfig;
use zimage_api::{build_cors, configure_routes};

const NO_UPSCALER: &str = "http://127.0.0.1:9";

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn health_check_is_always_ok() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    for uri in ["/api/", "/api"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Z-Image API is running");
    }
}

#[actix_web::test]
async fn malformed_json_is_rejected() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    for uri in ["/api/generate", "/api/generate-hf", "/api/upscale"] {
        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(("X-API-Key", "key"))
            .set_payload("{\"prompt\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Invalid JSON body"}));
    }
}

#[actix_web::test]
async fn missing_auth_header_is_unauthorized() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let cases = [
        ("gitee", "X-API-Key is required for Gitee AI"),
        ("modelscope", "X-MS-Token is required for ModelScope"),
    ];
    for (provider, message) in cases {
        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({"provider": provider, "prompt": "a cat", "width": 1024, "height": 1024}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], message);
    }
    assert_eq!(fakes.gitee.calls(), 0);
    assert_eq!(fakes.modelscope.calls(), 0);
}

#[actix_web::test]
async fn huggingface_does_not_require_a_token() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({"provider": "huggingface", "prompt": "a cat", "model": "ovis-image"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(fakes.huggingface.last_request().auth_token, None);
}

#[actix_web::test]
async fn unknown_provider_is_bad_request() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({"provider": "bogus", "prompt": "a cat"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid provider: bogus");
}

#[actix_web::test]
async fn invalid_fields_never_reach_the_provider() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let bodies = [
        json!({"prompt": "   "}),
        json!({"prompt": "x".repeat(10_001)}),
        json!({"prompt": "a cat", "width": 1020}),
        json!({"prompt": "a cat", "height": 4096}),
        json!({"prompt": "a cat", "width": 1024.5}),
        json!({"prompt": "a cat", "steps": 0}),
        json!({"prompt": "a cat", "num_inference_steps": 80}),
    ];
    for body in bodies {
        let req = test::TestRequest::post()
            .uri("/api/generate")
            .insert_header(("X-API-Key", "key"))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        let error: Value = test::read_body_json(resp).await;
        assert!(!error["error"].as_str().unwrap().is_empty());
    }
    assert_eq!(fakes.gitee.calls(), 0);
}

#[actix_web::test]
async fn generate_defaults_to_gitee_and_fills_defaults() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .insert_header(("X-API-Key", " key "))
        .set_json(json!({"prompt": "a cat", "negative_prompt": "blurry", "seed": 7}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"url": "https://gitee.com/out.png", "seed": 42}));

    let sent = fakes.gitee.last_request();
    assert_eq!(sent.prompt, "a cat");
    assert_eq!((sent.width, sent.height), (1024, 1024));
    assert_eq!(sent.steps, Some(9));
    assert_eq!(sent.seed, Some(7));
    assert_eq!(sent.negative_prompt.as_deref(), Some("blurry"));
    assert_eq!(sent.auth_token.as_deref(), Some("key"));
}

#[actix_web::test]
async fn empty_provider_result_is_a_server_error() {
    let fakes = Fakes::with_outcomes(
        Outcome::Empty,
        Outcome::Empty,
        Outcome::Image("https://modelscope.cn/out.png"),
    );
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .insert_header(("X-API-Key", "key"))
        .set_json(json!({"provider": "gitee", "prompt": "a cat"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "No image returned from Gitee AI"}));
}

#[actix_web::test]
async fn provider_failure_is_reported_with_its_message() {
    let fakes = Fakes::with_outcomes(
        Outcome::Image("https://gitee.com/out.png"),
        Outcome::Image("https://space.hf.space/out.png"),
        Outcome::Fail("ModelScope error (429): rate limited"),
    );
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .insert_header(("X-MS-Token", "ms"))
        .set_json(json!({"provider": "modelscope", "prompt": "a cat", "width": 768, "height": 1024}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ModelScope error (429): rate limited");
}

#[actix_web::test]
async fn legacy_endpoint_targets_huggingface() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/api/generate-hf")
        .insert_header(("X-HF-Token", "hf_token"))
        .set_json(json!({"prompt": "a cat", "width": 576, "height": 1024}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let sent = fakes.huggingface.last_request();
    assert_eq!(sent.model.as_deref(), Some("z-image"));
    assert_eq!((sent.width, sent.height), (576, 1024));
    assert_eq!(sent.auth_token.as_deref(), Some("hf_token"));
    assert_eq!(fakes.gitee.calls(), 0);

    let req = test::TestRequest::post()
        .uri("/api/generate-hf")
        .set_json(json!({"prompt": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn upscale_rejects_disallowed_urls_without_calling_out() {
    let upscaler = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"event_id": "e1"})))
        .expect(0)
        .mount(&upscaler)
        .await;

    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(&upscaler.uri()));

    for url in [
        "http://169.254.169.254/latest/meta-data",
        "https://internal.example.com/a.png",
        "http://space.hf.space/a.png",
    ] {
        let req = test::TestRequest::post()
            .uri("/api/upscale")
            .set_json(json!({"url": url, "scale": 2}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "URL not allowed"}));
    }

    let req = test::TestRequest::post()
        .uri("/api/upscale")
        .set_json(json!({"scale": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "url is required"}));

    let req = test::TestRequest::post()
        .uri("/api/upscale")
        .set_json(json!({"url": "https://space.hf.space/a.png", "scale": 8}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    upscaler.verify().await;
}

#[actix_web::test]
async fn upscale_runs_the_queue_protocol() {
    let upscaler = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gradio_api/call/realesrgan"))
        .and(body_partial_json(json!({
            "data": [
                {"path": "https://space.hf.space/a.png", "meta": {"_type": "gradio.FileData"}},
                "RealESRGAN_x4plus",
                0.5,
                false,
                4.0
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"event_id": "e1"})))
        .expect(1)
        .mount(&upscaler)
        .await;
    Mock::given(method("GET"))
        .and(path("/gradio_api/call/realesrgan/e1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(
                    "event: generating\ndata: null\n\nevent: complete\ndata: [{\"url\": \"https://space.hf.space/file=up.png\"}]\n\n",
                ),
        )
        .expect(1)
        .mount(&upscaler)
        .await;

    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(&upscaler.uri()));

    let req = test::TestRequest::post()
        .uri("/api/upscale")
        .set_json(json!({"url": "https://space.hf.space/a.png"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"url": "https://space.hf.space/file=up.png"}));
}

#[actix_web::test]
async fn upscale_reports_quota_exhaustion() {
    let upscaler = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"event_id": "e2"})))
        .expect(1)
        .mount(&upscaler)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("event: error\ndata: null\n\n"))
        .expect(1)
        .mount(&upscaler)
        .await;

    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(&upscaler.uri()));

    let req = test::TestRequest::post()
        .uri("/api/upscale")
        .set_json(json!({"url": "https://space.hf.space/a.png", "scale": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Quota exhausted, please set HF Token");
}

#[actix_web::test]
async fn upscale_without_image_url_is_a_server_error() {
    let upscaler = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"event_id": "e3"})))
        .mount(&upscaler)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("event: complete\ndata: [null]\n"))
        .mount(&upscaler)
        .await;

    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(&upscaler.uri()));

    let req = test::TestRequest::post()
        .uri("/api/upscale")
        .set_json(json!({"url": "https://space.hf.space/a.png"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "No image returned"}));
}

#[actix_web::test]
async fn upscale_timeout_is_a_server_error() {
    let upscaler = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"event_id": "slow"}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&upscaler)
        .await;

    let fakes = Fakes::succeeding();
    let gradio = common::gradio_client_with_timeout(Duration::from_millis(50));
    let app = test_app!(fakes.state_with(&upscaler.uri(), gradio));

    let req = test::TestRequest::post()
        .uri("/api/upscale")
        .set_json(json!({"url": "https://space.hf.space/a.png"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Upstream request timed out"), "{message}");
    upscaler.verify().await;
}

#[actix_web::test]
async fn wrong_field_types_are_reported_as_validation_errors() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    for payload in [
        json!({"prompt": "a cat", "seed": -1}),
        json!({"prompt": "a cat", "width": "1024"}),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/generate")
            .insert_header(("X-API-Key", "key"))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{payload}");
        let body: Value = test::read_body_json(resp).await;
        let message = body["error"].as_str().unwrap();
        assert_ne!(message, "Invalid JSON body");
        assert!(message.starts_with("invalid"), "{message}");
    }
    assert_eq!(fakes.gitee.calls(), 0);
}

#[actix_web::test]
async fn openai_route_honours_response_format() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/v1/images/generations")
        .set_json(json!({"prompt": "a cat", "response_format": "url"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0], json!({"url": "https://space.hf.space/out.png"}));

    let req = test::TestRequest::post()
        .uri("/v1/images/generations")
        .set_json(json!({"prompt": "a cat", "response_format": "b64_json"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "response_format b64_json is not available from HuggingFace"
    );

    let req = test::TestRequest::post()
        .uri("/v1/images/generations")
        .set_json(json!({"prompt": "a cat", "response_format": "png"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fakes.huggingface.calls(), 2);
}

#[actix_web::test]
async fn catalog_routes_list_models_and_providers() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/providers").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 3);
    assert_eq!(providers[0]["authHeader"], "X-API-Key");
    assert_eq!(providers[0]["requiresAuth"], true);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/models").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert!(
        body["models"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m["id"] == "qwen-image-fast" && m["provider"] == "huggingface")
    );
}

#[actix_web::test]
async fn openai_route_resolves_prefixed_models() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/v1/images/generations")
        .insert_header(("Authorization", "Bearer gitee-key"))
        .set_json(json!({"model": "gitee/qwen-image", "prompt": "a cat", "size": "1152x896"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["url"], "https://gitee.com/out.png");
    assert!(body["created"].as_i64().unwrap() > 0);

    let sent = fakes.gitee.last_request();
    assert_eq!(sent.model.as_deref(), Some("Qwen-Image"));
    assert_eq!((sent.width, sent.height), (1152, 896));
    assert_eq!(sent.auth_token.as_deref(), Some("gitee-key"));

    let req = test::TestRequest::post()
        .uri("/v1/images/generations")
        .set_json(json!({"model": "unknown-model", "prompt": "a cat"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(fakes.huggingface.last_request().model.as_deref(), Some("z-image-turbo"));
}

#[actix_web::test]
async fn openai_route_uses_openai_error_shape() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let req = test::TestRequest::post()
        .uri("/v1/images/generations")
        .set_json(json!({"model": "ms/flux-2", "prompt": "a cat"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "authentication_error");
    assert_eq!(body["error"]["message"], "Authorization is required for ModelScope");

    let req = test::TestRequest::post()
        .uri("/v1/images/generations")
        .set_json(json!({"prompt": "a cat", "size": "big"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[actix_web::test]
async fn openai_model_list() {
    let fakes = Fakes::succeeding();
    let app = test_app!(fakes.state(NO_UPSCALER));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/v1/models").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["object"], "list");
    let data = body["data"].as_array().unwrap();
    assert!(data.iter().any(|m| m["id"] == "gitee/qwen-image" && m["owned_by"] == "gitee"));
    assert!(data.iter().all(|m| m["object"] == "model"));
}

#[actix_web::test]
async fn cors_preflight_allows_configured_origins() {
    let config = AppConfig {
        cors_origins: vec!["https://app.example".to_string()],
        ..AppConfig::default()
    };
    let fakes = Fakes::succeeding();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(fakes.state(NO_UPSCALER)))
            .wrap(build_cors(&config))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/generate")
        .insert_header(("Origin", "https://app.example"))
        .insert_header(("Access-Control-Request-Method", "POST"))
        .insert_header(("Access-Control-Request-Headers", "x-api-key, content-type"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("https://app.example")
    );
}
