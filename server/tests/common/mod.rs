#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use events_server::config::Config;
use events_server::repositories::{InMemoryAccountRepository, InMemoryEventRepository};
use events_server::routes::create_routes;
use events_server::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub config: Config,
}

impl TestApp {
    pub async fn new() -> Self {
        // lowest bcrypt cost keeps the suite fast
        let config =
            Config::from_lookup(|name| (name == "BCRYPT_COST").then(|| "4".to_string())).unwrap();
        let state = AppState::new(
            &config,
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(InMemoryAccountRepository::new()),
        )
        .unwrap();
        state.seed_accounts(&config.app).await.unwrap();

        Self {
            router: create_routes(state, &config),
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub fn client_basic(&self) -> String {
        basic(&self.config.app.client_id, &self.config.app.client_secret)
    }

    pub async fn token_for(&self, username: &str, password: &str) -> Response {
        let form = format!(
            "grant_type=password&username={}&password={}",
            username, password
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/oauth/token")
            .header(header::AUTHORIZATION, self.client_basic())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        self.send(request).await
    }

    async fn access_token(&self, username: &str, password: &str) -> String {
        let response = self.token_for(username, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn user_token(&self) -> String {
        let app = self.config.app.clone();
        self.access_token(&app.user_username, &app.user_password).await
    }

    pub async fn admin_token(&self) -> String {
        let app = self.config.app.clone();
        self.access_token(&app.admin_username, &app.admin_password).await
    }

    pub async fn create_event(&self, token: &str, body: &Value) -> Response {
        self.send(json_request(Method::POST, "/api/events", Some(token), body))
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub fn basic(id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", id, secret)))
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn event_json(name: &str) -> Value {
    json!({
        "name": name,
        "description": "REST API Development with Spring",
        "beginEnrollmentDateTime": "2019-05-06T17:00:00",
        "closeEnrollmentDateTime": "2019-05-09T17:00:00",
        "beginEventDateTime": "2019-05-10T17:00:00",
        "endEventDateTime": "2019-05-13T17:00:00",
        "basePrice": 100,
        "maxPrice": 200,
        "limitOfEnrollment": 100,
        "location": "D2 Startup Factory"
    })
}
