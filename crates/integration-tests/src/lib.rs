//! Integration tests for Bazaar.
//!
//! Each test spawns the real router on an ephemeral port with in-memory
//! storage and sessions, then talks to it over HTTP with a cookie-keeping
//! client. No database or external service is needed.
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};

use bazaar_core::Email;
use bazaar_server::build_app;
use bazaar_server::config::ServerConfig;
use bazaar_server::db::{MemoryStore, Store};
use bazaar_server::middleware::create_session_layer;
use bazaar_server::services::AuthService;
use bazaar_server::state::AppState;

pub const ROOT_EMAIL: &str = "admin@example.com";
pub const ROOT_PASSWORD: &str = "Admin@1234";
pub const PASSWORD: &str = "Secret#123";

/// A running server.
pub struct TestApp {
    pub base_url: String,
}

impl TestApp {
    /// Start a server with a fresh store and the root admin in place.
    pub async fn spawn() -> Self {
        let config = ServerConfig::for_tests(Email::parse(ROOT_EMAIL).unwrap());
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let state = AppState::new(config.clone(), store);
        AuthService::new(state.store())
            .ensure_root_admin(state.root_admin(), Some(ROOT_PASSWORD))
            .await
            .unwrap()
            .unwrap();

        let app = build_app(
            state,
            create_session_layer(tower_sessions::MemoryStore::default(), &config),
        );
        let listener = tokio::net::TcpListener::bind(config.socket_addr())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
        }
    }

    /// A new client with its own cookie jar, signed out.
    pub fn client(&self) -> Session {
        Session {
            client: Client::builder().cookie_store(true).build().unwrap(),
            base_url: self.base_url.clone(),
        }
    }

    /// A client signed in as the root admin.
    pub async fn root_admin(&self) -> Session {
        let session = self.client();
        let response = session
            .post("/user/signin", json!({ "email": ROOT_EMAIL, "password": ROOT_PASSWORD }))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session
    }

    /// Sign up a customer and return its signed-in client and id.
    pub async fn customer(&self, email: &str) -> (Session, i64) {
        let session = self.client();
        let response = session
            .post(
                "/user/signup",
                json!({ "name": "Shopper", "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        let id = body["user"]["id"].as_i64().unwrap();
        (session, id)
    }

    /// Create an item as the root admin and return its id.
    pub async fn item(&self, title: &str, price: f64, count: u32) -> i64 {
        let admin = self.root_admin().await;
        let response = admin
            .post(
                "/admin/items",
                json!({
                    "title": title,
                    "image": format!("https://img.example.com/{title}.jpg"),
                    "price": price,
                    "description": format!("{title} description"),
                    "availableCount": count,
                    "genreOrCategory": "Books",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }
}

/// A client bound to one server, keeping its session cookie.
pub struct Session {
    pub client: Client,
    base_url: String,
}

impl Session {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post(&self, path: &str, body: Value) -> Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }

    pub async fn put(&self, path: &str, body: Value) -> Response {
        self.client.put(self.url(path)).json(&body).send().await.unwrap()
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client.delete(self.url(path)).send().await.unwrap()
    }

    pub async fn delete_json(&self, path: &str, body: Value) -> Response {
        self.client
            .delete(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Current stock of an item, read through the customer catalog.
    pub async fn stock(&self, item_id: i64) -> i64 {
        let body: Value = self
            .get(&format!("/customer/items/{item_id}"))
            .await
            .json()
            .await
            .unwrap();
        body["availableCount"].as_i64().unwrap()
    }
}

/// Read a response as `(status, json body)`.
pub async fn parts(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    (status, response.json().await.unwrap())
}
