//! Integration test helpers
//!
//! Each test gets its own server on an ephemeral port and talks to it through
//! the real client.

#![allow(dead_code)]

use dihadi_client::session::{MemoryTokenStore, SystemClock};
use dihadi_client::{ApiClient, AuthContext, SessionManager};
use dihadi_core::{RegisterRequest, Role, SessionWindows, UserLocation};
use dihadi_web::server::DihadiServerBuilder;
use std::sync::{Arc, LazyLock};
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@dihadi.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

// Ensure tracing is only initialized once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub struct TestApp {
    pub address: String,
}

impl TestApp {
    /// A fresh client with its own in-memory session
    pub fn client(&self) -> ApiClient {
        let manager = SessionManager::new(
            SessionWindows::default(),
            Arc::new(SystemClock),
            Box::new(MemoryTokenStore::new()),
        );
        let auth = Arc::new(AuthContext::new(manager));
        ApiClient::new(&self.address, auth).expect("Failed to build client")
    }
}

/// Spawn a server with in-memory stores
pub async fn spawn_app() -> TestApp {
    spawn_app_with(None).await
}

/// Spawn a server, optionally backed by SQLite at `database_url`
pub async fn spawn_app_with(database_url: Option<String>) -> TestApp {
    LazyLock::force(&TRACING);

    let mut builder = DihadiServerBuilder::new()
        .port(0)
        .jwt_secret("integration-test-secret")
        .admin(ADMIN_EMAIL, ADMIN_PASSWORD);
    if let Some(url) = database_url {
        builder = builder.database_url(url);
    }
    let server = builder.build().await.expect("Failed to build server");

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(server.run(listener, std::future::pending()));

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
    }
}

pub fn registration(name: &str, email: &str, role: Role) -> RegisterRequest {
    RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
        role,
        phone: Some("9812345678".to_string()),
        location: Some(UserLocation {
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "411001".to_string(),
        }),
        skills: if role == Role::Worker {
            vec!["masonry".to_string()]
        } else {
            Vec::new()
        },
        remember_me: false,
    }
}
