#![allow(dead_code, clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, unreachable_pub)]

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode};
use pagedash_server::api::{self, MgmtState, ServiceContainer};
use pagedash_server::config::{
    CleanupConfig, Config, LogFormat, RateLimitConfig, ServerConfig, SessionConfig, SocialConfig,
    StoreConfig, TelemetryConfig,
};
use pagedash_server::domain::connection::{NewConnection, SocialConnection};
use pagedash_server::domain::session::Session;
use pagedash_server::domain::user::{Claims, UserProfile};
use pagedash_server::error::{AppError, Result};
use pagedash_server::providers::{
    AppCredentials, GrantedPermission, Identity, Page, SocialGraph, TokenGrant,
};
use pagedash_server::services::{CleanupService, ConnectionService, ExchangeService};
use pagedash_server::storage::SessionStore;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};
use time::OffsetDateTime;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret";

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("pagedash_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

/// In-memory stand-in for the hosted store, shared with the spawned app so
/// tests can seed rows and flip failure modes.
#[derive(Debug, Default)]
pub struct FakeStore {
    pub sessions: Mutex<Vec<Session>>,
    pub connections: Mutex<Vec<SocialConnection>>,
    pub profiles: Mutex<Vec<UserProfile>>,
    /// Store unreachable: every call fails.
    pub fail_all: AtomicBool,
    pub fail_profile: AtomicBool,
    pub fail_refresh: AtomicBool,
    /// Session reads return empty until this many fetches have happened,
    /// mimicking the consistency window right after an OAuth redirect.
    pub session_visible_after: AtomicU32,
    pub session_fetches: AtomicU32,
}

impl FakeStore {
    pub fn seed_session(&self, user_id: Uuid, expires_at: OffsetDateTime) -> Session {
        let session = Session {
            user_id,
            access_token: format!("access-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
            expires_at,
        };
        self.sessions.lock().unwrap().push(session.clone());
        session
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn unreachable(&self) -> bool {
        self.fail_all.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for FakeStore {
    async fn fetch_session(&self, user_id: Uuid) -> Result<Option<Session>> {
        if self.unreachable() {
            return Err(AppError::Store("connection refused".to_string()));
        }
        let n = self.session_fetches.fetch_add(1, Ordering::SeqCst);
        if n < self.session_visible_after.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.sessions.lock().unwrap().iter().rev().find(|s| s.user_id == user_id).cloned())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        if self.unreachable() || self.fail_refresh.load(Ordering::SeqCst) {
            return Err(AppError::Store("connection refused".to_string()));
        }
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.refresh_token == refresh_token)
            .ok_or(AppError::AuthError)?;
        session.access_token = format!("{}-rotated", session.access_token);
        session.refresh_token = format!("{}-rotated", session.refresh_token);
        session.expires_at = OffsetDateTime::now_utc() + time::Duration::hours(1);
        Ok(session.clone())
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        if self.unreachable() || self.fail_profile.load(Ordering::SeqCst) {
            return Err(AppError::Store("connection refused".to_string()));
        }
        Ok(self.profiles.lock().unwrap().iter().find(|p| p.id == user_id).cloned())
    }

    async fn delete_expired_sessions(&self, cutoff: OffsetDateTime) -> Result<u64> {
        if self.unreachable() {
            return Err(AppError::Store("connection refused".to_string()));
        }
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.expires_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }

    async fn list_connections(&self, user_id: Uuid) -> Result<Vec<SocialConnection>> {
        if self.unreachable() {
            return Err(AppError::Store("connection refused".to_string()));
        }
        Ok(self.connections.lock().unwrap().iter().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn insert_connection(&self, connection: NewConnection) -> Result<SocialConnection> {
        if self.unreachable() {
            return Err(AppError::Store("connection refused".to_string()));
        }
        let created = SocialConnection {
            id: Uuid::new_v4(),
            user_id: connection.user_id,
            fb_page_id: connection.fb_page_id,
            ig_account_id: connection.ig_account_id,
            created_at: OffsetDateTime::now_utc(),
        };
        self.connections.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_connection(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        if self.unreachable() {
            return Err(AppError::Store("connection refused".to_string()));
        }
        let mut connections = self.connections.lock().unwrap();
        let before = connections.len();
        connections.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(connections.len() < before)
    }

    async fn ping(&self) -> Result<()> {
        if self.unreachable() {
            return Err(AppError::Store("connection refused".to_string()));
        }
        Ok(())
    }
}

/// In-memory stand-in for the social graph API.
#[derive(Debug, Default)]
pub struct FakeGraph {
    pub pages: Mutex<Vec<Page>>,
    pub fail_exchange: AtomicBool,
    pub fail_pages: AtomicBool,
    pub token_endpoint_calls: AtomicU32,
}

impl FakeGraph {
    pub fn set_pages(&self, pages: Vec<Page>) {
        *self.pages.lock().unwrap() = pages;
    }

    pub fn page(id: &str) -> Page {
        Page {
            id: id.to_string(),
            name: format!("Page {id}"),
            access_token: Some("page_token".to_string()),
            category: Some("Business".to_string()),
            tasks: Some(vec!["ANALYZE".to_string(), "MODERATE".to_string()]),
        }
    }
}

#[async_trait]
impl SocialGraph for FakeGraph {
    async fn exchange_code(&self, _credentials: &AppCredentials, code: &str) -> Result<TokenGrant> {
        self.token_endpoint_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exchange.load(Ordering::SeqCst) || code == "expired" {
            return Err(AppError::BadRequest("authorization code is invalid or has expired".to_string()));
        }
        Ok(TokenGrant { access_token: "T1".to_string(), expires_in: Some(3600) })
    }

    async fn list_pages(&self, _access_token: &str) -> Result<Vec<Page>> {
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("pages request rejected".to_string()));
        }
        Ok(self.pages.lock().unwrap().clone())
    }

    async fn fetch_identity(&self, _access_token: &str) -> Result<Identity> {
        Ok(Identity { id: "9001".to_string(), name: Some("Test User".to_string()) })
    }

    async fn fetch_permissions(&self, _access_token: &str) -> Result<Vec<GrantedPermission>> {
        Ok(vec![GrantedPermission { permission: "pages_show_list".to_string(), status: "granted".to_string() }])
    }
}

pub fn get_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 5,
            trusted_proxies: vec!["127.0.0.1/32".parse().unwrap()],
        },
        store: StoreConfig {
            url: "http://localhost:54321".to_string(),
            anon_key: "anon_key".to_string(),
            service_key: "service_key".to_string(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            request_timeout_ms: 1000,
        },
        social: SocialConfig {
            app_id: Some("test_app_id".to_string()),
            app_secret: Some("test_app_secret".to_string()),
            redirect_uri: "http://localhost/oauth/callback".to_string(),
            graph_base_url: "http://localhost:9".to_string(),
            exchange_timeout_secs: 10,
        },
        session: SessionConfig {
            retry_max_elapsed_ms: 1500,
            retry_initial_delay_ms: 25,
            attempt_timeout_ms: 500,
        },
        cleanup: CleanupConfig { interval_secs: 0 },
        rate_limit: RateLimitConfig {
            per_second: 10000,
            burst: 10000,
            exchange_per_second: 10000,
            exchange_burst: 10000,
        },
        telemetry: TelemetryConfig { otlp_endpoint: None, log_format: LogFormat::Text },
    }
}

/// A bearer token the app accepts, signed with the test store secret.
pub fn bearer_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id,
        exp: 2_000_000_000,
        email: Some("user@example.com".to_string()),
        role: Some("authenticated".to_string()),
        created_at: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes())).unwrap()
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub store: Arc<FakeStore>,
    pub graph: Arc<FakeGraph>,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        setup_tracing();

        let store = Arc::new(FakeStore::default());
        let graph = Arc::new(FakeGraph::default());

        let services = ServiceContainer {
            exchange_service: ExchangeService::new(
                Arc::clone(&graph) as Arc<dyn SocialGraph>,
                AppCredentials::from_config(&config.social),
            ),
            connection_service: ConnectionService::new(Arc::clone(&store) as Arc<dyn SessionStore>),
            cleanup_service: CleanupService::new(Arc::clone(&store) as Arc<dyn SessionStore>),
            store: Arc::clone(&store) as Arc<dyn SessionStore>,
        };

        let app = api::app_router(config.clone(), services);
        let mgmt = api::mgmt_router(MgmtState { store: Arc::clone(&store) as Arc<dyn SessionStore> });

        let api_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", api_listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(api_listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_url = format!("http://{}", mgmt_listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self { server_url, mgmt_url, client: reqwest::Client::new(), store, graph, config }
    }
}
