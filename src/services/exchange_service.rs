use crate::domain::outcome::Outcome;
use crate::error::{AppError, Result};
use crate::providers::{AppCredentials, Page, SocialGraph, TokenGrant};
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    exchanges_total: Counter<u64>,
    degraded_page_fetches_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("pagedash-server");
        Self {
            exchanges_total: meter
                .u64_counter("oauth_exchanges_total")
                .with_description("Total number of successful authorization code exchanges")
                .build(),
            degraded_page_fetches_total: meter
                .u64_counter("oauth_degraded_page_fetches_total")
                .with_description("Total number of exchanges where the pages fetch failed")
                .build(),
        }
    }
}

/// Result of a code exchange. Token acquisition and page enumeration are
/// independently failable: the grant is always present, the pages may be a
/// degraded empty list.
#[derive(Debug)]
pub struct CodeExchange {
    pub grant: TokenGrant,
    pub pages: Outcome<Vec<Page>>,
}

#[derive(Clone, Debug)]
pub struct ExchangeService {
    graph: Arc<dyn SocialGraph>,
    credentials: Option<AppCredentials>,
    metrics: Metrics,
}

impl ExchangeService {
    #[must_use]
    pub fn new(graph: Arc<dyn SocialGraph>, credentials: Option<AppCredentials>) -> Self {
        Self { graph, credentials, metrics: Metrics::new() }
    }

    /// Exchanges an authorization code for an access token, then enumerates
    /// the pages the token grants access to. The pages fetch must not discard
    /// an already-acquired token, so its failure degrades the result instead
    /// of failing it.
    #[tracing::instrument(
        skip(self, code),
        err(level = "warn"),
        fields(page_count = tracing::field::Empty, degraded = tracing::field::Empty)
    )]
    pub async fn exchange(&self, code: &str) -> Result<CodeExchange> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::Config("social app credentials are not set".to_string()))?;

        let grant = self.graph.exchange_code(credentials, code).await?;

        let pages = Outcome::or_degraded(self.graph.list_pages(&grant.access_token).await, Vec::new());
        if let Some(warning) = pages.warning() {
            tracing::warn!(warning = %warning, "Pages fetch failed; returning token with empty page list");
            self.metrics.degraded_page_fetches_total.add(1, &[]);
        }

        let page_count = pages.value().map_or(0, Vec::len);
        tracing::Span::current().record("page_count", page_count);
        tracing::Span::current().record("degraded", pages.is_degraded());

        if page_count == 0 {
            self.log_zero_page_diagnostics(&grant.access_token).await;
        }

        self.metrics.exchanges_total.add(1, &[]);
        Ok(CodeExchange { grant, pages })
    }

    /// Best-effort diagnostic reads when an exchange yields no pages. Results
    /// only ever reach the logs; failures are swallowed.
    async fn log_zero_page_diagnostics(&self, access_token: &str) {
        match self.graph.fetch_identity(access_token).await {
            Ok(identity) => tracing::info!(
                provider_user_id = %identity.id,
                name = identity.name.as_deref().unwrap_or("unknown"),
                "Zero pages for identity"
            ),
            Err(e) => tracing::debug!(error = %e, "Identity diagnostic failed"),
        }

        match self.graph.fetch_permissions(access_token).await {
            Ok(permissions) => {
                let granted: Vec<&str> = permissions
                    .iter()
                    .filter(|p| p.status == "granted")
                    .map(|p| p.permission.as_str())
                    .collect();
                tracing::info!(granted = ?granted, "Granted permission scopes");
            }
            Err(e) => tracing::debug!(error = %e, "Permissions diagnostic failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{GrantedPermission, Identity};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeGraph {
        fail_exchange: bool,
        fail_pages: bool,
        fail_diagnostics: bool,
        pages: Vec<Page>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeGraph {
        fn record(&self, call: &'static str) {
            self.calls.lock().expect("calls lock").push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl SocialGraph for FakeGraph {
        async fn exchange_code(&self, _credentials: &AppCredentials, _code: &str) -> Result<TokenGrant> {
            self.record("exchange_code");
            if self.fail_exchange {
                return Err(AppError::BadRequest("authorization code is invalid or has expired".to_string()));
            }
            Ok(TokenGrant { access_token: "T1".to_string(), expires_in: Some(3600) })
        }

        async fn list_pages(&self, _access_token: &str) -> Result<Vec<Page>> {
            self.record("list_pages");
            if self.fail_pages {
                return Err(AppError::Upstream("pages request rejected".to_string()));
            }
            Ok(self.pages.clone())
        }

        async fn fetch_identity(&self, _access_token: &str) -> Result<Identity> {
            self.record("fetch_identity");
            if self.fail_diagnostics {
                return Err(AppError::Upstream("identity request rejected".to_string()));
            }
            Ok(Identity { id: "123".to_string(), name: Some("Test User".to_string()) })
        }

        async fn fetch_permissions(&self, _access_token: &str) -> Result<Vec<GrantedPermission>> {
            self.record("fetch_permissions");
            if self.fail_diagnostics {
                return Err(AppError::Upstream("permissions request rejected".to_string()));
            }
            Ok(vec![GrantedPermission {
                permission: "pages_show_list".to_string(),
                status: "granted".to_string(),
            }])
        }
    }

    fn credentials() -> Option<AppCredentials> {
        Some(AppCredentials { app_id: "app".to_string(), app_secret: "secret".to_string() })
    }

    fn page(id: &str) -> Page {
        Page {
            id: id.to_string(),
            name: format!("Page {id}"),
            access_token: Some("page_token".to_string()),
            category: Some("Business".to_string()),
            tasks: None,
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_is_config_error() {
        let graph = Arc::new(FakeGraph::default());
        let service = ExchangeService::new(Arc::clone(&graph) as Arc<dyn SocialGraph>, None);

        let result = service.exchange("abc123").await;
        assert!(matches!(result, Err(AppError::Config(_))));
        // No provider call may happen before the config check.
        assert!(graph.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_code_stops_before_pages() {
        let graph = Arc::new(FakeGraph { fail_exchange: true, ..FakeGraph::default() });
        let service = ExchangeService::new(Arc::clone(&graph) as Arc<dyn SocialGraph>, credentials());

        let result = service.exchange("bad").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(graph.calls(), vec!["exchange_code"]);
    }

    #[tokio::test]
    async fn test_pages_failure_degrades_but_keeps_token() {
        let graph = Arc::new(FakeGraph { fail_pages: true, fail_diagnostics: true, ..FakeGraph::default() });
        let service = ExchangeService::new(Arc::clone(&graph) as Arc<dyn SocialGraph>, credentials());

        let result = service.exchange("abc123").await.expect("exchange should succeed");
        assert_eq!(result.grant.access_token, "T1");
        assert!(result.pages.is_degraded());
        assert_eq!(result.pages.value(), Some(&vec![]));
        // Diagnostic failures are swallowed, not surfaced.
        assert!(graph.calls().contains(&"fetch_identity"));
    }

    #[tokio::test]
    async fn test_zero_pages_success_is_not_degraded() {
        let graph = Arc::new(FakeGraph::default());
        let service = ExchangeService::new(Arc::clone(&graph) as Arc<dyn SocialGraph>, credentials());

        let result = service.exchange("abc123").await.expect("exchange should succeed");
        assert!(!result.pages.is_degraded());
        assert!(result.pages.warning().is_none());
        assert_eq!(result.pages.value(), Some(&vec![]));
        // Zero pages triggers the diagnostic reads.
        assert!(graph.calls().contains(&"fetch_identity"));
        assert!(graph.calls().contains(&"fetch_permissions"));
    }

    #[tokio::test]
    async fn test_nonempty_pages_skip_diagnostics() {
        let graph = Arc::new(FakeGraph { pages: vec![page("1"), page("2")], ..FakeGraph::default() });
        let service = ExchangeService::new(Arc::clone(&graph) as Arc<dyn SocialGraph>, credentials());

        let result = service.exchange("abc123").await.expect("exchange should succeed");
        assert_eq!(result.pages.value().map(Vec::len), Some(2));
        assert!(!graph.calls().contains(&"fetch_identity"));
    }
}
