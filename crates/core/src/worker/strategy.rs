//! Per-request caching strategies.
//!
//! Network failures never escape: every path ends in a response, either from
//! the cache or a synthetic 503. Non-200 origin responses are returned as they
//! are and never stored.

use http::Method;

use super::{FetchOutcome, OfflineWorker};
use crate::cache::GenerationKind;
use crate::message::{Request, Response};
use crate::routing::Policy;

const STATIC_UNAVAILABLE: &str = "Offline: Static resource not available";
const RESOURCE_UNAVAILABLE: &str = "Offline: Resource not available";
const CHECK_CONNECTION: &str = "Offline: Please check your connection";

impl OfflineWorker {
    /// Route an intercepted request.
    ///
    /// Only GET is intercepted. Anything else comes back as
    /// `FetchOutcome::PassThrough` without touching the cache.
    pub async fn fetch(&self, request: Request) -> FetchOutcome {
        if request.method != Method::GET {
            return FetchOutcome::PassThrough(request);
        }

        let policy = self.routes.classify(request.path());
        tracing::debug!(url = %request.url, ?policy, "routing request");

        let response = match policy {
            Policy::CacheFirst => self.cache_first(&request).await,
            Policy::NetworkFirst => self.network_first(&request).await,
            Policy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        };

        FetchOutcome::Respond(response)
    }

    async fn cache_first(&self, request: &Request) -> Response {
        if let Some(cached) = self.lookup(request).await {
            tracing::debug!(url = %request.url, "cache hit");
            return cached;
        }

        match self.network_fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store_in_background(GenerationKind::Static, request, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "static asset unavailable");
                if self.routes.is_image(request.path())
                    && let Some(placeholder) = self.lookup_path(self.routes.offline_image()).await
                {
                    return placeholder;
                }
                Response::offline(STATIC_UNAVAILABLE)
            }
        }
    }

    async fn network_first(&self, request: &Request) -> Response {
        let e = match self.network_fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() && self.routes.is_cacheable(request.path()) {
                    self.store_in_background(GenerationKind::Dynamic, request, &response).await;
                }
                return response;
            }
            Err(e) => e,
        };

        tracing::debug!(url = %request.url, error = %e, "network failed, falling back to cache");
        if let Some(cached) = self.lookup(request).await {
            return cached;
        }

        if request.is_navigation() {
            return match self.lookup_path(self.routes.offline_home()).await {
                Some(home) => home,
                None => Response::offline_html(CHECK_CONNECTION),
            };
        }

        Response::offline(RESOURCE_UNAVAILABLE)
    }

    async fn stale_while_revalidate(&self, request: Request) -> Response {
        if let Some(cached) = self.lookup(&request).await {
            tracing::debug!(url = %request.url, "serving cached copy, revalidating");
            self.revalidate_in_background(request).await;
            return cached;
        }

        match self.network_fetch(&request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store_in_background(GenerationKind::Dynamic, &request, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "no cached copy and network failed");
                Response::offline(RESOURCE_UNAVAILABLE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use http::StatusCode;

    use super::super::testing::{FakeNetwork, worker_with, worker_with_config};
    use super::*;
    use crate::cache::{CacheDb, CacheStore, CachedResponse, MemoryStore};
    use crate::config::AppConfig;
    use crate::message::RequestMode;
    use crate::network::Network;

    fn request(worker: &OfflineWorker, path: &str) -> Request {
        Request::get(worker.resolve(path).unwrap())
    }

    async fn seed(store: &MemoryStore, worker: &OfflineWorker, generation: &str, path: &str, body: &'static str) {
        let request = request(worker, path);
        let entry = CachedResponse::capture(&request, &Response::new(StatusCode::OK, body));
        store.put(generation, &request.cache_key(), entry).await.unwrap();
    }

    fn respond(outcome: FetchOutcome) -> Response {
        match outcome {
            FetchOutcome::Respond(response) => response,
            FetchOutcome::PassThrough(request) => panic!("expected a response for {}", request.url),
        }
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let (worker, store, network) = worker_with(FakeNetwork::new());
        seed(&store, &worker, "swcache-static-v1", "/static/css/styles.css", "cached").await;

        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let request = Request::new(method.clone(), worker.resolve("/static/css/styles.css").unwrap());
            match worker.fetch(request).await {
                FetchOutcome::PassThrough(passed) => assert_eq!(passed.method, method),
                FetchOutcome::Respond(_) => panic!("{method} must not be intercepted"),
            }
        }

        worker.settle().await;
        assert!(network.calls().is_empty());
        assert_eq!(store.count("swcache-static-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let network = FakeNetwork::new();
        network.reply("/static/css/styles.css", StatusCode::OK, "fresh");
        let (worker, store, network) = worker_with(network);
        seed(&store, &worker, "swcache-static-v1", "/static/css/styles.css", "body{color:red}").await;

        let response = respond(worker.fetch(request(&worker, "/static/css/styles.css")).await);

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, Bytes::from_static(b"body{color:red}"));
        worker.settle().await;
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_miss_stores_in_static_generation() {
        let network = FakeNetwork::new();
        network.reply("/static/js/app.js", StatusCode::OK, "console.log(1)");
        let (worker, store, network) = worker_with(network);

        let response = respond(worker.fetch(request(&worker, "/static/js/app.js")).await);
        assert_eq!(response.body, Bytes::from_static(b"console.log(1)"));

        worker.settle().await;
        assert_eq!(store.count(worker.generations().static_name()).await.unwrap(), 1);
        assert_eq!(store.count(worker.generations().dynamic_name()).await.unwrap(), 0);

        respond(worker.fetch(request(&worker, "/static/js/app.js")).await);
        assert_eq!(network.calls(), vec!["/static/js/app.js".to_string()]);
    }

    #[tokio::test]
    async fn test_cache_first_non_200_passed_through_uncached() {
        let network = FakeNetwork::new();
        network.reply("/static/css/gone.css", StatusCode::NOT_FOUND, "nope");
        let (worker, store, _) = worker_with(network);

        let response = respond(worker.fetch(request(&worker, "/static/css/gone.css")).await);

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, Bytes::from_static(b"nope"));
        worker.settle().await;
        assert_eq!(store.count(worker.generations().static_name()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_image_gets_placeholder() {
        let (worker, store, _) = worker_with(FakeNetwork::new());
        seed(&store, &worker, "swcache-static-v1", "/static/img/default_profile.png", "PNGDATA").await;

        let response = respond(worker.fetch(request(&worker, "/static/img/uploads/avatar.png")).await);

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, Bytes::from_static(b"PNGDATA"));
    }

    #[tokio::test]
    async fn test_offline_image_without_placeholder_is_503() {
        let (worker, _, _) = worker_with(FakeNetwork::new());
        let response = respond(worker.fetch(request(&worker, "/static/img/avatar.png")).await);
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_offline_static_non_image_is_503() {
        let (worker, store, _) = worker_with(FakeNetwork::new());
        seed(&store, &worker, "swcache-static-v1", "/static/img/default_profile.png", "PNGDATA").await;

        let response = respond(worker.fetch(request(&worker, "/static/css/styles.css")).await);

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body, Bytes::from_static(STATIC_UNAVAILABLE.as_bytes()));
    }

    #[tokio::test]
    async fn test_network_first_returns_network_response() {
        let network = FakeNetwork::new();
        network.reply("/dashboard", StatusCode::OK, "live dashboard");
        let (worker, store, _) = worker_with(network);
        seed(&store, &worker, "swcache-dynamic-v1", "/dashboard", "stale dashboard").await;

        let response = respond(worker.fetch(request(&worker, "/dashboard")).await);
        assert_eq!(response.body, Bytes::from_static(b"live dashboard"));

        worker.settle().await;
        let cached = store.get(&request(&worker, "/dashboard").cache_key()).await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from_static(b"stale dashboard"));
    }

    #[tokio::test]
    async fn test_network_first_caches_only_allow_listed_paths() {
        let mut config = AppConfig { origin: "https://app.test".into(), ..Default::default() };
        config.routes.network_first.push("/general/home".into());
        let network = FakeNetwork::new();
        network.reply("/general/home", StatusCode::OK, "home");
        network.reply("/reports", StatusCode::OK, "reports");
        let (worker, store, _) = worker_with_config(config, network);

        respond(worker.fetch(request(&worker, "/general/home")).await);
        respond(worker.fetch(request(&worker, "/reports")).await);
        worker.settle().await;

        assert!(store.get(&request(&worker, "/general/home").cache_key()).await.unwrap().is_some());
        assert!(store.get(&request(&worker, "/reports").cache_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let (worker, store, _) = worker_with(FakeNetwork::new());
        seed(&store, &worker, "swcache-dynamic-v1", "/api/notifications", "[]").await;

        let response = respond(worker.fetch(request(&worker, "/api/notifications")).await);

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, Bytes::from_static(b"[]"));
    }

    #[tokio::test]
    async fn test_offline_navigation_gets_cached_home() {
        let (worker, store, _) = worker_with(FakeNetwork::new());
        seed(&store, &worker, "swcache-dynamic-v1", "/general/home", "<h1>Home</h1>").await;

        let nav = request(&worker, "/dashboard").with_mode(RequestMode::Navigate);
        let response = respond(worker.fetch(nav).await);

        assert_eq!(response.body, Bytes::from_static(b"<h1>Home</h1>"));
    }

    #[tokio::test]
    async fn test_offline_navigation_without_home_is_503_html() {
        let (worker, _, _) = worker_with(FakeNetwork::new());

        let nav = request(&worker, "/dashboard").with_mode(RequestMode::Navigate);
        let response = respond(worker.fetch(nav).await);

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers.get(http::header::CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(response.body, Bytes::from_static(CHECK_CONNECTION.as_bytes()));
    }

    #[tokio::test]
    async fn test_offline_subresource_on_network_first_is_503() {
        let (worker, store, _) = worker_with(FakeNetwork::new());
        seed(&store, &worker, "swcache-dynamic-v1", "/general/home", "<h1>Home</h1>").await;

        let response = respond(worker.fetch(request(&worker, "/api/notifications/count")).await);

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body, Bytes::from_static(RESOURCE_UNAVAILABLE.as_bytes()));
    }

    #[tokio::test]
    async fn test_network_first_hung_fetch_times_out_to_fallback() {
        let config = AppConfig { origin: "https://app.test".into(), network_timeout_ms: 100, ..Default::default() };
        let network = FakeNetwork::new();
        network.hang("/payments");
        let (worker, store, _) = worker_with_config(config, network);
        seed(&store, &worker, "swcache-dynamic-v1", "/payments", "cached payments").await;

        let response = tokio::time::timeout(Duration::from_secs(5), worker.fetch(request(&worker, "/payments")))
            .await
            .expect("fetch must not hang");

        assert_eq!(respond(response).body, Bytes::from_static(b"cached payments"));
    }

    #[tokio::test]
    async fn test_swr_first_visit_uses_network_and_populates_dynamic() {
        let network = FakeNetwork::new();
        network.reply("/general/about", StatusCode::OK, "about us");
        let (worker, store, network) = worker_with(network);

        let response = respond(worker.fetch(request(&worker, "/general/about")).await);
        assert_eq!(response.body, Bytes::from_static(b"about us"));

        worker.settle().await;
        assert_eq!(store.count(worker.generations().dynamic_name()).await.unwrap(), 1);
        assert_eq!(network.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_swr_hit_does_not_wait_for_network() {
        let network = FakeNetwork::gated();
        network.reply("/general/contact", StatusCode::OK, "new contact");
        let (worker, store, network) = worker_with(network);
        seed(&store, &worker, "swcache-dynamic-v1", "/general/contact", "old contact").await;

        let response = tokio::time::timeout(Duration::from_secs(5), worker.fetch(request(&worker, "/general/contact")))
            .await
            .expect("cached copy must be served while the network is blocked");
        assert_eq!(respond(response).body, Bytes::from_static(b"old contact"));

        network.open_gate();
        worker.settle().await;

        let refreshed = store.get(&request(&worker, "/general/contact").cache_key()).await.unwrap().unwrap();
        assert_eq!(refreshed.body, Bytes::from_static(b"new contact"));
    }

    #[tokio::test]
    async fn test_swr_hit_keeps_entry_when_revalidation_fails() {
        let network = FakeNetwork::new();
        network.reply("/general/privacy", StatusCode::INTERNAL_SERVER_ERROR, "boom");
        let (worker, store, _) = worker_with(network);
        seed(&store, &worker, "swcache-dynamic-v1", "/general/privacy", "policy").await;

        let response = respond(worker.fetch(request(&worker, "/general/privacy")).await);
        worker.settle().await;

        assert_eq!(response.body, Bytes::from_static(b"policy"));
        let cached = store.get(&request(&worker, "/general/privacy").cache_key()).await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from_static(b"policy"));
    }

    #[tokio::test]
    async fn test_swr_miss_offline_is_503() {
        let (worker, _, _) = worker_with(FakeNetwork::new());
        let response = respond(worker.fetch(request(&worker, "/general/terms")).await);
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_concurrent_requests_last_writer_wins() {
        let network = FakeNetwork::gated();
        network.reply("/general/faq", StatusCode::OK, "faq");
        let (worker, store, network) = worker_with(network);
        let worker = Arc::new(worker);

        let (a, b, ()) = tokio::join!(
            worker.fetch(request(&worker, "/general/faq")),
            worker.fetch(request(&worker, "/general/faq")),
            async {
                tokio::task::yield_now().await;
                network.open_gate();
            }
        );
        respond(a);
        respond(b);
        worker.settle().await;

        assert_eq!(network.calls().len(), 2);
        assert_eq!(store.count(worker.generations().dynamic_name()).await.unwrap(), 1);
    }

    fn sqlite_worker(config: &AppConfig, store: &Arc<CacheDb>, network: FakeNetwork) -> OfflineWorker {
        OfflineWorker::new(config, Arc::clone(store) as Arc<dyn CacheStore>, Arc::new(network) as Arc<dyn Network>)
            .unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_store_serves_entry_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swcache.sqlite");
        let config = AppConfig { origin: "https://app.test".into(), ..Default::default() };

        {
            let network = FakeNetwork::new();
            network.reply("/general/about", StatusCode::OK, "about");
            network.reply("/static/css/styles.css", StatusCode::OK, "body{}");
            let store = Arc::new(CacheDb::open(&path).await.unwrap());
            let worker = sqlite_worker(&config, &store, network);
            worker.install().await.unwrap();
            worker.activate().await.unwrap();

            let response = respond(worker.fetch(request(&worker, "/general/about")).await);
            assert_eq!(response.body.as_ref(), b"about");
            worker.settle().await;
        }

        let store = Arc::new(CacheDb::open(&path).await.unwrap());
        assert_eq!(store.list_generations().await.unwrap(), ["swcache-static-v1", "swcache-dynamic-v1"]);
        assert_eq!(store.count("swcache-dynamic-v1").await.unwrap(), 1);

        let worker = sqlite_worker(&config, &store, FakeNetwork::new());
        let about = respond(worker.fetch(request(&worker, "/general/about")).await);
        let styles = respond(worker.fetch(request(&worker, "/static/css/styles.css")).await);
        worker.settle().await;

        assert_eq!(about.status, StatusCode::OK);
        assert_eq!(about.body.as_ref(), b"about");
        assert_eq!(styles.body.as_ref(), b"body{}");
        assert_eq!(store.count("swcache-dynamic-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_matches_static_before_dynamic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swcache.sqlite");
        let config = AppConfig { origin: "https://app.test".into(), ..Default::default() };
        let store = Arc::new(CacheDb::open(&path).await.unwrap());
        let worker = sqlite_worker(&config, &store, FakeNetwork::new());
        worker.install().await.unwrap();

        let shared = request(&worker, "/general/about");
        let put = |body: &'static str| CachedResponse::capture(&shared, &Response::new(StatusCode::OK, body));
        store.put("swcache-dynamic-v1", &shared.cache_key(), put("dynamic")).await.unwrap();
        store.put("swcache-static-v1", &shared.cache_key(), put("static")).await.unwrap();

        let hit = store.get(&shared.cache_key()).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), b"static");
    }
}
