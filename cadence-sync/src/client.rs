//! Composition root: wires store, credentials, gateway, cache, propagator,
//! and signal bus, and exposes the typed endpoint surface the UI calls.

use std::sync::Arc;

use cadence_core::{
    AuthPayload, CadenceError, CadenceResult, CredentialPair, LibrarySnapshot, LoginRequest,
    SignupRequest, StoreError, SyncSignal, TransportError, UserProfile,
};
use cadence_store::{CacheRead, KvStore, LmdbStore, MemoryStore, ResourceCache, ResourceKey};
use chrono::Utc;
use serde_json::Value;

use crate::config::SyncConfig;
use crate::credentials::CredentialStore;
use crate::gateway::RequestGateway;
use crate::library::ContentLibrary;
use crate::signals::SignalBus;
use crate::transport::{HttpTransport, RequestDescriptor, Transport};

const LOGIN_PATH: &str = "/api/v1/auth/login";
const SIGNUP_PATH: &str = "/api/v1/auth/signup";
const PROFILE_BUNDLE_PATH: &str = "/api/v1/me/bundle";
const SUGGESTIONS_PATH: &str = "/api/v1/suggestions";
const ANALYTICS_PATH: &str = "/api/v1/analytics";
const TRENDS_PATH: &str = "/api/v1/trends";

/// The sync layer's public face. All collaborators are injected; `new`
/// builds the production wiring from config, `with_parts` accepts doubles.
pub struct SyncClient {
    credentials: CredentialStore,
    signals: SignalBus,
    gateway: Arc<RequestGateway>,
    cache: Arc<ResourceCache>,
    library: ContentLibrary,
}

impl SyncClient {
    pub fn new(config: &SyncConfig) -> CadenceResult<Self> {
        let store: Arc<dyn KvStore> = match &config.store.path {
            Some(path) => Arc::new(
                LmdbStore::new(path, config.store.max_size_mb).map_err(|err| {
                    StoreError::Open {
                        path: path.display().to_string(),
                        reason: err.to_string(),
                    }
                })?,
            ),
            None => Arc::new(MemoryStore::new()),
        };
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(config).map_err(CadenceError::from)?);
        Ok(Self::with_parts(store, transport, config))
    }

    pub fn with_parts(
        store: Arc<dyn KvStore>,
        transport: Arc<dyn Transport>,
        config: &SyncConfig,
    ) -> Self {
        let signals = SignalBus::default();
        let credentials = CredentialStore::new(store.clone());
        let cache = Arc::new(ResourceCache::new(store, config.cache_policy()));
        let gateway = Arc::new(RequestGateway::new(
            transport,
            credentials.clone(),
            signals.clone(),
            config,
        ));
        let library = ContentLibrary::new(cache.clone(), gateway.clone());
        Self {
            credentials,
            signals,
            gateway,
            cache,
            library,
        }
    }

    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    pub fn library(&self) -> &ContentLibrary {
        &self.library
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    pub async fn cached_user(&self) -> CadenceResult<Option<UserProfile>> {
        Ok(self.credentials.cached_user().await?)
    }

    /// Exchange credentials for a session. A rejection is terminal by
    /// construction: login never enters the refresh protocol.
    pub async fn login(&self, email: &str, password: &str) -> CadenceResult<UserProfile> {
        let body = encode(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let envelope = self
            .gateway
            .send(RequestDescriptor::post(LOGIN_PATH, body).auth())
            .await?;
        self.install_session(decode_auth_payload(envelope.data)?)
            .await
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> CadenceResult<UserProfile> {
        let body = encode(&SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
        })?;
        let envelope = self
            .gateway
            .send(RequestDescriptor::post(SIGNUP_PATH, body).auth())
            .await?;
        self.install_session(decode_auth_payload(envelope.data)?)
            .await
    }

    /// Drop the session: credentials and every cached bundle go, and the
    /// redirect signal fires.
    pub async fn logout(&self) -> CadenceResult<()> {
        self.credentials.clear().await?;
        self.cache.invalidate_all().await?;
        self.signals.emit(SyncSignal::CredentialsCleared);
        Ok(())
    }

    /// The profile/content/stats snapshot, served from cache inside its
    /// validity window.
    pub async fn profile_bundle(&self) -> CadenceResult<CacheRead<LibrarySnapshot>> {
        let read = self.bundle(ResourceKey::ProfileBundle, PROFILE_BUNDLE_PATH).await?;
        read.try_map(|value| {
            serde_json::from_value(value).map_err(|err| {
                CadenceError::from(TransportError::Serialization {
                    reason: err.to_string(),
                })
            })
        })
    }

    pub async fn ai_suggestions(&self) -> CadenceResult<CacheRead<Value>> {
        self.bundle(ResourceKey::AiSuggestions, SUGGESTIONS_PATH).await
    }

    pub async fn analytics_bundle(&self) -> CadenceResult<CacheRead<Value>> {
        self.bundle(ResourceKey::AnalyticsBundle, ANALYTICS_PATH).await
    }

    pub async fn trends_bundle(&self) -> CadenceResult<CacheRead<Value>> {
        self.bundle(ResourceKey::TrendsBundle, TRENDS_PATH).await
    }

    /// Drop a bundle so the next read goes to the network.
    pub async fn force_refresh(&self, key: ResourceKey) -> CadenceResult<()> {
        Ok(self.cache.invalidate(key).await?)
    }

    async fn bundle(
        &self,
        key: ResourceKey,
        path: &'static str,
    ) -> CadenceResult<CacheRead<Value>> {
        let read = self
            .cache
            .fetch_with(key, || async {
                let envelope = self.gateway.send(RequestDescriptor::get(path)).await?;
                envelope.data.ok_or_else(|| {
                    CadenceError::from(TransportError::InvalidResponse {
                        status: envelope.status_code,
                        reason: envelope.message,
                    })
                })
            })
            .await?;
        Ok(read)
    }

    async fn install_session(&self, payload: AuthPayload) -> CadenceResult<UserProfile> {
        let expires_at_ms = payload
            .expires_in
            .map(|seconds| Utc::now().timestamp_millis() + seconds * 1000);
        let pair = CredentialPair::new(payload.access_token, payload.refresh_token, expires_at_ms)
            .ok_or_else(|| {
                CadenceError::from(TransportError::InvalidResponse {
                    status: 200,
                    reason: "auth response carried empty tokens".to_string(),
                })
            })?;
        self.credentials.save(&pair).await?;
        self.credentials.save_user(&payload.user).await?;
        self.signals.emit(SyncSignal::CredentialsUpdated);
        self.signals.emit(SyncSignal::UserUpdated);
        Ok(payload.user)
    }
}

fn encode<T: serde::Serialize>(body: &T) -> CadenceResult<Value> {
    serde_json::to_value(body).map_err(|err| {
        CadenceError::from(TransportError::Serialization {
            reason: err.to_string(),
        })
    })
}

fn decode_auth_payload(data: Option<Value>) -> CadenceResult<AuthPayload> {
    let data = data.ok_or_else(|| {
        CadenceError::from(TransportError::InvalidResponse {
            status: 200,
            reason: "auth response carried no data".to_string(),
        })
    })?;
    serde_json::from_value(data).map_err(|err| {
        CadenceError::from(TransportError::Serialization {
            reason: err.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StoreConfig, TtlConfig};
    use crate::transport::HttpReply;
    use async_trait::async_trait;
    use cadence_core::AuthError;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    fn make_config() -> SyncConfig {
        SyncConfig {
            api_base_url: "https://api.cadence.app".to_string(),
            request_timeout_ms: 10_000,
            refresh_timeout_ms: 5_000,
            early_refresh_margin_ms: 0,
            ttl: TtlConfig {
                long_ms: 86_400_000,
                short_ms: 3_600_000,
            },
            store: StoreConfig {
                path: None,
                max_size_mb: 64,
            },
        }
    }

    /// Serves canned `data` payloads per path; counts calls; can be
    /// switched to fail or reject.
    struct ScriptedTransport {
        data: HashMap<String, Value>,
        calls: StdMutex<Vec<String>>,
        fail: AtomicBool,
        unauthorized: AtomicBool,
    }

    impl ScriptedTransport {
        fn new(data: HashMap<String, Value>) -> Self {
            Self {
                data,
                calls: StdMutex::new(Vec::new()),
                fail: AtomicBool::new(false),
                unauthorized: AtomicBool::new(false),
            }
        }

        fn calls_to(&self, path: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
        }

        fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }

        fn set_unauthorized(&self, unauthorized: bool) {
            self.unauthorized.store(unauthorized, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(
            &self,
            request: &RequestDescriptor,
            _bearer: Option<&str>,
        ) -> Result<HttpReply, cadence_core::TransportError> {
            self.calls.lock().unwrap().push(request.path.clone());
            if self.fail.load(Ordering::SeqCst) {
                return Err(cadence_core::TransportError::Network {
                    reason: "offline".to_string(),
                });
            }
            if self.unauthorized.load(Ordering::SeqCst) {
                return Ok(HttpReply {
                    status: 401,
                    body: json!({"statusCode": 401, "message": "unauthorized"}),
                });
            }
            match self.data.get(&request.path) {
                Some(data) => Ok(HttpReply {
                    status: 200,
                    body: json!({"statusCode": 200, "message": "ok", "data": data}),
                }),
                None => Ok(HttpReply {
                    status: 404,
                    body: json!({"statusCode": 404, "message": "not found"}),
                }),
            }
        }
    }

    fn auth_data() -> Value {
        json!({
            "accessToken": "a-1",
            "refreshToken": "r-1",
            "expiresIn": 900,
            "user": {"id": "u1", "displayName": "Jo"}
        })
    }

    fn make_client(
        data: HashMap<String, Value>,
    ) -> (Arc<ScriptedTransport>, Arc<MemoryStore>, SyncClient) {
        let transport = Arc::new(ScriptedTransport::new(data));
        let store = Arc::new(MemoryStore::new());
        let client = SyncClient::with_parts(store.clone(), transport.clone(), &make_config());
        (transport, store, client)
    }

    #[tokio::test]
    async fn test_login_installs_session() {
        let (_transport, _store, client) =
            make_client(HashMap::from([(LOGIN_PATH.to_string(), auth_data())]));
        let mut rx = client.signals().subscribe();

        let user = client.login("jo@cadence.app", "hunter2").await.unwrap();

        assert_eq!(user["id"], "u1");
        let pair = client.gateway().credentials().load().await.unwrap().unwrap();
        assert_eq!(pair.access_token, "a-1");
        assert!(pair.expires_at_ms.is_some());
        assert_eq!(client.cached_user().await.unwrap().unwrap()["id"], "u1");
        assert_eq!(rx.try_recv().unwrap(), SyncSignal::CredentialsUpdated);
        assert_eq!(rx.try_recv().unwrap(), SyncSignal::UserUpdated);
    }

    #[tokio::test]
    async fn test_login_rejection_is_terminal() {
        let (transport, _store, client) = make_client(HashMap::new());
        transport.set_unauthorized(true);

        let result = client.login("jo@cadence.app", "wrong").await;

        assert!(matches!(
            result,
            Err(CadenceError::Auth(AuthError::Terminal { .. }))
        ));
    }

    #[tokio::test]
    async fn test_profile_bundle_is_cached() {
        let bundle = json!({
            "profile": {"id": "u1"},
            "stats": {"scheduledCount": 0, "engagementRate": 0, "streak": 0},
            "items": []
        });
        let (transport, _store, client) = make_client(HashMap::from([
            (PROFILE_BUNDLE_PATH.to_string(), bundle),
        ]));

        let first = client.profile_bundle().await.unwrap();
        let second = client.profile_bundle().await.unwrap();

        assert_eq!(first.value().profile["id"], "u1");
        assert!(!second.is_stale_fallback());
        // Only the first read hits the network.
        assert_eq!(transport.calls_to(PROFILE_BUNDLE_PATH), 1);
    }

    #[tokio::test]
    async fn test_suggestions_survive_outage_via_stale_fallback() {
        let (transport, store, client) = make_client(HashMap::from([(
            SUGGESTIONS_PATH.to_string(),
            json!(["post a reel"]),
        )]));

        client.ai_suggestions().await.unwrap();

        // Age the entry past the short TTL, then take the network away.
        let stale_stamp = Utc::now().timestamp_millis() - 2 * 3_600_000;
        store
            .set(
                &ResourceKey::AiSuggestions.fetched_at_key(),
                &stale_stamp.to_string(),
            )
            .await
            .unwrap();
        transport.set_failing(true);

        let read = client.ai_suggestions().await.unwrap();

        assert!(read.is_stale_fallback());
        assert_eq!(read.value()[0], "post a reel");
        // Initial fill plus the failed refetch.
        assert_eq!(transport.calls_to(SUGGESTIONS_PATH), 2);
    }

    #[tokio::test]
    async fn test_force_refresh_refetches() {
        let (transport, _store, client) = make_client(HashMap::from([(
            TRENDS_PATH.to_string(),
            json!({"topics": ["#rust"]}),
        )]));

        client.trends_bundle().await.unwrap();
        client.force_refresh(ResourceKey::TrendsBundle).await.unwrap();
        client.trends_bundle().await.unwrap();

        assert_eq!(transport.calls_to(TRENDS_PATH), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_caches() {
        let (_transport, _store, client) = make_client(HashMap::from([
            (LOGIN_PATH.to_string(), auth_data()),
            (ANALYTICS_PATH.to_string(), json!({"reach": 10})),
        ]));
        client.login("jo@cadence.app", "hunter2").await.unwrap();
        client.analytics_bundle().await.unwrap();
        let mut rx = client.signals().subscribe();

        client.logout().await.unwrap();

        assert!(client.gateway().credentials().load().await.unwrap().is_none());
        assert!(client.cached_user().await.unwrap().is_none());
        assert!(!client
            .cache()
            .is_valid(ResourceKey::AnalyticsBundle)
            .await
            .unwrap());
        assert_eq!(rx.try_recv().unwrap(), SyncSignal::CredentialsCleared);
    }

    #[tokio::test]
    async fn test_missing_bundle_surfaces_transport_error() {
        let (_transport, _store, client) = make_client(HashMap::new());

        let result = client.analytics_bundle().await;

        assert!(matches!(result, Err(CadenceError::Cache(_))));
    }
}
