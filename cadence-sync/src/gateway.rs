//! Authenticated request gateway.
//!
//! Wraps every outbound call with credential attachment, intercepts
//! authorization failures, and runs the refresh protocol:
//!
//! `IDLE → REFRESHING → {SETTLED_OK, SETTLED_FAIL} → IDLE`
//!
//! At most one refresh is in flight at any time. Callers that hit a 401
//! while a refresh is running are appended to a pending queue and released
//! FIFO when it settles; on success each replays its original request
//! exactly once with the new token, on failure all reject with the same
//! terminal error and credentials are cleared exactly once.
//!
//! The refresh call runs under an explicit timeout; a hung refresh settles
//! as a terminal failure instead of stalling the queue indefinitely.

use std::sync::Arc;
use std::time::Duration;

use cadence_core::{
    ApiEnvelope, AuthError, CadenceError, CadenceResult, CredentialPair, RefreshRequest,
    RefreshResponse, SyncSignal, TransportError,
};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};

use crate::config::SyncConfig;
use crate::credentials::CredentialStore;
use crate::signals::SignalBus;
use crate::transport::{HttpReply, RequestDescriptor, RequestKind, Transport};

const REFRESH_PATH: &str = "/api/v1/auth/refresh";

type RefreshOutcome = Result<String, AuthError>;

/// The pending-request queue. Created when a refresh begins, drained
/// exactly once when it settles, discarded immediately after.
#[derive(Default)]
struct RefreshSlot {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    signals: SignalBus,
    refresh: Mutex<RefreshSlot>,
    refresh_timeout: Duration,
    early_refresh_margin_ms: i64,
}

impl RequestGateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
        signals: SignalBus,
        config: &SyncConfig,
    ) -> Self {
        Self {
            transport,
            credentials,
            signals,
            refresh: Mutex::new(RefreshSlot::default()),
            refresh_timeout: Duration::from_millis(config.refresh_timeout_ms),
            early_refresh_margin_ms: config.early_refresh_margin_ms,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    /// Transmit a request with the current access token attached.
    ///
    /// A 401 on a standard, first-attempt request triggers the refresh
    /// protocol and a single replay. A 401 on an auth-surface request, or on
    /// a request that was already retried, is terminal. All other transport
    /// and HTTP errors pass through uninterpreted.
    pub async fn send(&self, request: RequestDescriptor) -> CadenceResult<ApiEnvelope<Value>> {
        let pair = self.credentials.load().await.map_err(CadenceError::from)?;
        if let Some(pair) = &pair {
            if pair.is_expiring_within(Utc::now().timestamp_millis(), self.early_refresh_margin_ms)
            {
                tracing::debug!("access token is nearing its expiry hint");
            }
        }

        let bearer = pair.as_ref().map(|p| p.access_token.as_str());
        let reply = self.transport.execute(&request, bearer).await?;
        if !reply.is_unauthorized() {
            return parse_envelope(reply);
        }

        if request.kind == RequestKind::Auth || request.attempt >= 1 {
            return Err(self
                .terminal_failure("authorization failed with no retry available")
                .await
                .into());
        }

        tracing::debug!(path = %request.path, "authorization failure, entering refresh protocol");
        let token = self.refreshed_access_token().await?;

        let retry = request.next_attempt();
        let reply = self.transport.execute(&retry, Some(token.as_str())).await?;
        if reply.is_unauthorized() {
            return Err(self
                .terminal_failure("request rejected again after refresh")
                .await
                .into());
        }
        parse_envelope(reply)
    }

    /// Resolve to a usable access token via the single-flight refresh.
    ///
    /// The first caller becomes the refresher; every concurrent caller
    /// suspends on the pending queue and shares the refresher's outcome.
    async fn refreshed_access_token(&self) -> Result<String, AuthError> {
        let refresh_token = match self.credentials.refresh_token().await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read refresh token");
                None
            }
        };
        let Some(refresh_token) = refresh_token else {
            self.clear_and_signal().await;
            return Err(AuthError::MissingRefreshToken);
        };

        let waiter = {
            let mut slot = self.refresh.lock().await;
            if slot.in_flight {
                let (tx, rx) = oneshot::channel();
                slot.waiters.push(tx);
                Some(rx)
            } else {
                slot.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            return rx.await.unwrap_or(Err(AuthError::Terminal {
                reason: "refresh abandoned".to_string(),
            }));
        }

        let outcome = self.run_refresh(refresh_token).await;

        let waiters = {
            let mut slot = self.refresh.lock().await;
            slot.in_flight = false;
            std::mem::take(&mut slot.waiters)
        };
        tracing::debug!(
            queued = waiters.len(),
            ok = outcome.is_ok(),
            "refresh settled, draining pending queue"
        );
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }

    /// One refresh network call, bounded by the configured timeout. Every
    /// failure path settles terminally: credentials cleared, queue rejected.
    async fn run_refresh(&self, refresh_token: String) -> RefreshOutcome {
        tracing::debug!("credential refresh started");
        let body = serde_json::to_value(RefreshRequest { refresh_token }).map_err(|err| {
            AuthError::Terminal {
                reason: format!("failed to encode refresh request: {err}"),
            }
        })?;
        let request = RequestDescriptor::post(REFRESH_PATH, body).auth();

        let reply = match tokio::time::timeout(
            self.refresh_timeout,
            self.transport.execute(&request, None),
        )
        .await
        {
            Err(_) => {
                return Err(self.terminal_failure("credential refresh timed out").await);
            }
            Ok(Err(err)) => {
                return Err(self
                    .terminal_failure(&format!("credential refresh failed: {err}"))
                    .await);
            }
            Ok(Ok(reply)) => reply,
        };

        if !reply.is_success() {
            return Err(self
                .terminal_failure(&format!("credential refresh rejected (status {})", reply.status))
                .await);
        }

        let envelope: ApiEnvelope<RefreshResponse> = match serde_json::from_value(reply.body) {
            Ok(envelope) => envelope,
            Err(err) => {
                return Err(self
                    .terminal_failure(&format!("malformed refresh response: {err}"))
                    .await);
            }
        };
        let Some(data) = envelope.data else {
            return Err(self.terminal_failure("refresh response carried no data").await);
        };

        let expires_at_ms = data
            .expires_in
            .map(|seconds| Utc::now().timestamp_millis() + seconds * 1000);
        let Some(pair) = CredentialPair::new(data.access_token, data.refresh_token, expires_at_ms)
        else {
            return Err(self.terminal_failure("refresh returned empty tokens").await);
        };

        if let Err(err) = self.credentials.save(&pair).await {
            return Err(self
                .terminal_failure(&format!("failed to persist refreshed credentials: {err}"))
                .await);
        }

        self.signals.emit(SyncSignal::CredentialsUpdated);
        tracing::debug!("credential refresh settled ok");
        Ok(pair.access_token)
    }

    async fn terminal_failure(&self, reason: &str) -> AuthError {
        self.clear_and_signal().await;
        AuthError::Terminal {
            reason: reason.to_string(),
        }
    }

    /// Clear stored credentials and broadcast the redirect trigger. The
    /// signal is the UI's cue to move to the unauthenticated surface; it is
    /// safe to receive while already there.
    async fn clear_and_signal(&self) {
        if let Err(err) = self.credentials.clear().await {
            tracing::warn!(error = %err, "failed to clear credentials after terminal auth failure");
        }
        self.signals.emit(SyncSignal::CredentialsCleared);
    }
}

fn parse_envelope(reply: HttpReply) -> CadenceResult<ApiEnvelope<Value>> {
    if reply.is_success() {
        serde_json::from_value(reply.body).map_err(|err| {
            TransportError::Serialization {
                reason: err.to_string(),
            }
            .into()
        })
    } else {
        let reason = reply
            .body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        Err(TransportError::InvalidResponse {
            status: reply.status,
            reason,
        }
        .into())
    }
}
