//! Credential pair data type and expiry predicate.

use crate::EpochMillis;
use serde::{Deserialize, Serialize};

/// The access/refresh credential pair with its optional expiry hint.
///
/// `expires_at_ms` is a soft early-refresh hint only. The server's 401
/// response is the ground truth for expiry; this field never gates a
/// request on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at_ms: Option<EpochMillis>,
}

impl CredentialPair {
    /// Construct a pair, rejecting empty tokens. A pair with an empty token
    /// is never valid to store.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at_ms: Option<EpochMillis>,
    ) -> Option<Self> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        if access_token.is_empty() || refresh_token.is_empty() {
            return None;
        }
        Some(Self {
            access_token,
            refresh_token,
            expires_at_ms,
        })
    }

    /// Soft predicate: does the expiry hint fall within `margin_ms` of
    /// `now_ms`? Pairs without a hint never report as expiring.
    pub fn is_expiring_within(&self, now_ms: EpochMillis, margin_ms: EpochMillis) -> bool {
        match self.expires_at_ms {
            Some(expires_at) => expires_at.saturating_sub(now_ms) <= margin_ms,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_tokens() {
        assert!(CredentialPair::new("", "r", None).is_none());
        assert!(CredentialPair::new("a", "", None).is_none());
        assert!(CredentialPair::new("a", "r", None).is_some());
    }

    #[test]
    fn test_expiry_hint_within_margin() {
        let pair = CredentialPair::new("a", "r", Some(10_000)).unwrap();
        assert!(pair.is_expiring_within(9_500, 1_000));
        assert!(pair.is_expiring_within(11_000, 1_000));
        assert!(!pair.is_expiring_within(5_000, 1_000));
    }

    #[test]
    fn test_no_hint_never_expiring() {
        let pair = CredentialPair::new("a", "r", None).unwrap();
        assert!(!pair.is_expiring_within(i64::MAX, i64::MAX));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Once a pair reports as expiring, it keeps reporting so as time
        /// advances.
        #[test]
        fn prop_expiring_is_monotonic_in_now(
            expires_at in 0i64..1_000_000,
            margin in 0i64..100_000,
            now in 0i64..1_000_000,
            advance in 0i64..100_000,
        ) {
            let pair = CredentialPair::new("a", "r", Some(expires_at)).unwrap();
            if pair.is_expiring_within(now, margin) {
                prop_assert!(pair.is_expiring_within(now + advance, margin));
            }
        }
    }
}
