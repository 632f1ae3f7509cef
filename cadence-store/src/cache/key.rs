//! Resource keys, TTL classes, and the validity predicate.

use cadence_core::EpochMillis;

/// The cached resource bundles. Each key owns one cache entry plus a
/// matching last-fetched timestamp entry in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// Profile, content collection, and derived stats, written as one
    /// combined snapshot.
    ProfileBundle,
    /// AI-generated suggestion feed. Expensive to compute server-side,
    /// fast-changing.
    AiSuggestions,
    /// Analytics bundle.
    AnalyticsBundle,
    /// Trends bundle.
    TrendsBundle,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 4] = [
        ResourceKey::ProfileBundle,
        ResourceKey::AiSuggestions,
        ResourceKey::AnalyticsBundle,
        ResourceKey::TrendsBundle,
    ];

    /// The store key for the payload entry.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKey::ProfileBundle => "profile-bundle",
            ResourceKey::AiSuggestions => "ai-suggestions",
            ResourceKey::AnalyticsBundle => "analytics-bundle",
            ResourceKey::TrendsBundle => "trends-bundle",
        }
    }

    /// The store key for the matching last-fetched timestamp.
    pub fn fetched_at_key(&self) -> String {
        format!("{}:fetched-at", self.as_str())
    }

    /// The validity class is fixed per key; only the class durations are
    /// configurable.
    pub fn ttl_class(&self) -> TtlClass {
        match self {
            ResourceKey::AiSuggestions => TtlClass::Short,
            _ => TtlClass::Long,
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validity window class for a cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlClass {
    /// Slow-changing bundles: profile, user content, analytics, trends.
    Long,
    /// Fast-changing, expensive-to-recompute feeds.
    Short,
}

/// Configured durations for the two TTL classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Validity window for [`TtlClass::Long`] entries.
    pub long_ms: EpochMillis,
    /// Validity window for [`TtlClass::Short`] entries.
    pub short_ms: EpochMillis,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            long_ms: 24 * 60 * 60 * 1000,
            short_ms: 60 * 60 * 1000,
        }
    }
}

impl CachePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the long-class validity window.
    pub fn with_long_ms(mut self, long_ms: EpochMillis) -> Self {
        self.long_ms = long_ms;
        self
    }

    /// Set the short-class validity window.
    pub fn with_short_ms(mut self, short_ms: EpochMillis) -> Self {
        self.short_ms = short_ms;
        self
    }

    /// Duration for a TTL class.
    pub fn ttl_ms(&self, class: TtlClass) -> EpochMillis {
        match class {
            TtlClass::Long => self.long_ms,
            TtlClass::Short => self.short_ms,
        }
    }

    /// Is an entry fetched at `fetched_at_ms` still valid for `key` at
    /// `now_ms`?
    pub fn is_valid_at(
        &self,
        key: ResourceKey,
        fetched_at_ms: EpochMillis,
        now_ms: EpochMillis,
    ) -> bool {
        entry_is_valid(fetched_at_ms, self.ttl_ms(key.ttl_class()), now_ms)
    }
}

/// The validity predicate: an entry is VALID iff `now - fetched_at < ttl`.
/// Strict inequality; an entry exactly at its window edge is invalid.
pub fn entry_is_valid(
    fetched_at_ms: EpochMillis,
    ttl_ms: EpochMillis,
    now_ms: EpochMillis,
) -> bool {
    now_ms.saturating_sub(fetched_at_ms) < ttl_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;

    #[test]
    fn test_ttl_boundary() {
        let written_at = 1_700_000_000_000;
        assert!(entry_is_valid(written_at, HOUR_MS, written_at + 3_599_999));
        assert!(!entry_is_valid(written_at, HOUR_MS, written_at + 3_600_000));
        assert!(!entry_is_valid(written_at, HOUR_MS, written_at + 3_600_001));
    }

    #[test]
    fn test_key_class_assignment() {
        assert_eq!(ResourceKey::AiSuggestions.ttl_class(), TtlClass::Short);
        assert_eq!(ResourceKey::ProfileBundle.ttl_class(), TtlClass::Long);
        assert_eq!(ResourceKey::AnalyticsBundle.ttl_class(), TtlClass::Long);
        assert_eq!(ResourceKey::TrendsBundle.ttl_class(), TtlClass::Long);
    }

    #[test]
    fn test_key_strings() {
        assert_eq!(ResourceKey::ProfileBundle.as_str(), "profile-bundle");
        assert_eq!(
            ResourceKey::AiSuggestions.fetched_at_key(),
            "ai-suggestions:fetched-at"
        );
    }

    #[test]
    fn test_policy_builder() {
        let policy = CachePolicy::new()
            .with_long_ms(10 * HOUR_MS)
            .with_short_ms(HOUR_MS / 2);
        assert_eq!(policy.ttl_ms(TtlClass::Long), 10 * HOUR_MS);
        assert_eq!(policy.ttl_ms(TtlClass::Short), HOUR_MS / 2);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// An entry valid at some instant is valid at every earlier instant
        /// back to its write; validity never flickers back on as time moves
        /// forward.
        #[test]
        fn prop_validity_is_monotonic(
            fetched_at in 0i64..1_000_000,
            ttl in 1i64..1_000_000,
            elapsed in 0i64..2_000_000,
        ) {
            let now = fetched_at + elapsed;
            if entry_is_valid(fetched_at, ttl, now) {
                prop_assert!(entry_is_valid(fetched_at, ttl, now - 1));
            } else {
                prop_assert!(!entry_is_valid(fetched_at, ttl, now + 1));
            }
        }

        /// An entry is always valid at the instant it was written.
        #[test]
        fn prop_valid_at_write_time(
            fetched_at in 0i64..1_000_000,
            ttl in 1i64..1_000_000,
        ) {
            prop_assert!(entry_is_valid(fetched_at, ttl, fetched_at));
        }
    }
}
