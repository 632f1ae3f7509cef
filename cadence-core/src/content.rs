//! Content records, partial-update payloads, and derived stats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned content identifier. Opaque to the client; compared only
/// for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Publication lifecycle state of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Scheduled,
    Published,
    Failed,
}

/// A single scheduled/published content item as the server reports it.
///
/// Engagement counters default to zero when the server omits them for
/// not-yet-published items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: ContentId,
    pub title: String,
    pub status: ContentStatus,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Partial update for a content item. Only set fields are applied; the
/// record's identity never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ContentItem {
    /// Apply a patch, producing the updated record. The original is not
    /// mutated; identity and creation time are preserved.
    pub fn with_patch(&self, patch: &ContentPatch) -> ContentItem {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = title.clone();
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(views) = patch.views {
            next.views = views;
        }
        if let Some(likes) = patch.likes {
            next.likes = likes;
        }
        if let Some(comments) = patch.comments {
            next.comments = comments;
        }
        if let Some(shares) = patch.shares {
            next.shares = shares;
        }
        if let Some(scheduled_for) = patch.scheduled_for {
            next.scheduled_for = Some(scheduled_for);
        }
        if let Some(metadata) = &patch.metadata {
            next.metadata = Some(metadata.clone());
        }
        next
    }
}

/// Aggregate derived from the full content collection. Never stored or
/// mutated independently of the collection it was computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    /// Count of records currently in `scheduled` status.
    pub scheduled_count: u32,
    /// Engagement over published records, rounded percentage in [0, 100].
    pub engagement_rate: u8,
    /// Consecutive calendar days, ending today, with at least one record
    /// created on each day.
    pub streak: u32,
}

/// Server-defined profile document. The client persists and forwards it
/// without interpreting its shape.
pub type UserProfile = serde_json::Value;

/// The combined snapshot written to the cache in a single operation, so a
/// reader can never observe a collection without its matching aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub stats: ContentStats,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_item(id: &str) -> ContentItem {
        ContentItem {
            id: ContentId::from(id),
            title: "Test item".to_string(),
            status: ContentStatus::Scheduled,
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            created_at: Utc::now(),
            scheduled_for: None,
            metadata: None,
        }
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let item = make_item("a");
        let patched = item.with_patch(&ContentPatch {
            status: Some(ContentStatus::Published),
            views: Some(100),
            ..Default::default()
        });

        assert_eq!(patched.id, item.id);
        assert_eq!(patched.status, ContentStatus::Published);
        assert_eq!(patched.views, 100);
        assert_eq!(patched.title, item.title);
        assert_eq!(patched.created_at, item.created_at);
    }

    #[test]
    fn test_patch_leaves_original_untouched() {
        let item = make_item("a");
        let _ = item.with_patch(&ContentPatch {
            status: Some(ContentStatus::Failed),
            ..Default::default()
        });
        assert_eq!(item.status, ContentStatus::Scheduled);
    }

    #[test]
    fn test_content_item_round_trip() {
        let item = make_item("a");
        let json = serde_json::to_string(&item).unwrap();
        let back: ContentItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ContentStatus::Scheduled).unwrap();
        assert_eq!(json, "\"scheduled\"");
    }

    #[test]
    fn test_item_missing_counters_defaults_to_zero() {
        let json = r#"{
            "id": "x",
            "title": "Draft",
            "status": "draft",
            "createdAt": "2026-08-01T12:00:00Z"
        }"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.views, 0);
        assert_eq!(item.likes, 0);
    }
}
