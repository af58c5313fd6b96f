//! Wire types returned by the remote catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side processing state of a media item.
///
/// Only [`Readiness::Ready`] items are synchronized. Unrecognised values
/// decode as [`Readiness::Unknown`] so a new server state never breaks listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Processing,
    Failed,
    #[serde(other)]
    Unknown,
}

impl Readiness {
    /// Convert to the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Processing => "processing",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    /// Parse from the string stored in the database.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ready" => Some(Self::Ready),
            "processing" => Some(Self::Processing),
            "failed" => Some(Self::Failed),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    #[serde(other)]
    Other,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Summary of one remote media item as it appears in a listing page.
///
/// `id` is assigned by the remote service and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSummary {
    pub id: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub camera_model: Option<String>,
    pub size_bytes: u64,
    pub status: Readiness,
    #[serde(default)]
    pub resolution: String,
    /// Present only for time-based media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    pub kind: MediaKind,
    pub width: u32,
    pub height: u32,
}

impl MediaSummary {
    pub fn is_ready(&self) -> bool {
        self.status == Readiness::Ready
    }
}

/// One page of a catalog listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPage {
    #[serde(default)]
    pub items: Vec<MediaSummary>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
