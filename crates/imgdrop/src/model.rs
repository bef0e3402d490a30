//! Wire and domain types for the image service.
//!
//! [`UploadResponse`] mirrors the JSON the server sends back from an upload.
//! [`UploadOutcome`] is the typed interpretation the rest of the crate works
//! with, so nothing downstream has to probe `message`/`error`/`detail` by hand.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::Result;

/// JSON body returned by `POST /upload/`, on success and on failure.
///
/// Every field is optional on the wire; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    /// Human-readable success message.
    pub message: Option<String>,
    /// Error text some handlers return instead of `message`.
    pub error: Option<String>,
    /// Validation error detail sent with non-success statuses.
    pub detail: Option<String>,
    /// Link to the processed artifact.
    pub url: Option<String>,
    /// Name the server stored the artifact under.
    pub filename: Option<String>,
    /// Compression statistics, when the server reports them.
    ///
    /// A block that does not match [`FileStats`] is dropped on its own and
    /// never fails the rest of the response.
    #[serde(deserialize_with = "lenient_stats")]
    pub stats: Option<FileStats>,
}

fn lenient_stats<'de, D>(deserializer: D) -> std::result::Result<Option<FileStats>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(stats) => Ok(Some(stats)),
        Err(err) => {
            warn!("ignoring malformed upload stats: {err}");
            Ok(None)
        }
    }
}

/// Compression statistics for one processed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    /// Size of the uploaded file in bytes.
    pub original_size: f64,
    /// Size of the processed file in bytes.
    pub compressed_size: f64,
    /// Reduction in percent.
    pub compression_ratio: f64,
    /// Quality setting used by the encoder.
    pub quality: f64,
    /// Output format label (e.g. `JPEG`).
    pub format: String,
}

/// Display-ready rendering of [`FileStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPanel {
    /// Original size, e.g. `200.0 KB`.
    pub original_size: String,
    /// Compressed size, e.g. `50.0 KB`.
    pub compressed_size: String,
    /// Compression, e.g. `75% smaller`.
    pub compression: String,
    /// Quality, e.g. `85%`.
    pub quality: String,
    /// Format label.
    pub format: String,
}

impl From<&FileStats> for StatsPanel {
    fn from(stats: &FileStats) -> Self {
        Self {
            original_size: format_kilobytes(stats.original_size),
            compressed_size: format_kilobytes(stats.compressed_size),
            compression: format!("{}% smaller", stats.compression_ratio),
            quality: format!("{}%", stats.quality),
            format: stats.format.clone(),
        }
    }
}

/// Format a byte count as kilobytes with one decimal place.
///
/// Rounds half up on the exact value, so 1280 bytes is `1.3 KB`.
#[must_use]
pub fn format_kilobytes(bytes: f64) -> String {
    let tenths = (bytes * 10.0 / 1024.0 + 0.5).floor();
    format!("{:.1} KB", tenths / 10.0)
}

/// Typed result of one upload request.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The server accepted the upload (2xx status).
    Completed {
        /// Text to show the user.
        message: String,
        /// Link to the processed artifact, if one was produced.
        url: Option<String>,
        /// Compression statistics, if reported.
        stats: Option<FileStats>,
    },
    /// The server rejected the upload (non-2xx status).
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Text to show the user.
        message: String,
    },
}

impl UploadOutcome {
    /// Interpret a raw upload reply.
    ///
    /// Empty strings count as absent. A rejected reply without `detail` or
    /// `error` carries `fallback` as its message.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON object of the expected shape,
    /// whatever the status.
    pub fn from_reply(status: u16, body: &[u8], fallback: &str) -> Result<Self> {
        let response: UploadResponse = serde_json::from_slice(body)?;
        Ok(Self::from_response(status, response, fallback))
    }

    /// Interpret an already decoded upload response.
    #[must_use]
    pub fn from_response(status: u16, response: UploadResponse, fallback: &str) -> Self {
        let UploadResponse {
            message,
            error,
            detail,
            url,
            stats,
            ..
        } = response;

        if (200..300).contains(&status) {
            Self::Completed {
                message: non_empty(message).or(non_empty(error)).unwrap_or_default(),
                url: non_empty(url),
                stats,
            }
        } else {
            Self::Rejected {
                status,
                message: non_empty(detail)
                    .or(non_empty(error))
                    .unwrap_or_else(|| fallback.to_string()),
            }
        }
    }

    /// The text shown to the user for this outcome.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Completed { message, .. } | Self::Rejected { message, .. } => message,
        }
    }

    /// Whether the server accepted the upload.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Link to the processed artifact, only for completed uploads.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Completed { url, .. } => url.as_deref(),
            Self::Rejected { .. } => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// A previously processed image: display name and link.
///
/// Encoded on the wire as a two-element array `[name, url]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ImageListing {
    /// Display name.
    pub name: String,
    /// Link target.
    pub url: String,
}

impl ImageListing {
    /// Create a new listing.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl From<(String, String)> for ImageListing {
    fn from((name, url): (String, String)) -> Self {
        Self { name, url }
    }
}

impl From<ImageListing> for (String, String) {
    fn from(listing: ImageListing) -> Self {
        (listing.name, listing.url)
    }
}

impl ImageListing {
    /// Read a listing from one `/images` entry.
    ///
    /// Takes the first two elements as name and link and ignores the rest.
    /// Returns `None` unless both are strings.
    #[must_use]
    pub fn from_entry(entry: &Value) -> Option<Self> {
        match entry.as_array()?.as_slice() {
            [Value::String(name), Value::String(url), ..] => Some(Self::new(name, url)),
            _ => None,
        }
    }
}

/// JSON body returned by `GET /images`, ordered oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageList {
    /// All known results. Entries that are not `[name, url]` pairs are skipped.
    #[serde(deserialize_with = "lenient_listings")]
    pub images: Vec<ImageListing>,
}

fn lenient_listings<'de, D>(deserializer: D) -> std::result::Result<Vec<ImageListing>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<Value>::deserialize(deserializer)?;
    Ok(entries
        .iter()
        .filter_map(|entry| {
            let listing = ImageListing::from_entry(entry);
            if listing.is_none() {
                warn!("skipping malformed image entry: {entry}");
            }
            listing
        })
        .collect())
}

/// The last `limit` entries of `listings`, in their original order.
#[must_use]
pub fn most_recent(listings: &[ImageListing], limit: usize) -> &[ImageListing] {
    &listings[listings.len().saturating_sub(limit)..]
}

/// JSON body returned by `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelcomeResponse {
    /// Greeting text.
    pub message: String,
}
