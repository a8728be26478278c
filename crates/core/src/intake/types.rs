//! Order types as exchanged with the order service.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::ContentType;
use crate::matcher::MatchCriteria;

/// A customer order for a prepared storage device.
///
/// Deserializes the order service's wire format: `product_type` is one of
/// `music`, `videos` or `movies` and `capacity` is a size string such as
/// `"8GB"`. Plain byte counts and the catalog's own type names are accepted
/// too, so the same shape serves the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(rename = "product_type", alias = "content_type")]
    pub content_type: ContentType,
    #[serde(
        rename = "capacity",
        alias = "capacity_bytes",
        deserialize_with = "deserialize_capacity"
    )]
    pub capacity_bytes: u64,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub artists: Vec<String>,
    /// Specific video titles requested, informational.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<String>,
    /// Specific movie titles requested, informational.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub movies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Order {
    pub fn new(
        order_id: impl Into<String>,
        content_type: ContentType,
        capacity_bytes: u64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            order_number: String::new(),
            customer_name: String::new(),
            customer_phone: String::new(),
            content_type,
            capacity_bytes,
            genres: Vec::new(),
            artists: Vec::new(),
            videos: Vec::new(),
            movies: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists = artists.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_customer(mut self, name: impl Into<String>, phone: impl Into<String>) -> Self {
        self.customer_name = name.into();
        self.customer_phone = phone.into();
        self
    }

    /// Match criteria with normalized tags.
    pub fn criteria(&self) -> MatchCriteria {
        MatchCriteria::new(self.content_type)
            .with_genres(self.genres.iter())
            .with_artists(self.artists.iter())
    }

    /// Human-readable job name.
    pub fn display_name(&self) -> String {
        let label = if self.order_number.is_empty() {
            &self.order_id
        } else {
            &self.order_number
        };
        if self.customer_name.is_empty() {
            format!("Order {}", label)
        } else {
            format!("Order {} ({})", label, self.customer_name)
        }
    }
}

static CAPACITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*([KMGT]?B)?\s*$").unwrap());

/// Parse a capacity such as `"8GB"`, `"512 MB"` or `"1000"`.
///
/// Units are decimal, as storage devices are sold: 1 GB = 10^9 bytes.
pub fn parse_capacity(raw: &str) -> Option<u64> {
    let caps = CAPACITY_RE.captures(raw)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        None => 1.0,
        Some(unit) => match unit.as_str() {
            "B" => 1.0,
            "KB" => 1e3,
            "MB" => 1e6,
            "GB" => 1e9,
            "TB" => 1e12,
            _ => return None,
        },
    };
    Some((value * multiplier).round() as u64)
}

fn deserialize_capacity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCapacity {
        Bytes(u64),
        Text(String),
    }

    match RawCapacity::deserialize(deserializer)? {
        RawCapacity::Bytes(bytes) => Ok(bytes),
        RawCapacity::Text(text) => parse_capacity(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid capacity '{}'", text))),
    }
}

/// Body of `GET /api/orders/pending`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingOrdersResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// Body returned by the order lifecycle endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub success: bool,
}

/// An order waiting in the inbox for an operator to confirm.
#[derive(Debug, Clone, Serialize)]
pub struct PendingOrder {
    pub order: Order,
    pub received_at: DateTime<Utc>,
}
