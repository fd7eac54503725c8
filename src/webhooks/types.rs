// src/webhooks/types.rs
//! Request and response bodies of the HTTP surface.

use crate::error::RevalidateError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `POST /api/revalidate`.
///
/// A `secret` that is not a JSON string decodes as `None` and is rejected as
/// unauthorized rather than as a malformed body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RevalidateRequest {
    #[serde(default, deserialize_with = "string_or_none")]
    pub secret: Option<String>,
}

impl RevalidateRequest {
    /// Decodes a raw request body. Any JSON document other than `null` is
    /// accepted; only unparseable bytes and `null` are `BadRequest`.
    pub fn from_body(body: &[u8]) -> Result<Self, RevalidateError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| RevalidateError::BadRequest(e.to_string()))?;
        if value.is_null() {
            return Err(RevalidateError::BadRequest("request body is null".to_string()));
        }
        Ok(Self {
            secret: value.get("secret").and_then(Value::as_str).map(str::to_string),
        })
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

/// Success acknowledgment of the revalidation webhook.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub message: String,
    pub timestamp: String,
}

impl RevalidateResponse {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            revalidated: true,
            message: "Vehicles cache cleared and pages marked for revalidation".to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Query string of `GET /api/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sort: Option<String>,
}

/// How a stale route pattern should be regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// A concrete path
    Path,
    /// A dynamic page template covering every concrete path it generates
    Page,
}

/// A route pattern the page layer must treat as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaleRoute {
    pub pattern: &'static str,
    pub kind: RouteKind,
}

/// Listing page plus the three dynamic vehicle page templates.
pub const INVENTORY_ROUTES: [StaleRoute; 4] = [
    StaleRoute {
        pattern: "/vehicles",
        kind: RouteKind::Path,
    },
    StaleRoute {
        pattern: "/vehicles/[manufacturer]",
        kind: RouteKind::Page,
    },
    StaleRoute {
        pattern: "/vehicles/[manufacturer]/[model]",
        kind: RouteKind::Page,
    },
    StaleRoute {
        pattern: "/vehicles/[manufacturer]/[model]/[id]",
        kind: RouteKind::Page,
    },
];
