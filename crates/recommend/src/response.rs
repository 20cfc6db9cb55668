//! Recommendation shapes and lenient parsing of generator output.

use std::fmt;
use std::str::FromStr;

use common::ItemId;
use serde::{Deserialize, Deserializer, Serialize};

use crate::RecommendError;

/// Audience a recommendation is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendRole {
    Client,
    Owner,
}

impl RecommendRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendRole::Client => "client",
            RecommendRole::Owner => "owner",
        }
    }
}

impl fmt::Display for RecommendRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendRole {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(RecommendRole::Client),
            "owner" => Ok(RecommendRole::Owner),
            other => Err(RecommendError::InvalidRole(other.to_string())),
        }
    }
}

/// A product suggestion for a shopper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecommendation {
    pub item_name: String,
    pub item_id: ItemId,
    pub reason: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Restock,
    NewProduct,
}

/// A restock or new-product suggestion for the business owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerRecommendation {
    pub item_name: String,
    pub reason: String,
    pub priority: Priority,
    /// `None` for products not yet carried.
    #[serde(default, deserialize_with = "whole_number")]
    pub current_stock: Option<i64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecommendationKind>,
}

/// Accepts `3` and `3.0`; rejects fractional or out-of-range numbers.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if value.fract() != 0.0 || value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a whole number, got {value}"
        )));
    }
    Ok(Some(value as i64))
}

/// Parsed recommendations for either audience.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Recommendations {
    Client(Vec<ClientRecommendation>),
    Owner(Vec<OwnerRecommendation>),
}

impl Recommendations {
    pub fn empty(role: RecommendRole) -> Self {
        match role {
            RecommendRole::Client => Recommendations::Client(Vec::new()),
            RecommendRole::Owner => Recommendations::Owner(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Recommendations::Client(r) => r.len(),
            Recommendations::Owner(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Body returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Recommendations,
    pub role: RecommendRole,
}

/// Removes a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parses generator output into recommendations for `role`.
///
/// Output that is not a JSON array of the expected shape yields an empty
/// list; the caller still gets a successful response.
pub fn parse_recommendations(raw: &str, role: RecommendRole) -> Recommendations {
    let body = strip_code_fence(raw);
    let parsed = match role {
        RecommendRole::Client => {
            serde_json::from_str::<Vec<ClientRecommendation>>(body).map(Recommendations::Client)
        }
        RecommendRole::Owner => {
            serde_json::from_str::<Vec<OwnerRecommendation>>(body).map(Recommendations::Owner)
        }
    };

    match parsed {
        Ok(recommendations) => recommendations,
        Err(e) => {
            tracing::warn!(%role, error = %e, "Unparseable recommendation output");
            metrics::counter!("recommendations_degraded_total", "role" => role.as_str())
                .increment(1);
            Recommendations::empty(role)
        }
    }
}
