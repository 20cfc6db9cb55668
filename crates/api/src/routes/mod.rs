//! HTTP handlers, one module per resource.

pub mod health;
pub mod inventory;
pub mod metrics;
pub mod orders;
pub mod recommendations;
pub mod reporting;
pub mod stock;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path segment into an id.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
