//! Template model, catalog and position resolution.

/// Template lookup and request-data validation.
pub mod catalog;
/// Serde model of poster templates.
pub mod model;
/// Anchor and pixel position resolution.
pub mod position;
