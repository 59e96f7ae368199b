//! Framework adapters.

#[cfg(feature = "actix")]
pub mod actix;

#[cfg(feature = "axum_support")]
pub mod axum;
