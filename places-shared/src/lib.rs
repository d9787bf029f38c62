//! # Places Shared
//!
//! This crate defines shared data structures and types used across the places
//! directory service. It includes the canonical `Place` document indexed by
//! the search backend.

pub mod types;

pub use types::place::{GeoPoint, Place};
