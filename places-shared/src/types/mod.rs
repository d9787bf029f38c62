//! This module defines the core data structures used across the places
//! directory service. It re-exports specific types like `Place`.

pub mod place;

pub use place::{GeoPoint, Place};
