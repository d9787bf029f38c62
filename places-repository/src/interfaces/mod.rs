//! Interface definitions for the place store.
//!
//! This module defines the abstract `PlaceStore` trait that allows for
//! dependency injection and swappable search backend implementations.

mod place_store;

pub use place_store::PlaceStore;
