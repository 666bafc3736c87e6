//! Job search provider implementations.
//!
//! Each module provides a struct implementing [`crate::provider::JobProvider`]
//! for one external listing API.

pub mod serpapi;

pub use serpapi::SerpApiProvider;
