//! Provider client adapters. Each adapter is feature-gated so the core
//! contracts stay dependency-light.

#[cfg(feature = "http-openai")]
pub mod openai_compatible;
