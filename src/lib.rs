//! The Rust SDK for FeatureSwitches, a feature flag management service.
//!
//! # Overview
//!
//! The SDK revolves around a [`Client`] that decides whether a feature is enabled for a user.
//! Each feature is described by a [`FeatureRecord`]: a master switch, allow- and deny-lists of
//! user identifiers, and the target and progress of a percentage rollout.
//!
//! Features are fetched from the server on first use and kept in a [`FeatureCache`] for a
//! configurable time. While a feature is being rolled out, users that are not yet covered by the
//! local rules are checked against the server, and users confirmed by the server are remembered
//! in the cache.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum.
//!
//! Feature evaluation never fails: if a feature cannot be looked up, the caller-provided default
//! is returned. Other operations report errors for visibility, but it is safe to ignore them.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages under the `featureswitches` target. Consider integrating a `log`-compatible logger
//! implementation for better visibility into SDK operations.
//!
//! # Examples
//!
//! Examples can be found in the `demos` directory of the crate repository.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod client;
mod config;
mod engine;
mod error;
mod feature;
mod feature_cache;
mod feature_source;
mod http_source;

pub use client::Client;
pub use config::ClientConfig;
pub use engine::{EvaluationDetails, EvaluationEngine, EvaluationReason};
pub use error::{Error, Result};
pub use feature::FeatureRecord;
pub use feature_cache::{FeatureCache, InMemoryFeatureCache};
pub use feature_source::{RemoteFeatureSource, User};
pub use http_source::HttpFeatureSource;
