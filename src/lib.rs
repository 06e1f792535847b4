//! Zelkova - Korean public-data property analysis pipeline.
//!
//! Resolves free-text addresses to coordinates through a multi-provider
//! fallback chain, joins building-ledger and land-registry lookups, and
//! merges everything into one scored analysis result.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod resolve;

pub use aggregate::AnalysisService;
pub use config::Config;
pub use error::ProviderError;
pub use models::{AdminCodes, AnalysisResult, ResolveMethod, ResolvedCoordinate};
