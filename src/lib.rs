pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::LocalStorage;
pub use app::service::{build_engine, load_document};
pub use config::VerifierConfig;
pub use core::engine::{VerificationEngine, VerificationOutcome, VerificationReport};
pub use utils::error::{Result, VerifyError};
