//! `groupsmith-recon` — directory attribute reconciliation and group derivation.
//!
//! Pure engine crate: receives pre-loaded tables, returns canonicalization
//! rules, dynamic group catalogs and an access model.
//! No CLI or IO dependencies.

pub mod access;
pub mod canonicalize;
pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod groups;
pub mod model;
pub mod naming;

pub use config::EngineConfig;
pub use engine::run;
pub use error::EngineError;
pub use model::{EngineInput, RunResult, Table};
pub use naming::synthesize;
