//! Shared types, error model, and configuration for pagemark.
//!
//! This crate is the foundation depended on by all other pagemark crates.
//! It provides:
//! - [`PagemarkError`], the unified error type
//! - Domain types ([`ExtractProfile`])
//! - Configuration ([`AppConfig`], [`ExtractConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ExtractConfig, FetchConfig, config_dir, config_file_path, init_config,
    init_config_at, load_config, load_config_from,
};
pub use error::{PagemarkError, Result};
pub use types::ExtractProfile;
