//! Configuration module for Job-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use job_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Listing source: {}", config.source.listing_url);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, DetailSelectors, ListingSelectors, OutputConfig, RetryConfig, SelectorConfig,
    SourceConfig, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
