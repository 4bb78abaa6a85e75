mod config;
pub use config::Config;

pub mod http;
pub mod model;
pub mod service;

/// The static schema applied by `muster migrate`.
pub const SCHEMA: &str = include_str!("../schema.sql");
