//! Library half of teradrop: resolvers, processing and the HTTP server.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;
pub mod server;
pub mod services;
pub mod storage;

pub use error::ResolveError;
pub use models::{FormatOption, ProcessedFile, ResolveResult};
