pub mod app;
pub mod config;
pub mod export;
pub mod job;
pub mod logging;
pub mod summary;
pub mod utils;
