pub mod config;
pub mod error;
pub mod inputs;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod summary;
