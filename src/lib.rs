pub mod analysis;
pub mod app_state;
pub mod browser;
pub mod config;
pub mod extractor;
pub mod health;
pub mod miner;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod routes;
