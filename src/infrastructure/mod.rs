pub mod config;
pub mod engine;
pub mod fetcher;
pub mod http;
pub mod temp;
pub mod transcoder;
