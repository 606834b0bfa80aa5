pub mod catalog;
pub mod config;
pub mod cost;
pub mod engine;
pub mod output;
pub mod pricing;
pub mod ranking;
pub mod search;
pub mod server;
