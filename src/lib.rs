pub mod browser;
pub mod common_scraper;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod persistence;
pub mod progress;
pub mod runner;
pub mod scrapers;
