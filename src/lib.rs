//! brandscan - Batch brand-presence checker for Russian marketplaces
//!
//! Reads a brand list from a spreadsheet, runs a cascade of detection
//! strategies against each marketplace's search pages, and writes one
//! present/absent/unknown verdict per (brand, marketplace) back.

pub mod brand;
pub mod commands;
pub mod config;
pub mod detect;
pub mod fetch;
pub mod format;
pub mod marketplace;
pub mod runner;
pub mod session;
pub mod sheet;

pub use brand::Brand;
pub use config::Config;
pub use detect::Verdict;
pub use marketplace::Marketplace;
