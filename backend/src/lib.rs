pub mod config;
pub mod coverage;
pub mod dispatch;
pub mod error;
pub mod fallback;
pub mod fulfillment;
pub mod manifest;
pub mod models;
pub mod pallets;
pub mod server;
pub mod submitter;
