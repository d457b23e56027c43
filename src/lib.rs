pub mod analysis;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod jobs;
pub mod models;
pub mod providers;
pub mod stats;
