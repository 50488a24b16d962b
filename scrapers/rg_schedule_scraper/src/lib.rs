pub mod config;
pub mod metrics;
pub mod normalizer;
pub mod polling;
pub mod schedule;
pub mod scheduler;
pub mod time_convert;
pub mod types;
pub mod web;
