pub mod app;
pub mod config;
pub mod databases;
pub mod domain;
pub mod error;
pub mod export;
pub mod model;
pub mod normalize;
pub mod report;
pub mod resolve;
pub mod targets;
pub mod taxonomy;
