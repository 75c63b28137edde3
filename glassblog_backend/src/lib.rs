pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod cli;
pub mod comments;
pub mod config;
pub mod database;
pub mod feed;
pub mod likes;
pub mod posts;
pub mod storage;
pub mod telemetry;
pub mod utils;
