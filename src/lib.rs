pub mod aggregate;
pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
