pub mod app;
pub mod auth;
pub mod comments;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod posts;
pub mod repository;
pub mod state;
