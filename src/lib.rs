pub mod auth;
pub mod config;
pub mod content;
pub mod logger;
pub mod paginator;
pub mod post_repository;
pub mod query_string;
pub mod server;
pub mod storage;
pub mod util;
pub mod view;
