pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod media;
pub mod middleware;
pub mod policy;
pub mod session;
pub mod state;
pub mod workflows;
