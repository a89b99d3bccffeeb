pub mod config;
pub mod cors;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod huggingface;
pub mod media;
pub mod server;

pub use config::AppConfig;
pub use server::{AppState, build_router};
