//! HTTP Layer - RESTful API
//!
//! 把两级缓存暴露为一组 JSON 接口，音频接口直接返回 MP3

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{build_router, HttpServer};
pub use state::AppState;
