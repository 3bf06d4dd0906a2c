//! HTTP Handlers

mod audio;
mod cache;
mod ping;

pub use audio::*;
pub use cache::*;
pub use ping::*;
