//! Request handlers.

pub mod health;
pub mod search;
pub mod videos;

pub use health::*;
pub use search::*;
pub use videos::*;
