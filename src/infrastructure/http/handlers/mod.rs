//! HTTP Handlers

mod caption;
mod events;
mod health;

pub use caption::*;
pub use events::*;
pub use health::*;
