//! API request handlers

mod events;
mod health;
mod sessions;

pub use events::*;
pub use health::*;
pub use sessions::*;
