//! Core data types for the buy alert bot.

pub mod address;
pub mod destination;
pub mod event;
pub mod market;
pub mod payload;

pub use address::*;
pub use destination::*;
pub use event::*;
pub use market::*;
pub use payload::*;
