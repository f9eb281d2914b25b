//! Database query functions, one module per table.

pub mod aliases;
pub mod events;
pub mod feeds;
pub mod templates;
