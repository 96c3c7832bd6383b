//! Meadowhive library crate — re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the headless simulation driver. This
//! library crate exposes the same modules so that `tests/` integration
//! tests can import resources, events, and systems directly.

pub mod almanac;
pub mod bees;
pub mod experience;
pub mod hives;
pub mod orders;
pub mod save;
pub mod shared;
