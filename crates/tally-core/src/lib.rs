//! Domain layer for Tally: sessions, choices, ranking and view state.

pub mod config;
pub mod error;
pub mod ranking;
pub mod session;
pub mod view;

// Re-export common error type
pub use error::TallyError;
