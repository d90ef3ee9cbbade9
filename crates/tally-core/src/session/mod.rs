//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Core domain model (`Session`, `Choice`, `ChoiceDraft`, `VoteDelta`)
//! - `repository`: Repository trait for session persistence

mod model;
mod repository;

// Re-export public API
pub use model::{
    Choice, ChoiceDraft, DEFAULT_DRAFT_EMOJI, FALLBACK_EMOJI, MIN_CHOICES, Session, VoteDelta,
};
pub use repository::SessionRepository;
