//! Application layer: the in-memory session store and its durable write path.

pub mod session;

pub use session::{DurableOp, SessionStore, SessionUpdater, SessionWriter};
