//! Session application services.
//!
//! `SessionStore` owns the loaded sessions and applies every mutation to memory
//! first. The durable half of each mutation goes through `SessionWriter`, which
//! serializes writes per session and performs each read-modify-write with
//! `SessionUpdater`.

mod store;
mod updater;
mod writer;

pub use store::SessionStore;
pub use updater::SessionUpdater;
pub use writer::{DurableOp, SessionWriter};
