//! Keyed, animated rendering of a session's ranking.
//!
//! - `arena`: generational storage for visual nodes
//! - `node`: per-choice row content and vote hooks
//! - `surface`: ordered layout target (`ListSurface` for terminal rows)
//! - `motion`: clock-driven transitions
//! - `reconciler`: `ChoiceList`, which keeps nodes in step with the ranking

pub mod arena;
pub mod motion;
pub mod node;
pub mod reconciler;
pub mod surface;

pub use arena::{NodeArena, NodeHandle};
pub use motion::{CubicBezier, MotionDriver, NodeStyle};
pub use node::{ChoiceNode, NodePhase, VoteCallback, VoteHooks};
pub use reconciler::{ChoiceList, RenderReport, RowView};
pub use surface::{ListSurface, Position, Surface};
