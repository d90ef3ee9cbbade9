//! Where nodes are laid out.

use crate::arena::NodeHandle;
use std::ops::{Add, Mul, Sub};

/// A point in surface cells.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Position {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// An ordered container of attached nodes.
///
/// Layout is derived from order alone: moving a node means re-appending it.
pub trait Surface {
    /// Attaches `node` at the end, moving it there if already attached.
    fn append(&mut self, node: NodeHandle);

    /// Returns `false` if the node was not attached.
    fn detach(&mut self, node: NodeHandle) -> bool;

    /// Resting position of an attached node, ignoring any running transition.
    fn position(&self, node: NodeHandle) -> Option<Position>;

    /// Attached nodes, first to last.
    fn order(&self) -> &[NodeHandle];

    fn clear(&mut self);
}

/// A vertical list of equally tall rows.
#[derive(Debug, Clone)]
pub struct ListSurface {
    rows: Vec<NodeHandle>,
    row_height: f32,
}

impl ListSurface {
    pub fn new(row_height: f32) -> Self {
        Self {
            rows: Vec::new(),
            row_height,
        }
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for ListSurface {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Surface for ListSurface {
    fn append(&mut self, node: NodeHandle) {
        self.rows.retain(|row| *row != node);
        self.rows.push(node);
    }

    fn detach(&mut self, node: NodeHandle) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| *row != node);
        self.rows.len() != before
    }

    fn position(&self, node: NodeHandle) -> Option<Position> {
        self.rows
            .iter()
            .position(|row| *row == node)
            .map(|index| Position::new(0.0, index as f32 * self.row_height))
    }

    fn order(&self) -> &[NodeHandle] {
        &self.rows
    }

    fn clear(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeArena;

    #[test]
    fn test_append_moves_existing_rows() {
        let mut arena = NodeArena::new();
        let (a, b, c) = (arena.insert(()), arena.insert(()), arena.insert(()));
        let mut surface = ListSurface::new(3.0);

        for node in [a, b, c] {
            surface.append(node);
        }
        assert_eq!(surface.position(c), Some(Position::new(0.0, 6.0)));

        surface.append(a);
        assert_eq!(surface.order(), [b, c, a]);
        assert_eq!(surface.position(a), Some(Position::new(0.0, 6.0)));
        assert_eq!(surface.position(b), Some(Position::ZERO));
    }

    #[test]
    fn test_detach() {
        let mut arena = NodeArena::new();
        let (a, b) = (arena.insert(()), arena.insert(()));
        let mut surface = ListSurface::default();
        surface.append(a);
        surface.append(b);

        assert!(surface.detach(a));
        assert!(!surface.detach(a));
        assert_eq!(surface.position(a), None);
        assert_eq!(surface.position(b), Some(Position::ZERO));
    }
}
