//! Motion driver: clock-driven tweens for row position, bar width and
//! enter/exit transitions.
//!
//! The driver never reads a wall clock. Callers move time forward with
//! [`MotionDriver::advance`] and sample the current look of a node with
//! [`MotionDriver::style`], which makes every transition reproducible.

use crate::arena::NodeHandle;
use crate::surface::Position;
use std::collections::BTreeMap;
use std::time::Duration;
use tally_core::config::MotionConfig;

/// Scale an exiting node shrinks to.
const EXIT_SCALE: f32 = 0.95;

/// CSS-style `cubic-bezier(x1, y1, x2, y2)` timing curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl CubicBezier {
    /// Fast start, long settle. Used for reorders, enters and bar growth.
    pub const STANDARD: Self = Self::new(0.2, 0.8, 0.2, 1.0);
    pub const EASE_OUT: Self = Self::new(0.0, 0.0, 0.58, 1.0);
    pub const LINEAR: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Maps linear progress `x` in `[0, 1]` to eased progress.
    pub fn ease(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }

        let t = self.solve_t(x);
        bezier(self.y1, self.y2, t)
    }

    /// Finds the curve parameter whose x equals `x`.
    fn solve_t(&self, x: f32) -> f32 {
        const EPSILON: f32 = 1e-5;

        let mut t = x;
        for _ in 0..8 {
            let error = bezier(self.x1, self.x2, t) - x;
            if error.abs() < EPSILON {
                return t;
            }
            let slope = bezier_slope(self.x1, self.x2, t);
            if slope.abs() < 1e-6 {
                break;
            }
            t = (t - error / slope).clamp(0.0, 1.0);
        }

        // Newton stalled; bisect.
        let (mut low, mut high) = (0.0_f32, 1.0_f32);
        t = x;
        for _ in 0..32 {
            let value = bezier(self.x1, self.x2, t);
            if (value - x).abs() < EPSILON {
                break;
            }
            if value < x {
                low = t;
            } else {
                high = t;
            }
            t = (low + high) / 2.0;
        }
        t
    }
}

/// One axis of a cubic bezier anchored at 0 and 1.
fn bezier(a1: f32, a2: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * t * a1 + 3.0 * u * t * t * a2 + t * t * t
}

fn bezier_slope(a1: f32, a2: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * a1 + 6.0 * u * t * (a2 - a1) + 3.0 * t * t * (1.0 - a2)
}

/// Values a [`Tween`] can interpolate.
pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Position {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

/// A fixed-duration eased interpolation started at a point on the driver clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T> {
    pub from: T,
    pub to: T,
    start: Duration,
    duration: Duration,
    easing: CubicBezier,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, start: Duration, duration: Duration, easing: CubicBezier) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    /// Linear progress in `[0, 1]`. Zero-length tweens are always complete.
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn sample(&self, now: Duration) -> T {
        self.from.lerp(self.to, self.easing.ease(self.progress(now)))
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.start + self.duration
    }
}

/// How a node looks at the current instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    /// Offset from the node's resting position
    pub offset: Position,
    pub opacity: f32,
    pub scale: f32,
    /// Bar width, 0–100
    pub bar: f32,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            offset: Position::ZERO,
            opacity: 1.0,
            scale: 1.0,
            bar: 0.0,
        }
    }
}

#[derive(Debug, Default)]
struct NodeMotion {
    offset: Option<Tween<Position>>,
    bar: Option<Tween<f32>>,
    /// Last bar value that finished (or was interrupted)
    bar_value: f32,
    enter: Option<Tween<f32>>,
    exit: Option<Tween<f32>>,
}

impl NodeMotion {
    fn is_idle(&self) -> bool {
        self.offset.is_none() && self.bar.is_none() && self.enter.is_none() && self.exit.is_none()
    }
}

#[derive(Debug)]
pub struct MotionDriver {
    config: MotionConfig,
    now: Duration,
    nodes: BTreeMap<NodeHandle, NodeMotion>,
}

impl MotionDriver {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            now: Duration::ZERO,
            nodes: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Applies to transitions started from now on.
    pub fn set_config(&mut self, config: MotionConfig) {
        self.config = config;
    }

    /// Slides `node` from `delta` (old minus new position) back to rest.
    ///
    /// An offset still in flight is carried over, so interrupted slides never
    /// jump. Returns `false` for a zero delta.
    pub fn play_position(&mut self, node: NodeHandle, delta: Position) -> bool {
        if delta.is_zero() {
            return false;
        }
        let now = self.now;
        let duration = self.config.reorder();
        let motion = self.nodes.entry(node).or_default();
        let residual = motion.offset.map_or(Position::ZERO, |t| t.sample(now));
        motion.offset = Some(Tween::new(
            residual + delta,
            Position::ZERO,
            now,
            duration,
            CubicBezier::STANDARD,
        ));
        true
    }

    /// Grows or shrinks the bar of `node` towards `target` percent.
    ///
    /// A running bar tween is cancelled and its current value committed as
    /// the new start. Returns `false` when already at or heading to `target`.
    pub fn play_magnitude(&mut self, node: NodeHandle, target: f32) -> bool {
        let now = self.now;
        let duration = self.config.bar();
        let motion = self.nodes.entry(node).or_default();
        let heading = motion.bar.map_or(motion.bar_value, |t| t.to);
        if (heading - target).abs() < f32::EPSILON {
            return false;
        }

        let current = motion.bar.map_or(motion.bar_value, |t| t.sample(now));
        motion.bar_value = current;
        motion.bar = Some(Tween::new(
            current,
            target,
            now,
            duration,
            CubicBezier::STANDARD,
        ));
        true
    }

    /// Fades and slides a new node in.
    pub fn play_enter(&mut self, node: NodeHandle) {
        let now = self.now;
        let duration = self.config.enter();
        let motion = self.nodes.entry(node).or_default();
        motion.enter = Some(Tween::new(0.0, 1.0, now, duration, CubicBezier::STANDARD));
    }

    /// Fades and shrinks a node out. Starting an exit twice is a no-op.
    ///
    /// The node is reported by [`advance`](Self::advance) once the exit ends.
    pub fn play_exit(&mut self, node: NodeHandle) -> bool {
        let now = self.now;
        let duration = self.config.exit();
        let motion = self.nodes.entry(node).or_default();
        if motion.exit.is_some() {
            return false;
        }
        motion.enter = None;
        motion.exit = Some(Tween::new(0.0, 1.0, now, duration, CubicBezier::EASE_OUT));
        true
    }

    /// Moves the clock forward and settles finished tweens.
    ///
    /// Returns the nodes whose exit completed, in handle order. Their motion
    /// state is dropped.
    pub fn advance(&mut self, dt: Duration) -> Vec<NodeHandle> {
        self.now += dt;
        let now = self.now;
        let mut exited = Vec::new();

        for (handle, motion) in self.nodes.iter_mut() {
            if motion.offset.is_some_and(|t| t.is_finished(now)) {
                motion.offset = None;
            }
            if let Some(bar) = motion.bar.filter(|t| t.is_finished(now)) {
                motion.bar_value = bar.to;
                motion.bar = None;
            }
            if motion.enter.is_some_and(|t| t.is_finished(now)) {
                motion.enter = None;
            }
            if motion.exit.is_some_and(|t| t.is_finished(now)) {
                exited.push(*handle);
            }
        }

        for handle in &exited {
            self.nodes.remove(handle);
        }
        exited
    }

    pub fn style(&self, node: NodeHandle) -> NodeStyle {
        let Some(motion) = self.nodes.get(&node) else {
            return NodeStyle::default();
        };
        let now = self.now;

        let entered = motion.enter.map_or(1.0, |t| t.sample(now));
        let exited = motion.exit.map_or(0.0, |t| t.sample(now));
        let slide = motion.offset.map_or(Position::ZERO, |t| t.sample(now));
        let rise = Position::new(0.0, self.config.enter_offset * (1.0 - entered));

        NodeStyle {
            offset: slide + rise,
            opacity: (entered * (1.0 - exited)).clamp(0.0, 1.0),
            scale: 1.0 - (1.0 - EXIT_SCALE) * exited,
            bar: motion.bar.map_or(motion.bar_value, |t| t.sample(now)),
        }
    }

    pub fn is_entering(&self, node: NodeHandle) -> bool {
        self.nodes.get(&node).is_some_and(|m| m.enter.is_some())
    }

    pub fn is_exiting(&self, node: NodeHandle) -> bool {
        self.nodes.get(&node).is_some_and(|m| m.exit.is_some())
    }

    /// True when no transition is running.
    pub fn is_idle(&self) -> bool {
        self.nodes.values().all(NodeMotion::is_idle)
    }

    /// Cancels every transition.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeArena;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn handles(n: usize) -> Vec<NodeHandle> {
        let mut arena = NodeArena::new();
        (0..n).map(|_| arena.insert(())).collect()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_bezier_endpoints_and_shape() {
        let curve = CubicBezier::STANDARD;
        assert_eq!(curve.ease(0.0), 0.0);
        assert_eq!(curve.ease(1.0), 1.0);
        // Front-loaded: well past halfway at the midpoint.
        assert!(curve.ease(0.5) > 0.8);
        assert!(close(CubicBezier::LINEAR.ease(0.3), 0.3));

        let mut last = 0.0;
        for step in 1..=20 {
            let value = curve.ease(step as f32 / 20.0);
            assert!(value >= last);
            last = value;
        }
    }

    #[test]
    fn test_position_slides_back_to_rest() {
        let node = handles(1)[0];
        let mut driver = MotionDriver::new(MotionConfig::default());

        assert!(!driver.play_position(node, Position::ZERO));
        assert!(driver.play_position(node, Position::new(0.0, 3.0)));
        assert_eq!(driver.style(node).offset, Position::new(0.0, 3.0));

        driver.advance(ms(130));
        let mid = driver.style(node).offset.y;
        assert!(mid > 0.0 && mid < 3.0);

        driver.advance(ms(130));
        assert_eq!(driver.style(node).offset, Position::ZERO);
        assert!(driver.is_idle());
    }

    #[test]
    fn test_interrupted_slide_keeps_residual() {
        let node = handles(1)[0];
        let mut driver = MotionDriver::new(MotionConfig::default());

        driver.play_position(node, Position::new(0.0, 3.0));
        driver.advance(ms(50));
        let residual = driver.style(node).offset;

        driver.play_position(node, Position::new(0.0, -3.0));
        let restarted = driver.style(node).offset;
        assert!(close(restarted.y, residual.y - 3.0));
    }

    #[test]
    fn test_magnitude_commits_and_retargets() {
        let node = handles(1)[0];
        let mut driver = MotionDriver::new(MotionConfig::default());

        assert!(driver.play_magnitude(node, 100.0));
        assert!(!driver.play_magnitude(node, 100.0));
        driver.advance(ms(100));
        let partial = driver.style(node).bar;
        assert!(partial > 0.0 && partial < 100.0);

        // Retarget starts from where the bar is now.
        assert!(driver.play_magnitude(node, 50.0));
        assert!(close(driver.style(node).bar, partial));

        driver.advance(ms(420));
        assert_eq!(driver.style(node).bar, 50.0);
        assert!(!driver.play_magnitude(node, 50.0));
    }

    #[test]
    fn test_enter_then_exit() {
        let node = handles(1)[0];
        let mut driver = MotionDriver::new(MotionConfig::default());

        driver.play_enter(node);
        let style = driver.style(node);
        assert_eq!(style.opacity, 0.0);
        assert_eq!(style.offset, Position::new(0.0, 1.0));
        assert!(driver.is_entering(node));

        assert!(driver.advance(ms(260)).is_empty());
        assert_eq!(driver.style(node).opacity, 1.0);
        assert!(!driver.is_entering(node));

        assert!(driver.play_exit(node));
        assert!(!driver.play_exit(node));
        assert!(driver.advance(ms(100)).is_empty());
        let style = driver.style(node);
        assert!(style.opacity < 1.0 && style.scale < 1.0);

        assert_eq!(driver.advance(ms(80)), vec![node]);
        assert!(!driver.is_exiting(node));
        assert_eq!(driver.style(node), NodeStyle::default());
    }

    #[test]
    fn test_zero_duration_finishes_on_next_advance() {
        let nodes = handles(2);
        let mut driver = MotionDriver::new(MotionConfig::instant());

        driver.play_exit(nodes[0]);
        driver.play_magnitude(nodes[1], 40.0);
        assert_eq!(driver.style(nodes[1]).bar, 40.0);

        assert_eq!(driver.advance(Duration::ZERO), vec![nodes[0]]);
        assert!(driver.is_idle());
    }

    #[test]
    fn test_clear_cancels_everything() {
        let nodes = handles(2);
        let mut driver = MotionDriver::new(MotionConfig::default());
        driver.play_exit(nodes[0]);
        driver.play_enter(nodes[1]);

        driver.clear();

        assert!(driver.is_idle());
        assert!(driver.advance(ms(1000)).is_empty());
    }
}
