//! Arriving units walking along a connected path.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Paths need more waypoints than this to be walked.
pub const MIN_WALK_WAYPOINTS: usize = 3;

/// Distance at which a waypoint counts as reached.
pub const WAYPOINT_TOLERANCE: f32 = 0.5;

/// Identifier of a walker within a controller session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u64);

/// A group of units following a waypoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitWalker {
    id: UnitId,
    path: Vec<Vec2Fixed>,
    position: Vec2Fixed,
    next_waypoint: usize,
    speed: Fixed,
}

impl UnitWalker {
    /// Start walking `path` from its first waypoint.
    ///
    /// Returns `None` for paths of [`MIN_WALK_WAYPOINTS`] or fewer points.
    #[must_use]
    pub fn new(id: UnitId, path: Vec<Vec2Fixed>, speed: Fixed) -> Option<Self> {
        if path.len() <= MIN_WALK_WAYPOINTS {
            return None;
        }
        Some(Self {
            id,
            position: path[0],
            path,
            next_waypoint: 1,
            speed,
        })
    }

    /// Walker id.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Waypoints being followed.
    #[must_use]
    pub fn path(&self) -> &[Vec2Fixed] {
        &self.path
    }

    /// Whether the last waypoint has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next_waypoint >= self.path.len()
    }

    /// Move toward the next waypoint. Returns `true` once finished.
    pub fn advance(&mut self, dt: Fixed) -> bool {
        let tolerance = Fixed::from_num(WAYPOINT_TOLERANCE);
        let tolerance_sq = tolerance * tolerance;
        let mut budget = self.speed.saturating_mul(dt);

        while let Some(&target) = self.path.get(self.next_waypoint) {
            let before = self.position;
            self.position = self.position.move_towards(target, budget);
            budget -= (self.position - before).length().min(budget);

            if self.position.distance_squared(target) <= tolerance_sq {
                self.next_waypoint += 1;
            } else {
                break;
            }
            if budget <= Fixed::ZERO {
                break;
            }
        }

        self.is_finished()
    }
}
