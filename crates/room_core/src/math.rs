//! Fixed-point math utilities for deterministic simulation.
//!
//! World coordinates on the grid plane and elapsed time both use
//! fixed-point arithmetic, so a session replays identically from the
//! same seed and inputs on any platform.
//!
//! Unit walkers are the main consumer of [`Vec2Fixed`]: each frame a
//! walker spends `speed * dt` of travel with [`Vec2Fixed::move_towards`],
//! and [`Vec2Fixed::length`] measures how much of that budget a partial
//! step used, so the leftover carries on to the next waypoint. Squared
//! lengths saturate rather than wrap, which keeps waypoint checks
//! monotonic even for points at the edge of the world range.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector on the active grid plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate (the plane's second axis).
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Values are written as their raw bit representation (i64) so replays
/// and snapshots keep exact precision.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bits.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bits.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Build a vector from host-side floats (input points, config values).
    #[must_use]
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Convert to floats for the presentation layer.
    #[must_use]
    pub fn to_f64(self) -> [f64; 2] {
        [self.x.to_num::<f64>(), self.y.to_num::<f64>()]
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Move toward `target` by at most `max_step`, never overshooting.
    #[must_use]
    pub fn move_towards(self, target: Self, max_step: Fixed) -> Self {
        let delta = target - self;
        let distance = delta.length();
        if distance <= max_step || distance == Fixed::ZERO {
            return target;
        }
        let scale = max_step / distance;
        Self::new(self.x + delta.x * scale, self.y + delta.y * scale)
    }
}

/// Computes the square root of a fixed-point number using binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
