//! Host world collaborators
//!
//! Callouts never reach into global map state. Everything they need from the
//! host (entity lookup, tile coordinates, camera scroll) comes through the two
//! traits in this module, so the frame pass can run against a test double.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an entity (player or map event) that can own labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position in tile units ("real" map coordinates, fractional while moving)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        WorldPoint { x, y }
    }
}

/// Position in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Entity lookup facilities of the host map
pub trait WorldModel {
    /// The player-controlled entity, if one exists on this map
    fn player(&self) -> Option<EntityId>;

    /// Map event by its numeric event id
    fn event(&self, event_id: u32) -> Option<EntityId>;

    /// All map events with their names, in event id order
    fn events(&self) -> Vec<(EntityId, &str)>;

    /// Current real (tile-space) position of an entity
    fn real_position(&self, entity: EntityId) -> Option<WorldPoint>;
}

/// Camera scroll and tile-size conversion
pub trait Viewport {
    /// Tile-space x relative to the camera's scroll origin
    fn adjust_x(&self, real_x: f64) -> f64;

    /// Tile-space y relative to the camera's scroll origin
    fn adjust_y(&self, real_y: f64) -> f64;

    fn tile_width(&self) -> u32;

    fn tile_height(&self) -> u32;

    /// Screen pixel at the bottom-center of the tile at `point`
    fn screen_point(&self, point: WorldPoint) -> ScreenPoint {
        let tw = self.tile_width() as f64;
        let th = self.tile_height() as f64;
        ScreenPoint {
            x: round_half_up(self.adjust_x(point.x) * tw + tw / 2.0),
            y: round_half_up(self.adjust_y(point.y) * th + th),
        }
    }
}

/// Rounds .5 towards positive infinity, the way screen coordinates snap in the host
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCamera {
        scroll: WorldPoint,
    }

    impl Viewport for FixedCamera {
        fn adjust_x(&self, real_x: f64) -> f64 {
            real_x - self.scroll.x
        }
        fn adjust_y(&self, real_y: f64) -> f64 {
            real_y - self.scroll.y
        }
        fn tile_width(&self) -> u32 {
            48
        }
        fn tile_height(&self) -> u32 {
            48
        }
    }

    #[test]
    fn test_screen_point_bottom_center_of_tile() {
        let camera = FixedCamera { scroll: WorldPoint::new(0.0, 0.0) };
        let p = camera.screen_point(WorldPoint::new(2.0, 3.0));
        assert_eq!(p.x, 120.0); // 2*48 + 24
        assert_eq!(p.y, 192.0); // 3*48 + 48
    }

    #[test]
    fn test_screen_point_follows_scroll() {
        let camera = FixedCamera { scroll: WorldPoint::new(1.5, 0.5) };
        let p = camera.screen_point(WorldPoint::new(2.0, 3.0));
        assert_eq!(p.x, 48.0);
        assert_eq!(p.y, 168.0);
    }

    #[test]
    fn test_round_half_up_negative() {
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }
}
