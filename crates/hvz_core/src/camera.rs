//! Viewport camera: world↔view transform and edge scrolling.
//!
//! The camera is a single offset, `gap`, the world coordinate of the
//! viewport's top-left corner. [`CameraController`] moves it when the
//! pointer sits in the band along a viewport edge, and clamps it so the
//! viewport never leaves the map.

use serde::{Deserialize, Serialize};

use crate::config::{CameraSettings, WorldSize};
use crate::math::{Fixed, Vec2Fixed};

/// Visible screen area in view pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// World-to-view offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Camera {
    /// World coordinate of the viewport's top-left corner.
    pub gap: Vec2Fixed,
}

impl Camera {
    /// Camera at the map origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gap: Vec2Fixed::ZERO,
        }
    }

    /// View coordinates to world coordinates.
    #[must_use]
    pub fn to_world(&self, view: Vec2Fixed) -> Vec2Fixed {
        view + self.gap
    }

    /// World coordinates to view coordinates.
    #[must_use]
    pub fn to_view(&self, world: Vec2Fixed) -> Vec2Fixed {
        world - self.gap
    }

    /// Check if a world position lies inside the viewport (edges included).
    #[must_use]
    pub fn is_visible(&self, pos: Vec2Fixed, viewport: Viewport) -> bool {
        let far = self.gap + Vec2Fixed::new(
            Fixed::from_num(viewport.width),
            Fixed::from_num(viewport.height),
        );
        self.gap.x <= pos.x && pos.x <= far.x && self.gap.y <= pos.y && pos.y <= far.y
    }

    /// Largest allowed offset for this viewport and world.
    #[must_use]
    pub fn max_gap(viewport: Viewport, world: WorldSize) -> Vec2Fixed {
        Vec2Fixed::new(
            Fixed::from_num(world.width.saturating_sub(viewport.width)),
            Fixed::from_num(world.height.saturating_sub(viewport.height)),
        )
    }
}

/// Where the pointer sits relative to the viewport edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeZone {
    /// Away from every edge.
    None,
    /// Left edge.
    Left,
    /// Right edge.
    Right,
    /// Top edge.
    Top,
    /// Bottom edge.
    Bottom,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

impl EdgeZone {
    /// Classify a pointer position (view coordinates). Corners win over edges.
    #[must_use]
    pub fn classify(pointer: Vec2Fixed, viewport: Viewport, band: u32) -> Self {
        let band = Fixed::from_num(band);
        let left = pointer.x < band;
        let right = pointer.x > Fixed::from_num(viewport.width) - band;
        let top = pointer.y < band;
        let bottom = pointer.y > Fixed::from_num(viewport.height) - band;

        match (left, right, top, bottom) {
            (true, _, true, _) => Self::TopLeft,
            (_, true, true, _) => Self::TopRight,
            (true, _, _, true) => Self::BottomLeft,
            (_, true, _, true) => Self::BottomRight,
            (true, ..) => Self::Left,
            (_, true, ..) => Self::Right,
            (_, _, true, _) => Self::Top,
            (.., true) => Self::Bottom,
            _ => Self::None,
        }
    }

    /// Scroll direction as `(dx, dy)`, each in `{-1, 0, 1}`.
    #[must_use]
    pub const fn direction(self) -> (i32, i32) {
        match self {
            Self::None => (0, 0),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Top => (0, -1),
            Self::Bottom => (0, 1),
            Self::TopLeft => (-1, -1),
            Self::TopRight => (1, -1),
            Self::BottomLeft => (-1, 1),
            Self::BottomRight => (1, 1),
        }
    }
}

/// Edge-scrolls a [`Camera`] from pointer proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraController {
    settings: CameraSettings,
}

impl CameraController {
    /// Create a controller with the given tuning.
    #[must_use]
    pub const fn new(settings: CameraSettings) -> Self {
        Self { settings }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn settings(&self) -> CameraSettings {
        self.settings
    }

    /// Run once per rendered frame. Returns true if `gap` changed, which is
    /// the only time the map layer needs a redraw.
    pub fn update(
        &self,
        camera: &mut Camera,
        pointer: Vec2Fixed,
        viewport: Viewport,
        world: WorldSize,
    ) -> bool {
        let zone = EdgeZone::classify(pointer, viewport, self.settings.move_band_size);
        let (dx, dy) = zone.direction();
        if (dx, dy) == (0, 0) {
            return false;
        }

        let speed = Fixed::from_num(self.settings.move_speed);
        let max = Camera::max_gap(viewport, world);
        let before = camera.gap;
        camera.gap = Vec2Fixed::new(
            (camera.gap.x + speed * Fixed::from_num(dx)).clamp(Fixed::ZERO, max.x),
            (camera.gap.y + speed * Fixed::from_num(dy)).clamp(Fixed::ZERO, max.y),
        );

        let moved = camera.gap != before;
        if moved {
            tracing::trace!(?zone, gap = ?camera.gap, "camera scrolled");
        }
        moved
    }
}
