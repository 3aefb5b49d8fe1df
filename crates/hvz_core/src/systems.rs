//! Simulation systems.
//!
//! Pure functions over positions and stats. [`Simulation`] decides when they
//! run and applies their results; nothing here touches unit storage.
//!
//! [`Simulation`]: crate::simulation::Simulation

use crate::config::WorldSize;
use crate::math::{Fixed, Vec2Fixed};
use crate::rng::SimRng;

/// Advance one coordinate toward its destination.
///
/// Snaps to `to` when closer than `speed`, otherwise moves by exactly
/// `speed`. A non-positive speed leaves the coordinate alone.
#[must_use]
pub fn step_axis(pos: Fixed, to: Fixed, speed: Fixed) -> Fixed {
    if pos == to || speed <= Fixed::ZERO {
        return pos;
    }
    if (pos - to).abs() < speed {
        to
    } else if pos > to {
        pos - speed
    } else {
        pos + speed
    }
}

/// Per-axis movement step. The axes move independently, so diagonal
/// travel covers `speed` on each axis rather than along the diagonal.
///
/// # Example
/// ```
/// use hvz_core::math::{Fixed, Vec2Fixed};
/// use hvz_core::systems::step_toward;
///
/// let next = step_toward(
///     Vec2Fixed::from_int(0, 0),
///     Vec2Fixed::from_int(10, 1),
///     Fixed::from_num(2),
/// );
/// assert_eq!(next, Vec2Fixed::from_int(2, 1));
/// ```
#[must_use]
pub fn step_toward(pos: Vec2Fixed, to: Vec2Fixed, speed: Fixed) -> Vec2Fixed {
    Vec2Fixed::new(step_axis(pos.x, to.x, speed), step_axis(pos.y, to.y, speed))
}

/// Distance between two points in grid cells: `floor(d / cell_size) - 1`.
///
/// Units closer than one cell report `-1`, so range 0 still means "adjacent".
#[must_use]
pub fn cell_distance(a: Vec2Fixed, b: Vec2Fixed, cell_size: u32) -> i64 {
    let unit = Fixed::from_num(cell_size.max(1));
    (a.distance(b) / unit).floor().to_num::<i64>() - 1
}

/// Check whether `target` is within `range` cells of `attacker`.
#[must_use]
pub fn in_attack_range(
    attacker: Vec2Fixed,
    target: Vec2Fixed,
    range: u32,
    cell_size: u32,
) -> bool {
    cell_distance(attacker, target, cell_size) <= i64::from(range)
}

/// Point an out-of-range attacker should walk to.
///
/// On the straight line from the target to the attacker, `range * cell_size`
/// world units from the target, so the attack check holds on arrival from
/// any direction. An attacker already that close stays where it is.
#[must_use]
pub fn approach_point(
    attacker: Vec2Fixed,
    target: Vec2Fixed,
    range: u32,
    cell_size: u32,
    world: WorldSize,
) -> Vec2Fixed {
    let offset = Fixed::saturating_from_num(u64::from(range) * u64::from(cell_size));
    let distance = attacker.distance(target);
    if distance <= offset {
        return attacker;
    }
    let delta = attacker - target;
    let scaled = |d: Fixed| d.saturating_mul(offset) / distance;
    world.clamp(Vec2Fixed::new(
        target.x + scaled(delta.x),
        target.y + scaled(delta.y),
    ))
}

/// Uniform random point in `[0, width) × [0, height)` with integer coordinates.
pub fn random_point(rng: &mut SimRng, world: WorldSize) -> Vec2Fixed {
    let x = rng.next_below(world.width);
    let y = rng.next_below(world.height);
    Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(v: f64) -> Fixed {
        Fixed::from_num(v)
    }

    #[test]
    fn test_step_axis_moves_by_speed() {
        assert_eq!(step_axis(f(100.0), f(110.0), f(1.25)), f(101.25));
        assert_eq!(step_axis(f(110.0), f(100.0), f(1.25)), f(108.75));
    }

    #[test]
    fn test_step_axis_snaps_when_close() {
        assert_eq!(step_axis(f(109.5), f(110.0), f(1.25)), f(110.0));
        // Exactly `speed` away is a full step, which also lands on target
        assert_eq!(step_axis(f(108.75), f(110.0), f(1.25)), f(110.0));
    }

    #[test]
    fn test_step_axis_zero_speed() {
        assert_eq!(step_axis(f(5.0), f(10.0), Fixed::ZERO), f(5.0));
    }

    #[test]
    fn test_eight_steps_cover_ten_units() {
        let mut pos = Vec2Fixed::from_int(100, 100);
        let to = Vec2Fixed::from_int(110, 100);
        for _ in 0..8 {
            pos = step_toward(pos, to, f(1.25));
        }
        assert_eq!(pos, to);
    }

    #[test]
    fn test_cell_distance() {
        let origin = Vec2Fixed::from_int(0, 0);
        assert_eq!(cell_distance(origin, Vec2Fixed::from_int(5, 0), 10), -1);
        assert_eq!(cell_distance(origin, Vec2Fixed::from_int(10, 0), 10), 0);
        assert_eq!(cell_distance(origin, Vec2Fixed::from_int(30, 40), 10), 4);
        assert_eq!(cell_distance(origin, Vec2Fixed::from_int(69, 0), 10), 5);
    }

    #[test]
    fn test_in_attack_range() {
        let origin = Vec2Fixed::from_int(0, 0);
        assert!(in_attack_range(origin, Vec2Fixed::from_int(69, 0), 5, 10));
        assert!(!in_attack_range(origin, Vec2Fixed::from_int(70, 0), 5, 10));
        assert!(in_attack_range(origin, Vec2Fixed::from_int(19, 0), 1, 10));
        assert!(!in_attack_range(origin, Vec2Fixed::from_int(20, 0), 0, 10));
    }

    #[test]
    fn test_approach_point_along_an_axis() {
        let world = WorldSize::new(1000, 1000);
        let target = Vec2Fixed::from_int(500, 500);

        let from_left = approach_point(Vec2Fixed::from_int(0, 500), target, 5, 10, world);
        assert_eq!(from_left, Vec2Fixed::from_int(450, 500));

        let from_below = approach_point(Vec2Fixed::from_int(500, 900), target, 1, 10, world);
        assert_eq!(from_below, Vec2Fixed::from_int(500, 510));
    }

    #[test]
    fn test_approach_point_on_a_diagonal_is_in_range() {
        let world = WorldSize::new(1000, 1000);
        let attacker = Vec2Fixed::from_int(100, 100);
        let target = Vec2Fixed::from_int(151, 151);
        assert!(!in_attack_range(attacker, target, 5, 10));

        let point = approach_point(attacker, target, 5, 10, world);
        assert!(in_attack_range(point, target, 5, 10));
        // On the attacker's side, roughly 35.36 units back on each axis
        let back = target.x - point.x;
        assert!(back > f(35.3) && back < f(35.4), "got {back:?}");
        assert_eq!(point.x, point.y);
    }

    #[test]
    fn test_approach_point_from_every_side() {
        let world = WorldSize::new(1000, 1000);
        let target = Vec2Fixed::from_int(500, 500);
        for (x, y) in [(0, 0), (900, 900), (0, 1000), (1000, 0), (430, 999), (3, 470)] {
            let attacker = Vec2Fixed::from_int(x, y);
            let point = approach_point(attacker, target, 5, 10, world);
            assert!(in_attack_range(point, target, 5, 10), "from ({x}, {y})");
            assert!(world.contains(point));
            assert!(point.distance(attacker) < attacker.distance(target));
        }
    }

    #[test]
    fn test_approach_point_when_already_close() {
        let world = WorldSize::new(100, 100);
        let attacker = Vec2Fixed::from_int(90, 90);
        let point = approach_point(attacker, Vec2Fixed::from_int(80, 85), 5, 10, world);
        assert_eq!(point, attacker);
    }

    #[test]
    fn test_random_point_in_world() {
        let mut rng = SimRng::new(3);
        let world = WorldSize::new(640, 480);
        for _ in 0..200 {
            assert!(world.contains(random_point(&mut rng, world)));
        }
    }
}
