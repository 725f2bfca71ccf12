//! Circle vs. rectangle collision and response
//!
//! Balls are circles, bricks and the play area are axis-aligned rectangles.
//! All functions are total: degenerate input yields "no hit", never a panic.

use glam::Vec2;

use crate::world::Rect;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Closest point on the rectangle to the circle center
    pub point: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
        }
    }
}

/// Closest-point test: the circle overlaps if the nearest point of the rect
/// lies strictly inside it
pub fn circle_rect_collision(center: Vec2, radius: f32, rect: &Rect) -> CollisionResult {
    let closest = center.clamp(rect.min(), rect.max());
    if center.distance_squared(closest) < radius * radius {
        CollisionResult {
            hit: true,
            point: closest,
        }
    } else {
        CollisionResult::miss()
    }
}

#[inline]
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    circle_rect_collision(center, radius, rect).hit
}

/// Bounce off a brick.
///
/// The offset from the brick center is normalized by the half extents; the
/// axis with the larger normalized offset is the face that was hit, and the
/// velocity on that axis is pointed away from the brick.
pub fn bounce_off_rect(pos: Vec2, vel: Vec2, rect: &Rect) -> Vec2 {
    let delta = pos - rect.center();
    let half = Vec2::new(rect.width, rect.height) * 0.5;
    let normalized = delta / half.max(Vec2::splat(f32::EPSILON));

    if normalized.x.abs() > normalized.y.abs() {
        Vec2::new(away(delta.x, vel.x), vel.y)
    } else {
        Vec2::new(vel.x, away(delta.y, vel.y))
    }
}

/// Velocity component pointing along `offset`; a dead-center hit just reverses
#[inline]
fn away(offset: f32, v: f32) -> f32 {
    if offset > 0.0 {
        v.abs()
    } else if offset < 0.0 {
        -v.abs()
    } else {
        -v
    }
}

/// Keep a circle inside `bounds`, reflecting velocity off any wall it touches.
/// Returns true if a wall was hit.
pub fn reflect_in_bounds(pos: &mut Vec2, vel: &mut Vec2, radius: f32, bounds: &Rect) -> bool {
    let min = bounds.min() + Vec2::splat(radius);
    let max = (bounds.max() - Vec2::splat(radius)).max(min);
    let mut hit = false;

    if pos.x < min.x {
        pos.x = min.x;
        vel.x = vel.x.abs();
        hit = true;
    } else if pos.x > max.x {
        pos.x = max.x;
        vel.x = -vel.x.abs();
        hit = true;
    }

    if pos.y < min.y {
        pos.y = min.y;
        vel.y = vel.y.abs();
        hit = true;
    } else if pos.y > max.y {
        pos.y = max.y;
        vel.y = -vel.y.abs();
        hit = true;
    }

    hit
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRICK: Rect = Rect::new(100.0, 100.0, 60.0, 20.0);

    #[test]
    fn test_overlap_closest_point() {
        // Just below the bottom face
        assert!(circle_rect_overlap(Vec2::new(130.0, 127.0), 8.0, &BRICK));
        assert!(!circle_rect_overlap(Vec2::new(130.0, 128.0), 8.0, &BRICK));
        // Corner: distance sqrt(5² + 5²) ≈ 7.07
        assert!(circle_rect_overlap(Vec2::new(95.0, 95.0), 8.0, &BRICK));
        assert!(!circle_rect_overlap(Vec2::new(93.0, 93.0), 8.0, &BRICK));
        // Center inside
        let inside = circle_rect_collision(Vec2::new(120.0, 110.0), 8.0, &BRICK);
        assert!(inside.hit);
        assert_eq!(inside.point, Vec2::new(120.0, 110.0));
    }

    #[test]
    fn test_bounce_from_below_flips_y() {
        let vel = bounce_off_rect(Vec2::new(130.0, 125.0), Vec2::new(50.0, -200.0), &BRICK);
        assert_eq!(vel, Vec2::new(50.0, 200.0));
    }

    #[test]
    fn test_bounce_from_side_flips_x() {
        let vel = bounce_off_rect(Vec2::new(95.0, 110.0), Vec2::new(200.0, 30.0), &BRICK);
        assert_eq!(vel, Vec2::new(-200.0, 30.0));
    }

    #[test]
    fn test_bounce_uses_normalized_offsets() {
        // 20px right of center is less than 8px below in normalized terms (20/30 < 8/10)
        let vel = bounce_off_rect(Vec2::new(150.0, 118.0), Vec2::new(10.0, -10.0), &BRICK);
        assert_eq!(vel, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_walls_reflect_and_clamp() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let mut pos = Vec2::new(-20.0, 650.0);
        let mut vel = Vec2::new(-100.0, 100.0);
        assert!(reflect_in_bounds(&mut pos, &mut vel, 8.0, &bounds));
        assert_eq!(pos, Vec2::new(8.0, 592.0));
        assert_eq!(vel, Vec2::new(100.0, -100.0));

        let mut pos = Vec2::new(400.0, 300.0);
        let mut vel = Vec2::new(1.0, 1.0);
        assert!(!reflect_in_bounds(&mut pos, &mut vel, 8.0, &bounds));
    }

    #[test]
    fn test_dead_center_hit_reverses() {
        let vel = bounce_off_rect(BRICK.center(), Vec2::new(30.0, -120.0), &BRICK);
        assert_eq!(vel, Vec2::new(30.0, 120.0));
    }
}
