//! Planar primitives shared by collision, perception and steering.
//!
//! Conventions: y grows upward, rotations are degrees clockwise from "up".

use serde::{Deserialize, Serialize};

pub const COS_45_DEG: f32 = 0.7071;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len <= f32::EPSILON || !len.is_finite() {
            return None;
        }
        Some(Vec2 {
            x: self.x / len,
            y: self.y / len,
        })
    }

    pub fn dist_sq(self, other: Vec2) -> f32 {
        (other - self).length_sq()
    }

    pub fn dist(self, other: Vec2) -> f32 {
        self.dist_sq(other).sqrt()
    }

    pub fn scale(self, factor: f32) -> Vec2 {
        Vec2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// Axis-aligned rectangle. Overlap is half-open on both axes, so rects that merely
/// share an edge do not overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Rect {
    pub const fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.bottom < other.top
            && other.bottom < self.top
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    /// Distance between the two circle edges; negative when they overlap.
    pub fn separation(&self, other: &Circle) -> f32 {
        self.center.dist(other.center) - (self.radius + other.radius)
    }

    pub fn overlaps(&self, other: &Circle) -> bool {
        self.separation(other) < 0.0
    }
}

/// The collidable part of a sprite box, as offsets from the entity position
/// (the sprite's bottom-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubRect {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl SubRect {
    pub fn full(size: Vec2) -> Self {
        Self {
            left: 0.0,
            bottom: 0.0,
            right: size.x,
            top: size.y,
        }
    }

    pub fn with_horizontal(mut self, left: f32, right: f32) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    /// Average of half-width and half-height.
    pub fn radius(&self) -> f32 {
        ((self.right - self.left) + (self.top - self.bottom)) / 4.0
    }
}

pub fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else if value > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Cosine of the angle between two vectors, or `None` if either is zero-length.
pub fn normalized_dot(a: Vec2, b: Vec2) -> Option<f32> {
    let a = a.normalized()?;
    let b = b.normalized()?;
    Some(a.x * b.x + a.y * b.y)
}

/// Rotation for an 8-way direction. `None` means "leave the current rotation".
pub fn rotation_from_direction(direction: Vec2) -> Option<f32> {
    if direction.is_zero() {
        return None;
    }
    if direction.x == 0.0 {
        return Some(if direction.y < 0.0 { 180.0 } else { 0.0 });
    }
    if direction.y == 0.0 {
        return Some(if direction.x > 0.0 { 90.0 } else { 270.0 });
    }
    let rotation = if direction.y > 0.0 { 45.0 } else { 135.0 };
    Some(if direction.x < 0.0 { -rotation } else { rotation })
}

/// Segment-vs-segment test (Graphics Gems II, "xlines"). Collinear segments count as
/// intersecting.
pub fn segments_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
    // Line through p1,p2 as a1*x + b1*y + c1 = 0.
    let a1 = p2.y - p1.y;
    let b1 = p1.x - p2.x;
    let c1 = p2.x * p1.y - p1.x * p2.y;

    let r3 = a1 * p3.x + b1 * p3.y + c1;
    let r4 = a1 * p4.x + b1 * p4.y + c1;
    if r3 != 0.0 && r4 != 0.0 && sign(r3) == sign(r4) {
        return false;
    }

    let a2 = p4.y - p3.y;
    let b2 = p3.x - p4.x;
    let c2 = p4.x * p3.y - p3.x * p4.y;

    let r1 = a2 * p1.x + b2 * p1.y + c2;
    let r2 = a2 * p2.x + b2 * p2.y + c2;
    if r1 != 0.0 && r2 != 0.0 && sign(r1) == sign(r2) {
        return false;
    }

    // Denominator zero means collinear; any other value is a proper crossing. The
    // intersection point itself is never needed.
    true
}

/// True if the segment crosses any of the rectangle's four edges.
pub fn segment_intersects_rect(a: Vec2, b: Vec2, rect: &Rect) -> bool {
    let bottom_left = Vec2::new(rect.left, rect.bottom);
    let bottom_right = Vec2::new(rect.right, rect.bottom);
    let top_left = Vec2::new(rect.left, rect.top);
    let top_right = Vec2::new(rect.right, rect.top);
    segments_intersect(a, b, bottom_left, bottom_right)
        || segments_intersect(a, b, bottom_left, top_left)
        || segments_intersect(a, b, bottom_right, top_right)
        || segments_intersect(a, b, top_left, top_right)
}
