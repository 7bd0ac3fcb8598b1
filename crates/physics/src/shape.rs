//! Collision shapes and their mass properties.

use glam::Vec2;

/// A collision shape in body-local coordinates.
///
/// Polygon vertices are normalized to counter-clockwise winding on
/// construction so that edge normals always point outward.
#[derive(Debug, Clone)]
pub struct Shape {
    pub kind: ShapeKind,
    pub density: f32,
    pub elasticity: f32,
}

#[derive(Debug, Clone)]
pub enum ShapeKind {
    Circle { radius: f32, offset: Vec2 },
    Polygon { verts: Vec<Vec2> },
    /// Line segment with a thickness radius. Static geometry only.
    Segment { a: Vec2, b: Vec2, radius: f32 },
}

impl Shape {
    pub fn circle(radius: f32, density: f32, elasticity: f32) -> Self {
        Self {
            kind: ShapeKind::Circle {
                radius,
                offset: Vec2::ZERO,
            },
            density,
            elasticity,
        }
    }

    pub fn polygon(verts: &[Vec2], density: f32, elasticity: f32) -> Self {
        let mut verts = verts.to_vec();
        if signed_area(&verts) < 0.0 {
            verts.reverse();
        }
        Self {
            kind: ShapeKind::Polygon { verts },
            density,
            elasticity,
        }
    }

    /// Axis-aligned box helper, centered on the body origin.
    pub fn boxed(half_width: f32, half_height: f32, density: f32, elasticity: f32) -> Self {
        Self::polygon(
            &[
                Vec2::new(-half_width, -half_height),
                Vec2::new(half_width, -half_height),
                Vec2::new(half_width, half_height),
                Vec2::new(-half_width, half_height),
            ],
            density,
            elasticity,
        )
    }

    pub fn segment(a: Vec2, b: Vec2, radius: f32, elasticity: f32) -> Self {
        Self {
            kind: ShapeKind::Segment { a, b, radius },
            density: 0.0,
            elasticity,
        }
    }

    pub fn area(&self) -> f32 {
        match &self.kind {
            ShapeKind::Circle { radius, .. } => core::f32::consts::PI * radius * radius,
            ShapeKind::Polygon { verts } => signed_area(verts),
            ShapeKind::Segment { .. } => 0.0,
        }
    }

    pub fn mass(&self) -> f32 {
        self.area() * self.density
    }

    /// Moment of inertia about the body origin, for this shape's mass.
    pub fn moment(&self) -> f32 {
        match &self.kind {
            ShapeKind::Circle { radius, offset } => {
                let m = self.mass();
                m * (0.5 * radius * radius + offset.length_squared())
            }
            ShapeKind::Polygon { verts } => polygon_moment(verts) * self.density,
            ShapeKind::Segment { .. } => 0.0,
        }
    }

    /// World-space AABB of this shape under the given body transform.
    pub fn aabb(&self, position: Vec2, angle: f32) -> (Vec2, Vec2) {
        let rot = Vec2::from_angle(angle);
        match &self.kind {
            ShapeKind::Circle { radius, offset } => {
                let c = position + rot.rotate(*offset);
                let r = Vec2::splat(*radius);
                (c - r, c + r)
            }
            ShapeKind::Polygon { verts } => {
                let mut min = Vec2::splat(f32::MAX);
                let mut max = Vec2::splat(f32::MIN);
                for v in verts {
                    let w = position + rot.rotate(*v);
                    min = min.min(w);
                    max = max.max(w);
                }
                (min, max)
            }
            ShapeKind::Segment { a, b, radius } => {
                let wa = position + rot.rotate(*a);
                let wb = position + rot.rotate(*b);
                let r = Vec2::splat(*radius);
                (wa.min(wb) - r, wa.max(wb) + r)
            }
        }
    }
}

/// Signed area via the shoelace formula. Positive for CCW winding.
fn signed_area(verts: &[Vec2]) -> f32 {
    let mut sum = 0.0;
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[(i + 1) % verts.len()];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

/// Second moment of area of a polygon about the body origin
/// (multiply by density for the moment of inertia).
fn polygon_moment(verts: &[Vec2]) -> f32 {
    let mut numer = 0.0;
    let mut denom = 0.0;
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[(i + 1) % verts.len()];
        let cross = a.perp_dot(b);
        numer += cross * (a.dot(a) + a.dot(b) + b.dot(b));
        denom += cross;
    }
    if denom == 0.0 {
        0.0
    } else {
        numer / 12.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_area_and_mass() {
        let s = Shape::boxed(5.0, 2.5, 1.0, 0.2);
        assert_relative_eq!(s.area(), 50.0, epsilon = 1e-4);
        assert_relative_eq!(s.mass(), 50.0, epsilon = 1e-4);
    }

    #[test]
    fn winding_is_normalized() {
        // Clockwise input gets reversed to CCW.
        let s = Shape::polygon(
            &[
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ],
            1.0,
            0.0,
        );
        assert!(s.area() > 0.0);
    }

    #[test]
    fn box_moment_matches_formula() {
        // I = m (w^2 + h^2) / 12 for a centered box.
        let s = Shape::boxed(5.0, 2.5, 1.0, 0.2);
        let expected = s.mass() * (10.0f32.powi(2) + 5.0f32.powi(2)) / 12.0;
        assert_relative_eq!(s.moment(), expected, epsilon = 1e-2);
    }

    #[test]
    fn circle_moment_includes_offset() {
        let mut s = Shape::circle(2.0, 1.0, 0.0);
        let centered = s.moment();
        if let ShapeKind::Circle { offset, .. } = &mut s.kind {
            *offset = Vec2::new(3.0, 0.0);
        }
        assert!(s.moment() > centered);
    }

    #[test]
    fn aabb_covers_rotated_polygon() {
        let s = Shape::boxed(5.0, 2.5, 1.0, 0.2);
        let (min, max) = s.aabb(Vec2::new(10.0, 10.0), core::f32::consts::FRAC_PI_2);
        // Rotated 90 degrees: extents swap.
        assert_relative_eq!(min.x, 7.5, epsilon = 1e-3);
        assert_relative_eq!(max.y, 15.0, epsilon = 1e-3);
    }
}
