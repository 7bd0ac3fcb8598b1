//! Narrow-phase contact generation.
//!
//! Produces at most one contact point per shape pair: the deepest
//! penetration. With no gravity in the simulation, contacts are transient
//! bumps rather than resting stacks, so a single-point manifold is enough.

use glam::Vec2;

use crate::shape::{Shape, ShapeKind};

/// A single contact between two shapes, in world space.
/// The normal points from shape A towards shape B.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub point: Vec2,
    pub normal: Vec2,
    pub depth: f32,
}

impl Contact {
    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// World-space view of a shape under its body transform.
enum WorldShape {
    Circle { center: Vec2, radius: f32 },
    Polygon { verts: Vec<Vec2> },
    Segment { a: Vec2, b: Vec2, radius: f32 },
}

fn to_world(shape: &Shape, position: Vec2, angle: f32) -> WorldShape {
    let rot = Vec2::from_angle(angle);
    match &shape.kind {
        ShapeKind::Circle { radius, offset } => WorldShape::Circle {
            center: position + rot.rotate(*offset),
            radius: *radius,
        },
        ShapeKind::Polygon { verts } => WorldShape::Polygon {
            verts: verts.iter().map(|v| position + rot.rotate(*v)).collect(),
        },
        ShapeKind::Segment { a, b, radius } => WorldShape::Segment {
            a: position + rot.rotate(*a),
            b: position + rot.rotate(*b),
            radius: *radius,
        },
    }
}

/// Collide two shapes under their body transforms.
/// Returns a contact whose normal points from A to B.
pub fn collide(
    shape_a: &Shape,
    pos_a: Vec2,
    angle_a: f32,
    shape_b: &Shape,
    pos_b: Vec2,
    angle_b: f32,
) -> Option<Contact> {
    let a = to_world(shape_a, pos_a, angle_a);
    let b = to_world(shape_b, pos_b, angle_b);
    match (&a, &b) {
        (WorldShape::Circle { center: ca, radius: ra }, WorldShape::Circle { center: cb, radius: rb }) => {
            circle_circle(*ca, *ra, *cb, *rb)
        }
        (WorldShape::Circle { center, radius }, WorldShape::Polygon { verts }) => {
            polygon_circle(verts, *center, *radius).map(Contact::flipped)
        }
        (WorldShape::Polygon { verts }, WorldShape::Circle { center, radius }) => {
            polygon_circle(verts, *center, *radius)
        }
        (WorldShape::Polygon { verts: va }, WorldShape::Polygon { verts: vb }) => {
            polygon_polygon(va, vb)
        }
        (WorldShape::Segment { a: sa, b: sb, radius }, WorldShape::Circle { center, radius: rc }) => {
            segment_circle(*sa, *sb, *radius, *center, *rc)
        }
        (WorldShape::Circle { center, radius: rc }, WorldShape::Segment { a: sa, b: sb, radius }) => {
            segment_circle(*sa, *sb, *radius, *center, *rc).map(Contact::flipped)
        }
        (WorldShape::Segment { a: sa, b: sb, radius }, WorldShape::Polygon { verts }) => {
            segment_polygon(*sa, *sb, *radius, verts)
        }
        (WorldShape::Polygon { verts }, WorldShape::Segment { a: sa, b: sb, radius }) => {
            segment_polygon(*sa, *sb, *radius, verts).map(Contact::flipped)
        }
        // Static walls never collide with each other.
        (WorldShape::Segment { .. }, WorldShape::Segment { .. }) => None,
    }
}

fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Contact> {
    let delta = cb - ca;
    let dist = delta.length();
    let depth = ra + rb - dist;
    if depth <= 0.0 {
        return None;
    }
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };
    Some(Contact {
        point: ca + normal * (ra - depth * 0.5),
        normal,
        depth,
    })
}

/// Polygon (A) versus circle (B); normal points from the polygon to the circle.
fn polygon_circle(verts: &[Vec2], center: Vec2, radius: f32) -> Option<Contact> {
    let closest = closest_point_on_polygon(verts, center);
    let delta = center - closest.point;
    if closest.inside {
        // Circle center inside the polygon: push out along the nearest face.
        return Some(Contact {
            point: closest.point,
            normal: closest.face_normal,
            depth: radius + delta.length(),
        });
    }
    let dist = delta.length();
    if dist >= radius {
        return None;
    }
    let normal = if dist > 1e-6 {
        delta / dist
    } else {
        closest.face_normal
    };
    Some(Contact {
        point: closest.point,
        normal,
        depth: radius - dist,
    })
}

struct ClosestPoint {
    point: Vec2,
    /// Outward normal of the face the closest point lies on.
    face_normal: Vec2,
    inside: bool,
}

fn closest_point_on_polygon(verts: &[Vec2], p: Vec2) -> ClosestPoint {
    let mut best = ClosestPoint {
        point: verts[0],
        face_normal: Vec2::X,
        inside: true,
    };
    let mut best_dist = f32::MAX;
    let mut min_separation = f32::MIN;
    let mut min_sep_face = (Vec2::ZERO, Vec2::X);
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[(i + 1) % verts.len()];
        let edge = b - a;
        let normal = Vec2::new(edge.y, -edge.x).normalize_or_zero();
        let separation = (p - a).dot(normal);
        if separation > 0.0 {
            best.inside = false;
        }
        if separation > min_separation {
            min_separation = separation;
            min_sep_face = (a, normal);
        }
        let t = ((p - a).dot(edge) / edge.length_squared()).clamp(0.0, 1.0);
        let q = a + edge * t;
        let d = p.distance_squared(q);
        if d < best_dist {
            best_dist = d;
            best.point = q;
            best.face_normal = normal;
        }
    }
    if best.inside {
        // Project onto the least-penetrated face.
        let (a, normal) = min_sep_face;
        best.point = p - normal * (p - a).dot(normal);
        best.face_normal = normal;
    }
    best
}

/// SAT over both polygons' face normals; the contact point is the deepest
/// vertex of the incident polygon. Normal points from A to B.
fn polygon_polygon(va: &[Vec2], vb: &[Vec2]) -> Option<Contact> {
    let mut min_depth = f32::MAX;
    let mut min_normal = Vec2::X;
    let mut reference_is_a = true;

    for (verts, other, from_a) in [(va, vb, true), (vb, va, false)] {
        for i in 0..verts.len() {
            let a = verts[i];
            let b = verts[(i + 1) % verts.len()];
            let edge = b - a;
            let normal = Vec2::new(edge.y, -edge.x).normalize_or_zero();
            // Deepest point of the other polygon behind this face.
            let mut separation = f32::MAX;
            for &v in other {
                separation = separation.min((v - a).dot(normal));
            }
            if separation > 0.0 {
                return None; // Separating axis found.
            }
            if -separation < min_depth {
                min_depth = -separation;
                min_normal = normal;
                reference_is_a = from_a;
            }
        }
    }

    // Orient the normal from A to B.
    let normal = if reference_is_a { min_normal } else { -min_normal };
    // Incident point: deepest vertex of the non-reference polygon.
    let incident = if reference_is_a { vb } else { va };
    let mut point = incident[0];
    let mut deepest = f32::MAX;
    for &v in incident {
        let d = v.dot(min_normal);
        if d < deepest {
            deepest = d;
            point = v;
        }
    }
    Some(Contact {
        point,
        normal,
        depth: min_depth,
    })
}

fn segment_circle(a: Vec2, b: Vec2, seg_radius: f32, center: Vec2, radius: f32) -> Option<Contact> {
    let edge = b - a;
    let t = ((center - a).dot(edge) / edge.length_squared()).clamp(0.0, 1.0);
    let q = a + edge * t;
    let delta = center - q;
    let dist = delta.length();
    let depth = seg_radius + radius - dist;
    if depth <= 0.0 {
        return None;
    }
    let normal = if dist > 1e-6 {
        delta / dist
    } else {
        edge.perp().normalize_or_zero()
    };
    Some(Contact {
        point: q + normal * seg_radius,
        normal,
        depth,
    })
}

/// Thick segment (A) versus polygon (B): deepest polygon vertex within the
/// segment's radius. Adequate for long boundary walls against small convex
/// hulls, which is the only way the simulation uses segments.
fn segment_polygon(a: Vec2, b: Vec2, seg_radius: f32, verts: &[Vec2]) -> Option<Contact> {
    let edge = b - a;
    let len_sq = edge.length_squared();
    let mut best: Option<Contact> = None;
    for &v in verts {
        let t = ((v - a).dot(edge) / len_sq).clamp(0.0, 1.0);
        let q = a + edge * t;
        let delta = v - q;
        let dist = delta.length();
        let depth = seg_radius - dist;
        if depth <= 0.0 {
            continue;
        }
        let normal = if dist > 1e-6 {
            delta / dist
        } else {
            edge.perp().normalize_or_zero()
        };
        let replace = match &best {
            Some(c) => depth > c.depth,
            None => true,
        };
        if replace {
            best = Some(Contact {
                point: q + normal * seg_radius,
                normal,
                depth,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn circles_overlapping() {
        let a = Shape::circle(10.0, 1.0, 0.2);
        let b = Shape::circle(10.0, 1.0, 0.2);
        let c = collide(&a, Vec2::ZERO, 0.0, &b, Vec2::new(15.0, 0.0), 0.0).unwrap();
        assert_relative_eq!(c.depth, 5.0, epsilon = 1e-4);
        assert_relative_eq!(c.normal.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn circles_apart() {
        let a = Shape::circle(10.0, 1.0, 0.2);
        let b = Shape::circle(10.0, 1.0, 0.2);
        assert!(collide(&a, Vec2::ZERO, 0.0, &b, Vec2::new(25.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn boxes_overlapping() {
        let a = Shape::boxed(5.0, 5.0, 1.0, 0.2);
        let b = Shape::boxed(5.0, 5.0, 1.0, 0.2);
        let c = collide(&a, Vec2::ZERO, 0.0, &b, Vec2::new(8.0, 0.0), 0.0).unwrap();
        assert_relative_eq!(c.depth, 2.0, epsilon = 1e-4);
        assert_relative_eq!(c.normal.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn boxes_separated_diagonally() {
        let a = Shape::boxed(5.0, 5.0, 1.0, 0.2);
        let b = Shape::boxed(5.0, 5.0, 1.0, 0.2);
        assert!(collide(&a, Vec2::ZERO, 0.0, &b, Vec2::new(11.0, 11.0), 0.0).is_none());
    }

    #[test]
    fn box_against_circle() {
        let a = Shape::boxed(5.0, 5.0, 1.0, 0.2);
        let b = Shape::circle(3.0, 1.0, 0.2);
        let c = collide(&a, Vec2::ZERO, 0.0, &b, Vec2::new(7.0, 0.0), 0.0).unwrap();
        assert_relative_eq!(c.depth, 1.0, epsilon = 1e-4);
        assert!(c.normal.x > 0.99);
    }

    #[test]
    fn wall_against_circle() {
        let wall = Shape::segment(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0), 10.0, 1.0);
        let ball = Shape::circle(5.0, 1.0, 0.2);
        let c = collide(&wall, Vec2::ZERO, 0.0, &ball, Vec2::new(0.0, 12.0), 0.0).unwrap();
        assert_relative_eq!(c.depth, 3.0, epsilon = 1e-4);
        assert_relative_eq!(c.normal.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn wall_against_box_corner() {
        let wall = Shape::segment(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0), 10.0, 1.0);
        let b = Shape::boxed(5.0, 5.0, 1.0, 0.2);
        let c = collide(&wall, Vec2::ZERO, 0.0, &b, Vec2::new(0.0, 13.0), 0.0).unwrap();
        assert_relative_eq!(c.depth, 2.0, epsilon = 1e-4);
        assert!(c.normal.y > 0.99);
    }

    #[test]
    fn rotated_box_reaches_further() {
        let a = Shape::boxed(5.0, 2.5, 1.0, 0.2);
        let b = Shape::boxed(5.0, 2.5, 1.0, 0.2);
        // Apart when axis-aligned at dy=6, touching when A is turned upright.
        assert!(collide(&a, Vec2::ZERO, 0.0, &b, Vec2::new(0.0, 6.0), 0.0).is_none());
        assert!(collide(
            &a,
            Vec2::ZERO,
            core::f32::consts::FRAC_PI_2,
            &b,
            Vec2::new(0.0, 6.0),
            0.0
        )
        .is_some());
    }
}
