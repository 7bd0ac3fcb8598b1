//! Rigid bodies.

use glam::Vec2;

use crate::shape::Shape;

/// Dense index of a body inside a [`crate::World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

impl BodyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Static,
}

/// A 2D rigid body. Mass and moment are derived from the attached shapes.
///
/// `collision_tag` classifies every shape of the body for the contact
/// callbacks (0 = untagged); the simulation layer maps tags back to game
/// entities.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub position: Vec2,
    pub angle: f32,
    pub linvel: Vec2,
    pub angvel: f32,
    /// Accumulated force, cleared at the start of each step's integration.
    pub force: Vec2,
    /// Accumulated torque, cleared at the start of each step's integration.
    pub torque: f32,
    pub collision_tag: u8,
    mass: f32,
    inv_mass: f32,
    moment: f32,
    inv_moment: f32,
    shapes: Vec<Shape>,
}

impl RigidBody {
    pub fn dynamic() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            angle: 0.0,
            linvel: Vec2::ZERO,
            angvel: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            collision_tag: 0,
            mass: 0.0,
            inv_mass: 0.0,
            moment: 0.0,
            inv_moment: 0.0,
            shapes: Vec::new(),
        }
    }

    pub fn fixed() -> Self {
        Self {
            body_type: BodyType::Static,
            ..Self::dynamic()
        }
    }

    pub fn with_tag(mut self, tag: u8) -> Self {
        self.collision_tag = tag;
        self
    }

    /// Attach a shape, accumulating the body's mass and moment from it.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        if self.body_type == BodyType::Dynamic {
            self.mass += shape.mass();
            self.moment += shape.moment();
            self.inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
            self.inv_moment = if self.moment > 0.0 {
                1.0 / self.moment
            } else {
                0.0
            };
        }
        self.shapes.push(shape);
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn moment(&self) -> f32 {
        self.moment
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn inv_moment(&self) -> f32 {
        self.inv_moment
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    /// Rotate a body-local vector into world space.
    pub fn local_to_world_vec(&self, v: Vec2) -> Vec2 {
        Vec2::from_angle(self.angle).rotate(v)
    }

    /// Rotate a world vector into the body frame.
    pub fn world_to_local_vec(&self, v: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle).rotate(v)
    }

    /// Linear velocity expressed in the body frame.
    pub fn local_velocity(&self) -> Vec2 {
        self.world_to_local_vec(self.linvel)
    }

    /// Accumulate a force given in body-local coordinates, acting through
    /// the body origin. Takes effect at the next step's integration.
    pub fn apply_force_local(&mut self, force: Vec2) {
        self.force += self.local_to_world_vec(force);
    }

    /// Apply an impulse given in body-local coordinates, acting through
    /// the body origin. Changes velocity immediately.
    pub fn apply_impulse_local(&mut self, impulse: Vec2) {
        self.linvel += self.local_to_world_vec(impulse) * self.inv_mass;
    }

    /// Apply a world-space impulse at a world point (used by the solver).
    pub(crate) fn apply_impulse_at(&mut self, impulse: Vec2, point: Vec2) {
        self.linvel += impulse * self.inv_mass;
        self.angvel += (point - self.position).perp_dot(impulse) * self.inv_moment;
    }

    /// Velocity of a world-space point attached to this body.
    pub(crate) fn velocity_at(&self, point: Vec2) -> Vec2 {
        self.linvel + (point - self.position).perp() * self.angvel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mass_accumulates_over_shapes() {
        let body = RigidBody::dynamic()
            .with_shape(Shape::boxed(5.0, 2.5, 1.0, 0.2))
            .with_shape(Shape::circle(1.0, 2.0, 0.2));
        let expected = 50.0 + core::f32::consts::PI * 2.0;
        assert_relative_eq!(body.mass(), expected, epsilon = 1e-3);
        assert_relative_eq!(body.inv_mass(), 1.0 / expected, epsilon = 1e-6);
    }

    #[test]
    fn static_body_has_no_inverse_mass() {
        let body = RigidBody::fixed().with_shape(Shape::segment(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            1.0,
            1.0,
        ));
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_moment(), 0.0);
    }

    #[test]
    fn local_impulse_rotates_with_body() {
        let mut body = RigidBody::dynamic().with_shape(Shape::boxed(5.0, 2.5, 1.0, 0.2));
        body.angle = core::f32::consts::FRAC_PI_2;
        body.apply_impulse_local(Vec2::new(body.mass(), 0.0));
        // Local +x is world +y after a quarter turn.
        assert_relative_eq!(body.linvel.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(body.linvel.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn point_velocity_includes_rotation() {
        let mut body = RigidBody::dynamic().with_shape(Shape::circle(1.0, 1.0, 0.0));
        body.angvel = 2.0;
        let v = body.velocity_at(body.position + Vec2::new(1.0, 0.0));
        assert_relative_eq!(v.y, 2.0, epsilon = 1e-5);
    }
}
