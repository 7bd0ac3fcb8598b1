//! Stars, obstacles and the arena walls.

use glam::Vec2;
use starchase_physics::{BodyId, RigidBody, Shape, World};

use crate::config::ARENA_HALF_EXTENT;

/// Collision tag carried by every star shape.
pub const STAR_TAG: u8 = 2;

pub const OBSTACLE_RADIUS: f32 = 10.0;
pub const STAR_OUTER_RADIUS: f32 = 20.0;
pub const STAR_INNER_RADIUS: f32 = 10.0;

const WALL_RADIUS: f32 = 10.0;
const ELASTICITY: f32 = 0.2;

/// A collectible star: five triangular points around an inner pentagon.
/// `is_caught` is set by the catch handler during a physics step and
/// cleared when the star is relocated at the end of the tick.
#[derive(Debug, Clone, Copy)]
pub struct Star {
    pub body: BodyId,
    pub is_caught: bool,
}

impl Star {
    pub fn spawn(world: &mut World) -> Self {
        let step = core::f32::consts::TAU / 5.0;
        let outers: Vec<Vec2> = (0..5)
            .map(|i| Vec2::from_angle(step * i as f32) * STAR_OUTER_RADIUS)
            .collect();
        let inners: Vec<Vec2> = (0..5)
            .map(|i| Vec2::from_angle(step / 2.0 + step * i as f32) * STAR_INNER_RADIUS)
            .collect();

        let mut body = RigidBody::dynamic().with_tag(STAR_TAG);
        for i in 0..5 {
            let previous = (i + 4) % 5;
            body = body.with_shape(Shape::polygon(
                &[outers[i], inners[i], inners[previous]],
                1.0,
                ELASTICITY,
            ));
        }
        body = body.with_shape(Shape::polygon(&inners, 1.0, ELASTICITY));

        Self {
            body: world.add_body(body),
            is_caught: false,
        }
    }
}

/// A free-rolling circular obstacle, denser than anything else so that
/// hitting one hurts.
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub body: BodyId,
}

impl Obstacle {
    pub fn spawn(world: &mut World) -> Self {
        Self {
            body: world.add_body(
                RigidBody::dynamic().with_shape(Shape::circle(OBSTACLE_RADIUS, 2.0, ELASTICITY)),
            ),
        }
    }
}

/// Four perfectly elastic thick segments closing the arena square.
/// Returns the number of wall bodies added.
pub fn add_walls(world: &mut World) -> usize {
    let e = ARENA_HALF_EXTENT;
    let corners = [
        Vec2::new(-e, e),
        Vec2::new(e, e),
        Vec2::new(e, -e),
        Vec2::new(-e, -e),
    ];
    for i in 0..4 {
        world.add_body(RigidBody::fixed().with_shape(Shape::segment(
            corners[i],
            corners[(i + 1) % 4],
            WALL_RADIUS,
            1.0,
        )));
    }
    4
}

/// Velocity hook shared by stars and obstacles: bleed momentum so loose
/// objects roll to a stop instead of pinballing forever.
pub fn passive_damping(body: &mut RigidBody) {
    body.force += body.linvel * (-0.5 * body.mass());
    body.torque += -0.5 * body.moment() * body.angvel;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn star_mass_covers_all_six_shapes() {
        let mut world = World::new();
        let star = Star::spawn(&mut world);
        let body = world.body(star.body);
        assert_eq!(body.shapes().len(), 6);
        assert!(body.mass() > 0.0);
        assert_eq!(body.collision_tag, STAR_TAG);
    }

    #[test]
    fn obstacle_mass_matches_density() {
        let mut world = World::new();
        let obstacle = Obstacle::spawn(&mut world);
        let expected = core::f32::consts::PI * OBSTACLE_RADIUS * OBSTACLE_RADIUS * 2.0;
        assert_relative_eq!(world.body(obstacle.body).mass(), expected, epsilon = 1e-2);
    }

    #[test]
    fn damping_opposes_motion() {
        let mut world = World::new();
        let obstacle = Obstacle::spawn(&mut world);
        let body = world.body_mut(obstacle.body);
        body.linvel = Vec2::new(100.0, 0.0);
        passive_damping(body);
        assert!(body.force.x < 0.0);
    }

    #[test]
    fn walls_are_static_and_elastic() {
        let mut world = World::new();
        let count = add_walls(&mut world);
        assert_eq!(count, 4);
        for i in 0..4 {
            let wall = world.body(starchase_physics::BodyId(i));
            assert!(wall.is_static());
            assert_relative_eq!(wall.shapes()[0].elasticity, 1.0);
        }
    }
}
