//! The vehicle model.
//!
//! A car is five bodies: a light hexagonal chassis and four heavy tires
//! pinned to it by pivot joints. The front-left tire steers within its
//! rotary limit, the front-right is slaved to it and the rear tires are
//! locked straight. All driving forces act on the tires; the chassis is
//! just along for the ride.

use glam::Vec2;
use starchase_physics::{BodyId, Joint, RigidBody, Shape, World};

/// Collision tag shared by every chassis and tire shape.
pub const CAR_TAG: u8 = 1;

/// Hard cap on any tire's speed.
pub const MAX_SPEED: f32 = 300.0;

/// Maximum steering deflection of the front tires.
pub const STEERING_LIMIT: f32 = core::f32::consts::PI / 6.0;

/// Rear grip is lower than front so the tail slides out under power.
pub const FRONT_GRIP: f32 = 500.0;
pub const REAR_GRIP: f32 = 300.0;

/// Tire slots, in body-creation order.
pub const FRONT_LEFT: usize = 0;
pub const FRONT_RIGHT: usize = 1;
pub const REAR_LEFT: usize = 2;
pub const REAR_RIGHT: usize = 3;

pub const TIRE_GRIPS: [f32; 4] = [FRONT_GRIP, FRONT_GRIP, REAR_GRIP, REAR_GRIP];

const TIRE_OFFSETS: [Vec2; 4] = [
    Vec2::new(12.5, 12.5),
    Vec2::new(12.5, -12.5),
    Vec2::new(-12.5, 15.0),
    Vec2::new(-12.5, -15.0),
];

const CHASSIS_VERTS: [Vec2; 6] = [
    Vec2::new(-20.0, 7.5),
    Vec2::new(-5.0, 10.0),
    Vec2::new(20.0, 5.0),
    Vec2::new(20.0, -5.0),
    Vec2::new(-5.0, -10.0),
    Vec2::new(-20.0, -7.5),
];

const CHASSIS_DENSITY: f32 = 0.01;
const TIRE_DENSITY: f32 = 1.0;
const ELASTICITY: f32 = 0.2;

/// One car's bodies and match state. Body handles are stable for the
/// lifetime of the world.
#[derive(Debug, Clone, Copy)]
pub struct Car {
    pub chassis: BodyId,
    pub tires: [BodyId; 4],
    pub score: u32,
    pub crash_energy: f32,
}

impl Car {
    /// Create the five bodies and seven joints of a car at the origin.
    pub fn spawn(world: &mut World) -> Self {
        let chassis = world.add_body(
            RigidBody::dynamic()
                .with_tag(CAR_TAG)
                .with_shape(Shape::polygon(&CHASSIS_VERTS, CHASSIS_DENSITY, ELASTICITY)),
        );

        let mut tires = [chassis; 4];
        for (slot, offset) in TIRE_OFFSETS.iter().enumerate() {
            let mut tire = RigidBody::dynamic()
                .with_tag(CAR_TAG)
                .with_shape(Shape::boxed(5.0, 2.5, TIRE_DENSITY, ELASTICITY));
            tire.position = *offset;
            tires[slot] = world.add_body(tire);
        }

        // Pin each tire to the chassis at its mounting point.
        for (slot, offset) in TIRE_OFFSETS.iter().enumerate() {
            world.add_joint(Joint::pivot(
                chassis,
                tires[slot],
                *offset,
                (Vec2::ZERO, 0.0),
                (*offset, 0.0),
            ));
        }

        // Front-left steers within the lock, front-right mirrors it,
        // rears are locked straight.
        world.add_joint(Joint::rotary_limit(
            chassis,
            tires[FRONT_LEFT],
            -STEERING_LIMIT,
            STEERING_LIMIT,
        ));
        world.add_joint(Joint::rotary_limit(
            tires[FRONT_LEFT],
            tires[FRONT_RIGHT],
            0.0,
            0.0,
        ));
        world.add_joint(Joint::rotary_limit(chassis, tires[REAR_LEFT], 0.0, 0.0));
        world.add_joint(Joint::rotary_limit(chassis, tires[REAR_RIGHT], 0.0, 0.0));

        Self {
            chassis,
            tires,
            score: 0,
            crash_energy: 0.0,
        }
    }

    /// Teleport the whole car, tires re-posed at their rotated offsets.
    pub fn set_position_and_angle(&self, world: &mut World, position: Vec2, angle: f32) {
        world.set_position_and_angle(self.chassis, position, angle);
        let rot = Vec2::from_angle(angle);
        for (slot, offset) in TIRE_OFFSETS.iter().enumerate() {
            world.set_position_and_angle(self.tires[slot], position + rot.rotate(*offset), angle);
        }
    }

    /// Drive force, split across the rear tires. Reverse is half strength
    /// so nobody wins by driving backwards.
    pub fn accelerate(&self, world: &mut World, force: f32) {
        for slot in [REAR_LEFT, REAR_RIGHT] {
            tire_accelerate(world.body_mut(self.tires[slot]), force / 2.0);
        }
    }

    /// Braking force, split across all four tires.
    pub fn brake(&self, world: &mut World, force: f32) {
        for tire in self.tires {
            tire_brake(world.body_mut(tire), force / 4.0);
        }
    }

    /// Steering torque on the front tires; the rotary limits keep the
    /// deflection inside the lock.
    pub fn steer(&self, world: &mut World, torque: f32) {
        for slot in [FRONT_LEFT, FRONT_RIGHT] {
            world.body_mut(self.tires[slot]).torque += torque / 2.0;
        }
    }

    /// Front-tire deflection relative to the chassis, unnormalized.
    pub fn steering_angle(&self, world: &World) -> f32 {
        world.body(self.tires[FRONT_LEFT]).angle - world.body(self.chassis).angle
    }

    /// Angular momentum of the front tires, the observation's raw
    /// steering-torque reading.
    pub fn steering_torque(&self, world: &World) -> f32 {
        [FRONT_LEFT, FRONT_RIGHT]
            .iter()
            .map(|&slot| {
                let tire = world.body(self.tires[slot]);
                tire.moment() * tire.angvel
            })
            .sum()
    }
}

fn tire_accelerate(tire: &mut RigidBody, force: f32) {
    let force = if force < 0.0 { force * 0.5 } else { force };
    tire.apply_force_local(Vec2::new(force, 0.0));
}

fn tire_brake(tire: &mut RigidBody, force: f32) {
    // Momentum-cancelling longitudinal force, clamped so braking can
    // slow the tire but never push it backwards.
    let mut p = -tire.mass() * tire.local_velocity().x;
    if p.abs() > force {
        p = force * p.signum();
    }
    tire.apply_force_local(Vec2::new(p, 0.0));
}

/// Per-tire velocity hook, run every step after force integration.
pub fn tire_velocity_update(tire: &mut RigidBody, grip: f32, dt: f32) {
    let local = tire.local_velocity();

    // Rolling drag along the tire's axis.
    tire.apply_force_local(Vec2::new(-5.0 * tire.mass() * local.x, 0.0));

    // Grip cancels lateral momentum up to its limit; beyond it the tire
    // slides and the remainder survives as drift.
    let mut p = -tire.mass() * local.y;
    if p.abs() > grip {
        p = grip * p.signum();
    }
    tire.apply_impulse_local(Vec2::new(0.0, p));

    // Turning a tire is hard, holding it still is easy.
    tire.torque -= tire.moment() * tire.angvel * (1.0 / dt) * 0.1;

    let speed = tire.linvel.length();
    if speed > MAX_SPEED {
        tire.linvel *= MAX_SPEED / speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use starchase_physics::StepEvents;

    const DT: f32 = 1.0 / 30.0;

    struct TireEvents {
        tires: Vec<(BodyId, f32)>,
    }

    impl TireEvents {
        fn for_car(car: &Car) -> Self {
            Self {
                tires: car
                    .tires
                    .iter()
                    .zip(TIRE_GRIPS)
                    .map(|(&id, grip)| (id, grip))
                    .collect(),
            }
        }
    }

    impl StepEvents for TireEvents {
        fn update_velocity(&mut self, id: BodyId, body: &mut RigidBody, dt: f32) {
            if let Some(&(_, grip)) = self.tires.iter().find(|(tire, _)| *tire == id) {
                tire_velocity_update(body, grip, dt);
            }
        }
    }

    fn drive(world: &mut World, car: &Car, ticks: u32, act: impl Fn(&Car, &mut World)) {
        let mut events = TireEvents::for_car(car);
        for _ in 0..ticks {
            act(car, world);
            world.step(DT, &mut events);
        }
    }

    #[test]
    fn accelerating_moves_along_heading() {
        let mut world = World::new();
        let car = Car::spawn(&mut world);
        drive(&mut world, &car, 60, |car, world| {
            car.accelerate(world, 20_000.0)
        });
        let position = world.body(car.chassis).position;
        // Rolling drag caps the terminal speed around 20 units/s.
        assert!(position.x > 20.0, "car only reached {position}");
        assert!(
            position.y.abs() < position.x * 0.2,
            "car drifted sideways to {position}"
        );
    }

    #[test]
    fn reverse_is_weaker_than_forward() {
        let mut forward = World::new();
        let car = Car::spawn(&mut forward);
        drive(&mut forward, &car, 60, |car, world| {
            car.accelerate(world, 20_000.0)
        });

        let mut backward = World::new();
        let car_b = Car::spawn(&mut backward);
        drive(&mut backward, &car_b, 60, |car, world| {
            car.accelerate(world, -20_000.0)
        });

        let ahead = forward.body(car.chassis).position.x;
        let behind = -backward.body(car_b.chassis).position.x;
        assert!(behind > 0.0, "reverse never moved the car");
        assert!(behind < ahead * 0.75, "reverse {behind} vs forward {ahead}");
    }

    #[test]
    fn braking_stops_without_reversing() {
        let mut world = World::new();
        let car = Car::spawn(&mut world);
        drive(&mut world, &car, 60, |car, world| {
            car.accelerate(world, 20_000.0)
        });
        drive(&mut world, &car, 90, |car, world| car.brake(world, 200_000.0));
        let velocity = world.body(car.chassis).linvel;
        assert!(
            velocity.x > -1.0,
            "braking pushed the car backwards: {velocity}"
        );
        assert!(velocity.length() < 10.0, "car still moving at {velocity}");
    }

    #[test]
    fn steering_saturates_at_the_lock() {
        let mut world = World::new();
        let car = Car::spawn(&mut world);
        drive(&mut world, &car, 90, |car, world| car.steer(world, 20_000.0));
        let deflection = car.steering_angle(&world);
        assert!(deflection > 0.1, "steering never deflected: {deflection}");
        assert!(
            deflection < STEERING_LIMIT + 0.05,
            "steering {deflection} passed the lock"
        );
    }

    #[test]
    fn front_right_mirrors_front_left() {
        let mut world = World::new();
        let car = Car::spawn(&mut world);
        drive(&mut world, &car, 60, |car, world| car.steer(world, 20_000.0));
        let fl = world.body(car.tires[FRONT_LEFT]).angle;
        let fr = world.body(car.tires[FRONT_RIGHT]).angle;
        assert_relative_eq!(fl, fr, epsilon = 0.05);
    }

    #[test]
    fn grip_cancels_small_lateral_velocity() {
        let mut tire = RigidBody::dynamic().with_shape(Shape::boxed(5.0, 2.5, 1.0, 0.2));
        tire.linvel = Vec2::new(0.0, 5.0);
        tire_velocity_update(&mut tire, FRONT_GRIP, DT);
        assert_relative_eq!(tire.linvel.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn grip_clamp_leaves_drift_above_the_limit() {
        // Lateral momentum 50 * 20 = 1000 against grip 500: half survives.
        let mut tire = RigidBody::dynamic().with_shape(Shape::boxed(5.0, 2.5, 1.0, 0.2));
        tire.linvel = Vec2::new(0.0, 20.0);
        tire_velocity_update(&mut tire, FRONT_GRIP, DT);
        assert_relative_eq!(tire.linvel.y, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn speed_is_capped() {
        let mut tire = RigidBody::dynamic().with_shape(Shape::boxed(5.0, 2.5, 1.0, 0.2));
        tire.linvel = Vec2::new(1000.0, 0.0);
        tire_velocity_update(&mut tire, FRONT_GRIP, DT);
        assert!(tire.linvel.length() <= MAX_SPEED + 1e-3);
    }

    #[test]
    fn teleport_moves_tires_with_the_chassis() {
        let mut world = World::new();
        let car = Car::spawn(&mut world);
        let angle = core::f32::consts::FRAC_PI_2;
        car.set_position_and_angle(&mut world, Vec2::new(100.0, 200.0), angle);
        // Front-left offset (12.5, 12.5) rotated a quarter turn.
        let tire = world.body(car.tires[FRONT_LEFT]);
        assert_relative_eq!(tire.position.x, 100.0 - 12.5, epsilon = 1e-3);
        assert_relative_eq!(tire.position.y, 200.0 + 12.5, epsilon = 1e-3);
        assert_relative_eq!(tire.angle, angle);
    }
}
