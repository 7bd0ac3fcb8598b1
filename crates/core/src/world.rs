//! The match world: construction, collision rules, the tick loop and
//! observations.

use glam::Vec2;
use log::debug;
use serde::Serialize;
use starchase_physics::{self as phys, BodyId, ContactEvent, RigidBody, StepEvents};

use crate::agent::{Action, AgentController};
use crate::config::{self, MatchConfig};
use crate::error::PlacementError;
use crate::objects::{self, Obstacle, Star};
use crate::observation::{normalize_angle, MyCar, Observation, OtherCar, Sighting};
use crate::random::SeededRandom;
use crate::vehicle::{self, Car};

/// Gaussian spread of sampled placements around the arena center.
const STAR_PLACEMENT_SIGMA: f32 = 300.0;
const OBSTACLE_PLACEMENT_SIGMA: f32 = 500.0;

/// Accepted placements lie in this annulus, clear of everything else.
const PLACEMENT_MIN_RADIUS: f32 = 100.0;
const PLACEMENT_MAX_RADIUS: f32 = 950.0;
const PLACEMENT_CLEARANCE: f32 = 50.0;

/// What a physics body means to the game, indexed densely by `BodyId`.
#[derive(Debug, Clone, Copy)]
enum BodyKind {
    Wall,
    Chassis { car: usize },
    Tire { car: usize, grip: f32 },
    Obstacle,
    Star { star: usize },
}

/// Game state addressed by the physics callbacks while the world steps.
/// Kept apart from [`SimulationWorld`] so the physics world and the game
/// state can be borrowed independently.
struct GameState {
    kinds: Vec<BodyKind>,
    cars: Vec<Car>,
    stars: Vec<Star>,
    crash_energy_max: f32,
}

impl GameState {
    /// The car owning a body, through either its chassis or a tire.
    fn car_of(&self, id: BodyId) -> Option<usize> {
        match self.kinds[id.index()] {
            BodyKind::Chassis { car } | BodyKind::Tire { car, .. } => Some(car),
            _ => None,
        }
    }

    fn star_of(&self, id: BodyId) -> Option<usize> {
        match self.kinds[id.index()] {
            BodyKind::Star { star } => Some(star),
            _ => None,
        }
    }

    fn add_crash_energy(&mut self, car: usize, energy: f32) {
        let car = &mut self.cars[car];
        car.crash_energy = (car.crash_energy + energy).min(self.crash_energy_max);
    }
}

impl StepEvents for GameState {
    fn update_velocity(&mut self, id: BodyId, body: &mut RigidBody, dt: f32) {
        match self.kinds[id.index()] {
            BodyKind::Tire { grip, .. } => vehicle::tire_velocity_update(body, grip, dt),
            BodyKind::Obstacle | BodyKind::Star { .. } => objects::passive_damping(body),
            BodyKind::Chassis { .. } | BodyKind::Wall => {}
        }
    }

    /// Catch rule: a star touched by any part of a car scores for that
    /// car and passes through it. Stars stay solid to everything else.
    fn contact_begin(&mut self, event: &ContactEvent) -> bool {
        if event.tag_a != objects::STAR_TAG && event.tag_b != objects::STAR_TAG {
            return true;
        }
        let Some(car) = self.car_of(event.a).or_else(|| self.car_of(event.b)) else {
            return true;
        };
        if let Some(star) = self.star_of(event.a).or_else(|| self.star_of(event.b)) {
            // A star grazed by two tires in one tick still scores once.
            if !self.stars[star].is_caught {
                self.stars[star].is_caught = true;
                self.cars[car].score += 1;
                debug!("car {car} caught star {star}");
            }
        }
        false
    }

    /// Crash rule: every car party to a contact absorbs half the
    /// dissipated energy, up to the repair-time cap.
    fn post_solve(&mut self, event: &ContactEvent) {
        if event.tag_a != vehicle::CAR_TAG && event.tag_b != vehicle::CAR_TAG {
            return;
        }
        let first = self.car_of(event.a);
        let second = self.car_of(event.b);
        if let Some(car) = first {
            self.add_crash_energy(car, event.total_ke / 2.0);
        }
        if let Some(car) = second.filter(|&car| Some(car) != first) {
            self.add_crash_energy(car, event.total_ke / 2.0);
        }
    }
}

/// Per-tick telemetry for an external frame consumer.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub tick: u32,
    pub cars: Vec<CarFrame>,
    pub obstacles: Vec<Vec2>,
    pub stars: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarFrame {
    pub position: Vec2,
    pub angle: f32,
    pub score: u32,
    pub crash_energy: f32,
    /// The clipped action recorded this tick, before actuation noise.
    pub action: Action,
}

/// One running match.
pub struct SimulationWorld {
    config: MatchConfig,
    physics: phys::World,
    state: GameState,
    obstacles: Vec<Obstacle>,
    world_rng: SeededRandom,
    control_rng: SeededRandom,
    tick: u32,
    actions: Vec<Action>,
}

impl SimulationWorld {
    /// Build the arena: walls, cars on the spawn circle, then obstacles
    /// and stars placed by rejection sampling.
    pub fn new(config: MatchConfig, seed: u32) -> Result<Self, PlacementError> {
        let mut world = Self {
            physics: phys::World::new(),
            state: GameState {
                kinds: Vec::new(),
                cars: Vec::new(),
                stars: Vec::new(),
                crash_energy_max: config.crash_energy_max(),
            },
            obstacles: Vec::new(),
            // Identically seeded but independent: placement draws must
            // not depend on how much actuation noise has been consumed.
            world_rng: SeededRandom::new(seed),
            control_rng: SeededRandom::new(seed),
            tick: 0,
            actions: vec![Action::NEUTRAL; config.car_count],
            config,
        };

        for _ in 0..objects::add_walls(&mut world.physics) {
            world.state.kinds.push(BodyKind::Wall);
        }

        let spawn_step = core::f32::consts::TAU / world.config.car_count as f32;
        for i in 0..world.config.car_count {
            let angle = spawn_step * i as f32;
            let position = Vec2::from_angle(angle) * config::SPAWN_RADIUS;
            let car = Car::spawn(&mut world.physics);
            car.set_position_and_angle(&mut world.physics, position, angle);
            let index = world.state.cars.len();
            world.state.kinds.push(BodyKind::Chassis { car: index });
            for grip in vehicle::TIRE_GRIPS {
                world.state.kinds.push(BodyKind::Tire { car: index, grip });
            }
            world.state.cars.push(car);
        }

        for _ in 0..world.config.obstacle_count {
            let position = world.random_position(OBSTACLE_PLACEMENT_SIGMA)?;
            let angle = world.world_rng.next_range(0.0, core::f32::consts::TAU);
            let obstacle = Obstacle::spawn(&mut world.physics);
            world.state.kinds.push(BodyKind::Obstacle);
            world
                .physics
                .set_position_and_angle(obstacle.body, position, angle);
            world.obstacles.push(obstacle);
        }

        for _ in 0..world.config.star_count {
            let star = Star::spawn(&mut world.physics);
            let index = world.state.stars.len();
            world.state.kinds.push(BodyKind::Star { star: index });
            world.state.stars.push(star);
            world.reset_star_position(index)?;
        }

        debug_assert_eq!(world.state.kinds.len(), world.physics.body_count());
        Ok(world)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn scores(&self) -> Vec<u32> {
        self.state.cars.iter().map(|car| car.score).collect()
    }

    /// Sample a position in the annulus, at least the clearance distance
    /// from every car, obstacle and star. Fails after the retry cap.
    fn random_position(&mut self, sigma: f32) -> Result<Vec2, PlacementError> {
        for _ in 0..config::PLACEMENT_RETRY_CAP {
            let radius = self.world_rng.gauss(0.0, sigma);
            let rotation = self.world_rng.next_range(0.0, core::f32::consts::TAU);
            let candidate = Vec2::from_angle(rotation) * radius;

            let length = candidate.length();
            if length <= PLACEMENT_MIN_RADIUS || length >= PLACEMENT_MAX_RADIUS {
                continue;
            }
            if self.placement_blocked(candidate) {
                continue;
            }
            return Ok(candidate);
        }
        Err(PlacementError::Exhausted {
            attempts: config::PLACEMENT_RETRY_CAP,
        })
    }

    fn placement_blocked(&self, candidate: Vec2) -> bool {
        let cars = self
            .state
            .cars
            .iter()
            .map(|car| self.physics.body(car.chassis).position);
        let obstacles = self
            .obstacles
            .iter()
            .map(|obstacle| self.physics.body(obstacle.body).position);
        let stars = self
            .state
            .stars
            .iter()
            .map(|star| self.physics.body(star.body).position);
        cars.chain(obstacles)
            .chain(stars)
            .any(|position| (position - candidate).length() < PLACEMENT_CLEARANCE)
    }

    /// Move a star to a fresh position and heading, clearing its flag.
    fn reset_star_position(&mut self, star: usize) -> Result<(), PlacementError> {
        let position = self.random_position(STAR_PLACEMENT_SIGMA)?;
        let angle = self.world_rng.next_range(0.0, core::f32::consts::TAU);
        let body = self.state.stars[star].body;
        self.physics.set_position_and_angle(body, position, angle);
        self.state.stars[star].is_caught = false;
        debug!("star {star} placed at {position}");
        Ok(())
    }

    /// Advance the match by one tick. Cars beyond the supplied agents run
    /// on the neutral action. Returns `true` once the match is over.
    pub fn step(
        &mut self,
        agents: &mut [Box<dyn AgentController>],
    ) -> Result<bool, PlacementError> {
        self.tick += 1;

        for car_index in 0..self.state.cars.len() {
            let observation = self.observe(car_index);
            let raw = match agents.get_mut(car_index) {
                Some(agent) => agent.request_action(&observation),
                None => Action::NEUTRAL,
            };
            let action = raw.clipped();
            self.actions[car_index] = action;

            // Crashed cars are in repair: no actuation until the energy
            // has drained.
            let car = &mut self.state.cars[car_index];
            if car.crash_energy > 0.0 {
                car.crash_energy = (car.crash_energy - config::CRASH_ENERGY_UNIT).max(0.0);
                continue;
            }

            let sigma = config::CONTROL_NOISE_SIGMA;
            let acceleration =
                (action.acceleration + self.control_rng.gauss(0.0, sigma)).clamp(-1.0, 1.0);
            let braking = (action.braking + self.control_rng.gauss(0.0, sigma)).clamp(0.0, 1.0);
            let steering = (action.steering + self.control_rng.gauss(0.0, sigma)).clamp(-1.0, 1.0);

            let car = self.state.cars[car_index];
            car.accelerate(&mut self.physics, acceleration * config::ACCELERATE_SCALE);
            car.brake(&mut self.physics, braking * config::BRAKE_SCALE);
            car.steer(&mut self.physics, steering * config::STEER_SCALE);
        }

        self.physics.step(self.config.dt(), &mut self.state);

        // Caught stars reappear elsewhere before the next tick observes.
        for star in 0..self.state.stars.len() {
            if self.state.stars[star].is_caught {
                self.reset_star_position(star)?;
            }
        }

        Ok(self.tick >= self.config.total_ticks())
    }

    /// Build the egocentric observation for one car from current state.
    pub fn observe(&self, car_index: usize) -> Observation {
        let my = &self.state.cars[car_index];
        let chassis = self.physics.body(my.chassis);
        let my_position = chassis.position;
        let my_angle = chassis.angle;
        let my_velocity = chassis.linvel;
        let into_my_frame = Vec2::from_angle(-my_angle);
        let tick_rate = self.config.tick_rate as f32;

        let local_velocity = into_my_frame.rotate(my_velocity);
        let my_car = MyCar {
            position: my_position,
            angle: normalize_angle(my_angle),
            velocity_angle: normalize_angle(local_velocity.y.atan2(local_velocity.x)),
            velocity_length: local_velocity.length() / tick_rate,
            steering_angle: normalize_angle(my.steering_angle(&self.physics)),
            steering_torque: my.steering_torque(&self.physics) / config::STEER_SCALE,
            score: my.score,
            crash_energy: my.crash_energy / config::CRASH_ENERGY_UNIT,
        };

        let other_cars = self
            .state
            .cars
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != car_index)
            .map(|(_, other)| {
                let body = self.physics.body(other.chassis);
                let delta = into_my_frame.rotate(body.position - my_position);
                let relative_velocity = into_my_frame.rotate(body.linvel - my_velocity);
                OtherCar {
                    position_angle: normalize_angle(delta.y.atan2(delta.x)),
                    position_length: delta.length(),
                    angle: normalize_angle(body.angle - my_angle),
                    velocity_angle: normalize_angle(
                        relative_velocity.y.atan2(relative_velocity.x),
                    ),
                    velocity_length: relative_velocity.length() / tick_rate,
                    steering_angle: normalize_angle(other.steering_angle(&self.physics)),
                    score: other.score,
                    crash_energy: other.crash_energy / config::CRASH_ENERGY_UNIT,
                }
            })
            .collect();

        let sight = |body: BodyId| {
            Sighting::of(self.physics.body(body).position, my_position, my_angle)
        };
        let obstacles = self
            .obstacles
            .iter()
            .map(|obstacle| sight(obstacle.body))
            .collect();
        let stars = self
            .state
            .stars
            .iter()
            .map(|star| sight(star.body))
            .collect();

        Observation {
            my_car,
            other_cars,
            obstacles,
            stars,
        }
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            tick: self.tick,
            cars: self
                .state
                .cars
                .iter()
                .zip(&self.actions)
                .map(|(car, &action)| {
                    let body = self.physics.body(car.chassis);
                    CarFrame {
                        position: body.position,
                        angle: body.angle,
                        score: car.score,
                        crash_energy: car.crash_energy,
                        action,
                    }
                })
                .collect(),
            obstacles: self
                .obstacles
                .iter()
                .map(|obstacle| self.physics.body(obstacle.body).position)
                .collect(),
            stars: self
                .state
                .stars
                .iter()
                .map(|star| self.physics.body(star.body).position)
                .collect(),
        }
    }
}
