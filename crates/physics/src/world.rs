//! The physics world and its fixed-timestep solver.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::body::{BodyId, RigidBody};
use crate::collision::{collide, Contact};
use crate::joint::Joint;

const SOLVER_ITERATIONS: usize = 10;
/// Positional correction factor per step.
const BAUMGARTE: f32 = 0.2;
/// Penetration tolerated before positional correction kicks in.
const SLOP: f32 = 0.5;

/// A contact notification delivered to [`StepEvents`].
///
/// `total_ke` estimates the kinetic energy dissipated by the contact this
/// step, from the pre-solve approach speed, reduced mass and restitution.
/// It is zero for `contact_begin` notifications.
#[derive(Debug, Clone, Copy)]
pub struct ContactEvent {
    pub a: BodyId,
    pub b: BodyId,
    pub tag_a: u8,
    pub tag_b: u8,
    pub total_ke: f32,
}

/// Step callbacks, invoked synchronously from [`World::step`].
///
/// `contact_begin` fires once per touch episode of a body pair in which at
/// least one body carries a non-zero collision tag; returning `false`
/// suppresses the physical response for that pair until the bodies
/// separate. `post_solve` fires every step such a (non-suppressed) pair
/// stays in contact.
pub trait StepEvents {
    fn update_velocity(&mut self, _id: BodyId, _body: &mut RigidBody, _dt: f32) {}

    fn contact_begin(&mut self, _event: &ContactEvent) -> bool {
        true
    }

    fn post_solve(&mut self, _event: &ContactEvent) {}
}

/// No-op events, for stepping a world without game logic attached.
pub struct NoEvents;

impl StepEvents for NoEvents {}

struct ContactConstraint {
    a: usize,
    b: usize,
    contact: Contact,
    restitution: f32,
    // Pre-solve data.
    normal_mass: f32,
    approach_speed: f32,
    bias: f32,
    accumulated: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct PairState {
    suppressed: bool,
}

/// The rigid-body world: bodies, joints and persistent contact-pair state.
pub struct World {
    bodies: Vec<RigidBody>,
    joints: Vec<Joint>,
    /// Pairs currently in contact, keyed by body index (low, high).
    pairs: BTreeMap<(u32, u32), PairState>,
    pub gravity: Vec2,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            joints: Vec::new(),
            pairs: BTreeMap::new(),
            gravity: Vec2::ZERO,
        }
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(body);
        id
    }

    pub fn add_joint(&mut self, joint: Joint) {
        self.joints.push(joint);
    }

    pub fn body(&self, id: BodyId) -> &RigidBody {
        &self.bodies[id.index()]
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut RigidBody {
        &mut self.bodies[id.index()]
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Teleport a body, dropping any cached contact-pair state involving it
    /// so that contacts at the new location begin a fresh touch episode.
    pub fn set_position_and_angle(&mut self, id: BodyId, position: Vec2, angle: f32) {
        let body = &mut self.bodies[id.index()];
        body.position = position;
        body.angle = angle;
        let idx = id.0;
        self.pairs.retain(|&(a, b), _| a != idx && b != idx);
    }

    fn jointed(&self, a: usize, b: usize) -> bool {
        self.joints.iter().any(|j| {
            let (ja, jb) = j.bodies();
            (ja.index() == a && jb.index() == b) || (ja.index() == b && jb.index() == a)
        })
    }

    /// Mutable access to two distinct bodies, returned in argument order.
    fn two_bodies(&mut self, a: usize, b: usize) -> (&mut RigidBody, &mut RigidBody) {
        debug_assert_ne!(a, b);
        if a < b {
            let (lo, hi) = self.bodies.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.bodies.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        }
    }

    /// Advance the world by one fixed timestep.
    pub fn step(&mut self, dt: f32, events: &mut dyn StepEvents) {
        let inv_dt = 1.0 / dt;

        // 1. Integrate forces into velocities, then run the per-body hook.
        for i in 0..self.bodies.len() {
            let body = &mut self.bodies[i];
            if body.is_static() {
                continue;
            }
            let accel = self.gravity + body.force * body.inv_mass();
            body.linvel += accel * dt;
            body.angvel += body.torque * body.inv_moment() * dt;
            body.force = Vec2::ZERO;
            body.torque = 0.0;
            events.update_velocity(BodyId(i as u32), body, dt);
        }

        // 2. Broad + narrow phase.
        let aabbs: Vec<(Vec2, Vec2)> = self
            .bodies
            .iter()
            .map(|b| {
                let mut min = Vec2::splat(f32::MAX);
                let mut max = Vec2::splat(f32::MIN);
                for s in b.shapes() {
                    let (smin, smax) = s.aabb(b.position, b.angle);
                    min = min.min(smin);
                    max = max.max(smax);
                }
                (min, max)
            })
            .collect();

        let mut constraints: Vec<ContactConstraint> = Vec::new();
        let n = self.bodies.len();
        for a in 0..n {
            for b in (a + 1)..n {
                if self.bodies[a].is_static() && self.bodies[b].is_static() {
                    continue;
                }
                let (amin, amax) = aabbs[a];
                let (bmin, bmax) = aabbs[b];
                if amax.x < bmin.x || bmax.x < amin.x || amax.y < bmin.y || bmax.y < amin.y {
                    continue;
                }
                // Jointed bodies (a chassis and its tires) do not collide.
                if self.jointed(a, b) {
                    continue;
                }
                let (body_a, body_b) = (&self.bodies[a], &self.bodies[b]);
                for sa in body_a.shapes() {
                    for sb in body_b.shapes() {
                        if let Some(contact) = collide(
                            sa,
                            body_a.position,
                            body_a.angle,
                            sb,
                            body_b.position,
                            body_b.angle,
                        ) {
                            constraints.push(ContactConstraint {
                                a,
                                b,
                                contact,
                                restitution: sa.elasticity * sb.elasticity,
                                normal_mass: 0.0,
                                approach_speed: 0.0,
                                bias: 0.0,
                                accumulated: 0.0,
                            });
                        }
                    }
                }
            }
        }

        // 3. Begin events for fresh touch episodes; honor suppression.
        let mut touching: Vec<(u32, u32)> = constraints
            .iter()
            .map(|c| (c.a as u32, c.b as u32))
            .collect();
        touching.sort_unstable();
        touching.dedup();
        for &(a, b) in &touching {
            if self.pairs.contains_key(&(a, b)) {
                continue;
            }
            let tag_a = self.bodies[a as usize].collision_tag;
            let tag_b = self.bodies[b as usize].collision_tag;
            let mut state = PairState::default();
            if tag_a != 0 || tag_b != 0 {
                let event = ContactEvent {
                    a: BodyId(a),
                    b: BodyId(b),
                    tag_a,
                    tag_b,
                    total_ke: 0.0,
                };
                state.suppressed = !events.contact_begin(&event);
            }
            self.pairs.insert((a, b), state);
        }
        constraints.retain(|c| !self.pairs[&(c.a as u32, c.b as u32)].suppressed);

        // 4. Pre-solve: effective masses, restitution targets, position bias.
        for c in &mut constraints {
            let (ba, bb) = (&self.bodies[c.a], &self.bodies[c.b]);
            let ra = c.contact.point - ba.position;
            let rb = c.contact.point - bb.position;
            let rna = ra.perp_dot(c.contact.normal);
            let rnb = rb.perp_dot(c.contact.normal);
            let k = ba.inv_mass()
                + bb.inv_mass()
                + ba.inv_moment() * rna * rna
                + bb.inv_moment() * rnb * rnb;
            c.normal_mass = if k > 0.0 { 1.0 / k } else { 0.0 };
            let rel_vel = bb.velocity_at(c.contact.point) - ba.velocity_at(c.contact.point);
            c.approach_speed = rel_vel.dot(c.contact.normal).min(0.0);
            c.bias = BAUMGARTE * inv_dt * (c.contact.depth - SLOP).max(0.0);
        }

        // 5. Iterative velocity solve: joints and contacts.
        let joints = std::mem::take(&mut self.joints);
        for _ in 0..SOLVER_ITERATIONS {
            for joint in &joints {
                self.solve_joint(joint, inv_dt);
            }
            for c in &mut constraints {
                let (ba, bb) = self.two_bodies(c.a, c.b);
                let rel_vel = bb.velocity_at(c.contact.point) - ba.velocity_at(c.contact.point);
                let vn = rel_vel.dot(c.contact.normal);
                let target = c.bias - c.restitution * c.approach_speed;
                let mut lambda = c.normal_mass * (target - vn);
                // Accumulated impulse stays non-negative.
                let new_total = (c.accumulated + lambda).max(0.0);
                lambda = new_total - c.accumulated;
                c.accumulated = new_total;
                let impulse = c.contact.normal * lambda;
                ba.apply_impulse_at(-impulse, c.contact.point);
                bb.apply_impulse_at(impulse, c.contact.point);
            }
        }
        self.joints = joints;

        // 6. Integrate positions.
        for body in &mut self.bodies {
            if body.is_static() {
                continue;
            }
            body.position += body.linvel * dt;
            body.angle += body.angvel * dt;
        }

        // 7. Post-solve events with the per-pair dissipated-energy estimate.
        let mut pair_ke: BTreeMap<(u32, u32), f32> = BTreeMap::new();
        for c in &constraints {
            let e = c.restitution;
            let ke = 0.5 * c.normal_mass * c.approach_speed * c.approach_speed * (1.0 - e * e);
            *pair_ke.entry((c.a as u32, c.b as u32)).or_insert(0.0) += ke;
        }
        for (&(a, b), &ke) in &pair_ke {
            let tag_a = self.bodies[a as usize].collision_tag;
            let tag_b = self.bodies[b as usize].collision_tag;
            if tag_a == 0 && tag_b == 0 {
                continue;
            }
            events.post_solve(&ContactEvent {
                a: BodyId(a),
                b: BodyId(b),
                tag_a,
                tag_b,
                total_ke: ke,
            });
        }

        // 8. Separated pairs end their touch episode.
        self.pairs.retain(|key, _| touching.binary_search(key).is_ok());
    }

    fn solve_joint(&mut self, joint: &Joint, inv_dt: f32) {
        match *joint {
            Joint::Pivot {
                a,
                b,
                anchor_a,
                anchor_b,
            } => {
                let (ba, bb) = self.two_bodies(a.index(), b.index());
                let ra = ba.local_to_world_vec(anchor_a);
                let rb = bb.local_to_world_vec(anchor_b);
                let pa = ba.position + ra;
                let pb = bb.position + rb;
                let (ima, imb) = (ba.inv_mass(), bb.inv_mass());
                let (iia, iib) = (ba.inv_moment(), bb.inv_moment());
                let k11 = ima + imb + iia * ra.y * ra.y + iib * rb.y * rb.y;
                let k12 = -iia * ra.x * ra.y - iib * rb.x * rb.y;
                let k22 = ima + imb + iia * ra.x * ra.x + iib * rb.x * rb.x;
                let det = k11 * k22 - k12 * k12;
                if det.abs() < 1e-12 {
                    return;
                }
                let rel_vel = (bb.linvel + rb.perp() * bb.angvel)
                    - (ba.linvel + ra.perp() * ba.angvel);
                let bias = (pb - pa) * (BAUMGARTE * inv_dt);
                let rhs = -(rel_vel + bias);
                let impulse = Vec2::new(
                    (k22 * rhs.x - k12 * rhs.y) / det,
                    (k11 * rhs.y - k12 * rhs.x) / det,
                );
                ba.apply_impulse_at(-impulse, pa);
                bb.apply_impulse_at(impulse, pb);
            }
            Joint::RotaryLimit { a, b, min, max } => {
                let (ba, bb) = self.two_bodies(a.index(), b.index());
                let relative = bb.angle - ba.angle;
                let k = ba.inv_moment() + bb.inv_moment();
                if k <= 0.0 {
                    return;
                }
                let rel_w = bb.angvel - ba.angvel;
                if (max - min).abs() < 1e-9 {
                    // Locked: drive the relative angle to the fixed value.
                    let err = relative - min;
                    let j = -(rel_w + BAUMGARTE * inv_dt * err) / k;
                    ba.angvel -= j * ba.inv_moment();
                    bb.angvel += j * bb.inv_moment();
                } else if relative < min {
                    let err = relative - min;
                    let j = (-(rel_w + BAUMGARTE * inv_dt * err) / k).max(0.0);
                    ba.angvel -= j * ba.inv_moment();
                    bb.angvel += j * bb.inv_moment();
                } else if relative > max {
                    let err = relative - max;
                    let j = (-(rel_w + BAUMGARTE * inv_dt * err) / k).min(0.0);
                    ba.angvel -= j * ba.inv_moment();
                    bb.angvel += j * bb.inv_moment();
                }
            }
        }
    }
}
