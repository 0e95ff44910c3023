use physlab_core::{
    Scalar, Vec3, Isometry, Velocity, BodyId, ColliderId, StateDigest, Digest,
    DeterminismContract, Quat,
};
use physlab_geom::{Aabb, Shape, MassProps, Material, aabb_of};

use crate::bodies::{Bodies, BodyDesc};
use crate::broadphase::sweep_pairs;
use crate::narrowphase;

// Contact solve tuning. Penetration below SLOP is left alone; positional
// correction removes BETA of the remainder per iteration. Restitution only
// fires above REST_VEL approach speed, and positional correction only below
// SETTLE_SPEED, so fast elastic impacts neither gain height nor lose bounce.
const SLOP: Scalar = 1.0e-3;
const BETA: Scalar = 0.8;
const REST_VEL: Scalar = 0.5;
const SETTLE_SPEED: Scalar = 0.2;

// Sleep thresholds: a dynamic body below both speeds for SLEEP_STEPS
// consecutive steps is put to sleep.
const SLEEP_LIN: Scalar = 0.05;
const SLEEP_ANG: Scalar = 0.05;
const SLEEP_STEPS: u32 = 30;

#[derive(Copy, Clone, Debug)]
pub struct SolverConfig {
    pub iterations: u32,
    pub enhanced_determinism: bool,
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { iterations: 8, enhanced_determinism: true, seed: 0 }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct StepStats {
    pub pairs_tested: u32,
    pub contacts: u32,
}

#[derive(Copy, Clone, Debug)]
pub struct Collider {
    pub body: BodyId,
    pub shape: Shape,
    pub aabb: Aabb,
    pub material: Material,
}

/// One contact from the last completed step, owned by the world. `normal`
/// points from `body_a` toward `body_b`; `depth` is the pre-solve overlap.
#[derive(Copy, Clone, Debug)]
pub struct ContactSample {
    pub collider_a: ColliderId,
    pub collider_b: ColliderId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub normal: Vec3,
    pub depth: Scalar,
}

struct PendingContact {
    a_collider: usize,
    b_collider: usize,
    normal: Vec3,
    depth: Scalar,
}

/* ---------------- World ---------------- */

pub struct SolverWorld {
    config: SolverConfig,
    bodies: Bodies,
    colliders: Vec<Collider>,
    contacts: Vec<ContactSample>,
    tick: u64,
}

impl SolverWorld {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            bodies: Bodies::default(),
            colliders: Vec::new(),
            contacts: Vec::new(),
            tick: 0,
        }
    }

    pub fn contract(&self, dt: Scalar) -> DeterminismContract {
        DeterminismContract {
            fixed_dt: dt,
            iterations: self.config.iterations,
            enhanced: self.config.enhanced_determinism,
            stable_sorts: true,
        }
    }

    /* ---------- Composition ---------- */

    pub fn add_body(&mut self, pose: Isometry, vel: Velocity, mass: MassProps, dynamic: bool) -> BodyId {
        let inv_mass = if dynamic { mass.inv_mass } else { 0.0 };
        let inv_inertia_local = if dynamic {
            mass.inertia.inverse()
        } else {
            glam::Mat3A::ZERO
        };
        let id = self.bodies.add(BodyDesc { pose, vel, inv_mass, inv_inertia_local, dynamic });
        BodyId(id)
    }

    pub fn add_collider(&mut self, body: BodyId, shape: Shape, material: Material) -> ColliderId {
        let pose = self.bodies.pose(body.0);
        let aabb = aabb_of(&shape, &pose);
        let id = self.colliders.len() as u32;
        self.colliders.push(Collider { body, shape, aabb, material });
        ColliderId(id)
    }

    /* ---------- Readout ---------- */

    #[inline] pub fn body_count(&self) -> usize { self.bodies.len() }
    #[inline] pub fn body_pose(&self, id: BodyId) -> Isometry { self.bodies.pose(id.0) }
    #[inline] pub fn body_vel(&self, id: BodyId) -> Velocity { self.bodies.vel(id.0) }
    #[inline] pub fn body_sleeping(&self, id: BodyId) -> bool { self.bodies.is_asleep(id.0) }
    #[inline] pub fn body_dynamic(&self, id: BodyId) -> bool { self.bodies.is_dynamic(id.0) }
    #[inline] pub fn contacts(&self) -> &[ContactSample] { &self.contacts }
    #[inline] pub fn tick(&self) -> u64 { self.tick }

    /* ---------- Step ---------- */

    pub fn step(&mut self, dt: Scalar, gravity: Vec3) -> StepStats {
        self.tick = self.tick.wrapping_add(1);

        // Integrate awake dynamic bodies, linear and angular.
        let count = self.bodies.len() as u32;
        for i in 0..count {
            if !self.bodies.is_dynamic(i) || self.bodies.inv_mass_of(i) == 0.0 { continue; }
            if self.bodies.is_asleep(i) { continue; }
            let pose = self.bodies.pose(i);
            let mut vel = self.bodies.vel(i);
            vel.lin += gravity * dt;
            let new_pos = pose.pos + vel.lin * dt;
            let new_rot = integrate_rotation(pose.rot, vel.ang, dt);
            self.bodies.set_vel(i, vel);
            self.bodies.set_pose(i, Isometry { pos: new_pos, rot: new_rot });
        }

        // Refresh AABBs
        for idx in 0..self.colliders.len() {
            let b = self.colliders[idx].body;
            let shape = self.colliders[idx].shape;
            let pose = self.bodies.pose(b.0);
            self.colliders[idx].aabb = aabb_of(&shape, &pose);
        }

        // Broadphase sweep over AABBs grown by the prediction margin, then
        // narrowphase in sorted pair order
        let mut aabbs: Vec<Aabb> = self.colliders.iter().map(|c| c.aabb).collect();
        for bb in &mut aabbs {
            bb.expand_by(0.5 * narrowphase::CONTACT_PREDICTION);
        }
        let pairs = sweep_pairs(&aabbs);

        let mut pending: Vec<PendingContact> = Vec::new();
        for (i, j) in pairs.iter().copied() {
            let ca = &self.colliders[i];
            let cb = &self.colliders[j];
            if ca.body == cb.body { continue; }
            // two static bodies never need a response
            if self.bodies.inv_mass_of(ca.body.0) == 0.0 && self.bodies.inv_mass_of(cb.body.0) == 0.0 {
                continue;
            }
            let pa = self.bodies.pose(ca.body.0);
            let pb = self.bodies.pose(cb.body.0);
            if let Some(c) = narrowphase::generate(&ca.shape, &pa, &cb.shape, &pb) {
                pending.push(PendingContact {
                    a_collider: i,
                    b_collider: j,
                    normal: c.normal,
                    depth: c.depth,
                });
            }
        }

        self.solve_contacts(&pending, dt);

        // Sleep bookkeeping from post-solve velocities
        for i in 0..count {
            self.bodies.update_sleep(i, SLEEP_LIN, SLEEP_ANG, SLEEP_STEPS);
        }

        // Materialise owned contact samples for readout
        self.contacts.clear();
        for c in &pending {
            self.contacts.push(ContactSample {
                collider_a: ColliderId(c.a_collider as u32),
                collider_b: ColliderId(c.b_collider as u32),
                body_a: self.colliders[c.a_collider].body,
                body_b: self.colliders[c.b_collider].body,
                normal: c.normal,
                depth: c.depth,
            });
        }

        StepStats { pairs_tested: pairs.len() as u32, contacts: pending.len() as u32 }
    }

    /* ---------- Solver (normal + friction) ---------- */

    fn solve_contacts(&mut self, contacts: &[PendingContact], dt: Scalar) {
        let iterations = self.config.iterations.max(1);

        for _ in 0..iterations {
            for c in contacts {
                let ai = self.colliders[c.a_collider].body.0;
                let bi = self.colliders[c.b_collider].body.0;

                let inv_a = self.bodies.inv_mass_of(ai);
                let inv_b = self.bodies.inv_mass_of(bi);
                let denom = inv_a + inv_b;
                if denom == 0.0 { continue; }

                let mat = Material::combine(
                    self.colliders[c.a_collider].material,
                    self.colliders[c.b_collider].material,
                );

                let va = self.bodies.vel(ai);
                let vb = self.bodies.vel(bi);
                let n = c.normal;
                let rel_v_n = (vb.lin - va.lin).dot(n);

                let mut jn = 0.0;
                if rel_v_n < 0.0 {
                    let approach = -rel_v_n;
                    // A speculative contact may absorb `-depth / dt` of closing
                    // speed before the surfaces actually meet.
                    let allowed = (-c.depth).max(0.0) / dt;
                    let e = if approach > REST_VEL { mat.restitution } else { 0.0 };

                    if e > 0.0 {
                        jn = (1.0 + e) * approach / denom;
                    } else if approach > allowed {
                        jn = (approach - allowed) / denom;
                    }

                    if jn > 0.0 {
                        let imp_n = n * jn;
                        self.bodies.apply_impulse(ai, -imp_n);
                        self.bodies.apply_impulse(bi, imp_n);
                    }

                    // Positional correction for settling penetrations only; a
                    // fast impact separates on its own and must not gain height.
                    if approach < SETTLE_SPEED {
                        let corr = (c.depth - SLOP).max(0.0) * BETA;
                        if corr > 0.0 {
                            let corr_vec = n * (corr / denom);
                            self.bodies.apply_position_delta(ai, -corr_vec * inv_a);
                            self.bodies.apply_position_delta(bi, corr_vec * inv_b);
                        }
                    }
                }

                // Friction (2 tangents) against the post-normal-impulse velocities
                if jn > 0.0 && mat.friction > 0.0 {
                    let va2 = self.bodies.vel(ai);
                    let vb2 = self.bodies.vel(bi);
                    let vrel = vb2.lin - va2.lin;
                    let v_t = vrel - n * vrel.dot(n);

                    let (t1, t2) = orthonormal_basis(n);
                    let vt1 = v_t.dot(t1);
                    let vt2 = v_t.dot(t2);

                    let jt1_des = -vt1 / denom;
                    let jt2_des = -vt2 / denom;
                    let jt_des_len = (jt1_des * jt1_des + jt2_des * jt2_des).sqrt();
                    let jt_max = mat.friction * jn;

                    let (jt1, jt2) = if jt_des_len <= jt_max {
                        (jt1_des, jt2_des)
                    } else {
                        let scale = if jt_des_len > 1.0e-9 { jt_max / jt_des_len } else { 0.0 };
                        (jt1_des * scale, jt2_des * scale)
                    };

                    let jt_vec = t1 * jt1 + t2 * jt2;
                    self.bodies.apply_impulse(ai, -jt_vec);
                    self.bodies.apply_impulse(bi, jt_vec);
                }
            }
        }
    }

    /* ---------- State digest ---------- */

    // The seed has no stochastic consumer in this solver; it still feeds the
    // digest so differently-seeded runs never compare equal.
    pub fn state_hash(&self, dt: Scalar) -> Digest {
        let mut d = StateDigest::new();
        self.contract(dt).digest_into(&mut d);
        d.bytes(&self.config.seed.to_le_bytes());
        for i in self.bodies.indices() {
            d.index(i);
            d.pose(&self.bodies.pose(i));
            d.velocity(&self.bodies.vel(i));
            d.flag(self.bodies.is_asleep(i));
        }
        d.finish()
    }
}

/* ---------- helpers ---------- */

/// Small-angle orientation integration: q' = normalize(dq(w*dt) * q).
fn integrate_rotation(rot: Quat, ang: Vec3, dt: Scalar) -> Quat {
    let dtheta = ang * dt;
    if dtheta.length_squared() <= 0.0 { return rot; }
    let dq = Quat::from_xyzw(dtheta.x * 0.5, dtheta.y * 0.5, dtheta.z * 0.5, 1.0).normalize();
    (dq * rot).normalize()
}

fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let ax = n.x.abs(); let ay = n.y.abs(); let az = n.z.abs();
    let base = if ax <= ay && ax <= az { Vec3::X }
    else if ay <= az { Vec3::Y }
    else { Vec3::Z };
    let t1 = (base.cross(n)).normalize_or_zero();
    let t2 = n.cross(t1);
    (t1, t2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlab_core::{vec3, iso, quat_identity};
    use approx::assert_relative_eq;

    const DT: Scalar = 1.0 / 60.0;
    const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

    fn ground_plus_unit_box(gap: Scalar) -> SolverWorld {
        let mut w = SolverWorld::new(SolverConfig::default());
        let g = w.add_body(
            iso(vec3(0.0, -0.5, 0.0), quat_identity()),
            Velocity::default(),
            MassProps::infinite(),
            false,
        );
        w.add_collider(g, Shape::Box { hx: 50.0, hy: 0.5, hz: 50.0 }, Material::default());

        let b = w.add_body(
            iso(vec3(0.0, 0.5 + gap, 0.0), quat_identity()),
            Velocity::default(),
            MassProps::cuboid(Vec3::splat(0.5), 1.0),
            true,
        );
        w.add_collider(b, Shape::Box { hx: 0.5, hy: 0.5, hz: 0.5 }, Material::default());
        w
    }

    #[test]
    fn free_fall_matches_symplectic_euler() {
        let mut w = SolverWorld::new(SolverConfig::default());
        let b = w.add_body(
            iso(vec3(0.0, 100.0, 0.0), quat_identity()),
            Velocity::default(),
            MassProps::sphere(0.5, 1.0),
            true,
        );
        w.add_collider(b, Shape::Sphere { r: 0.5 }, Material::default());

        w.step(DT, GRAVITY);
        let pose = w.body_pose(b);
        let vel = w.body_vel(b);
        assert_relative_eq!(vel.lin.y, -9.81 * DT, epsilon = 1e-6);
        assert_relative_eq!(pose.pos.y, 100.0 - 9.81 * DT * DT, epsilon = 1e-5);
    }

    #[test]
    fn dropped_box_settles_on_ground() {
        let mut w = ground_plus_unit_box(1.0e-3);
        for _ in 0..120 {
            w.step(DT, GRAVITY);
        }
        let pose = w.body_pose(BodyId(1));
        // resting height: top of ground minus a little residual penetration
        assert!(pose.pos.y > 0.47 && pose.pos.y < 0.51, "resting y = {}", pose.pos.y);
        let vel = w.body_vel(BodyId(1));
        assert!(vel.lin.length() < 0.05, "residual speed {}", vel.lin.length());
    }

    #[test]
    fn settled_box_falls_asleep() {
        let mut w = ground_plus_unit_box(1.0e-3);
        for _ in 0..300 {
            w.step(DT, GRAVITY);
        }
        assert!(w.body_sleeping(BodyId(1)));
        assert_eq!(w.body_vel(BodyId(1)).lin, Vec3::ZERO);
    }

    #[test]
    fn contacts_are_reported_with_positive_depth() {
        let mut w = ground_plus_unit_box(1.0e-3);
        for _ in 0..10 {
            w.step(DT, GRAVITY);
        }
        assert!(!w.contacts().is_empty());
        for c in w.contacts() {
            assert!(c.depth > 0.0);
            assert_ne!(c.body_a, c.body_b);
        }
    }

    #[test]
    fn identical_worlds_produce_identical_hashes() {
        let build = || ground_plus_unit_box(1.0e-3);
        let mut a = build();
        let mut b = build();
        for _ in 0..90 {
            a.step(DT, GRAVITY);
            b.step(DT, GRAVITY);
            assert_eq!(a.state_hash(DT), b.state_hash(DT));
        }
    }

    #[test]
    fn static_pairs_are_skipped() {
        let mut w = SolverWorld::new(SolverConfig::default());
        for k in 0..2 {
            let b = w.add_body(
                iso(vec3(0.0, k as f32 * 0.5, 0.0), quat_identity()),
                Velocity::default(),
                MassProps::infinite(),
                false,
            );
            w.add_collider(b, Shape::Box { hx: 1.0, hy: 1.0, hz: 1.0 }, Material::default());
        }
        let stats = w.step(DT, GRAVITY);
        assert_eq!(stats.contacts, 0);
    }

    #[test]
    fn elastic_bounce_preserves_impact_speed() {
        let mut w = SolverWorld::new(SolverConfig::default());
        let mat = Material { friction: 0.0, restitution: 1.0 };
        let g = w.add_body(
            iso(vec3(0.0, -0.5, 0.0), quat_identity()),
            Velocity::default(),
            MassProps::infinite(),
            false,
        );
        w.add_collider(g, Shape::Box { hx: 10.0, hy: 0.5, hz: 10.0 }, mat);

        let b = w.add_body(
            iso(vec3(0.0, 2.0, 0.0), quat_identity()),
            Velocity { lin: vec3(0.0, -5.0, 0.0), ang: Vec3::ZERO },
            MassProps::sphere(0.5, 1.0),
            true,
        );
        w.add_collider(b, Shape::Sphere { r: 0.5 }, mat);

        let mut peak_up: f32 = 0.0;
        let mut impact: f32 = 0.0;
        for _ in 0..60 {
            let pre = w.body_vel(b).lin.y;
            w.step(DT, GRAVITY);
            let post = w.body_vel(b).lin.y;
            if pre < 0.0 && post > 0.0 {
                // approach speed seen by the solver: gravity already applied
                impact = -pre + 9.81 * DT;
                peak_up = post;
            }
        }
        assert!(impact > 0.0, "ball never bounced");
        assert_relative_eq!(peak_up, impact, epsilon = 1e-3);
    }
}
