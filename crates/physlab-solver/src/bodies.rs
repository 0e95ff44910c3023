use physlab_core::types::{Isometry, Velocity, Vec3};
use physlab_core::{Scalar, Quat};
use glam::Mat3A;

/// Input descriptor when creating a body.
#[derive(Copy, Clone, Debug)]
pub struct BodyDesc {
    pub pose: Isometry,
    pub vel: Velocity,
    pub inv_mass: Scalar,
    pub inv_inertia_local: Mat3A,
    pub dynamic: bool,
}

// Velocity change needed to pull a body out of sleep, and the position nudge
// that does the same. Gravity-cancelling rest impulses stay below these.
const WAKE_VEL: Scalar = 0.1;
const WAKE_POS: Scalar = 1.0e-3;

/// SoA body storage with deterministic ID = index semantics.
pub struct Bodies {
    pos: Vec<Vec3>,
    rot: Vec<Quat>,
    linvel: Vec<Vec3>,
    angvel: Vec<Vec3>,
    inv_mass: Vec<Scalar>,
    dynamic: Vec<bool>,
    inv_inertia_local: Vec<Mat3A>,
    asleep: Vec<bool>,
    low_motion: Vec<u32>,
}

impl Bodies {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            pos: Vec::with_capacity(cap),
            rot: Vec::with_capacity(cap),
            linvel: Vec::with_capacity(cap),
            angvel: Vec::with_capacity(cap),
            inv_mass: Vec::with_capacity(cap),
            dynamic: Vec::with_capacity(cap),
            inv_inertia_local: Vec::with_capacity(cap),
            asleep: Vec::with_capacity(cap),
            low_motion: Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, desc: BodyDesc) -> u32 {
        self.pos.push(desc.pose.pos);
        self.rot.push(desc.pose.rot);
        self.linvel.push(desc.vel.lin);
        self.angvel.push(desc.vel.ang);
        self.inv_mass.push(desc.inv_mass);
        self.dynamic.push(desc.dynamic);
        self.inv_inertia_local.push(desc.inv_inertia_local);
        self.asleep.push(false);
        self.low_motion.push(0);
        (self.pos.len() as u32) - 1
    }

    #[inline] pub fn len(&self) -> usize { self.pos.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pos.is_empty() }

    // -------- Accessors used by world/solver/hash --------
    #[inline] pub fn pose(&self, id: u32) -> Isometry {
        let i = id as usize;
        Isometry { pos: self.pos[i], rot: self.rot[i] }
    }
    #[inline] pub fn set_pose(&mut self, id: u32, iso: Isometry) {
        let i = id as usize;
        self.pos[i] = iso.pos;
        self.rot[i] = iso.rot;
    }

    #[inline] pub fn vel(&self, id: u32) -> Velocity {
        let i = id as usize;
        Velocity { lin: self.linvel[i], ang: self.angvel[i] }
    }
    #[inline] pub fn set_vel(&mut self, id: u32, v: Velocity) {
        let i = id as usize;
        self.linvel[i] = v.lin;
        self.angvel[i] = v.ang;
    }

    #[inline] pub fn inv_mass_of(&self, id: u32) -> Scalar { self.inv_mass[id as usize] }
    #[inline] pub fn is_dynamic(&self, id: u32) -> bool { self.dynamic[id as usize] }
    #[inline] pub fn is_asleep(&self, id: u32) -> bool { self.asleep[id as usize] }

    /// World-space inverse inertia: R * I^-1_local * R^T.
    pub fn inv_inertia_world(&self, id: u32) -> Mat3A {
        if self.inv_mass_of(id) == 0.0 { return Mat3A::ZERO; }
        let r = Mat3A::from_quat(self.rot[id as usize]);
        r * self.inv_inertia_local[id as usize] * r.transpose()
    }

    // -------- Impulses / deltas --------
    // A sleeping body absorbs small impulses without waking; anything that
    // would change its velocity past WAKE_VEL brings it back.
    #[inline] pub fn apply_impulse(&mut self, id: u32, j: Vec3) {
        let i = id as usize;
        let im = self.inv_mass[i];
        if im == 0.0 { return; }
        let dv = j * im;
        if self.asleep[i] {
            if dv.length_squared() <= WAKE_VEL * WAKE_VEL { return; }
            self.wake(id);
        }
        self.linvel[i] += dv;
    }

    /// Add a position delta (already scaled for this body).
    #[inline] pub fn apply_position_delta(&mut self, id: u32, dp: Vec3) {
        let i = id as usize;
        if self.asleep[i] && dp.length_squared() > WAKE_POS * WAKE_POS {
            self.wake(id);
        }
        self.pos[i] += dp;
    }

    pub fn apply_angular_impulse(&mut self, id: u32, tau_impulse: Vec3) {
        let i = id as usize;
        if self.inv_mass[i] == 0.0 { return; }
        let dw = self.inv_inertia_world(id) * tau_impulse;
        if self.asleep[i] {
            if dw.length_squared() <= WAKE_VEL * WAKE_VEL { return; }
            self.wake(id);
        }
        self.angvel[i] += dw;
    }

    // -------- Sleeping --------
    #[inline] pub fn wake(&mut self, id: u32) {
        let i = id as usize;
        self.asleep[i] = false;
        self.low_motion[i] = 0;
    }

    /// Count low-motion frames; after `after_steps` consecutive ones the body
    /// sleeps and its velocities are zeroed.
    pub fn update_sleep(&mut self, id: u32, lin_thresh: Scalar, ang_thresh: Scalar, after_steps: u32) {
        let i = id as usize;
        if !self.dynamic[i] || self.asleep[i] { return; }
        if self.vel(id).below(lin_thresh, ang_thresh) {
            self.low_motion[i] += 1;
            if self.low_motion[i] >= after_steps {
                self.asleep[i] = true;
                self.linvel[i] = Vec3::ZERO;
                self.angvel[i] = Vec3::ZERO;
            }
        } else {
            self.low_motion[i] = 0;
        }
    }

    // Iterator for hashing in stable order
    pub fn indices(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        0..(self.len() as u32)
    }
}

impl Default for Bodies {
    fn default() -> Self { Self::with_capacity(0) }
}
