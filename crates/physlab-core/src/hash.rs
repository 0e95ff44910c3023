use blake3::Hasher;
use glam::Quat;

use crate::types::{Isometry, Scalar, Vec3, Velocity};

/// Finished 32-byte state digest.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            let _ = write!(s, "{b:02x}");
        }
        s
    }
}

/// Accumulates world state into a blake3 digest. The caller fixes the field
/// order; equal states fed in the same order produce equal digests.
pub struct StateDigest(Hasher);

impl StateDigest {
    pub fn new() -> Self { StateDigest(Hasher::new()) }

    pub fn bytes(&mut self, bytes: &[u8]) { self.0.update(bytes); }
    pub fn scalar(&mut self, s: Scalar) { self.0.update(&s.to_le_bytes()); }
    pub fn index(&mut self, i: u32) { self.0.update(&i.to_le_bytes()); }
    pub fn flag(&mut self, on: bool) { self.0.update(&[on as u8]); }

    pub fn vector(&mut self, v: &Vec3) {
        for c in [v.x, v.y, v.z] { self.scalar(c); }
    }

    fn rotation(&mut self, q: &Quat) {
        for c in [q.x, q.y, q.z, q.w] { self.scalar(c); }
    }

    pub fn pose(&mut self, xf: &Isometry) {
        self.vector(&xf.pos);
        self.rotation(&xf.rot);
    }

    pub fn velocity(&mut self, vel: &Velocity) {
        self.vector(&vel.lin);
        self.vector(&vel.ang);
    }

    pub fn finish(self) -> Digest { Digest(*self.0.finalize().as_bytes()) }
}

impl Default for StateDigest {
    fn default() -> Self { Self::new() }
}
