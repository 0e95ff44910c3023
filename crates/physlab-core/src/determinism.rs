use crate::hash::StateDigest;

/// What a solver build promises about cross-run reproducibility. Folded into
/// the world state digest so two runs under different contracts never compare
/// equal by accident.
#[derive(Copy, Clone, Debug)]
pub struct DeterminismContract {
    pub fixed_dt: f32,
    pub iterations: u32,
    pub enhanced: bool,
    pub stable_sorts: bool,
}

impl DeterminismContract {
    pub fn digest_into(&self, d: &mut StateDigest) {
        d.scalar(self.fixed_dt);
        d.bytes(&self.iterations.to_le_bytes());
        d.flag(self.enhanced);
        d.flag(self.stable_sorts);
    }
}
