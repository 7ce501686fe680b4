//! Siblinghood threshold schedule.
//!
//! The reference implementation keeps a single `sib`/`cand` pair that
//! decays by a constant factor every generation to correct for
//! accumulating reconstruction noise, plus an optional per-generation
//! override list (`set_sib`/`set_cand` with an explicit vector). Both
//! paths are modeled here: [`Thresholds::decaying`] reproduces the
//! default schedule, [`Thresholds::with_schedule`] reproduces the
//! override.

/// Default genetic-overlap threshold for sibling triples (`DEFAULT_SIB`).
pub const DEFAULT_SIB: f64 = 0.21;
/// Default fraction of the genome that must be recovered for a
/// reconstructed couple to be considered valid (`DEFAULT_REC`).
pub const DEFAULT_REC: f64 = 0.99;
/// Default per-generation decay applied to `sib`/`cand` (`DEFAULT_DEC`).
pub const DEFAULT_DECAY: f64 = 0.85;
/// Default minimum desirable siblinghood-clique size (`DEFAULT_D`,
/// definition 4.2, d-richness).
pub const DEFAULT_D: usize = 3;

#[derive(Debug, Clone)]
pub struct Thresholds {
    sib: f64,
    cand: f64,
    decay: f64,
    rec: f64,
    d: usize,
    sib_schedule: Option<Vec<f64>>,
    cand_schedule: Option<Vec<f64>>,
    generation: usize,
}

impl Thresholds {
    /// The single-argument C++ constructor: `cand` starts equal to `sib`,
    /// and both decay by `decay` every generation.
    #[must_use]
    pub fn decaying(sib: f64, decay: f64, rec: f64, d: usize) -> Self {
        Thresholds {
            sib,
            cand: sib,
            decay,
            rec,
            d,
            sib_schedule: None,
            cand_schedule: None,
            generation: 0,
        }
    }

    #[must_use]
    pub fn with_schedule(sib_schedule: Vec<f64>, cand_schedule: Vec<f64>, rec: f64, d: usize) -> Self {
        let sib = sib_schedule.first().copied().unwrap_or(DEFAULT_SIB);
        let cand = cand_schedule.first().copied().unwrap_or(DEFAULT_SIB);
        Thresholds {
            sib,
            cand,
            decay: 1.0,
            rec,
            d,
            sib_schedule: Some(sib_schedule),
            cand_schedule: Some(cand_schedule),
            generation: 0,
        }
    }

    #[must_use]
    pub fn sib(&self) -> f64 {
        self.sib
    }

    #[must_use]
    pub fn cand(&self) -> f64 {
        self.cand
    }

    #[must_use]
    pub fn rec(&self) -> f64 {
        self.rec
    }

    #[must_use]
    pub fn d(&self) -> usize {
        self.d
    }

    /// Advances the schedule by one generation, either decaying the
    /// current thresholds or pulling the next explicit override.
    pub fn advance(&mut self) {
        self.generation += 1;
        match (&self.sib_schedule, &self.cand_schedule) {
            (Some(sibs), Some(cands)) => {
                self.sib = sibs.get(self.generation).copied().unwrap_or(self.sib);
                self.cand = cands.get(self.generation).copied().unwrap_or(self.cand);
            }
            _ => {
                self.sib *= self.decay;
                self.cand *= self.decay;
            }
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds::decaying(DEFAULT_SIB, DEFAULT_DECAY, DEFAULT_REC, DEFAULT_D)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decaying_schedule_shrinks_each_generation() {
        let mut t = Thresholds::decaying(0.5, 0.8, DEFAULT_REC, DEFAULT_D);
        assert!((t.sib() - 0.5).abs() < 1e-9);
        t.advance();
        assert!((t.sib() - 0.4).abs() < 1e-9);
        assert!((t.cand() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn explicit_schedule_overrides_decay() {
        let mut t = Thresholds::with_schedule(vec![0.3, 0.2], vec![0.3, 0.1], DEFAULT_REC, DEFAULT_D);
        assert!((t.sib() - 0.3).abs() < 1e-9);
        t.advance();
        assert!((t.sib() - 0.2).abs() < 1e-9);
        assert!((t.cand() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn schedule_past_its_end_holds_last_value() {
        let mut t = Thresholds::with_schedule(vec![0.3], vec![0.3], DEFAULT_REC, DEFAULT_D);
        t.advance();
        assert!((t.sib() - 0.3).abs() < 1e-9);
    }
}
