//! Metrics.
//!
//! Metrics are evaluation helpers (they do not participate in backprop).
//! They are computed sample-by-sample without allocating per step.

/// One-hot decode `y` into `out`: the maximum output becomes `1`, every other `0`.
///
/// Ties all map to `1`.
///
/// # Panics
///
/// If `y.len() != out.len()`.
#[inline]
pub fn one_hot_into(y: &[f32], out: &mut [f32]) {
    assert_eq!(
        y.len(),
        out.len(),
        "y len {} does not match out len {}",
        y.len(),
        out.len()
    );

    let max = y.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    for (o, &v) in out.iter_mut().zip(y) {
        *o = if v < max { 0.0 } else { 1.0 };
    }
}

/// Running tally of one-hot classification results.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accuracy {
    samples: usize,
    errors: usize,
}

impl Accuracy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample: an error if any decoded element differs from `target`.
    pub fn record(&mut self, decoded: &[f32], target: &[f32]) -> bool {
        let hit = decoded.len() == target.len() && decoded.iter().zip(target).all(|(a, b)| a == b);
        self.samples += 1;
        if !hit {
            self.errors += 1;
        }
        hit
    }

    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    #[inline]
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Fraction of samples classified correctly, `0.0` when nothing was recorded.
    pub fn value(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.samples - self.errors) as f32 / self.samples as f32
    }
}
