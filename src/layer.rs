//! One network stage: a set of neurons bound to a single page.
//!
//! The layer orchestrates the per-stage phases:
//!
//! - forward: every neuron computes `z`, then (softmax only) the layer-wide
//!   reduction is stored in the page's `af_args`, then every neuron computes `y`
//! - errors: `de_dy` is pulled back through the downstream weight matrix
//! - backward: one SGD update of the weights and biases of every row

use crate::activation::{Activation, ActivationKind};
use crate::neuron::Neuron;
use crate::page::Page;
use crate::random::RandomGenerator;
use crate::Result;

/// Weight initializer family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    /// He/Kaiming uniform: `U(-sqrt(6 / fan_in), sqrt(6 / fan_in))`.
    He,
    /// Xavier/Glorot uniform: `U(-sqrt(6 / (fan_in + fan_out)), ...)`.
    Xavier,
    Zeros,
}

impl Init {
    /// Default initializer for an activation tag.
    pub fn for_activation(kind: ActivationKind) -> Self {
        match kind {
            ActivationKind::Relu
            | ActivationKind::LeakyRelu
            | ActivationKind::Prelu
            | ActivationKind::Swish
            | ActivationKind::Elu => Init::He,
            ActivationKind::Tanh | ActivationKind::Sigmoid | ActivationKind::Softmax => {
                Init::Xavier
            }
            ActivationKind::Linear | ActivationKind::Softplus | ActivationKind::Unknown => {
                Init::Zeros
            }
        }
    }

    /// Uniform bound for this family, or `None` for zero-fill.
    pub fn bound(self, fan_in: usize, fan_out: usize) -> Option<f32> {
        match self {
            Init::He => Some((6.0 / fan_in as f32).sqrt()),
            Init::Xavier => Some((6.0 / (fan_in + fan_out) as f32).sqrt()),
            Init::Zeros => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    l_id: usize,
    neurons: Vec<Neuron>,
    safe: bool,
}

impl Layer {
    /// Validate `page` as stage `l_id` and bind one neuron per output unit.
    pub fn create(page: &mut Page, l_id: usize) -> Result<Self> {
        page.validate(l_id)?;

        let neurons = (0..page.width())
            .map(|j| Neuron::create(page, j))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            l_id,
            neurons,
            safe: true,
        })
    }

    /// Release the neurons. Idempotent.
    pub fn destroy(&mut self) {
        self.neurons = Vec::new();
        self.safe = false;
    }

    #[inline]
    pub fn l_id(&self) -> usize {
        self.l_id
    }

    #[inline]
    pub fn is_safe(&self) -> bool {
        self.safe
    }

    #[inline]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Re-initialize every row of `page.w` and set each bias slot to `bias`.
    pub fn init_weights(&self, page: &mut Page, bias: f32, rng: &mut RandomGenerator) {
        if !self.safe {
            return;
        }

        let fan_in = page.x_len;
        let fan_out = page.width();
        let bound = Init::for_activation(page.af_type).bound(fan_in, fan_out);

        for j in 0..fan_out {
            let row = page.w.row_mut(j);
            let (weights, bias_slot) = row.split_at_mut(fan_in);
            match bound {
                Some(b) => weights.iter_mut().for_each(|w| *w = rng.range(-b, b)),
                None => weights.fill(0.0),
            }
            bias_slot[0] = bias;
        }
    }

    /// Forward pass over input `x`.
    ///
    /// Shape contract: `x.len() == page.x_len`.
    pub fn step_forward(&self, x: &[f32], page: &mut Page) {
        if !self.safe {
            return;
        }

        for neuron in &self.neurons {
            neuron.step_forward_z(x, page);
        }

        if page.af_call == Some(Activation::Softmax) {
            let z_max = page.z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let sum_exp: f32 = page.z.iter().map(|&z| (z - z_max).exp()).sum();
            page.af_args[0] = sum_exp;
            page.af_args[1] = z_max;
        }

        for neuron in &self.neurons {
            neuron.step_forward_y(page);
        }
    }

    /// Pull the error sensitivity back from the downstream stage:
    /// `de_dy[j] = sum_i next.de_dy[i] * next.dy_dz[i] * next.w[i][j]`.
    ///
    /// No-op when `next` is this layer or is not safe.
    pub fn step_errors(&self, page: &mut Page, next: &Layer, next_page: &Page) {
        if !self.safe || !next.safe || next.l_id == self.l_id {
            return;
        }
        debug_assert_eq!(next_page.x_len, page.width());

        for (j, de_dy) in page.de_dy.iter_mut().enumerate() {
            let mut sum = 0.0_f32;
            for i in 0..next_page.width() {
                sum += next_page.de_dy[i] * next_page.dy_dz[i] * next_page.w.at(i, j);
            }
            *de_dy = sum;
        }
    }

    /// One per-sample SGD update using the input `x` of the current forward pass.
    ///
    /// `w[j][i] -= lr * delta_j * x[i]` and `w[j][bias] -= lr * delta_j`,
    /// with `delta_j = de_dy[j] * dy_dz[j]`.
    pub fn step_backward(&self, x: &[f32], page: &mut Page) {
        if !self.safe {
            return;
        }
        debug_assert_eq!(x.len(), page.x_len);

        let lr = page.lr;
        for j in 0..page.width() {
            let delta = page.de_dy[j] * page.dy_dz[j];
            let step = lr * delta;

            let row = page.w.row_mut(j);
            let (weights, bias) = row.split_at_mut(x.len());
            for (w, &xi) in weights.iter_mut().zip(x) {
                *w -= step * xi;
            }
            bias[0] -= step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Page whose weights copy the input straight into `z` (identity plus zero bias).
    fn passthrough(width: usize, kind: ActivationKind) -> Page {
        let mut page = Page::new(0, width, width, 0.1, kind);
        for j in 0..width {
            page.w.row_mut(j)[j] = 1.0;
        }
        if kind == ActivationKind::Softmax {
            page.af_args = vec![0.0; 2];
        }
        page
    }

    fn softmax_of(x: &[f32]) -> Vec<f32> {
        let mut page = passthrough(x.len(), ActivationKind::Softmax);
        let layer = Layer::create(&mut page, 0).unwrap();
        layer.step_forward(x, &mut page);
        page.y.clone()
    }

    #[test]
    fn create_builds_one_neuron_per_output() {
        let mut page = Page::new(3, 4, 5, 0.1, ActivationKind::Relu);
        let layer = Layer::create(&mut page, 3).unwrap();
        assert_eq!(layer.neurons().len(), 5);
        assert!(layer.is_safe());

        let mut page = Page::new(3, 4, 5, 0.1, ActivationKind::Relu);
        assert!(Layer::create(&mut page, 2).is_err());
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut page = Page::new(0, 2, 2, 0.1, ActivationKind::Tanh);
        let mut layer = Layer::create(&mut page, 0).unwrap();
        layer.destroy();
        layer.destroy();
        assert!(!layer.is_safe());
        assert!(layer.neurons().is_empty());

        // A destroyed layer leaves its page untouched.
        page.z[0] = 7.0;
        layer.step_forward(&[1.0, 1.0], &mut page);
        assert_eq!(page.z[0], 7.0);
    }

    #[test]
    fn softmax_sums_to_one_and_is_shift_invariant() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            let n = rng.gen_range(1..12);
            let x: Vec<f32> = (0..n).map(|_| rng.gen_range(-20.0..20.0)).collect();
            let c: f32 = rng.gen_range(-50.0..50.0);
            let shifted: Vec<f32> = x.iter().map(|v| v + c).collect();

            let y = softmax_of(&x);
            let y_shifted = softmax_of(&shifted);

            let total: f32 = y.iter().sum();
            assert!((total - 1.0).abs() < 1e-5, "sum = {total}");
            for (a, b) in y.iter().zip(&y_shifted) {
                assert!((a - b).abs() < 1e-5, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn softmax_survives_large_logits() {
        let y = softmax_of(&[1000.0, 1000.0, -1000.0]);
        assert!((y[0] - 0.5).abs() < 1e-6);
        assert!((y[1] - 0.5).abs() < 1e-6);
        assert!(y[2].abs() < 1e-6);
    }

    #[test]
    fn softmax_reduction_is_stashed_in_args() {
        let mut page = passthrough(3, ActivationKind::Softmax);
        let layer = Layer::create(&mut page, 0).unwrap();
        layer.step_forward(&[0.0, 1.0, 2.0], &mut page);

        let expected_sum = (-2.0_f32).exp() + (-1.0_f32).exp() + 1.0;
        assert!((page.af_args[0] - expected_sum).abs() < 1e-6);
        assert_eq!(page.af_args[1], 2.0);
        for j in 0..3 {
            let y = page.y[j];
            assert!((page.dy_dz[j] - y * (1.0 - y)).abs() < 1e-7);
        }
    }

    #[test]
    fn step_errors_contracts_with_downstream_weights() {
        let mut page = Page::new(0, 1, 2, 0.1, ActivationKind::Linear);
        let layer = Layer::create(&mut page, 0).unwrap();

        let mut next_page = Page::new(1, 2, 3, 0.1, ActivationKind::Linear);
        let next = Layer::create(&mut next_page, 1).unwrap();
        next_page.w.data = vec![
            1.0, 2.0, 9.0, //
            3.0, 4.0, 9.0, //
            5.0, 6.0, 9.0,
        ];
        next_page.de_dy = vec![1.0, -1.0, 0.5];
        next_page.dy_dz = vec![1.0, 2.0, 4.0];

        layer.step_errors(&mut page, &next, &next_page);

        // j = 0: 1*1*1 + (-1)*2*3 + 0.5*4*5 = 5
        // j = 1: 1*1*2 + (-1)*2*4 + 0.5*4*6 = 6
        assert_eq!(page.de_dy, vec![5.0, 6.0]);
    }

    #[test]
    fn step_errors_ignores_self() {
        let mut page = Page::new(0, 2, 2, 0.1, ActivationKind::Linear);
        let layer = Layer::create(&mut page, 0).unwrap();
        let mut other = page.clone();
        other.de_dy = vec![1.0, 1.0];
        other.dy_dz = vec![1.0, 1.0];
        other.w.data.fill(1.0);

        layer.step_errors(&mut page, &layer, &other);
        assert_eq!(page.de_dy, vec![0.0, 0.0]);
    }

    #[test]
    fn step_backward_applies_sgd_to_weights_and_bias() {
        let mut page = Page::new(0, 2, 1, 0.5, ActivationKind::Linear);
        let layer = Layer::create(&mut page, 0).unwrap();
        page.w.data = vec![1.0, 1.0, 1.0];
        page.de_dy = vec![2.0];
        page.dy_dz = vec![0.5];

        layer.step_backward(&[3.0, -1.0], &mut page);

        // delta = 1, lr * delta = 0.5
        assert_eq!(page.w.data, vec![1.0 - 1.5, 1.0 + 0.5, 0.5]);
    }

    #[test]
    fn init_weights_respects_family_bounds() {
        let mut rng = RandomGenerator::new(3);

        let mut page = Page::new(0, 6, 4, 0.1, ActivationKind::Relu);
        let layer = Layer::create(&mut page, 0).unwrap();
        layer.init_weights(&mut page, 0.25, &mut rng);
        let he = (6.0_f32 / 6.0).sqrt();
        for j in 0..4 {
            let row = page.w.row(j);
            assert!(row[..6].iter().all(|w| w.abs() <= he));
            assert!(row[..6].iter().any(|&w| w != 0.0));
            assert_eq!(row[6], 0.25);
        }

        let mut page = Page::new(0, 6, 4, 0.1, ActivationKind::Sigmoid);
        let layer = Layer::create(&mut page, 0).unwrap();
        layer.init_weights(&mut page, -1.0, &mut rng);
        let xavier = (6.0_f32 / 10.0).sqrt();
        for j in 0..4 {
            let row = page.w.row(j);
            assert!(row[..6].iter().all(|w| w.abs() <= xavier));
            assert_eq!(row[6], -1.0);
        }

        let mut page = Page::new(0, 6, 4, 0.1, ActivationKind::Linear);
        page.w.data.fill(3.0);
        let layer = Layer::create(&mut page, 0).unwrap();
        layer.init_weights(&mut page, 0.5, &mut rng);
        for j in 0..4 {
            let row = page.w.row(j);
            assert!(row[..6].iter().all(|&w| w == 0.0));
            assert_eq!(row[6], 0.5);
        }
    }

    #[test]
    fn init_weights_is_reproducible_for_a_seed() {
        let mut a = Page::new(0, 5, 3, 0.1, ActivationKind::Tanh);
        let mut b = a.clone();
        let la = Layer::create(&mut a, 0).unwrap();
        let lb = Layer::create(&mut b, 0).unwrap();
        la.init_weights(&mut a, 0.0, &mut RandomGenerator::new(11));
        lb.init_weights(&mut b, 0.0, &mut RandomGenerator::new(11));
        assert_eq!(a.w, b.w);
    }

    #[test]
    fn initializer_families() {
        assert_eq!(Init::for_activation(ActivationKind::Swish), Init::He);
        assert_eq!(Init::for_activation(ActivationKind::Softmax), Init::Xavier);
        assert_eq!(Init::for_activation(ActivationKind::Softplus), Init::Zeros);
        assert_eq!(Init::Zeros.bound(4, 4), None);
    }
}
