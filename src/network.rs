//! Whole-network orchestration.
//!
//! A [`Network`] borrows a caller-owned [`Pages`] arena for its whole life and
//! owns one [`Layer`] per page. It never allocates or frees page storage.
//!
//! Lifecycle: `Uninitialized -> Safe -> Destroyed`. Every step function is a
//! silent no-op unless the network is `Safe`, so the only place success needs
//! to be checked is the result of [`Network::create`].

use tracing::debug;

use crate::layer::Layer;
use crate::loss;
use crate::page::Pages;
use crate::random::RandomGenerator;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Uninitialized,
    Safe,
    Destroyed,
}

#[derive(Debug, Default)]
pub struct Network<'a> {
    pages: Option<&'a mut Pages>,
    layers: Vec<Layer>,
    state: State,
}

impl<'a> Network<'a> {
    /// Validate `pages` and build one layer per page.
    ///
    /// Requires at least two stages, every page valid for its position and
    /// every stage wired to the previous stage's output. On error everything
    /// built so far is released and the borrow of `pages` ends, so the caller
    /// may fix the pages and try again.
    pub fn create(pages: &'a mut Pages) -> Result<Self> {
        if pages.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "network needs at least 2 pages, got {}",
                pages.len()
            )));
        }

        let mut layers = Vec::with_capacity(pages.len());
        for (k, page) in pages.pages.iter_mut().enumerate() {
            let layer = Layer::create(page, k).inspect_err(|e| {
                debug!(layer = k, error = %e, "layer creation failed");
            })?;
            layers.push(layer);
        }

        // Wiring can only be checked once every page passed its own validation.
        pages.validate_wiring().inspect_err(|e| {
            debug!(error = %e, "page wiring check failed");
        })?;

        debug!(layers = layers.len(), "network created");
        Ok(Self {
            pages: Some(pages),
            layers,
            state: State::Safe,
        })
    }

    /// Release every layer and the page borrow. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.state == State::Destroyed {
            return;
        }
        for layer in &mut self.layers {
            layer.destroy();
        }
        self.layers = Vec::new();
        self.pages = None;
        self.state = State::Destroyed;
        debug!("network destroyed");
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub fn is_safe(&self) -> bool {
        self.state == State::Safe
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn pages(&self) -> Option<&Pages> {
        self.pages.as_deref()
    }

    /// Weight storage of stage `k`, row-major with the bias as each row's last column.
    ///
    /// Only the values can change; every buffer keeps the shape checked by
    /// [`Network::create`].
    pub fn weights_mut(&mut self, k: usize) -> Option<&mut [f32]> {
        self.pages
            .as_deref_mut()?
            .pages
            .get_mut(k)
            .map(|page| page.w.data.as_mut_slice())
    }

    /// Input buffer of the first stage; write a sample here before `step_forward`.
    pub fn input_mut(&mut self) -> Option<&mut [f32]> {
        self.pages.as_deref_mut().map(|p| p.input.as_mut_slice())
    }

    /// Output of the last stage after the most recent `step_forward`.
    pub fn output(&self) -> Option<&[f32]> {
        self.pages.as_deref().map(Pages::output)
    }

    /// Initialize every layer's weights in forward order from `rng`.
    pub fn init_weights(&mut self, bias: f32, rng: &mut RandomGenerator) {
        if !self.is_safe() {
            return;
        }
        let Some(pages) = self.pages.as_deref_mut() else {
            return;
        };
        for (layer, page) in self.layers.iter().zip(pages.pages.iter_mut()) {
            layer.init_weights(page, bias, rng);
        }
    }

    /// Like [`Network::init_weights`], with a generator seeded from the clock.
    pub fn init_weights_from_clock(&mut self, bias: f32) {
        let mut rng = RandomGenerator::from_time();
        self.init_weights(bias, &mut rng);
    }

    /// Run every stage in order on the current input.
    pub fn step_forward(&mut self) {
        if !self.is_safe() {
            return;
        }
        let Some(pages) = self.pages.as_deref_mut() else {
            return;
        };
        for (k, layer) in self.layers.iter().enumerate() {
            let (x, page) = pages.stage_mut(k);
            layer.step_forward(x, page);
        }
    }

    /// Inject the output error for `target` and propagate it back to the first stage.
    ///
    /// The output sensitivity is `de_dy[j] = 2 * (y[j] - target[j])`, the gradient
    /// of the summed squared error (not divided by the output count).
    /// Ignored if `target.len()` differs from the output width.
    pub fn step_errors(&mut self, target: &[f32]) {
        if !self.is_safe() {
            return;
        }
        let Some(pages) = self.pages.as_deref_mut() else {
            return;
        };
        let Some(out) = pages.pages.last_mut() else {
            return;
        };
        if out.y.len() != target.len() {
            return;
        }

        loss::squared_error_backward(&out.y, target, &mut out.de_dy);

        for k in (0..self.layers.len() - 1).rev() {
            let (page, next_page) = pages.pair_mut(k);
            self.layers[k].step_errors(page, &self.layers[k + 1], next_page);
        }
    }

    /// Apply the SGD update of every stage, last stage first.
    pub fn step_backward(&mut self) {
        if !self.is_safe() {
            return;
        }
        let Some(pages) = self.pages.as_deref_mut() else {
            return;
        };
        for (k, layer) in self.layers.iter().enumerate().rev() {
            let (x, page) = pages.stage_mut(k);
            layer.step_backward(x, page);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationKind;
    use crate::page::Page;

    fn two_stage(kind: ActivationKind) -> Pages {
        Pages::new(vec![
            Page::new(0, 3, 4, 0.1, ActivationKind::Tanh),
            Page::new(1, 4, 2, 0.1, kind),
        ])
    }

    #[test]
    fn create_then_destroy_twice() {
        let mut pages = two_stage(ActivationKind::Sigmoid);
        let mut net = Network::create(&mut pages).unwrap();
        assert_eq!(net.state(), State::Safe);
        assert_eq!(net.num_layers(), 2);

        net.destroy();
        assert_eq!(net.state(), State::Destroyed);
        assert_eq!(net.num_layers(), 0);
        assert!(net.pages().is_none());

        net.destroy();
        assert_eq!(net.state(), State::Destroyed);
    }

    #[test]
    fn default_network_is_inert() {
        let mut net = Network::default();
        assert_eq!(net.state(), State::Uninitialized);
        net.init_weights(0.5, &mut RandomGenerator::new(0));
        net.step_forward();
        net.step_errors(&[1.0]);
        net.step_backward();
        assert!(net.output().is_none());
        assert!(net.input_mut().is_none());
    }

    #[test]
    fn rejects_single_stage() {
        let mut pages = Pages::new(vec![Page::new(0, 3, 4, 0.1, ActivationKind::Tanh)]);
        assert!(Network::create(&mut pages).is_err());
    }

    #[test]
    fn rejects_mismatched_l_id() {
        let mut pages = two_stage(ActivationKind::Sigmoid);
        pages.pages[1].l_id = 0;
        assert!(Network::create(&mut pages).is_err());
    }

    #[test]
    fn rejects_broken_wiring() {
        let mut pages = two_stage(ActivationKind::Sigmoid);
        pages.pages[1] = Page::new(1, 5, 2, 0.1, ActivationKind::Sigmoid);
        assert!(Network::create(&mut pages).is_err());

        let mut pages = two_stage(ActivationKind::Sigmoid);
        pages.input = vec![0.0; 2];
        assert!(Network::create(&mut pages).is_err());
    }

    #[test]
    fn failed_create_can_be_retried_after_fixing_pages() {
        let mut pages = two_stage(ActivationKind::LeakyRelu);
        assert!(Network::create(&mut pages).is_err());
        assert!(pages.pages[1].af_call.is_none());

        pages.pages[1].af_args = vec![0.01];
        let net = Network::create(&mut pages).unwrap();
        assert!(net.is_safe());
    }

    #[test]
    fn weights_mut_only_exposes_values() {
        let mut pages = two_stage(ActivationKind::Sigmoid);
        let mut net = Network::create(&mut pages).unwrap();

        let w = net.weights_mut(1).unwrap();
        assert_eq!(w.len(), 2 * 5);
        w.fill(0.25);
        assert!(net.weights_mut(2).is_none());

        net.step_forward();
        assert_eq!(net.output().unwrap().len(), 2);

        net.destroy();
        assert!(net.weights_mut(0).is_none());
    }

    #[test]
    fn recreate_rechecks_activation_args() {
        let mut pages = two_stage(ActivationKind::Prelu);
        pages.pages[1].af_args = vec![0.1, 0.2];
        {
            let mut net = Network::create(&mut pages).unwrap();
            net.destroy();
        }
        assert!(pages.pages[1].af_call.is_some());

        pages.pages[1].af_args.clear();
        assert!(Network::create(&mut pages).is_err());

        pages.pages[1].af_args = vec![0.1, 0.2];
        let mut net = Network::create(&mut pages).unwrap();
        net.step_forward();
        assert!(net.is_safe());
    }

    #[test]
    fn clock_seeded_init_respects_family_bounds() {
        let mut pages = Pages::new(vec![
            Page::new(0, 3, 4, 0.1, ActivationKind::Relu),
            Page::new(1, 4, 2, 0.1, ActivationKind::Sigmoid),
        ]);
        let mut net = Network::create(&mut pages).unwrap();
        net.init_weights_from_clock(0.3);

        let he = (6.0_f32 / 3.0).sqrt();
        let xavier = (6.0_f32 / 6.0).sqrt();
        for (page, bound) in net.pages().unwrap().pages.iter().zip([he, xavier]) {
            for j in 0..page.width() {
                let (weights, bias) = page.w.row(j).split_at(page.x_len);
                assert!(weights.iter().all(|w| w.abs() <= bound));
                assert_eq!(bias, &[0.3]);
            }
            assert!(page.w.data.iter().any(|&w| w != 0.0 && w != 0.3));
        }
    }

    #[test]
    fn clock_seeded_init_is_inert_after_destroy() {
        let mut pages = two_stage(ActivationKind::Sigmoid);
        {
            let mut net = Network::create(&mut pages).unwrap();
            net.destroy();
            net.init_weights_from_clock(0.3);
        }
        assert!(pages.pages.iter().all(|p| p.w.data.iter().all(|&w| w == 0.0)));
    }

    #[test]
    fn step_errors_ignores_wrong_target_len() {
        let mut pages = two_stage(ActivationKind::Linear);
        let mut net = Network::create(&mut pages).unwrap();
        net.step_forward();
        net.step_errors(&[1.0, 2.0, 3.0]);
        let pages = net.pages().unwrap();
        assert!(pages.pages.iter().all(|p| p.de_dy.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn output_error_is_twice_the_residual() {
        let mut pages = two_stage(ActivationKind::Linear);
        pages.pages[1].w.row_mut(0)[4] = 1.5;
        pages.pages[1].w.row_mut(1)[4] = -0.5;

        let mut net = Network::create(&mut pages).unwrap();
        net.step_forward();
        assert_eq!(net.output().unwrap(), &[1.5, -0.5]);

        net.step_errors(&[1.0, 0.5]);
        assert_eq!(net.pages().unwrap().pages[1].de_dy, vec![1.0, -2.0]);
    }

    #[test]
    fn forward_is_deterministic() {
        let mut pages = two_stage(ActivationKind::Sigmoid);
        let mut net = Network::create(&mut pages).unwrap();
        net.init_weights(0.1, &mut RandomGenerator::new(5));
        net.input_mut().unwrap().copy_from_slice(&[0.2, -0.4, 0.9]);

        net.step_forward();
        let first = net.output().unwrap().to_vec();
        for _ in 0..5 {
            net.step_forward();
            assert_eq!(net.output().unwrap(), first.as_slice());
        }
    }

    #[test]
    fn training_reduces_error() {
        let mut pages = two_stage(ActivationKind::Sigmoid);
        let mut net = Network::create(&mut pages).unwrap();
        net.init_weights(0.0, &mut RandomGenerator::new(17));
        net.input_mut().unwrap().copy_from_slice(&[0.5, -0.3, 0.8]);
        let target = [1.0_f32, 0.0];

        let sq_err = |y: &[f32]| -> f32 { y.iter().zip(&target).map(|(a, b)| (a - b) * (a - b)).sum() };

        net.step_forward();
        let before = sq_err(net.output().unwrap());
        for _ in 0..200 {
            net.step_forward();
            net.step_errors(&target);
            net.step_backward();
        }
        net.step_forward();
        let after = sq_err(net.output().unwrap());
        assert!(after < before * 0.5, "before={before} after={after}");
    }
}
