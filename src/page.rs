//! Per-stage data records.
//!
//! A [`Page`] bundles every buffer one transformation stage reads or writes:
//! weight matrix, pre-activation `z`, output `y`, the two derivative vectors,
//! learning rate and activation configuration. Pages carry no behavior beyond
//! validation; layers and neurons compute into them.
//!
//! [`Pages`] is the arena the layout step produces. Each page owns disjoint
//! storage for its own vectors and only *declares* its input width: the input
//! of page `k` is the output `y` of page `k - 1` (or [`Pages::input`] for the
//! first page). Two logically distinct buffers can therefore never alias.

use crate::activation::{Activation, ActivationKind};
use crate::{Error, Result};

/// Row-major `f32` matrix.
///
/// For a page, `rows` is the number of neurons and `cols` is the input width
/// plus one trailing bias column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Row `j`. Panics if out of range.
    #[inline]
    pub fn row(&self, j: usize) -> &[f32] {
        let start = j * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Row `j`, mutably. Panics if out of range.
    #[inline]
    pub fn row_mut(&mut self, j: usize) -> &mut [f32] {
        let start = j * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Element at `(row, col)`. Panics if out of range.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn is_consistent(&self) -> bool {
        self.rows.checked_mul(self.cols) == Some(self.data.len())
    }
}

/// Buffers and configuration of one network stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Position of this page in its [`Pages`] arena.
    pub l_id: usize,
    /// Width of the input vector (the previous stage's output).
    pub x_len: usize,
    pub w: Matrix,
    pub z: Vec<f32>,
    pub y: Vec<f32>,
    pub dy_dz: Vec<f32>,
    pub de_dy: Vec<f32>,
    pub lr: f32,
    pub af_type: ActivationKind,
    /// Resolved dispatch handle; set when the first neuron is created.
    pub af_call: Option<Activation>,
    /// Activation-specific scalars (slopes, or the softmax reduction scratch).
    pub af_args: Vec<f32>,
}

impl Page {
    /// Allocate a zeroed page for a stage mapping `x_len` inputs to `width` outputs.
    pub fn new(l_id: usize, x_len: usize, width: usize, lr: f32, af_type: ActivationKind) -> Self {
        Self {
            l_id,
            x_len,
            w: Matrix::zeros(width, x_len + 1),
            z: vec![0.0; width],
            y: vec![0.0; width],
            dy_dz: vec![0.0; width],
            de_dy: vec![0.0; width],
            lr,
            af_type,
            af_call: None,
            af_args: Vec::new(),
        }
    }

    /// Clear every field, including the dispatch handle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.y.len()
    }

    /// Structural validation of this page as stage `l_id`.
    pub fn validate(&self, l_id: usize) -> Result<()> {
        if self.l_id != l_id {
            return Err(Error::InvalidShape(format!(
                "page l_id {} does not match expected {l_id}",
                self.l_id
            )));
        }
        if self.x_len == 0 {
            return Err(Error::InvalidShape(format!("page {l_id}: x_len must be > 0")));
        }
        if self.w.data.is_empty()
            || self.z.is_empty()
            || self.y.is_empty()
            || self.dy_dz.is_empty()
            || self.de_dy.is_empty()
        {
            return Err(Error::InvalidShape(format!(
                "page {l_id}: w, z, y, dy_dz and de_dy must all be allocated"
            )));
        }
        if !self.w.is_consistent() {
            return Err(Error::InvalidShape(format!(
                "page {l_id}: weight storage {} does not match rows * cols ({} * {})",
                self.w.data.len(),
                self.w.rows,
                self.w.cols
            )));
        }
        if self.w.cols != self.x_len + 1 {
            return Err(Error::InvalidShape(format!(
                "page {l_id}: w.cols {} does not match x_len + 1 ({})",
                self.w.cols,
                self.x_len + 1
            )));
        }
        if self.w.rows != self.z.len() || self.w.rows != self.y.len() {
            return Err(Error::InvalidShape(format!(
                "page {l_id}: w.rows {} does not match z len {} / y len {}",
                self.w.rows,
                self.z.len(),
                self.y.len()
            )));
        }
        if self.dy_dz.len() != self.z.len() || self.de_dy.len() != self.y.len() {
            return Err(Error::InvalidShape(format!(
                "page {l_id}: dy_dz len {} / de_dy len {} do not match width {}",
                self.dy_dz.len(),
                self.de_dy.len(),
                self.y.len()
            )));
        }
        Ok(())
    }

    /// Boolean form of [`Page::validate`].
    pub fn check(&self, l_id: usize) -> bool {
        self.validate(l_id).is_ok()
    }

    /// Weak check used when binding a neuron: `index` must address `z`.
    #[inline]
    pub fn check_index(&self, index: usize) -> bool {
        index < self.z.len()
    }
}

/// Ordered stages plus the network input they read from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pages {
    /// Input of the first stage.
    pub input: Vec<f32>,
    pub pages: Vec<Page>,
}

impl Pages {
    /// Wrap `pages`, allocating an input buffer of the first page's `x_len`.
    pub fn new(pages: Vec<Page>) -> Self {
        let input_len = pages.first().map(|p| p.x_len).unwrap_or(0);
        Self {
            input: vec![0.0; input_len],
            pages,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Output of the last stage.
    pub fn output(&self) -> &[f32] {
        self.pages.last().map(|p| p.y.as_slice()).unwrap_or(&[])
    }

    /// Check that stage `k` reads exactly what stage `k - 1` writes.
    pub fn validate_wiring(&self) -> Result<()> {
        let mut upstream = self.input.len();
        for (k, page) in self.pages.iter().enumerate() {
            if page.x_len != upstream {
                return Err(Error::InvalidShape(format!(
                    "page {k}: x_len {} is not wired to upstream output len {upstream}",
                    page.x_len
                )));
            }
            upstream = page.y.len();
        }
        Ok(())
    }

    /// Input slice and mutable page for stage `k`.
    ///
    /// Panics if `k` is out of range.
    #[inline]
    pub(crate) fn stage_mut(&mut self, k: usize) -> (&[f32], &mut Page) {
        let (before, after) = self.pages.split_at_mut(k);
        let x = match before.last() {
            Some(prev) => prev.y.as_slice(),
            None => self.input.as_slice(),
        };
        (x, &mut after[0])
    }

    /// Stage `k` mutably and stage `k + 1` shared.
    ///
    /// Panics if `k + 1` is out of range.
    #[inline]
    pub(crate) fn pair_mut(&mut self, k: usize) -> (&mut Page, &Page) {
        let (left, right) = self.pages.split_at_mut(k + 1);
        (&mut left[k], &right[0])
    }
}
