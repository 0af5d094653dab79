use crate::page::Page;
use crate::{Error, Result};

/// Compute handle for one unit of a page.
///
/// A neuron owns no memory: it is just the row index `j` it addresses in
/// the page's `w`, `z`, `y` and `dy_dz` buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neuron {
    index: usize,
}

impl Neuron {
    /// Bind a neuron to row `index` of `page`.
    ///
    /// The first neuron created for a page resolves the page's activation tag.
    /// The arguments are checked against the handle on every call, and a new
    /// handle is only stored when they are valid, so a corrected page
    /// resolves again on retry.
    pub fn create(page: &mut Page, index: usize) -> Result<Self> {
        if !page.check_index(index) {
            return Err(Error::InvalidShape(format!(
                "neuron index {index} out of range for page {} with {} units",
                page.l_id,
                page.z.len()
            )));
        }

        // Arguments are checked on every bind: a page may have been edited
        // between a destroyed network and the next create.
        let act = page.af_call.unwrap_or_else(|| page.af_type.resolve());
        if !act.args_valid(&page.af_args, page.y.len()) {
            return Err(Error::InvalidConfig(format!(
                "page {}: {} activation got {} argument(s) for {} units",
                page.l_id,
                page.af_type,
                page.af_args.len(),
                page.y.len()
            )));
        }
        page.af_call = Some(act);

        Ok(Self { index })
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// `z[j] = w[j][bias] + sum_i w[j][i] * x[i]`.
    ///
    /// Shape contract: `x.len() == page.x_len`.
    #[inline]
    pub fn step_forward_z(&self, x: &[f32], page: &mut Page) {
        debug_assert_eq!(x.len(), page.x_len);

        let j = self.index;
        let row = page.w.row(j);
        let (weights, bias) = row.split_at(x.len());

        let mut sum = bias[0];
        for (&w, &xi) in weights.iter().zip(x) {
            sum += w * xi;
        }
        page.z[j] = sum;
    }

    /// Apply the page's activation to unit `j`, writing `y[j]` and `dy_dz[j]`.
    #[inline]
    pub fn step_forward_y(&self, page: &mut Page) {
        let Some(act) = page.af_call else {
            return;
        };

        let j = self.index;
        let (y, dy_dz) = act.apply(page.z[j], j, &page.af_args);
        page.y[j] = y;
        page.dy_dz[j] = dy_dz;
    }
}
