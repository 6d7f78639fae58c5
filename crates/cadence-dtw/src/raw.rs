//! Flat-buffer entry point for host bindings.
//!
//! Hosts that hold their features as contiguous row-major arrays call
//! [`align_into`] with explicit lengths and receive either the number of path
//! pairs written or a negative [`ErrorCode`](crate::ErrorCode) value.

use crate::engine::Aligner;
use crate::error::AlignError;
use crate::sequence::FeatureSequenceView;

/// Align two flat feature buffers and write the path into `path_buffer`.
///
/// `s` holds `n` reference vectors and `t` holds `m` query vectors, each of
/// dimension `l`, row-major. The path is written as interleaved
/// `(reference, query)` pairs; `path_buffer` should hold `2 * (n + m)`
/// entries.
///
/// Returns the number of pairs written (at least 1), or a negative status
/// code from [`ErrorCode`](crate::ErrorCode). On failure neither
/// `path_distance` nor `path_buffer` is modified.
#[allow(clippy::too_many_arguments)]
pub fn align_into(
    s: &[f64],
    t: &[f64],
    n: usize,
    m: usize,
    l: usize,
    skip_penalty: f64,
    radius: i64,
    path_distance: &mut f64,
    path_buffer: &mut [usize],
) -> isize {
    match try_align_into(s, t, n, m, l, skip_penalty, radius, path_distance, path_buffer) {
        Ok(written) => isize::try_from(written).unwrap_or(isize::MAX),
        Err(e) => e.code().value(),
    }
}

#[allow(clippy::too_many_arguments)]
fn try_align_into(
    s: &[f64],
    t: &[f64],
    n: usize,
    m: usize,
    l: usize,
    skip_penalty: f64,
    radius: i64,
    path_distance: &mut f64,
    path_buffer: &mut [usize],
) -> Result<usize, AlignError> {
    let aligner = Aligner::new(skip_penalty, radius)?;
    if l == 0 {
        return Err(AlignError::ZeroDimension);
    }
    if n == 0 || m == 0 {
        return Err(AlignError::EmptySequence);
    }
    check_shape(s, n, l)?;
    check_shape(t, m, l)?;

    let reference = FeatureSequenceView::new(s, l)?;
    let query = FeatureSequenceView::new(t, l)?;
    aligner.align_into(reference, query, path_distance, path_buffer)
}

fn check_shape(buffer: &[f64], count: usize, dim: usize) -> Result<(), AlignError> {
    let expected = count.saturating_mul(dim);
    if buffer.len() != expected {
        return Err(AlignError::ShapeMismatch {
            len: buffer.len(),
            expected,
        });
    }
    Ok(())
}
