//! Random input matrices for the benchmarks and tests
//!
//! - [`random_positive`]: entries drawn uniformly from `1..=1000`
//! - [`make_spd`]: symmetrize in place and make strictly diagonally dominant
//! - [`random_spd`], [`random_diagonally_dominant`]: convenience wrappers

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest entry produced by [`random_positive`].
pub const MAX_ENTRY: u32 = 1000;

/// RNG seeded from `seed`, or from the thread RNG when `None`.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => {
            let mut thread_rng = rand::rng();
            StdRng::from_rng(&mut thread_rng)
        }
    }
}

/// `n x n` matrix with independent entries uniform in `1..=MAX_ENTRY`.
///
/// No structure is guaranteed beyond positivity: LU without pivoting may hit
/// a tiny pivot on such input.
pub fn random_positive<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |_| f64::from(rng.random_range(1..=MAX_ENTRY)))
}

/// Turn `a` into a symmetric positive-definite matrix in place.
///
/// The upper triangle is replaced by `(A[i][j] + A[j][i]) / 2` and mirrored to
/// the lower triangle. Each diagonal entry then gets `n` plus the absolute sum
/// of its off-diagonal row added, which makes the matrix strictly diagonally
/// dominant with a positive diagonal and hence SPD.
pub fn make_spd(a: &mut Array2<f64>) {
    let n = a.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let v = 0.5 * (a[[i, j]] + a[[j, i]]);
            a[[i, j]] = v;
            a[[j, i]] = v;
        }
    }
    for i in 0..n {
        let off: f64 = (0..n).filter(|&j| j != i).map(|j| a[[i, j]].abs()).sum();
        a[[i, i]] += n as f64 + off;
    }
}

/// Random SPD matrix: [`random_positive`] followed by [`make_spd`].
pub fn random_spd<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Array2<f64> {
    let mut a = random_positive(n, rng);
    make_spd(&mut a);
    a
}

/// Random non-symmetric, strictly diagonally dominant matrix.
///
/// Every leading principal minor is non-singular, so LU without pivoting never
/// meets a zero pivot and stays numerically stable.
pub fn random_diagonally_dominant<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Array2<f64> {
    let mut a = random_positive(n, rng);
    for i in 0..n {
        let off: f64 = (0..n).filter(|&j| j != i).map(|j| a[[i, j]]).sum();
        a[[i, i]] += off;
    }
    a
}
