//! Shifted QR sweeps on a symmetric tridiagonal matrix.

extern crate nalgebra as na;

use na::DMatrix;

/// Rotation `[c s; -s c]` mapping `(x, z)` onto `(r, 0)`.
fn givens(x: f64, z: f64) -> (f64, f64) {
    let r = x.hypot(z);
    if r == 0.0 {
        (1.0, 0.0)
    } else {
        (x / r, z / r)
    }
}

/// Apply one explicit QR step per shift to the tridiagonal `t`:
/// `T - μ I = Q R`, `T ← R Q + μ I`.
///
/// Returns the transformed matrix and the accumulated orthogonal `Q`, so that
/// `T⁺ = Qᵀ T Q`. Entries outside the tridiagonal band are cleared after each
/// sweep.
pub fn shifted_qr(t: &DMatrix<f64>, shifts: &[f64]) -> (DMatrix<f64>, DMatrix<f64>) {
    let m = t.nrows();
    let mut h = t.clone();
    let mut q = DMatrix::<f64>::identity(m, m);

    for &mu in shifts {
        for i in 0..m {
            h[(i, i)] -= mu;
        }
        let mut rotations = Vec::with_capacity(m.saturating_sub(1));
        for i in 0..m.saturating_sub(1) {
            let (c, s) = givens(h[(i, i)], h[(i + 1, i)]);
            for col in 0..m {
                let x = h[(i, col)];
                let z = h[(i + 1, col)];
                h[(i, col)] = c * x + s * z;
                h[(i + 1, col)] = -s * x + c * z;
            }
            rotations.push((c, s));
        }
        for (i, &(c, s)) in rotations.iter().enumerate() {
            for row in 0..m {
                let x = h[(row, i)];
                let z = h[(row, i + 1)];
                h[(row, i)] = c * x + s * z;
                h[(row, i + 1)] = -s * x + c * z;

                let x = q[(row, i)];
                let z = q[(row, i + 1)];
                q[(row, i)] = c * x + s * z;
                q[(row, i + 1)] = -s * x + c * z;
            }
        }
        for i in 0..m {
            h[(i, i)] += mu;
        }
        // restore exact symmetric tridiagonal form
        for i in 0..m {
            for j in 0..m {
                if i.abs_diff(j) > 1 {
                    h[(i, j)] = 0.0;
                }
            }
            if i + 1 < m {
                let sub = 0.5 * (h[(i + 1, i)] + h[(i, i + 1)]);
                h[(i + 1, i)] = sub;
                h[(i, i + 1)] = sub;
            }
        }
    }
    (h, q)
}
