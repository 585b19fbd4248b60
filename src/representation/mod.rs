use crate::error::DynamicsError;
use ndarray::prelude::*;
use ndarray_linalg::{c64, Eigh, UPLO};

/// Instantaneous eigenbasis of the coupled Hamiltonian. Eigenvectors are
/// stored as **columns** of `vectors`, in ascending order of `energies`;
/// whatever orientation the underlying solver uses is fixed here, once, so
/// call sites never transpose. The eigenvector phase remains arbitrary,
/// which is why state tracking exists.
#[derive(Clone)]
pub struct PolaritonBasis {
    pub energies: Array1<f64>,
    pub vectors: Array2<c64>,
}

/// Diagonalize the Hermitian coupled matrix. A nonzero solver status is
/// fatal; it invalidates all downstream state of the step.
pub fn diagonalize(h: ArrayView2<c64>) -> Result<PolaritonBasis, DynamicsError> {
    let (energies, vectors) = h
        .to_owned()
        .eigh(UPLO::Upper)
        .map_err(DynamicsError::solver("eigh(H)"))?;
    Ok(PolaritonBasis { energies, vectors })
}

impl PolaritonBasis {
    pub fn ndim(&self) -> usize {
        self.energies.len()
    }

    /// Placeholder basis used before the first diagonalization result is
    /// broadcast; workers fill it with zeros and reduce.
    pub fn zeros(ndim: usize) -> PolaritonBasis {
        PolaritonBasis {
            energies: Array1::zeros(ndim),
            vectors: Array2::zeros((ndim, ndim)),
        }
    }

    /// U^dagger, the adjoint with the eigenvectors as rows.
    pub fn adjoint(&self) -> Array2<c64> {
        self.vectors.t().mapv(|v| v.conj())
    }

    /// Diabatic to adiabatic: `c = U^dagger d`.
    pub fn to_adiabatic(&self, d: ArrayView1<c64>) -> Array1<c64> {
        self.adjoint().dot(&d)
    }

    /// Adiabatic to diabatic: `d = U c`.
    pub fn to_diabatic(&self, c: ArrayView1<c64>) -> Array1<c64> {
        self.vectors.dot(&c)
    }

    /// Overlap matrix with a previous basis, `S[i, j] = <prev_i | new_j>`.
    pub fn overlap_with_previous(&self, previous: &PolaritonBasis) -> Array2<c64> {
        previous.adjoint().dot(&self.vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_hamiltonian() -> Array2<c64> {
        let mut h: Array2<c64> = Array2::zeros((3, 3));
        h[[0, 0]] = c64::from(-0.5);
        h[[1, 1]] = c64::from(-0.3);
        h[[2, 2]] = c64::from(-0.1);
        h[[0, 2]] = c64::new(0.02, 0.01);
        h[[2, 0]] = h[[0, 2]].conj();
        h[[1, 2]] = c64::new(-0.015, 0.005);
        h[[2, 1]] = h[[1, 2]].conj();
        h
    }

    #[test]
    fn eigenvalues_ascend_and_vectors_are_orthonormal() {
        let basis = diagonalize(sample_hamiltonian().view()).unwrap();
        for w in basis.energies.windows(2) {
            assert!(w[0] <= w[1]);
        }
        let gram = basis.adjoint().dot(&basis.vectors);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]].re, expected, epsilon = 1e-12);
                assert_abs_diff_eq!(gram[[i, j]].im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn basis_round_trip() {
        let basis = diagonalize(sample_hamiltonian().view()).unwrap();
        let d = arr1(&[
            c64::new(0.6, 0.1),
            c64::new(-0.3, 0.2),
            c64::new(0.1, -0.4),
        ]);
        let back = basis.to_diabatic(basis.to_adiabatic(d.view()).view());
        for (a, b) in back.iter().zip(d.iter()) {
            assert_abs_diff_eq!((a - b).norm_sqr(), 0.0, epsilon = 1e-24);
        }
    }

    #[test]
    fn diagonalization_reproduces_the_matrix() {
        let h = sample_hamiltonian();
        let basis = diagonalize(h.view()).unwrap();
        let rebuilt = basis
            .vectors
            .dot(&Array2::from_diag(&basis.energies.mapv(c64::from)))
            .dot(&basis.adjoint());
        for (a, b) in rebuilt.iter().zip(h.iter()) {
            assert_abs_diff_eq!((a - b).norm_sqr(), 0.0, epsilon = 1e-20);
        }
    }
}
