use crate::initialization::Simulation;
use crate::representation::PolaritonBasis;

/// Restore continuity between consecutive eigenbases. Each new eigenvector is
/// assigned to the previous-step state it overlaps most with, and its sign is
/// flipped when the real part of that overlap is negative, so that the
/// arbitrary solver phase does not masquerade as nuclear dynamics. The full
/// ndim x ndim overlap block is searched; near-degenerate crossings make a
/// windowed search unreliable.
///
/// Returns the assignment map, `assignment[i]` being the previous-step index
/// of new state `i`.
pub fn track_states(previous: &PolaritonBasis, basis: &mut PolaritonBasis) -> Vec<usize> {
    let ndim: usize = basis.ndim();
    // overlap[j, i] = <previous_j | new_i>
    let overlap = basis.overlap_with_previous(previous);
    let mut assignment: Vec<usize> = vec![0; ndim];
    for i in 0..ndim {
        let mut maxover: f64 = -1.0;
        for j in 0..ndim {
            if overlap[[j, i]].norm() > maxover {
                maxover = overlap[[j, i]].norm();
                assignment[i] = j;
            }
        }
    }
    for i in 0..ndim {
        if overlap[[assignment[i], i]].re < 0.0 {
            basis.vectors.column_mut(i).map_inplace(|v| *v = -*v);
        }
    }
    assignment
}

impl Simulation {
    /// Track the fresh eigenbasis against the previous step. A relocated
    /// active state signals a trivial (diabatic) crossing; the caller must
    /// then force the hop to the returned index.
    pub fn track_active_state(&mut self) -> Option<usize> {
        let assignment = track_states(&self.previous_basis, &mut self.basis);
        let relocated: usize = assignment
            .iter()
            .position(|&j| j == self.state)
            .unwrap_or(self.state);
        (relocated != self.state).then_some(relocated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::diagonalize;
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;
    use ndarray_linalg::c64;

    fn basis_of(h: &Array2<c64>) -> PolaritonBasis {
        diagonalize(h.view()).unwrap()
    }

    #[test]
    fn sign_continuity_is_restored() {
        let mut h: Array2<c64> = Array2::zeros((2, 2));
        h[[0, 0]] = c64::from(-0.4);
        h[[1, 1]] = c64::from(-0.2);
        h[[0, 1]] = c64::from(0.01);
        h[[1, 0]] = c64::from(0.01);
        let previous = basis_of(&h);

        // same matrix, eigenvectors flipped by hand
        let mut flipped = previous.clone();
        flipped.vectors.column_mut(0).map_inplace(|v| *v = -*v);
        let assignment = track_states(&previous, &mut flipped);
        assert_eq!(assignment, vec![0, 1]);
        for (a, b) in flipped.vectors.iter().zip(previous.vectors.iter()) {
            assert_abs_diff_eq!((a - b).norm_sqr(), 0.0, epsilon = 1e-24);
        }
    }

    #[test]
    fn swapped_states_are_reassigned() {
        let mut h: Array2<c64> = Array2::zeros((2, 2));
        h[[0, 0]] = c64::from(-0.4);
        h[[1, 1]] = c64::from(-0.2);
        h[[0, 1]] = c64::from(0.001);
        h[[1, 0]] = c64::from(0.001);
        let previous = basis_of(&h);

        // invert the diagonal ordering so the characters swap places
        let mut h_swapped = h.clone();
        h_swapped[[0, 0]] = c64::from(-0.2);
        h_swapped[[1, 1]] = c64::from(-0.4);
        let mut new = basis_of(&h_swapped);
        let assignment = track_states(&previous, &mut new);
        assert_eq!(assignment, vec![1, 0]);
    }
}
