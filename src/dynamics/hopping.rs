use crate::initialization::Simulation;
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Transient record of an attempted surface switch.
#[derive(Debug, Clone, Copy)]
pub struct HopProposal {
    pub from: usize,
    pub to: usize,
    pub probability: f64,
    pub energy_gap: f64,
    /// set for trivial diabatic crossings, which bypass the stochastic draw
    pub forced: bool,
}

/// Fewest-switches draw: walk the cumulative probabilities of all candidate
/// states and pick the first state whose cumulative sum exceeds the random
/// number. Returns `current` when the draw selects no switch.
pub fn select_by_cumulative(
    current: usize,
    probabilities: ArrayView1<f64>,
    rnr: f64,
) -> usize {
    let mut target: usize = current;
    let mut ptot: f64 = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        if i != current && ptot < rnr {
            if ptot + p > rnr {
                target = i;
            }
            ptot += p;
        }
    }
    target
}

/// Deterministic selection of the maximum-population state, following
/// J. R. Mannouch and J. O. Richardson, JCP 158, 104111 (2023).
pub fn mash_target(amplitudes: ArrayView1<c64>) -> usize {
    let mut max: f64 = 0.0;
    let mut target: usize = 0;
    for (i, c) in amplitudes.iter().enumerate() {
        if c.norm_sqr() > max {
            max = c.norm_sqr();
            target = i;
        }
    }
    target
}

impl Simulation {
    /// Hopping probabilities in the local diabatization scheme of Granucci,
    /// Persico and Toniolo, JCP 114, 10608 (2001). The total probability to
    /// leave the active state is the fractional population loss over the
    /// step; it is distributed over the candidate states in proportion to the
    /// population they received through the one-step propagator `u`.
    pub fn granucci_probabilities(
        &self,
        c_old: ArrayView1<c64>,
        u: ArrayView2<c64>,
    ) -> Array1<f64> {
        let current: usize = self.state;
        let mut p: Array1<f64> = Array1::zeros(self.ndim);

        let occupied_old: f64 = c_old[current].norm_sqr();
        let ptot: f64 = (occupied_old - self.adiabatic[current].norm_sqr()) / occupied_old;
        if ptot <= 0.0 {
            return p;
        }
        let mut btot: f64 = 0.0;
        for i in 0..self.ndim {
            if i != current {
                let b: f64 = (u[[i, current]] * c_old[current]).norm_sqr();
                if b > 0.0 {
                    btot += b;
                    p[i] = b;
                }
            }
        }
        if btot > 0.0 {
            p.mapv_inplace(|val| val / btot * ptot);
        }
        p
    }

    /// Tully's fewest-switches probabilities with the nonadiabatic couplings
    /// approximated by finite differences of consecutive eigenvector overlaps,
    /// following Fabiano, Keal and Thiel, Chem. Phys. 349, 334 (2008).
    pub fn tully_probabilities(&self) -> Array1<f64> {
        let current: usize = self.state;
        let invdt: f64 = 1.0 / self.stepsize;
        // overlap[j, i] = <previous_j | new_i>
        let overlap: Array2<c64> = self.basis.overlap_with_previous(&self.previous_basis);

        let mut p: Array1<f64> = Array1::zeros(self.ndim);
        let occupied: f64 = self.adiabatic[current].norm_sqr();
        for i in 0..self.ndim {
            if i != current {
                // sigma_ci = (<old_c|new_i> - <new_c|old_i>) / (2 dt)
                let coupling: c64 =
                    0.5 * invdt * (overlap[[current, i]] - overlap[[i, current]].conj());
                let b: f64 =
                    2.0 * (self.adiabatic[current].conj() * self.adiabatic[i] * coupling).re;
                if b > 0.0 {
                    p[i] = b * self.stepsize / occupied;
                }
            }
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_draw_selects_the_crossing_state() {
        // candidates 0, 2 and 3 around the active state 1
        let p = arr1(&[0.05, 0.0, 0.10, 0.02]);
        assert_eq!(select_by_cumulative(1, p.view(), 0.12), 2);
        // a small draw lands in the first candidate's window
        assert_eq!(select_by_cumulative(1, p.view(), 0.04), 0);
        // a draw beyond the total probability never hops
        assert_eq!(select_by_cumulative(1, p.view(), 0.9), 1);
    }

    #[test]
    fn mash_picks_the_argmax_population() {
        let c = arr1(&[
            c64::from(0.1_f64.sqrt()),
            c64::from(0.6_f64.sqrt()),
            c64::from(0.3_f64.sqrt()),
        ]);
        assert_eq!(mash_target(c.view()), 1);
    }
}
