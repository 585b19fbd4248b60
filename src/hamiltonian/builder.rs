use crate::hamiltonian::CavityModeSet;
use crate::interface::ProviderOutput;
use itertools::iproduct;
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// The local share of the coupled Hamiltonian owned by one replica
/// contributor. Merging the contributions of all workers by collective
/// summation yields the global diagonal and coupling block; entries outside
/// the contributor's responsibility are zero (or, for the diagonal, its
/// ground-state energy, which every other entry of the summed diagonal needs).
pub struct SiteContribution {
    /// length ndim; entry `i` holds this replica's ground-state energy,
    /// except the replica's own entry, which holds its excited energy
    pub energies: Array1<f64>,
    /// (nmol, n_modes) dipole-field couplings, nonzero only in this
    /// replica's row
    pub couplings: Array2<c64>,
}

impl SiteContribution {
    pub fn new(
        replica: usize,
        nmol: usize,
        provider: &ProviderOutput,
        cavity: &CavityModeSet,
    ) -> SiteContribution {
        let ndim = nmol + cavity.n_modes();
        let mut energies: Array1<f64> = Array1::from_elem(ndim, provider.ground_energy);
        energies[replica] = provider.excited_energy;

        let mut couplings: Array2<c64> = Array2::zeros((nmol, cavity.n_modes()));
        for (i, n) in cavity.mode_indices().enumerate() {
            couplings[[replica, i]] =
                cavity.coupling(n, replica, nmol, &provider.transition_dipole);
        }

        SiteContribution { energies, couplings }
    }
}

/// Add the per-mode dispersion to the photonic entries of the summed
/// diagonal. Applied once, after the collective reduction.
pub fn add_mode_dispersion(energies: &mut Array1<f64>, cavity: &CavityModeSet, nmol: usize) {
    for (i, n) in cavity.mode_indices().enumerate() {
        energies[nmol + i] += cavity.dispersion(n);
    }
}

/// Assemble the ndim x ndim coupled matrix from the merged diagonal and
/// coupling block. The molecular-row block carries the couplings as
/// computed; the mirror block carries their conjugates.
pub fn assemble(
    energies: ArrayView1<f64>,
    couplings: ArrayView2<c64>,
    nmol: usize,
) -> Array2<c64> {
    let ndim = energies.len();
    let n_modes = couplings.dim().1;
    debug_assert_eq!(ndim, nmol + n_modes);

    let mut h: Array2<c64> = Array2::zeros((ndim, ndim));
    for (i, e) in energies.iter().enumerate() {
        h[[i, i]] = c64::from(*e);
    }
    for (k, j) in iproduct!(0..nmol, 0..n_modes) {
        h[[k, nmol + j]] = couplings[[k, j]];
        h[[nmol + j, k]] = couplings[[k, j]].conj();
    }
    h
}

/// Two-slot ring buffer holding the coupled matrix of the current and the
/// previous step, used for the trapezoidal interpolation of the propagator.
pub struct HamiltonianPair {
    pub current: Array2<c64>,
    pub previous: Array2<c64>,
    primed: bool,
}

impl HamiltonianPair {
    pub fn new(ndim: usize) -> HamiltonianPair {
        HamiltonianPair {
            current: Array2::zeros((ndim, ndim)),
            previous: Array2::zeros((ndim, ndim)),
            primed: false,
        }
    }

    /// Rotate the buffer: the current matrix becomes the previous one.
    pub fn advance(&mut self, next: Array2<c64>) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current = next;
        self.primed = true;
    }

    /// `H(t) + H(t - dt)`, the unhalved trapezoidal sum.
    pub fn summed(&self) -> Array2<c64> {
        &self.current + &self.previous
    }

    /// False until the buffer holds two consecutive matrices.
    pub fn primed(&self) -> bool {
        self.primed && !self.previous.iter().all(|v| v.norm_sqr() == 0.0)
    }
}
