use crate::error::DynamicsError;
use ndarray::prelude::*;

/// Per-step result of the electronic-structure calculation for one replica.
/// All quantities are in atomic units; gradients and the dipole gradient are
/// (n_atoms, 3) arrays over the replica's atoms (QM and point charges alike).
pub struct ProviderOutput {
    pub ground_energy: f64,
    pub excited_energy: f64,
    pub ground_gradient: Array2<f64>,
    pub excited_gradient: Array2<f64>,
    /// transition dipole moment of the replica's S0 -> S1 excitation
    pub transition_dipole: [f64; 3],
    /// per-atom gradient of each cartesian component of the transition dipole
    pub dipole_gradient: [Array2<f64>; 3],
}

impl ProviderOutput {
    /// Zero-filled record used before the first provider call.
    pub fn empty(n_atoms: usize) -> ProviderOutput {
        ProviderOutput {
            ground_energy: 0.0,
            excited_energy: 0.0,
            ground_gradient: Array2::zeros((n_atoms, 3)),
            excited_gradient: Array2::zeros((n_atoms, 3)),
            transition_dipole: [0.0; 3],
            dipole_gradient: [
                Array2::zeros((n_atoms, 3)),
                Array2::zeros((n_atoms, 3)),
                Array2::zeros((n_atoms, 3)),
            ],
        }
    }
}

/// Trait that provides an interface to an external electronic-structure
/// program. It is invoked once per replica per timestep; a result that cannot
/// be parsed is fatal for the run.
pub trait ElectronicStructure {
    fn compute(
        &mut self,
        coordinates: ArrayView2<f64>,
        state: usize,
        step: usize,
    ) -> Result<ProviderOutput, DynamicsError>;
}
