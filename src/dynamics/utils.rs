use crate::initialization::Simulation;
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Broadcast-by-summation helpers: the owning role keeps its data, every
/// other member zeroes its copy, and the collective sum leaves all members
/// with the owner's values.
impl Simulation {
    pub(crate) fn broadcast_complex(&self, data: &mut Array1<c64>, owner: bool) {
        if !owner {
            data.fill(c64::new(0.0, 0.0));
        }
        let mut buffer: Vec<c64> = data.to_vec();
        self.group.sum_c64(&mut buffer);
        for (d, b) in data.iter_mut().zip(buffer) {
            *d = b;
        }
    }

    pub(crate) fn broadcast_matrix(&self, data: &mut Array2<c64>, owner: bool) {
        if !owner {
            data.fill(c64::new(0.0, 0.0));
        }
        let mut buffer: Vec<c64> = data.iter().copied().collect();
        self.group.sum_c64(&mut buffer);
        for (d, b) in data.iter_mut().zip(buffer) {
            *d = b;
        }
    }

    pub(crate) fn broadcast_real(&self, data: &mut Array1<f64>, owner: bool) {
        if !owner {
            data.fill(0.0);
        }
        let mut buffer: Vec<f64> = data.to_vec();
        self.group.sum_f64(&mut buffer);
        for (d, b) in data.iter_mut().zip(buffer) {
            *d = b;
        }
    }

    /// Element-wise sum of everyone's copy, used to merge the per-replica
    /// Hamiltonian contributions.
    pub(crate) fn reduce_real(&self, data: &mut Array1<f64>) {
        let mut buffer: Vec<f64> = data.to_vec();
        self.group.sum_f64(&mut buffer);
        for (d, b) in data.iter_mut().zip(buffer) {
            *d = b;
        }
    }

    pub(crate) fn reduce_complex_matrix(&self, data: &mut Array2<c64>) {
        let mut buffer: Vec<c64> = data.iter().copied().collect();
        self.group.sum_c64(&mut buffer);
        for (d, b) in data.iter_mut().zip(buffer) {
            *d = b;
        }
    }
}
