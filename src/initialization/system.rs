use crate::constants;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// The classical degrees of freedom of one replica: the atoms (QM region and
/// point charges alike) of the molecule this process is responsible for.
/// Coordinates in Bohr, velocities in Bohr per atomic time unit, masses in
/// atomic units.
pub struct ReplicaData {
    /// index of this replica within the group, `m` in `[0, nmol)`
    pub index: usize,
    pub n_atoms: usize,
    pub masses: Array1<f64>,
    pub coordinates: Array2<f64>,
    pub velocities: Array2<f64>,
}

impl ReplicaData {
    pub fn new(index: usize, masses: Array1<f64>, coordinates: Array2<f64>) -> ReplicaData {
        let n_atoms: usize = masses.len();
        assert_eq!(coordinates.dim(), (n_atoms, 3));
        ReplicaData {
            index,
            n_atoms,
            masses,
            coordinates,
            velocities: Array2::zeros((n_atoms, 3)),
        }
    }

    /// Draw Maxwell-Boltzmann velocities at `temperature`. The generator is
    /// seeded with the run seed offset by the replica index, so a rerun
    /// reproduces every replica and no two replicas share a stream.
    pub fn thermalize(&mut self, temperature: f64, seed: u64) {
        let sigma: f64 = (constants::K_BOLTZMANN * temperature).sqrt();
        let boltzmann: Normal<f64> =
            Normal::new(0.0, sigma).expect("negative temperature");
        let mut rng: StdRng = StdRng::seed_from_u64(seed.wrapping_add(self.index as u64));
        for atom in 0..self.n_atoms {
            let scale: f64 = 1.0 / self.masses[atom].sqrt();
            for axis in 0..3 {
                self.velocities[[atom, axis]] = scale * boltzmann.sample(&mut rng);
            }
        }
    }

    /// Kinetic energy of this replica's atoms.
    pub fn kinetic_energy(&self) -> f64 {
        let mut energy: f64 = 0.0;
        for atom in 0..self.n_atoms {
            let v = self.velocities.slice(s![atom, ..]);
            energy += 0.5 * self.masses[atom] * v.dot(&v);
        }
        energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn kinetic_energy_sums_over_atoms() {
        let mut replica = ReplicaData::new(
            0,
            arr1(&[2.0, 4.0]),
            Array2::zeros((2, 3)),
        );
        replica.velocities[[0, 0]] = 1.0;
        replica.velocities[[1, 2]] = 0.5;
        // 0.5 * 2 * 1 + 0.5 * 4 * 0.25
        assert_abs_diff_eq!(replica.kinetic_energy(), 1.5, epsilon = 1e-14);
    }

    #[test]
    fn thermalization_is_reproducible_per_seed() {
        let mut a = ReplicaData::new(0, arr1(&[1836.0, 1836.0]), Array2::zeros((2, 3)));
        let mut b = ReplicaData::new(0, arr1(&[1836.0, 1836.0]), Array2::zeros((2, 3)));
        a.thermalize(300.0, 42);
        b.thermalize(300.0, 42);
        assert_eq!(a.velocities, b.velocities);
        assert!(a.kinetic_energy() > 0.0);
    }

    #[test]
    fn replicas_draw_from_distinct_streams() {
        let mut a = ReplicaData::new(0, arr1(&[1836.0]), Array2::zeros((1, 3)));
        let mut b = ReplicaData::new(1, arr1(&[1836.0]), Array2::zeros((1, 3)));
        a.thermalize(300.0, 42);
        b.thermalize(300.0, 42);
        assert_ne!(a.velocities, b.velocities);
    }
}
