use crate::constants;
use crate::initialization::CavityConfiguration;
use ndarray_linalg::c64;
use std::f64::consts::PI;

/// The discrete set of cavity photon modes. Immutable after configuration.
///
/// Mode `n` carries the dispersion energy
/// `omega(n) = sqrt(omega_0^2 + c^2 (2 pi n / L)^2 / n_r^2)` and couples to a
/// molecular transition dipole with the prefactor `sqrt(omega(n) / V0)`,
/// where `V0 = omega_0 / |E|^2` normalizes the field at `k = 0`.
pub struct CavityModeSet {
    /// photon energy at k=0 (Hartree)
    pub omega0: f64,
    pub n_min: i64,
    pub n_max: i64,
    /// cavity length in Bohr
    pub length: f64,
    pub refractive_index: f64,
    /// loss term -i*gamma subtracted on the mode diagonal (Hartree); zero
    /// for a perfect cavity
    pub decay_energy: f64,
    /// unit vector of the E-field, zero when the field magnitude is zero
    unit: [f64; 3],
    /// field normalization 2*eps0*V_cav at k=0
    v0: f64,
}

impl CavityModeSet {
    pub fn new(config: &CavityConfiguration) -> CavityModeSet {
        let field_norm_sq: f64 = config.field.iter().map(|e| e * e).sum();
        // with a vanishing field the direction is undefined and every
        // coupling is zero; v0 = 1 avoids the division by zero
        let (unit, v0) = if field_norm_sq > 0.0 {
            let norm = field_norm_sq.sqrt();
            (
                [
                    config.field[0] / norm,
                    config.field[1] / norm,
                    config.field[2] / norm,
                ],
                config.photon_energy / field_norm_sq,
            )
        } else {
            ([0.0; 3], 1.0)
        };

        CavityModeSet {
            omega0: config.photon_energy,
            n_min: config.n_min,
            n_max: config.n_max,
            length: config.cavity_length * constants::MICROMETER_TO_BOHR,
            refractive_index: config.refractive_index,
            decay_energy: config.decay_rate * constants::HBAR_EV_PS / constants::HARTREE_TO_EV,
            unit,
            v0,
        }
    }

    pub fn n_modes(&self) -> usize {
        (self.n_max - self.n_min + 1) as usize
    }

    pub fn mode_indices(&self) -> impl Iterator<Item = i64> {
        self.n_min..=self.n_max
    }

    pub fn unit_vector(&self) -> [f64; 3] {
        self.unit
    }

    pub fn is_lossy(&self) -> bool {
        self.decay_energy > 0.0
    }

    /// Dispersion energy of mode `n` (Hartree).
    pub fn dispersion(&self, n: i64) -> f64 {
        let k = 2.0 * PI * n as f64 / self.length;
        (self.omega0 * self.omega0
            + constants::SPEED_OF_LIGHT_AU * constants::SPEED_OF_LIGHT_AU * k * k
                / (self.refractive_index * self.refractive_index))
            .sqrt()
    }

    /// Field amplitude factor `sqrt(omega(n) / V0)` of mode `n`.
    pub fn field_amplitude(&self, n: i64) -> f64 {
        (self.dispersion(n) / self.v0).sqrt()
    }

    /// Position-dependent mode phase for replica `m` of `nmol`. The replicas
    /// are spaced evenly along the cavity axis, so the phase reduces to
    /// `2 pi n m / nmol`.
    pub fn phase(&self, n: i64, replica: usize, nmol: usize) -> c64 {
        let arg = 2.0 * PI * n as f64 * replica as f64 / nmol as f64;
        c64::new(0.0, arg).exp()
    }

    /// Light-matter coupling of replica `m`'s transition dipole to mode `n`:
    /// `-(mu . u) sqrt(omega(n)/V0) exp(i phase)`.
    pub fn coupling(&self, n: i64, replica: usize, nmol: usize, dipole: &[f64; 3]) -> c64 {
        let projection: f64 = dipole
            .iter()
            .zip(self.unit.iter())
            .map(|(mu, u)| mu * u)
            .sum();
        -projection * self.field_amplitude(n) * self.phase(n, replica, nmol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn config() -> CavityConfiguration {
        CavityConfiguration {
            photon_energy: 0.1,
            n_min: -2,
            n_max: 2,
            cavity_length: 1.0,
            refractive_index: 1.0,
            field: [0.0, 0.0, 0.0005],
            decay_rate: 0.0,
            decoherence_rate: 0.0,
        }
    }

    #[test]
    fn dispersion_is_symmetric_in_mode_index() {
        let cavity = CavityModeSet::new(&config());
        assert_eq!(cavity.n_modes(), 5);
        assert_abs_diff_eq!(cavity.dispersion(2), cavity.dispersion(-2), epsilon = 1e-14);
        assert!(cavity.dispersion(1) > cavity.dispersion(0));
        assert_abs_diff_eq!(cavity.dispersion(0), 0.1, epsilon = 1e-14);
    }

    #[test]
    fn zero_field_gives_zero_coupling() {
        let mut cfg = config();
        cfg.field = [0.0; 3];
        let cavity = CavityModeSet::new(&cfg);
        let g = cavity.coupling(1, 0, 4, &[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(g.norm_sqr(), 0.0, epsilon = 1e-30);
    }

    #[test]
    fn coupling_phase_depends_on_replica_position() {
        let cavity = CavityModeSet::new(&config());
        let g0 = cavity.coupling(1, 0, 4, &[0.0, 0.0, 1.0]);
        let g1 = cavity.coupling(1, 1, 4, &[0.0, 0.0, 1.0]);
        // same magnitude, rotated by 2 pi / 4
        assert_abs_diff_eq!(g0.norm_sqr(), g1.norm_sqr(), epsilon = 1e-20);
        assert_abs_diff_eq!(g1.arg() - g0.arg(), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }
}
