use crate::initialization::Simulation;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use rayon::prelude::*;

impl Simulation {
    /// Gradient of the dipole projection onto the field direction,
    /// `sum_k u_k * grad(mu_k)`, per atom.
    pub(crate) fn projected_dipole_gradient(&self) -> Array2<f64> {
        let u: [f64; 3] = self.cavity.unit_vector();
        &(&self.electronic.dipole_gradient[0] * u[0])
            + &(&self.electronic.dipole_gradient[1] * u[1]
                + &self.electronic.dipole_gradient[2] * u[2])
    }

    /// Forces on this replica's atoms while the trajectory runs on the single
    /// active polaritonic surface `p`: the excitonic weight mixes the
    /// excited- and ground-state gradients, the light-matter weight pulls on
    /// the transition-dipole gradient. Self-contained per replica, no
    /// reduction needed. Returns the potential energy of the active surface.
    pub fn active_state_forces(&mut self) -> f64 {
        let m: usize = self.roles.replica;
        let p: usize = self.state;

        let betasq: f64 = self.basis.vectors[[m, p]].norm_sqr();
        let cross: f64 =
            2.0 * (self.basis.vectors[[m, p]].conj() * self.photon_weight(p)).re;

        let gradient: Array2<f64> = &(&self.electronic.excited_gradient * betasq)
            + &(&self.electronic.ground_gradient * (1.0 - betasq)
                - &(self.projected_dipole_gradient() * cross));
        self.forces = -gradient;
        self.basis.energies[p]
    }

    /// Ehrenfest mean-field forces: all surfaces weighted with their
    /// populations, plus the coherence terms between every state pair. With
    /// cavity losses the weights are normalized by the surviving norm, so the
    /// remaining wavepacket keeps steering the nuclei. The photonic weight is
    /// evaluated per state pair. Returns the population-weighted energy.
    pub fn ehrenfest_forces(&mut self) -> f64 {
        let m: usize = self.roles.replica;
        let ndim: usize = self.ndim;
        let totpop: f64 = self.adiabatic.iter().map(|v| v.norm_sqr()).sum();

        let gradient_gap: Array2<f64> =
            &self.electronic.excited_gradient - &self.electronic.ground_gradient;
        let dipole: Array2<f64> = self.projected_dipole_gradient();

        let energy: f64 = (0..ndim)
            .map(|p| self.adiabatic[p].norm_sqr() * self.basis.energies[p])
            .sum::<f64>()
            / totpop;

        let zeros: Array2<f64> = Array2::zeros(self.forces.raw_dim());
        let gradient: Array2<f64> = (0..ndim)
            .into_par_iter()
            .map(|p| {
                let c_p: c64 = self.adiabatic[p];
                let beta_p: c64 = self.basis.vectors[[m, p]];
                let a_p: c64 = self.photon_weight(p);

                // diagonal term of state p
                let betasq: f64 = beta_p.norm_sqr();
                let cross: f64 = 2.0 * (beta_p.conj() * a_p).re;
                let weight: f64 = c_p.norm_sqr() / totpop;
                let mut local: Array2<f64> = (&(&self.electronic.excited_gradient * betasq)
                    + &(&self.electronic.ground_gradient * (1.0 - betasq)
                        - &(&dipole * cross)))
                    * weight;

                // coherences with all higher states
                for q in p + 1..ndim {
                    let cpcq: c64 = c_p.conj() * self.adiabatic[q];
                    let beta_q: c64 = self.basis.vectors[[m, q]];
                    let a_q: c64 = self.photon_weight(q);
                    let betasq_pq: c64 = beta_p.conj() * beta_q;
                    let coupling: c64 = beta_p.conj() * a_q + a_p.conj() * beta_q;

                    let diag_weight: f64 = 2.0 * (cpcq * betasq_pq).re / totpop;
                    let cross_weight: f64 = 2.0 * (cpcq * coupling).re / totpop;
                    local = local + &(&gradient_gap * diag_weight) - &(&dipole * cross_weight);
                }
                local
            })
            .reduce(|| zeros.clone(), |acc, item| acc + item);

        self.forces = -gradient;
        energy
    }
}

#[cfg(test)]
mod tests {
    use crate::coordination::SerialGroup;
    use crate::initialization::{DynamicConfiguration, ReplicaData, Simulation};
    use crate::interface::ProviderOutput;
    use crate::representation::PolaritonBasis;
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;
    use ndarray_linalg::c64;

    fn simulation(config: &str) -> Simulation {
        let config: DynamicConfiguration = toml::from_str(config).unwrap();
        let replica = ReplicaData::new(0, arr1(&[1836.0]), Array2::zeros((1, 3)));
        Simulation::new(config, replica, Box::new(SerialGroup)).unwrap()
    }

    fn electronic() -> ProviderOutput {
        let mut out = ProviderOutput::empty(1);
        out.ground_gradient[[0, 2]] = 0.1;
        out.excited_gradient[[0, 2]] = 0.4;
        out
    }

    #[test]
    fn pure_excitonic_state_feels_the_excited_gradient() {
        let mut sim = simulation("");
        sim.update_replica(electronic());
        // identity eigenvectors, molecular state first
        sim.basis = PolaritonBasis {
            energies: arr1(&[-0.1, 0.1]),
            vectors: Array2::<f64>::eye(2).mapv(c64::from),
        };
        sim.state = 0;
        let energy = sim.active_state_forces();
        assert_abs_diff_eq!(energy, -0.1, epsilon = 1e-14);
        assert_abs_diff_eq!(sim.forces[[0, 2]], -0.4, epsilon = 1e-14);
    }

    #[test]
    fn pure_photonic_state_feels_the_ground_gradient() {
        let mut sim = simulation("");
        sim.update_replica(electronic());
        sim.basis = PolaritonBasis {
            energies: arr1(&[-0.1, 0.1]),
            vectors: Array2::<f64>::eye(2).mapv(c64::from),
        };
        sim.state = 1;
        sim.active_state_forces();
        assert_abs_diff_eq!(sim.forces[[0, 2]], -0.1, epsilon = 1e-14);
    }

    #[test]
    fn ehrenfest_interpolates_between_the_surfaces() {
        let mut sim = simulation("[hopping]\nmethod = \"ehrenfest\"\n");
        sim.update_replica(electronic());
        sim.basis = PolaritonBasis {
            energies: arr1(&[-0.1, 0.1]),
            vectors: Array2::<f64>::eye(2).mapv(c64::from),
        };
        sim.adiabatic = arr1(&[c64::from(0.5_f64.sqrt()), c64::from(0.5_f64.sqrt())]);
        let energy = sim.ehrenfest_forces();
        assert_abs_diff_eq!(energy, 0.0, epsilon = 1e-14);
        // equal weights of -0.4 and -0.1; the coherence term vanishes
        // because the diagonal eigenvectors do not overlap
        assert_abs_diff_eq!(sim.forces[[0, 2]], -0.25, epsilon = 1e-14);
    }

    #[test]
    fn lossy_weights_are_normalized_by_the_surviving_norm() {
        let mut sim = simulation("[hopping]\nmethod = \"ehrenfest\"\n");
        sim.update_replica(electronic());
        sim.basis = PolaritonBasis {
            energies: arr1(&[-0.1, 0.1]),
            vectors: Array2::<f64>::eye(2).mapv(c64::from),
        };
        // half the population already decayed away
        sim.adiabatic = arr1(&[c64::from(0.25_f64.sqrt()), c64::from(0.25_f64.sqrt())]);
        sim.ehrenfest_forces();
        assert_abs_diff_eq!(sim.forces[[0, 2]], -0.25, epsilon = 1e-14);
    }
}
