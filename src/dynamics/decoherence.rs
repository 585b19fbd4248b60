use crate::initialization::Simulation;
use log::info;
use ndarray::prelude::*;

impl Simulation {
    /// Decoherence correction of Granucci and Persico, JCP 126, 134114
    /// (2007). The amplitudes of the inactive states decay exponentially with
    /// `tau = (1 + C / E_kin) / |E_J - E_K|`, so coherences with distant
    /// states die quickly and the transitions become irreversible. The
    /// kinetic energy is the total over all replicas; the removed population,
    /// together with whatever already leaked to the ground state, is restored
    /// onto the active amplitude. The diabatic vector is refreshed from the
    /// corrected adiabatic one afterwards.
    pub fn apply_decoherence(&mut self) {
        let ekin: f64 = self.group.sum_scalar(self.replica.kinetic_energy());
        let constant: f64 = self.config.cavity.decoherence_rate;

        let mut sum: f64 = 0.0;
        for state in 0..self.ndim {
            if state != self.state {
                let tau: f64 = (1.0 + constant / ekin)
                    / (self.basis.energies[state] - self.basis.energies[self.state]).abs();
                self.adiabatic[state] *= (-self.stepsize / tau).exp();
                sum += self.adiabatic[state].norm_sqr();
            }
        }
        // the ground-state population lost through cavity decay takes part
        // in the bookkeeping as well
        sum += self.groundstate;
        let active: f64 = self.adiabatic[self.state].norm_sqr();
        let decay: f64 = ((1.0 - sum) / active).sqrt();
        self.adiabatic[self.state] *= decay;
        info!("decoherence done, decay = {:.6}", decay);

        // capture the effect on d: d = U c on the propagator, then broadcast
        if self.roles.propagator {
            self.diabatic = self.basis.to_diabatic(self.adiabatic.view());
        }
        let owner: bool = self.roles.propagator;
        let mut diabatic = std::mem::replace(&mut self.diabatic, Array1::zeros(self.ndim));
        self.broadcast_complex(&mut diabatic, owner);
        self.diabatic = diabatic;
    }
}

#[cfg(test)]
mod tests {
    use crate::coordination::SerialGroup;
    use crate::initialization::{DynamicConfiguration, ReplicaData, Simulation};
    use crate::representation::diagonalize;
    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;
    use ndarray_linalg::c64;

    fn simulation() -> Simulation {
        let config: DynamicConfiguration = toml::from_str(
            "[hopping]\ndecoherence_correction = true\n[cavity]\ndecoherence_rate = 0.1\n",
        )
        .unwrap();
        let replica = ReplicaData::new(0, arr1(&[1836.0]), Array2::zeros((1, 3)));
        Simulation::new(config, replica, Box::new(SerialGroup)).unwrap()
    }

    #[test]
    fn decoherence_conserves_the_total_population() {
        let mut sim = simulation();
        sim.replica.velocities[[0, 0]] = 1.0e-3;
        let mut h: Array2<c64> = Array2::zeros((2, 2));
        h[[0, 0]] = c64::from(-0.2);
        h[[1, 1]] = c64::from(0.1);
        sim.basis = diagonalize(h.view()).unwrap();
        sim.state = 1;
        sim.groundstate = 0.05;
        sim.adiabatic = arr1(&[c64::from(0.3_f64.sqrt()), c64::from(0.65_f64.sqrt())]);

        sim.apply_decoherence();

        let inactive: f64 = sim.adiabatic[0].norm_sqr();
        let active: f64 = sim.adiabatic[1].norm_sqr();
        // inactive population decayed, the active amplitude absorbed it
        assert!(inactive < 0.3);
        assert_abs_diff_eq!(
            inactive + active + sim.groundstate,
            1.0,
            epsilon = 1e-12
        );
        // in the serial group d mirrors U c
        let d = sim.basis.to_diabatic(sim.adiabatic.view());
        for (a, b) in sim.diabatic.iter().zip(d.iter()) {
            assert_abs_diff_eq!((a - b).norm_sqr(), 0.0, epsilon = 1e-24);
        }
    }
}
