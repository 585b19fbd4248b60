use crate::constants;
use crate::coordination::{ProcessGroup, Roles};
use crate::error::DynamicsError;
use crate::hamiltonian::{CavityModeSet, HamiltonianPair};
use crate::initialization::restart::read_restart_parameters;
use crate::initialization::system::ReplicaData;
use crate::initialization::DynamicConfiguration;
use crate::interface::ProviderOutput;
use crate::representation::PolaritonBasis;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Struct that holds the [DynamicConfiguration] and the other necessary
/// arguments, which are required for the polariton dynamics. One instance
/// lives on each process of the group; the quantum arrays are kept identical
/// across the group by the collective reductions of each step.
pub struct Simulation {
    pub stepsize: f64,
    pub actual_time: f64,
    pub config: DynamicConfiguration,
    pub cavity: CavityModeSet,
    pub group: Box<dyn ProcessGroup>,
    pub roles: Roles,
    /// number of molecular replicas, one per process
    pub nmol: usize,
    /// nmol + number of cavity modes
    pub ndim: usize,
    pub replica: ReplicaData,
    /// last electronic-structure result for this replica
    pub electronic: ProviderOutput,
    /// active polaritonic surface
    pub state: usize,
    /// diabatic amplitude vector d, the persisted quantity
    pub diabatic: Array1<c64>,
    /// adiabatic amplitude vector c, derived from d each step
    pub adiabatic: Array1<c64>,
    /// population lost to the ground state through cavity decay
    pub groundstate: f64,
    pub hamiltonians: HamiltonianPair,
    pub basis: PolaritonBasis,
    pub previous_basis: PolaritonBasis,
    pub forces: Array2<f64>,
    pub kinetic_energy: f64,
    /// first step of this run, nonzero after a restart
    pub start_step: usize,
    hop_randoms: Vec<f64>,
}

impl Simulation {
    /// Initialize the struct [Simulation] from the configuration, this
    /// process' [ReplicaData] and the process group. Creates all required
    /// arrays, draws the hopping random sequence and initializes the
    /// velocities (or reads the restart file).
    pub fn new(
        config: DynamicConfiguration,
        mut replica: ReplicaData,
        group: Box<dyn ProcessGroup>,
    ) -> Result<Simulation, DynamicsError> {
        config.validate()?;

        let stepsize_au: f64 = config.stepsize * constants::FS_TO_AU;
        let cavity: CavityModeSet = CavityModeSet::new(&config.cavity);
        let roles: Roles = Roles::assign(group.as_ref());
        let nmol: usize = group.size();
        let ndim: usize = nmol + cavity.n_modes();

        if replica.index != roles.replica {
            return Err(DynamicsError::Config(format!(
                "replica index {} does not match group rank {}",
                replica.index, roles.replica
            )));
        }
        if config.hopping.initial_state >= ndim {
            return Err(DynamicsError::Config(format!(
                "initial state {} outside the {} polaritonic states",
                config.hopping.initial_state, ndim
            )));
        }

        // the hopping random sequence is drawn once from the configured seed;
        // every process holds the same sequence, so the stochastic hop
        // decisions agree across the group without an extra broadcast
        let mut rng: StdRng = StdRng::seed_from_u64(config.hopping.random_seed);
        let hop_randoms: Vec<f64> = (0..config.nstep + 1).map(|_| rng.gen::<f64>()).collect();

        let mut diabatic: Array1<c64> = Array1::zeros(ndim);
        let mut adiabatic: Array1<c64> = Array1::zeros(ndim);
        let mut groundstate: f64 = 0.0;
        let mut state: usize = config.hopping.initial_state;
        let mut start_step: usize = 0;

        if config.restart_flag {
            let (coordinates, velocities, coefficients, groundstate_old, state_old, step_old) =
                read_restart_parameters();
            replica.coordinates = coordinates;
            replica.velocities = velocities;
            diabatic = coefficients;
            groundstate = groundstate_old;
            state = state_old;
            start_step = step_old + 1;
        } else {
            // the initial surface fixes the adiabatic amplitudes; the
            // diabatic vector follows at step zero, once the first
            // eigenbasis exists
            adiabatic[state] = c64::from(1.0);
            replica.thermalize(config.temperature, config.hopping.random_seed);
        }

        let n_atoms: usize = replica.n_atoms;
        Ok(Simulation {
            stepsize: stepsize_au,
            actual_time: start_step as f64 * stepsize_au,
            config,
            cavity,
            group,
            roles,
            nmol,
            ndim,
            replica,
            electronic: ProviderOutput::empty(n_atoms),
            state,
            diabatic,
            adiabatic,
            groundstate,
            hamiltonians: HamiltonianPair::new(ndim),
            basis: PolaritonBasis::zeros(ndim),
            previous_basis: PolaritonBasis::zeros(ndim),
            forces: Array2::zeros((n_atoms, 3)),
            kinetic_energy: 0.0,
            start_step,
            hop_randoms,
        })
    }

    /// Random number of the fewest-switches draw for a given step. Indexed
    /// by the absolute step number, so a restarted trajectory draws the same
    /// numbers as the uninterrupted run with the same seed.
    pub fn hop_random(&self, step: usize) -> f64 {
        self.hop_randoms[step % self.hop_randoms.len()]
    }

    /// Store the electronic-structure result of this step and refresh the
    /// replica's kinetic energy.
    pub fn update_replica(&mut self, electronic: ProviderOutput) {
        self.electronic = electronic;
        self.kinetic_energy = self.replica.kinetic_energy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::SerialGroup;

    fn simulation() -> Simulation {
        let config: DynamicConfiguration = toml::from_str("").unwrap();
        let replica = ReplicaData::new(0, arr1(&[1836.0]), Array2::zeros((1, 3)));
        Simulation::new(config, replica, Box::new(SerialGroup)).unwrap()
    }

    #[test]
    fn serial_simulation_has_two_states() {
        let sim = simulation();
        // one molecule plus the single n = 0 mode
        assert_eq!(sim.ndim, 2);
        assert_eq!(sim.state, 1);
        assert_eq!(sim.adiabatic[1], c64::from(1.0));
        assert_eq!(sim.diabatic[1], c64::from(0.0));
    }

    #[test]
    fn hop_random_sequence_is_reproducible() {
        let a = simulation();
        let b = simulation();
        for step in 0..5 {
            assert_eq!(a.hop_random(step), b.hop_random(step));
            assert!((0.0..1.0).contains(&a.hop_random(step)));
        }
    }

    #[test]
    fn hop_randoms_survive_a_restart() {
        let a = simulation();
        let mut b = simulation();
        // resuming mid-trajectory must not rewind the sequence
        b.start_step = 3;
        for step in 3..8 {
            assert_eq!(a.hop_random(step), b.hop_random(step));
        }
    }

    #[test]
    fn replica_index_must_match_the_group_rank() {
        let config: DynamicConfiguration = toml::from_str("").unwrap();
        let replica = ReplicaData::new(2, arr1(&[1836.0]), Array2::zeros((1, 3)));
        assert!(matches!(
            Simulation::new(config, replica, Box::new(SerialGroup)),
            Err(DynamicsError::Config(_))
        ));
    }

    #[test]
    fn initial_state_outside_the_basis_is_rejected() {
        let config: DynamicConfiguration =
            toml::from_str("[hopping]\ninitial_state = 5\n").unwrap();
        let replica = ReplicaData::new(0, arr1(&[1836.0]), Array2::zeros((1, 3)));
        assert!(matches!(
            Simulation::new(config, replica, Box::new(SerialGroup)),
            Err(DynamicsError::Config(_))
        ));
    }
}
