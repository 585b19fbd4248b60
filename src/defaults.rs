// config file
pub const CONFIG_FILE_NAME: &str = "polariton.toml";
// restart file
pub const RESTART_FILE_NAME: &str = "polariton_restart.out";
// number of nuclear steps
pub const NSTEP: usize = 1000;
// nuclear stepsize in fs
pub const STEPSIZE: f64 = 0.1;
// new trajectory or restart from polariton_restart.out
pub const RESTARTFLAG: bool = false;
// temperature (K) for the initial Boltzmann velocities
pub const TEMPERATURE: f64 = 300.0;
// initial adiabatic state
pub const INITIAL_STATE: usize = 1;
// seed of the per-run hopping random sequence
pub const RANDOM_SEED: u64 = 42;
// cavity photon energy at k=0 in Hartree
pub const PHOTON_ENERGY: f64 = 0.1;
// range of the cavity mode index
pub const N_MIN: i64 = 0;
pub const N_MAX: i64 = 0;
// cavity length in micrometer
pub const CAVITY_LENGTH: f64 = 1.0;
pub const REFRACTIVE_INDEX: f64 = 1.0;
// E-field vector at k=0 (a.u.)
pub const FIELD: [f64; 3] = [0.0, 0.0, 0.0005];
// cavity decay rate in 1/ps, 0.0 disables the loss term
pub const DECAY_RATE: f64 = 0.0;
// decoherence parameter C in Hartree, the recommended value of
// eqn. (17) in JCP 126, 134114 (2007)
pub const DECOHERENCE_RATE: f64 = 0.1;
pub const DECOHERENCE_CORRECTION: bool = false;
// print settings
pub const PRINT_RESTART: bool = true;
pub const PRINT_COEFFICIENTS: bool = true;
pub const PRINT_EIGENVECTORS: bool = false;
pub const PRINT_STATE: bool = true;
pub const PRINT_ENERGIES: bool = true;
