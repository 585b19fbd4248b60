//! Physical constants and unit conversions. All internal quantities are kept
//! in Hartree atomic units; the conversions below handle the user-facing
//! units of the configuration file.

/// femtoseconds to atomic time units
pub const FS_TO_AU: f64 = 41.3413745758;
/// Hartree to electron volt
pub const HARTREE_TO_EV: f64 = 27.2114;
/// speed of light in atomic units
pub const SPEED_OF_LIGHT_AU: f64 = 137.035999;
/// micrometer to Bohr
pub const MICROMETER_TO_BOHR: f64 = 1.8897259886e4;
/// Bohr to Angstrom
pub const BOHR_TO_ANGS: f64 = 0.52917721092;
/// Boltzmann constant in Hartree/K
pub const K_BOLTZMANN: f64 = 3.166811563e-6;
/// hbar in eV*ps, used to convert a decay rate in 1/ps to an energy
pub const HBAR_EV_PS: f64 = 6.582119569e-4;
