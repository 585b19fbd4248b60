use crate::defaults::*;
use crate::error::DynamicsError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_nstep() -> usize {
    NSTEP
}
fn default_stepsize() -> f64 {
    STEPSIZE
}
fn default_restart_flag() -> bool {
    RESTARTFLAG
}
fn default_temperature() -> f64 {
    TEMPERATURE
}
fn default_initial_state() -> usize {
    INITIAL_STATE
}
fn default_random_seed() -> u64 {
    RANDOM_SEED
}
fn default_photon_energy() -> f64 {
    PHOTON_ENERGY
}
fn default_n_min() -> i64 {
    N_MIN
}
fn default_n_max() -> i64 {
    N_MAX
}
fn default_cavity_length() -> f64 {
    CAVITY_LENGTH
}
fn default_refractive_index() -> f64 {
    REFRACTIVE_INDEX
}
fn default_field() -> [f64; 3] {
    FIELD
}
fn default_decay_rate() -> f64 {
    DECAY_RATE
}
fn default_decoherence_rate() -> f64 {
    DECOHERENCE_RATE
}
fn default_decoherence_correction() -> bool {
    DECOHERENCE_CORRECTION
}
fn default_hop_method() -> HopMethod {
    HopMethod::LocalDiabatization
}
fn default_representation() -> Representation {
    Representation::Hybrid
}
fn default_print_restart() -> bool {
    PRINT_RESTART
}
fn default_print_coefficients() -> bool {
    PRINT_COEFFICIENTS
}
fn default_print_eigenvectors() -> bool {
    PRINT_EIGENVECTORS
}
fn default_print_state() -> bool {
    PRINT_STATE
}
fn default_print_energies() -> bool {
    PRINT_ENERGIES
}
fn default_cavity_config() -> CavityConfiguration {
    toml::from_str("").unwrap()
}
fn default_hopping_config() -> HoppingConfiguration {
    toml::from_str("").unwrap()
}
fn default_print_config() -> PrintConfiguration {
    toml::from_str("").unwrap()
}

/// The surface-selection algorithm.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum HopMethod {
    /// fewest switches in the locally diabatized basis (Granucci)
    LocalDiabatization,
    /// fewest switches from finite-difference couplings (Tully)
    Tully,
    /// deterministic maximum-population selection
    Mash,
    /// mean field, no discrete hops
    Ehrenfest,
}

impl HopMethod {
    pub fn is_stochastic(&self) -> bool {
        matches!(self, HopMethod::LocalDiabatization | HopMethod::Tully)
    }
}

/// Representation in which the wavefunction is propagated.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    Adiabatic,
    Diabatic,
    DiabaticLossy,
    Hybrid,
    HybridLossy,
}

impl Representation {
    pub fn is_lossy(&self) -> bool {
        matches!(
            self,
            Representation::DiabaticLossy | Representation::HybridLossy
        )
    }

    /// Whether the diabatic amplitude vector is the propagated quantity.
    pub fn propagates_diabatic(&self) -> bool {
        !matches!(self, Representation::Adiabatic)
    }
}

/// Cavity and light-matter coupling parameters, immutable after startup.
#[derive(Serialize, Deserialize, Clone)]
pub struct CavityConfiguration {
    /// photon energy at k=0 in Hartree
    #[serde(default = "default_photon_energy")]
    pub photon_energy: f64,
    #[serde(default = "default_n_min")]
    pub n_min: i64,
    #[serde(default = "default_n_max")]
    pub n_max: i64,
    /// cavity length in micrometer
    #[serde(default = "default_cavity_length")]
    pub cavity_length: f64,
    #[serde(default = "default_refractive_index")]
    pub refractive_index: f64,
    /// E-field vector at k=0 in atomic units
    #[serde(default = "default_field")]
    pub field: [f64; 3],
    /// cavity decay rate in 1/ps
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    /// decoherence parameter C in Hartree
    #[serde(default = "default_decoherence_rate")]
    pub decoherence_rate: f64,
}

/// Parameters of the surface-hopping procedure.
#[derive(Serialize, Deserialize, Clone)]
pub struct HoppingConfiguration {
    #[serde(default = "default_hop_method")]
    pub method: HopMethod,
    #[serde(default = "default_representation")]
    pub representation: Representation,
    #[serde(default = "default_initial_state")]
    pub initial_state: usize,
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    #[serde(default = "default_decoherence_correction")]
    pub decoherence_correction: bool,
}

/// Controls the per-step output files.
#[derive(Serialize, Deserialize, Clone)]
pub struct PrintConfiguration {
    #[serde(default = "default_print_restart")]
    pub print_restart: bool,
    #[serde(default = "default_print_coefficients")]
    pub print_coefficients: bool,
    #[serde(default = "default_print_eigenvectors")]
    pub print_eigenvectors: bool,
    #[serde(default = "default_print_state")]
    pub print_state: bool,
    #[serde(default = "default_print_energies")]
    pub print_energies: bool,
}

/// Struct that loads the configuration of the dynamics from the file
/// "polariton.toml". Missing entries fall back to the defaults and the
/// completed file is written back to the working directory.
#[derive(Serialize, Deserialize, Clone)]
pub struct DynamicConfiguration {
    #[serde(default = "default_nstep")]
    pub nstep: usize,
    /// nuclear stepsize in fs
    #[serde(default = "default_stepsize")]
    pub stepsize: f64,
    #[serde(default = "default_restart_flag")]
    pub restart_flag: bool,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_cavity_config")]
    pub cavity: CavityConfiguration,
    #[serde(default = "default_hopping_config")]
    pub hopping: HoppingConfiguration,
    #[serde(default = "default_print_config")]
    pub print: PrintConfiguration,
}

impl DynamicConfiguration {
    pub fn new() -> Self {
        let config_file_path: &Path = Path::new(CONFIG_FILE_NAME);
        let config_string: String = if config_file_path.exists() {
            fs::read_to_string(config_file_path).expect("Unable to read config file")
        } else {
            String::from("")
        };
        let config: Self = toml::from_str(&config_string).unwrap();
        if !config_file_path.exists() {
            let config_string = toml::to_string(&config).unwrap();
            fs::write(config_file_path, config_string).expect("Unable to write config file");
        }
        config
    }

    /// Reject inconsistent algorithm combinations before the first step.
    pub fn validate(&self) -> Result<(), DynamicsError> {
        if self.cavity.n_max < self.cavity.n_min {
            return Err(DynamicsError::Config(format!(
                "empty cavity mode range [{}, {}]",
                self.cavity.n_min, self.cavity.n_max
            )));
        }
        if self.hopping.representation.is_lossy() && self.cavity.decay_rate <= 0.0 {
            return Err(DynamicsError::Config(
                "a lossy representation requires decay_rate > 0".into(),
            ));
        }
        if self.hopping.method == HopMethod::Tully && self.hopping.representation.is_lossy() {
            return Err(DynamicsError::Config(
                "Tully surface hopping requires a norm-conserving representation".into(),
            ));
        }
        if self.hopping.method == HopMethod::Ehrenfest && self.hopping.decoherence_correction {
            return Err(DynamicsError::Config(
                "decoherence correction is incompatible with Ehrenfest dynamics".into(),
            ));
        }
        if !self.hopping.method.is_stochastic()
            && self.hopping.method != HopMethod::Ehrenfest
            && self.hopping.decoherence_correction
        {
            return Err(DynamicsError::Config(
                "decoherence correction applies to stochastic hopping only".into(),
            ));
        }
        Ok(())
    }
}

impl Default for DynamicConfiguration {
    fn default() -> Self {
        toml::from_str("").unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: DynamicConfiguration = toml::from_str("").unwrap();
        assert_eq!(config.nstep, NSTEP);
        assert_eq!(config.hopping.method, HopMethod::LocalDiabatization);
        assert_eq!(config.hopping.representation, Representation::Hybrid);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn method_names_are_snake_case() {
        let config: DynamicConfiguration = toml::from_str(
            "[hopping]\nmethod = \"tully\"\nrepresentation = \"adiabatic\"\n",
        )
        .unwrap();
        assert_eq!(config.hopping.method, HopMethod::Tully);
        assert_eq!(config.hopping.representation, Representation::Adiabatic);
    }

    #[test]
    fn lossy_representation_without_decay_is_rejected() {
        let config: DynamicConfiguration =
            toml::from_str("[hopping]\nrepresentation = \"hybrid_lossy\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(DynamicsError::Config(_))
        ));
    }

    #[test]
    fn ehrenfest_with_decoherence_is_rejected() {
        let config: DynamicConfiguration = toml::from_str(
            "[hopping]\nmethod = \"ehrenfest\"\ndecoherence_correction = true\n",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(DynamicsError::Config(_))));
    }

    #[test]
    fn tully_in_lossy_representation_is_rejected() {
        let config: DynamicConfiguration = toml::from_str(
            "[cavity]\ndecay_rate = 1.0\n[hopping]\nmethod = \"tully\"\nrepresentation = \"diabatic_lossy\"\n",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(DynamicsError::Config(_))));
    }
}
