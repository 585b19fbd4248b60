use crate::constants;
use crate::defaults;
use crate::dynamics::StepReport;
use crate::initialization::Simulation;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Struct that stores the parameters, which are necessary to restart the
/// dynamics simulation. The amplitudes are stored in the diabatic basis, the
/// only representation that survives between runs.
#[derive(Serialize, Deserialize, Clone)]
pub struct RestartOutput {
    pub n_atoms: usize,
    pub coordinates: Array2<f64>,
    pub velocities: Array2<f64>,
    pub coefficients: Array1<c64>,
    pub groundstate: f64,
    pub state: usize,
    pub step: usize,
}

impl RestartOutput {
    pub fn new(
        n_atoms: usize,
        coordinates: ArrayView2<f64>,
        velocities: ArrayView2<f64>,
        coefficients: ArrayView1<c64>,
        groundstate: f64,
        state: usize,
        step: usize,
    ) -> RestartOutput {
        RestartOutput {
            n_atoms,
            coordinates: coordinates.to_owned(),
            velocities: velocities.to_owned(),
            coefficients: coefficients.to_owned(),
            groundstate,
            state,
            step,
        }
    }
}

/// Per-step population record written to "coefficients.dat".
#[derive(Serialize, Deserialize, Clone)]
pub struct CoefficientOutput {
    pub time: f64,
    pub coefficients_real: Array1<f64>,
    pub coefficients_imag: Array1<f64>,
    pub populations: Array1<f64>,
    pub groundstate: f64,
}

impl CoefficientOutput {
    pub fn new(time: f64, coefficients: ArrayView1<c64>, groundstate: f64) -> CoefficientOutput {
        let time: f64 = time / constants::FS_TO_AU;
        let coefficients_real: Vec<f64> = coefficients.iter().map(|val| val.re).collect();
        let coefficients_imag: Vec<f64> = coefficients.iter().map(|val| val.im).collect();
        let populations: Vec<f64> = coefficients.iter().map(|val| val.norm_sqr()).collect();
        CoefficientOutput {
            time,
            coefficients_real: Array::from(coefficients_real),
            coefficients_imag: Array::from(coefficients_imag),
            populations: Array::from(populations),
            groundstate,
        }
    }
}

/// Per-step energy record written to "energies.dat".
#[derive(Serialize, Deserialize, Clone)]
pub struct EnergyOutput {
    pub time: f64,
    pub kinetic_energy: f64,
    pub electronic_energy: f64,
    pub total_energy: f64,
    pub eigenvalues: Array1<f64>,
}

impl EnergyOutput {
    pub fn new(
        time: f64,
        kinetic_energy: f64,
        electronic_energy: f64,
        eigenvalues: ArrayView1<f64>,
    ) -> EnergyOutput {
        let time: f64 = time / constants::FS_TO_AU;
        EnergyOutput {
            time,
            kinetic_energy,
            electronic_energy,
            total_energy: kinetic_energy + electronic_energy,
            eigenvalues: eigenvalues.to_owned(),
        }
    }
}

/// Per-step polaritonic eigenvector record written to "eigenvectors.dat".
#[derive(Serialize, Deserialize, Clone)]
pub struct EigenvectorOutput {
    pub time: f64,
    pub vectors_real: Array2<f64>,
    pub vectors_imag: Array2<f64>,
}

impl EigenvectorOutput {
    pub fn new(time: f64, vectors: ArrayView2<c64>) -> EigenvectorOutput {
        let time: f64 = time / constants::FS_TO_AU;
        EigenvectorOutput {
            time,
            vectors_real: vectors.mapv(|val| val.re),
            vectors_imag: vectors.mapv(|val| val.im),
        }
    }
}

fn append_or_create(file_path: &Path, content: &str, first_call: bool) {
    if file_path.exists() {
        let file = if first_call {
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(file_path)
                .unwrap()
        } else {
            OpenOptions::new().append(true).open(file_path).unwrap()
        };
        let mut stream = BufWriter::new(file);
        stream.write_fmt(format_args!("{}", content)).unwrap();
        stream.flush().unwrap();
    } else {
        fs::write(file_path, content)
            .unwrap_or_else(|_| panic!("Unable to write to {}", file_path.display()));
    }
}

/// Write the restart parameters from the struct [RestartOutput] to the file
/// "polariton_restart.out" in the yaml file format. Overwritten every step,
/// only the last completed step can be resumed.
pub fn write_restart(restart: &RestartOutput) {
    let file_path: &Path = Path::new(defaults::RESTART_FILE_NAME);
    let restart: String = serde_yaml::to_string(restart).unwrap();
    fs::write(file_path, restart).expect("Unable to write restart file");
}

/// Append the struct [CoefficientOutput] to the file "coefficients.dat".
pub fn write_coefficients(coefficients: &CoefficientOutput, first_call: bool) {
    let mut string: String = String::from("#############################\n");
    string.push_str(&toml::to_string(coefficients).unwrap());
    append_or_create(Path::new("coefficients.dat"), &string, first_call);
}

/// Append the struct [EnergyOutput] to the file "energies.dat".
pub fn write_energies(energies: &EnergyOutput, first_call: bool) {
    let mut string: String = String::from("#############################\n");
    string.push_str(&toml::to_string(energies).unwrap());
    append_or_create(Path::new("energies.dat"), &string, first_call);
}

/// Append the struct [EigenvectorOutput] to the file "eigenvectors.dat" in
/// the yaml file format.
pub fn write_eigenvectors(vectors: &EigenvectorOutput, first_call: bool) {
    let string: String = serde_yaml::to_string(vectors).unwrap();
    append_or_create(Path::new("eigenvectors.dat"), &string, first_call);
}

/// Append the active state of this step to the file "state.dat".
pub fn write_state(time: f64, state: usize, first_call: bool) {
    let string: String = format!("{:>12.4} {:>4}\n", time / constants::FS_TO_AU, state);
    append_or_create(Path::new("state.dat"), &string, first_call);
}

/// Write the per-step output files selected in the print configuration.
/// Called on the diagonalizer role only, so each file has a single writer.
pub fn write_step_files(sim: &Simulation, report: &StepReport) {
    let first_call: bool = report.step == sim.start_step && !sim.config.restart_flag;
    if sim.config.print.print_restart {
        let restart: RestartOutput = RestartOutput::new(
            sim.replica.n_atoms,
            sim.replica.coordinates.view(),
            sim.replica.velocities.view(),
            sim.diabatic.view(),
            sim.groundstate,
            sim.state,
            report.step,
        );
        write_restart(&restart);
    }
    if sim.config.print.print_coefficients {
        let coefficients: CoefficientOutput =
            CoefficientOutput::new(report.time, sim.diabatic.view(), sim.groundstate);
        write_coefficients(&coefficients, first_call);
    }
    if sim.config.print.print_energies {
        let energies: EnergyOutput = EnergyOutput::new(
            report.time,
            report.kinetic_energy,
            report.energy,
            sim.basis.energies.view(),
        );
        write_energies(&energies, first_call);
    }
    if sim.config.print.print_eigenvectors {
        let vectors: EigenvectorOutput =
            EigenvectorOutput::new(report.time, sim.basis.vectors.view());
        write_eigenvectors(&vectors, first_call);
    }
    if sim.config.print.print_state {
        write_state(report.time, report.state, first_call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_record_round_trips_through_yaml() {
        let restart = RestartOutput::new(
            2,
            Array2::zeros((2, 3)).view(),
            Array2::ones((2, 3)).view(),
            arr1(&[c64::new(0.6, 0.0), c64::new(0.0, 0.8)]).view(),
            0.05,
            1,
            17,
        );
        let string: String = serde_yaml::to_string(&restart).unwrap();
        let back: RestartOutput = serde_yaml::from_str(&string).unwrap();
        assert_eq!(back.state, 1);
        assert_eq!(back.step, 17);
        assert_eq!(back.coefficients, restart.coefficients);
        assert_eq!(back.velocities, restart.velocities);
    }

    #[test]
    fn coefficient_record_carries_the_populations() {
        let c = arr1(&[c64::new(0.6, 0.0), c64::new(0.0, 0.8)]);
        let out = CoefficientOutput::new(0.0, c.view(), 0.0);
        assert!((out.populations[0] - 0.36).abs() < 1e-14);
        assert!((out.populations[1] - 0.64).abs() < 1e-14);
    }
}
