use crate::constants;
use crate::dynamics::{HopOutcome, StepReport};
use log::warn;

/// Logger of the host process. Warn level by default, so the step banners
/// show without RUST_LOG set.
pub fn init_logger() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    pretty_env_logger::init();
}

pub fn print_step_header(step: usize) {
    warn!("{:^90}", "");
    warn!("{: ^90}", format!("Polariton Dynamics Step {}", step));
    warn!("{:-^90}", "");
}

pub fn print_step_summary(report: &StepReport) {
    warn!(
        "{:>25} {:>14.4} fs",
        "time:",
        report.time / constants::FS_TO_AU
    );
    warn!("{:>25} {:>14}", "active state:", report.state);
    warn!("{:>25} {:>14.8} H", "electronic energy:", report.energy);
    warn!(
        "{:>25} {:>14.8} H",
        "kinetic energy:", report.kinetic_energy
    );
    warn!("{:>25} {:>14.8}", "ground state share:", report.groundstate);
    match report.hop {
        HopOutcome::None => {}
        HopOutcome::Accepted { from, to } => {
            warn!("{:>25} {} -> {}", "surface hop:", from, to);
        }
        HopOutcome::Frustrated { from, to } => {
            warn!("{:>25} {} -> {} (frustrated)", "surface hop:", from, to);
        }
    }
    warn!("{:-<90} ", "");
}
