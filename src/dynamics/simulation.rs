use crate::dynamics::hopping::{mash_target, select_by_cumulative, HopProposal};
use crate::dynamics::rescaling::hop_feasibility;
use crate::error::DynamicsError;
use crate::hamiltonian::{add_mode_dispersion, assemble, SiteContribution};
use crate::initialization::{HopMethod, Simulation};
use crate::interface::ElectronicStructure;
use crate::output;
use crate::representation::{diagonalize, PolaritonBasis};
use log::{info, warn};
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Outcome of the surface-selection stage of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopOutcome {
    /// the trajectory stays on its surface
    None,
    Accepted { from: usize, to: usize },
    /// a switch was proposed, but the group lacks the kinetic energy along
    /// the coupling direction
    Frustrated { from: usize, to: usize },
}

/// Per-step diagnostics handed back to the caller and to the output writers.
pub struct StepReport {
    pub step: usize,
    pub time: f64,
    pub state: usize,
    pub energy: f64,
    pub kinetic_energy: f64,
    pub populations: Array1<f64>,
    pub groundstate: f64,
    pub hop: HopOutcome,
}

impl Simulation {
    /// Advance the quantum subsystem by one MD timestep: refresh the coupled
    /// Hamiltonian from this step's electronic structure, diagonalize and
    /// track the polaritonic basis, propagate the amplitudes, select the
    /// active surface and compute the forces the nuclei feel. The host
    /// integrator moves the nuclei between calls.
    pub fn propagate_step(
        &mut self,
        provider: &mut dyn ElectronicStructure,
        step: usize,
    ) -> Result<StepReport, DynamicsError> {
        output::print_step_header(step);
        let electronic = provider.compute(self.replica.coordinates.view(), self.state, step)?;
        self.update_replica(electronic);

        self.assemble_hamiltonian();
        // until the ring buffer holds two consecutive matrices there is
        // nothing to propagate; this is the first step of a fresh run and of
        // a restart alike
        let first: bool = !self.hamiltonians.primed();
        self.refresh_basis()?;

        let trivial: Option<usize> = if first { None } else { self.track_active_state() };
        if let Some(to) = trivial {
            warn!(
                "trivial crossing: state {} continues as state {}",
                self.state, to
            );
        }

        let c_old: Array1<c64> = self.adiabatic.clone();
        let u_hop: Array2<c64> = self.advance_amplitudes(first)?;

        let proposal: Option<HopProposal> = if first {
            None
        } else {
            self.select_surface(step, c_old.view(), u_hop.view(), trivial)
        };
        let hop: HopOutcome = match proposal {
            Some(proposal) => self.attempt_hop(proposal),
            None => HopOutcome::None,
        };

        // population bookkeeping; without losses the norm stays at one and
        // the ground-state share vanishes
        let totpop: f64 = self.adiabatic.iter().map(|v| v.norm_sqr()).sum();
        self.groundstate = 1.0 - totpop;

        let energy: f64 = match self.config.hopping.method {
            HopMethod::Ehrenfest => self.ehrenfest_forces(),
            _ => self.active_state_forces(),
        };

        if self.config.hopping.decoherence_correction
            && self.config.hopping.method.is_stochastic()
            && self.config.cavity.decoherence_rate > 0.0
        {
            self.apply_decoherence();
        }

        let report = StepReport {
            step,
            time: self.actual_time,
            state: self.state,
            energy,
            kinetic_energy: self.kinetic_energy,
            populations: self.adiabatic.mapv(|v| v.norm_sqr()),
            groundstate: self.groundstate,
            hop,
        };
        self.actual_time += self.stepsize;

        if self.roles.diagonalizer {
            output::write_step_files(self, &report);
        }
        output::print_step_summary(&report);
        Ok(report)
    }

    /// Merge everyone's diagonal and coupling contributions by collective
    /// summation, add the mode dispersion and rotate the two-step buffer.
    fn assemble_hamiltonian(&mut self) {
        let contribution = SiteContribution::new(
            self.roles.replica,
            self.nmol,
            &self.electronic,
            &self.cavity,
        );
        let mut energies: Array1<f64> = contribution.energies;
        let mut couplings: Array2<c64> = contribution.couplings;
        self.reduce_real(&mut energies);
        self.reduce_complex_matrix(&mut couplings);
        add_mode_dispersion(&mut energies, &self.cavity, self.nmol);
        let h: Array2<c64> = assemble(energies.view(), couplings.view(), self.nmol);
        self.hamiltonians.advance(h);
    }

    /// The diagonalizer role solves the eigenproblem; everyone else receives
    /// the basis through the zero-padded summation. The outgoing basis
    /// becomes the previous one.
    fn refresh_basis(&mut self) -> Result<(), DynamicsError> {
        let owner: bool = self.roles.diagonalizer;
        let mut fresh: PolaritonBasis = if owner {
            diagonalize(self.hamiltonians.current.view())?
        } else {
            PolaritonBasis::zeros(self.ndim)
        };
        self.broadcast_real(&mut fresh.energies, owner);
        self.broadcast_matrix(&mut fresh.vectors, owner);
        self.previous_basis = std::mem::replace(&mut self.basis, fresh);
        Ok(())
    }

    /// Propagate the amplitude vectors by one step on the propagator role and
    /// distribute the result. Returns the one-step propagator in the
    /// adiabatic basis (meaningful on the propagator role only), which feeds
    /// the hop probabilities.
    fn advance_amplitudes(&mut self, first: bool) -> Result<Array2<c64>, DynamicsError> {
        let propagator: bool = self.roles.propagator;
        let mut u_hop: Array2<c64> = Array2::zeros((self.ndim, self.ndim));

        if first {
            // every member holds the same user-supplied amplitudes and the
            // same broadcast basis, so the reconciliation is deterministic
            self.reconcile_initial();
            return Ok(u_hop);
        }

        if self.config.hopping.representation.propagates_diabatic() {
            if propagator {
                let exp_h: Array2<c64> = self.diabatic_propagator()?;
                self.diabatic = exp_h.dot(&self.diabatic);
                // the same evolution expressed between the two eigenbases
                u_hop = self
                    .basis
                    .adjoint()
                    .dot(&exp_h)
                    .dot(&self.previous_basis.vectors);
                self.adiabatic = u_hop.dot(&self.adiabatic);
            }
        } else if propagator {
            let (c_new, u) = self.local_diabatization()?;
            self.adiabatic = c_new;
            self.diabatic = self.basis.to_diabatic(self.adiabatic.view());
            u_hop = u;
        }

        let mut diabatic = std::mem::replace(&mut self.diabatic, Array1::zeros(self.ndim));
        self.broadcast_complex(&mut diabatic, propagator);
        self.diabatic = diabatic;
        let mut adiabatic = std::mem::replace(&mut self.adiabatic, Array1::zeros(self.ndim));
        self.broadcast_complex(&mut adiabatic, propagator);
        self.adiabatic = adiabatic;
        Ok(u_hop)
    }

    /// Pick the candidate surface for this step on the propagator role and
    /// distribute the decision. Trivial crossings bypass the stochastic draw.
    fn select_surface(
        &self,
        step: usize,
        c_old: ArrayView1<c64>,
        u_hop: ArrayView2<c64>,
        trivial: Option<usize>,
    ) -> Option<HopProposal> {
        if self.config.hopping.method == HopMethod::Ehrenfest {
            return None;
        }

        let propagator: bool = self.roles.propagator;
        let mut target: usize = 0;
        let mut forced: usize = 0;
        let mut probability: f64 = 0.0;
        if propagator {
            target = match self.config.hopping.method {
                HopMethod::Mash => mash_target(self.adiabatic.view()),
                HopMethod::LocalDiabatization | HopMethod::Tully => {
                    if let Some(to) = trivial {
                        forced = 1;
                        to
                    } else {
                        let p: Array1<f64> =
                            if self.config.hopping.method == HopMethod::Tully {
                                self.tully_probabilities()
                            } else {
                                self.granucci_probabilities(c_old, u_hop)
                            };
                        let to = select_by_cumulative(self.state, p.view(), self.hop_random(step));
                        probability = p[to];
                        to
                    }
                }
                HopMethod::Ehrenfest => unreachable!(),
            };
        }
        let target: usize = self.group.sum_count(target);
        let forced: bool = self.group.sum_count(forced) > 0;
        let probability: f64 = self.group.sum_scalar(probability);

        (target != self.state).then(|| HopProposal {
            from: self.state,
            to: target,
            probability,
            energy_gap: self.basis.energies[target] - self.basis.energies[self.state],
            forced,
        })
    }

    /// Check the energy feasibility of a proposed switch across the whole
    /// group and commit it only when every member agrees. The velocities are
    /// adjusted either way: an accepted hop absorbs the gap along the
    /// coupling vector, a frustrated one reverses the velocity component
    /// along it.
    fn attempt_hop(&mut self, proposal: HopProposal) -> HopOutcome {
        info!(
            "hop proposed from {} to {} (gap {:.6} Hartree, p = {:.4}{})",
            proposal.from,
            proposal.to,
            proposal.energy_gap,
            proposal.probability,
            if proposal.forced { ", forced" } else { "" },
        );
        let nac: Array2<f64> = self.nac_vector(proposal.from, proposal.to);
        let (a, b) = self.kinetic_terms(nac.view());
        let (allowed, g) = hop_feasibility(a, b, proposal.energy_gap);
        let votes: usize = self.group.sum_count(allowed as usize);

        let outcome: HopOutcome = if votes == self.nmol {
            self.state = proposal.to;
            HopOutcome::Accepted {
                from: proposal.from,
                to: proposal.to,
            }
        } else {
            warn!("insufficient kinetic energy, frustrated hop");
            HopOutcome::Frustrated {
                from: proposal.from,
                to: proposal.to,
            }
        };
        self.adjust_velocities(g, nac.view());
        self.kinetic_energy = self.replica.kinetic_energy();
        outcome
    }
}
