use crate::error::DynamicsError;
use crate::initialization::Simulation;
use ndarray::prelude::*;
use ndarray_linalg::{c64, Eig, Eigh, Inverse, UPLO};

/// `exp(-0.5*i*dt*A)` for a Hermitian `A`, computed from the spectral
/// decomposition. The halving assumes `A` is the sum of the Hamiltonians at
/// `t` and `t - dt`, see eqn. (B11) in JCP 114, 10608 (2001).
pub fn expm_hermitian(a: ArrayView2<c64>, dt: f64) -> Result<Array2<c64>, DynamicsError> {
    let (w, v): (Array1<f64>, Array2<c64>) = a
        .to_owned()
        .eigh(UPLO::Upper)
        .map_err(DynamicsError::solver("eigh of the summed Hamiltonian"))?;
    let phases: Array1<c64> = w.mapv(|val| (-0.5 * c64::new(0.0, 1.0) * dt * val).exp());
    let adjoint: Array2<c64> = v.t().mapv(|val| val.conj());
    Ok(v.dot(&Array2::from_diag(&phases)).dot(&adjoint))
}

/// `exp(-0.5*i*dt*A)` for a non-Hermitian `A` via the right eigenvectors,
/// `V exp(-0.5*i*dt*lambda) V^-1`. Used when the cavity losses put imaginary
/// terms on the mode diagonal.
pub fn expm_general(a: ArrayView2<c64>, dt: f64) -> Result<Array2<c64>, DynamicsError> {
    let (w, v): (Array1<c64>, Array2<c64>) = a
        .to_owned()
        .eig()
        .map_err(DynamicsError::solver("eig of the lossy Hamiltonian"))?;
    let v_inv: Array2<c64> = v
        .inv()
        .map_err(DynamicsError::solver("inversion of the eigenvector matrix"))?;
    let phases: Array1<c64> = w.mapv(|val| (-0.5 * c64::new(0.0, 1.0) * dt * val).exp());
    Ok(v.dot(&Array2::from_diag(&phases)).dot(&v_inv))
}

impl Simulation {
    /// `H(t) + H(t - dt)` with the loss term `-2i*gamma` subtracted on every
    /// cavity-mode diagonal entry, so that the averaged Hamiltonian carries
    /// `-i*gamma`. The losses are assumed independent of R and t.
    pub fn lossy_summed(&self) -> Array2<c64> {
        let mut ham: Array2<c64> = self.hamiltonians.summed();
        for i in self.nmol..self.ndim {
            ham[[i, i]] -= c64::new(0.0, 2.0 * self.cavity.decay_energy);
        }
        ham
    }

    /// One-step propagator of the diabatic amplitudes for the configured
    /// representation.
    pub fn diabatic_propagator(&self) -> Result<Array2<c64>, DynamicsError> {
        if self.config.hopping.representation.is_lossy() {
            expm_general(self.lossy_summed().view(), self.stepsize)
        } else {
            expm_hermitian(self.hamiltonians.summed().view(), self.stepsize)
        }
    }

    /// The coefficients of the polaritonic wavefunction are propagated in the
    /// local diabatic basis as explained in
    /// [1] JCP 114, 10608 (2001) and
    /// [2] JCP 137, 22A514 (2012).
    /// Both the overlap and the interpolation diagonal come from
    /// `previous_basis`, the eigenbasis of the step before. Returns the new
    /// adiabatic amplitudes together with the one-step propagator, which also
    /// drives the hop probabilities.
    pub fn local_diabatization(&self) -> Result<(Array1<c64>, Array2<c64>), DynamicsError> {
        // Loewdin orthogonalization of the overlap matrix,
        // see eqns. (B5) and (B6) in [2]
        let s: Array2<c64> = self.basis.overlap_with_previous(&self.previous_basis);
        let s_adjoint: Array2<c64> = s.t().mapv(|val| val.conj());
        let s_ts: Array2<c64> = s_adjoint.dot(&s);
        let (l, o): (Array1<f64>, Array2<c64>) = s_ts
            .eigh(UPLO::Upper)
            .map_err(DynamicsError::solver("eigh of the squared overlap"))?;
        let lm12: Array1<c64> = l.mapv(|val| c64::from(1.0 / val.sqrt()));
        let o_adjoint: Array2<c64> = o.t().mapv(|val| val.conj());
        let t: Array2<c64> = s.dot(&o.dot(&Array2::from_diag(&lm12).dot(&o_adjoint)));
        let t_adjoint: Array2<c64> = t.t().mapv(|val| val.conj());

        // interpolated Hamiltonian T E(t+dt) T^dagger + E(t), kept unhalved
        // for the exponential
        let e_new: Array1<c64> = self.basis.energies.mapv(c64::from);
        let mut ham: Array2<c64> = t.dot(&Array2::from_diag(&e_new).dot(&t_adjoint));
        for (i, e) in self.previous_basis.energies.iter().enumerate() {
            ham[[i, i]] += c64::from(*e);
        }

        let exp_h: Array2<c64> = expm_hermitian(ham.view(), self.stepsize)?;
        let u: Array2<c64> = t_adjoint.dot(&exp_h);
        let c_new: Array1<c64> = u.dot(&self.adiabatic);
        Ok((c_new, u))
    }

    /// The first step never propagates: the user supplies either adiabatic or
    /// diabatic amplitudes, and the zero-norm vector is derived from the
    /// populated one with the first eigenbasis.
    pub fn reconcile_initial(&mut self) {
        let dtot: f64 = self.diabatic.iter().map(|v| v.norm_sqr()).sum();
        let ctot: f64 = self.adiabatic.iter().map(|v| v.norm_sqr()).sum();
        if ctot > dtot {
            self.diabatic = self.basis.to_diabatic(self.adiabatic.view());
        } else {
            self.adiabatic = self.basis.to_adiabatic(self.diabatic.view());
        }
    }
}
