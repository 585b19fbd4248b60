use crate::initialization::Simulation;
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Energy feasibility of a hop along the nonadiabatic coupling direction,
/// see Fabiano, Groenhof, Thiel; Chemical Physics 351 (2008) 111.
/// `a = 1/2 sum_A d_A^2 / M_A` and `b = sum_A d_A . v_A` must already be
/// reduced over the whole group, `gap` is `E_target - E_source`. Returns
/// whether the hop is allowed together with the rescaling factor: the
/// smaller-modulus root of `a g^2 - b g + gap = 0` when allowed, and the
/// reversal factor `b / a` for a frustrated hop.
pub fn hop_feasibility(a: f64, b: f64, gap: f64) -> (bool, f64) {
    let discriminant: f64 = b * b - 4.0 * a * gap;
    if discriminant >= 0.0 {
        let g: f64 = if b < 0.0 {
            (b + discriminant.sqrt()) / (2.0 * a)
        } else {
            (b - discriminant.sqrt()) / (2.0 * a)
        };
        (true, g)
    } else {
        (false, b / a)
    }
}

impl Simulation {
    /// Photonic weight of eigenstate `p` seen from this replica: the
    /// mode amplitudes folded with the field and the replica's position
    /// phase.
    pub(crate) fn photon_weight(&self, p: usize) -> c64 {
        let m: usize = self.roles.replica;
        let mut sum: c64 = c64::new(0.0, 0.0);
        for (i, n) in self.cavity.mode_indices().enumerate() {
            sum += self.basis.vectors[[self.nmol + i, p]]
                * self.cavity.field_amplitude(n)
                * self.cavity.phase(n, m, self.nmol);
        }
        sum
    }

    /// This replica's contribution to the nonadiabatic coupling vector
    /// between eigenstates `p` and `q`: the population-difference term on the
    /// excitation gradient minus the light-matter cross term on the dipole
    /// gradient, normalized by the adiabatic gap. The coupling is complex in
    /// general; only its real part enters the velocity work `d . v + v . d`.
    pub fn nac_vector(&self, p: usize, q: usize) -> Array2<f64> {
        let m: usize = self.roles.replica;
        let gap: f64 = self.basis.energies[q] - self.basis.energies[p];

        let betasq: c64 = self.basis.vectors[[m, p]].conj() * self.basis.vectors[[m, q]];
        let cross: c64 = self.basis.vectors[[m, p]].conj() * self.photon_weight(q)
            + self.photon_weight(p).conj() * self.basis.vectors[[m, q]];

        let gradient_gap: Array2<f64> =
            &self.electronic.excited_gradient - &self.electronic.ground_gradient;
        let dipole: Array2<f64> = self.projected_dipole_gradient();

        (gradient_gap * betasq.re - dipole * cross.re) / gap
    }

    /// Group-summed rescaling prefactors of the coupling vector: the
    /// mass-weighted norm `a` and the velocity projection `b`. Massless
    /// sites (e.g. link atoms) carry no kinetic energy and are skipped.
    pub fn kinetic_terms(&self, nac: ArrayView2<f64>) -> (f64, f64) {
        let mut a: f64 = 0.0;
        let mut b: f64 = 0.0;
        for atom in 0..self.replica.n_atoms {
            if self.replica.masses[atom] > 0.0 {
                let d = nac.slice(s![atom, ..]);
                a += d.dot(&d) / self.replica.masses[atom];
                b += d.dot(&self.replica.velocities.slice(s![atom, ..]));
            }
        }
        a *= 0.5;
        let a: f64 = self.group.sum_scalar(a);
        let b: f64 = self.group.sum_scalar(b);
        (a, b)
    }

    /// Remove the hop work from the velocities along the coupling direction,
    /// `v_A -= g d_A / M_A`. With the frustrated factor `g = b / a` this
    /// reverses the velocity component along the coupling.
    pub fn adjust_velocities(&mut self, g: f64, nac: ArrayView2<f64>) {
        for atom in 0..self.replica.n_atoms {
            if self.replica.masses[atom] > 0.0 {
                let scale: f64 = g / self.replica.masses[atom];
                let mut v = self.replica.velocities.slice_mut(s![atom, ..]);
                v -= &(&nac.slice(s![atom, ..]) * scale);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn feasible_hop_takes_the_smaller_root() {
        let (allowed, g) = hop_feasibility(1.0, 2.0, 0.5);
        assert!(allowed);
        // (2 - sqrt(2)) / 2
        assert_abs_diff_eq!(g, 0.2928932188134524, epsilon = 1e-12);
    }

    #[test]
    fn smaller_root_respects_the_sign_of_b() {
        let (allowed, g) = hop_feasibility(1.0, -2.0, 0.5);
        assert!(allowed);
        assert_abs_diff_eq!(g, -0.2928932188134524, epsilon = 1e-12);
    }

    #[test]
    fn frustrated_hop_returns_the_reversal_factor() {
        let (allowed, g) = hop_feasibility(1.0, 2.0, 2.0);
        assert!(!allowed);
        assert_abs_diff_eq!(g, 2.0, epsilon = 1e-14);
    }

    #[test]
    fn downward_gap_is_always_allowed() {
        let (allowed, _) = hop_feasibility(0.3, 0.01, -0.2);
        assert!(allowed);
    }
}
