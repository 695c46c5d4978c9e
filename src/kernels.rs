//! SPH smoothing kernels. All have compact support: they're exactly zero at and beyond `h`.
//!
//! - Poly6 for density: W(r, h) = 315 / (64π h⁹) · (h² - r²)³
//! - Spiky gradient for pressure: ∇W(r, h) = -45 / (π h⁶) · (h - |r|)² · r̂
//! - Viscosity Laplacian: ∇²W(r, h) = 45 / (π h⁶) · (h - r)

use std::f64::consts::PI;

use lin_alg::f64::Vec3;

/// Below this distance, a pair is treated as coincident, and has no gradient direction.
const R_MIN: f64 = 1.0e-12;

/// Kernel normalization factors; these depend on h only, so we compute them once per step.
#[derive(Clone, Copy, Debug)]
pub struct KernelCoeffs {
    pub h: f64,
    pub h_sq: f64,
    pub poly6: f64,
    pub spiky_grad: f64,
    pub visc_laplacian: f64,
}

impl KernelCoeffs {
    pub fn new(h: f64) -> Self {
        let h_sq = h * h;
        let h6 = h_sq * h_sq * h_sq;
        let h9 = h6 * h_sq * h;

        Self {
            h,
            h_sq,
            poly6: 315. / (64. * PI * h9),
            spiky_grad: -45. / (PI * h6),
            visc_laplacian: 45. / (PI * h6),
        }
    }

    /// Takes squared distance; no square root required.
    pub fn poly6(&self, r_sq: f64) -> f64 {
        if r_sq >= self.h_sq {
            return 0.;
        }
        let diff = self.h_sq - r_sq;
        self.poly6 * diff * diff * diff
    }

    /// `r` is the displacement from the source particle to the target, i.e. `posit_i - posit_j`.
    /// The result points from i toward j, so `-∇W` pushes i away from j.
    pub fn spiky_grad(&self, r: Vec3) -> Vec3 {
        let r_len = r.magnitude();
        if r_len >= self.h || r_len < R_MIN {
            return Vec3::new_zero();
        }
        let diff = self.h - r_len;
        r * (self.spiky_grad * diff * diff / r_len)
    }

    pub fn visc_laplacian(&self, r_len: f64) -> f64 {
        if r_len >= self.h {
            return 0.;
        }
        self.visc_laplacian * (self.h - r_len)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn zero_at_support_boundary() {
        let k = KernelCoeffs::new(0.5);

        assert_eq!(k.poly6(0.25), 0.);
        assert_eq!(k.poly6(1.), 0.);
        assert_eq!(k.visc_laplacian(0.5), 0.);
        assert_eq!(k.visc_laplacian(0.7), 0.);

        let g = k.spiky_grad(Vec3::new(0.5, 0., 0.));
        assert_eq!((g.x, g.y, g.z), (0., 0., 0.));
    }

    #[test]
    fn poly6_at_origin() {
        let h = 0.2;
        let k = KernelCoeffs::new(h);
        assert_relative_eq!(k.poly6(0.), 315. / (64. * PI * h.powi(3)), max_relative = 1e-12);
    }

    #[test]
    fn poly6_integrates_to_one() {
        // Radial quadrature: ∫ 4πr² W(r) dr over [0, h].
        let h = 0.3;
        let k = KernelCoeffs::new(h);
        let n = 20_000;
        let dr = h / n as f64;

        let mut total = 0.;
        for i in 0..n {
            let r = (i as f64 + 0.5) * dr;
            total += 4. * PI * r * r * k.poly6(r * r) * dr;
        }
        assert_relative_eq!(total, 1., epsilon = 1e-6);
    }

    #[test]
    fn spiky_grad_points_toward_source() {
        let k = KernelCoeffs::new(1.);
        // Target at +x of the source.
        let g = k.spiky_grad(Vec3::new(0.5, 0., 0.));
        assert!(g.x < 0.);
        assert_relative_eq!(g.x, -45. / PI * 0.25, max_relative = 1e-12);
        assert_eq!(g.y, 0.);
    }

    #[test]
    fn coincident_pair_has_no_gradient() {
        let k = KernelCoeffs::new(1.);
        let g = k.spiky_grad(Vec3::new_zero());
        assert_eq!((g.x, g.y, g.z), (0., 0., 0.));
    }
}
