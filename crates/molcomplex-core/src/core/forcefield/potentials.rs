const SINGULAR_DISTANCE: f64 = 1e-6;
const SINGULAR_ENERGY: f64 = 1e10;

/// Lennard-Jones 12-6 in the `r_min` form: `eps * ((r_min/r)^12 - 2 (r_min/r)^6)`.
#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < SINGULAR_DISTANCE {
        return SINGULAR_ENERGY;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// dE/dr of [`lennard_jones_12_6`].
#[inline]
pub fn lennard_jones_12_6_derivative(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < SINGULAR_DISTANCE {
        return 0.0;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    12.0 * well_depth * (rho6 - rho12) / dist
}

/// Harmonic spring `k (r - r0)^2`.
#[inline]
pub fn harmonic(dist: f64, r0: f64, force_constant: f64) -> f64 {
    let delta = dist - r0;
    force_constant * delta * delta
}

/// dE/dr of [`harmonic`].
#[inline]
pub fn harmonic_derivative(dist: f64, r0: f64, force_constant: f64) -> f64 {
    2.0 * force_constant * (dist - r0)
}
