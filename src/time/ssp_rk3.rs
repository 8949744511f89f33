//! Strong Stability Preserving Runge-Kutta time integration.
//!
//! SSP-RK3 (Shu-Osher form) is a convex combination of forward Euler steps,
//! so any bound a forward Euler step preserves under a time-step restriction
//! is preserved by the full step under the same restriction.

/// Perform one forward Euler step u <- u + dt L(u, t).
pub fn forward_euler_step<F>(u: &mut [f64], mut rhs_fn: F, t: f64, dt: f64)
where
    F: FnMut(&[f64], f64) -> Vec<f64>,
{
    let l_u = rhs_fn(u, t);
    axpy(u, dt, &l_u);
}

/// Perform one step of SSP-RK3 with time-dependent RHS.
///
/// The Shu-Osher form:
/// u1 = u + dt * L(u, t)
/// u2 = 3/4 * u + 1/4 * u1 + 1/4 * dt * L(u1, t + dt)
/// u_new = 1/3 * u + 2/3 * u2 + 2/3 * dt * L(u2, t + dt/2)
///
/// # Arguments
/// * `u` - Solution to update (modified in place)
/// * `rhs_fn` - Function that computes the RHS given solution and time
/// * `t` - Current time
/// * `dt` - Time step
pub fn ssp_rk3_step<F>(u: &mut [f64], mut rhs_fn: F, t: f64, dt: f64)
where
    F: FnMut(&[f64], f64) -> Vec<f64>,
{
    // Stage 1: u1 = u + dt * L(u, t)
    let l_u = rhs_fn(u, t);
    let mut u1 = u.to_vec();
    axpy(&mut u1, dt, &l_u);

    // Stage 2: u2 = 3/4 * u + 1/4 * u1 + 1/4 * dt * L(u1, t + dt)
    let l_u1 = rhs_fn(&u1, t + dt);
    let mut u2: Vec<f64> = u.iter().map(|v| 0.75 * v).collect();
    axpy(&mut u2, 0.25, &u1);
    axpy(&mut u2, 0.25 * dt, &l_u1);

    // Stage 3: u_new = 1/3 * u + 2/3 * u2 + 2/3 * dt * L(u2, t + dt/2)
    let l_u2 = rhs_fn(&u2, t + 0.5 * dt);
    u.iter_mut().for_each(|v| *v /= 3.0);
    axpy(u, 2.0 / 3.0, &u2);
    axpy(u, 2.0 / 3.0 * dt, &l_u2);
}

fn axpy(y: &mut [f64], a: f64, x: &[f64]) {
    assert_eq!(y.len(), x.len());
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += a * xi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssp_rk3_exact_for_cubic_in_time() {
        // du/dt = 3 t^2, exact u = t^3: third order integrates it exactly
        let mut u = [0.0];
        let mut t = 0.0;
        let dt = 0.25;
        for _ in 0..4 {
            ssp_rk3_step(&mut u, |_, s| vec![3.0 * s * s], t, dt);
            t += dt;
        }
        assert!((u[0] - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_stage_times() {
        let mut times = Vec::new();
        let mut u = [1.0];
        ssp_rk3_step(
            &mut u,
            |_, s| {
                times.push(s);
                vec![0.0]
            },
            2.0,
            0.5,
        );
        assert_eq!(times, vec![2.0, 2.5, 2.25]);

        times.clear();
        let mut u = [1.0];
        forward_euler_step(
            &mut u,
            |_, s| {
                times.push(s);
                vec![1.0]
            },
            1.0,
            0.5,
        );
        assert_eq!(times, vec![1.0]);
        assert_eq!(u, [1.5]);
    }
}
