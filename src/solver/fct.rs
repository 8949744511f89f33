//! Flux-corrected transport blend of low- and high-order derivatives.
//!
//! Per element, the antidiffusive fluxes m_j/dt (u_clipped_j - u_low_j) move
//! the low-order update towards the high-order one as far as the dof bounds
//! allow. The one-signed excess is then scaled down so the fluxes of every
//! element sum to zero and the blend conserves mass exactly.

use crate::parallel::for_each_element;
use crate::topology::{ElementRange, TopologyIndex};

use super::EPS;

/// Inputs of the blend shared by every element.
#[derive(Clone, Copy, Debug)]
pub struct FctInput<'a> {
    pub topology: &'a TopologyIndex,
    pub ranges: &'a ElementRange,
    pub lumped_mass: &'a [f64],
    pub x: &'a [f64],
    pub dt: f64,
    pub y_low: &'a [f64],
    pub y_high: &'a [f64],
}

impl FctInput<'_> {
    /// Limited antidiffusive fluxes of element `k` into `fluxes`.
    pub fn element_fluxes(&self, k: usize, fluxes: &mut [f64]) {
        let nd = self.topology.dofs_per_element();
        let base = k * nd;
        let mut sum_pos = 0.0;
        let mut sum_neg = 0.0;
        for (j, fj) in fluxes.iter_mut().enumerate().take(nd) {
            let dof = base + j;
            let range = self.topology.dof_range(dof, self.ranges);
            let u_clipped = range.clamp(self.x[dof] + self.dt * self.y_high[dof]);
            let u_low = self.x[dof] + self.dt * self.y_low[dof];
            *fj = self.lumped_mass[dof] / self.dt * (u_clipped - u_low);
            sum_pos += fj.max(0.0);
            sum_neg += fj.min(0.0);
        }

        let net = sum_pos + sum_neg;
        if net > EPS {
            let scale = -sum_neg / sum_pos;
            fluxes[..nd].iter_mut().filter(|f| **f > EPS).for_each(|f| *f *= scale);
        } else if net < -EPS {
            let scale = -sum_pos / sum_neg;
            fluxes[..nd].iter_mut().filter(|f| **f < -EPS).for_each(|f| *f *= scale);
        }
    }
}

/// y = y_low + f / m_L with the limited fluxes of every element.
pub fn fct_blend(input: &FctInput<'_>, y: &mut [f64]) {
    assert!(input.dt > 0.0, "FCT needs a positive time step");
    let nd = input.topology.dofs_per_element();
    for_each_element(y, nd, |k, y_e| {
        let base = k * nd;
        let mut fluxes = vec![0.0; nd];
        input.element_fluxes(k, &mut fluxes);
        for (i, yi) in y_e.iter_mut().enumerate() {
            let dof = base + i;
            *yi = input.y_low[dof] + fluxes[i] / input.lumped_mass[dof];
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::CartesianMesh;

    #[test]
    fn test_blend_equals_high_order_when_admissible() {
        let mesh = CartesianMesh::segment_periodic(0.0, 1.0, 2);
        let topo = TopologyIndex::new(&mesh, 1).unwrap();
        let x = [0.0, 1.0, 1.0, 0.0];
        let ranges = ElementRange::compute(&x, 2);
        let y_low = [0.1, -0.1, -0.1, 0.1];
        let y_high = [0.2, -0.2, -0.2, 0.2];
        let input = FctInput {
            topology: &topo,
            ranges: &ranges,
            lumped_mass: &[0.25; 4],
            x: &x,
            dt: 0.5,
            y_low: &y_low,
            y_high: &y_high,
        };
        let mut y = [0.0; 4];
        fct_blend(&input, &mut y);
        for (a, b) in y.iter().zip(&y_high) {
            assert!((a - b).abs() < 1e-14);
        }
    }

    #[test]
    fn test_blend_clips_overshoot() {
        let mesh = CartesianMesh::segment(0.0, 1.0, 1);
        let topo = TopologyIndex::new(&mesh, 1).unwrap();
        let x = [0.0, 1.0];
        let ranges = ElementRange::compute(&x, 2);
        let y_low = [0.0, 0.0];
        // Pushes dof 1 above the element maximum
        let y_high = [-1.0, 1.0];
        let input = FctInput {
            topology: &topo,
            ranges: &ranges,
            lumped_mass: &[0.5, 0.5],
            x: &x,
            dt: 0.1,
            y_low: &y_low,
            y_high: &y_high,
        };
        let mut fluxes = [0.0; 2];
        input.element_fluxes(0, &mut fluxes);
        // Dof 0 clips to 0, dof 1 clips to 1: nothing remains to correct
        assert_eq!(fluxes, [0.0, 0.0]);
    }
}
