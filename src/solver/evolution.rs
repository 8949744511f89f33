//! The evolution operator: du/dt for one integration stage.
//!
//! Dispatches to the configured combination of low-order, high-order and FCT
//! derivatives. In remap mode every evaluation first moves the mesh to the
//! stage time and refreshes everything that depends on geometry.

use log::{debug, info};

use crate::config::{EvolutionConfig, ExecMode, MonotoneScheme};
use crate::error::{ConfigError, Result, TopologyError};
use crate::operators::{CsrMatrix, Discretization};
use crate::stencil::{StencilAssembly, StencilSnapshot};
use crate::time::TimeScheme;
use crate::topology::{ElementRange, TopologyIndex};

use super::fct::{FctInput, fct_blend};
use super::high_order::{NeumannOutcome, high_order_derivative};
use super::low_order::{
    DiscreteUpwinding, discrete_upwind_derivative, forward_euler_limit, lumped_flux_diagonal,
    residual_distribution_derivative, upwind_diagonal,
};

/// Structures derived from the discretization, shared by every evaluation.
#[derive(Clone, Debug)]
pub struct EvolutionContext {
    pub topology: TopologyIndex,
    pub stencils: StencilAssembly,
    /// Discrete upwind matrix, when discrete upwinding is active
    pub upwinding: Option<DiscreteUpwinding>,
}

impl EvolutionContext {
    fn lumping(&self, apply: bool) -> Option<(&TopologyIndex, &StencilSnapshot)> {
        apply.then(|| (&self.topology, self.stencils.current()))
    }
}

/// Time derivative of a DG state under a bounded, conservative scheme.
pub struct EvolutionOperator<D: Discretization> {
    disc: D,
    config: EvolutionConfig,
    context: EvolutionContext,
    dt: f64,
    start_positions: Vec<f64>,
    positions: Vec<f64>,
    ranges: ElementRange,
    y_low: Vec<f64>,
    y_high: Vec<f64>,
    scratch: Vec<f64>,
    last_solve: Option<NeumannOutcome>,
}

impl<D: Discretization> EvolutionOperator<D> {
    /// Build the operator around an assembled discretization.
    ///
    /// The discretization must have been assembled for the same (resolved)
    /// configuration: mode, face terms in K and the preconditioned K.
    pub fn new(disc: D, config: EvolutionConfig) -> Result<Self> {
        let order = disc.order();
        let config = config.resolve(order);

        if disc.mode() != config.mode {
            return Err(ConfigError::AssemblyMismatch("execution mode").into());
        }
        if disc.convection_has_face_terms() != config.face_terms_in_convection() {
            return Err(ConfigError::AssemblyMismatch("upwind face terms in K").into());
        }
        if config.preconditioned_upwinding() && disc.preconditioned_convection().is_none() {
            return Err(ConfigError::AssemblyMismatch("preconditioned K missing").into());
        }

        let topology = TopologyIndex::new(disc.mesh(), order)?;
        if topology.dofs_per_element() != disc.dofs_per_element() {
            return Err(TopologyError::DofCountMismatch {
                order,
                dim: topology.dim(),
                expected: topology.dofs_per_element(),
                actual: disc.dofs_per_element(),
            }
            .into());
        }

        let stencils = StencilAssembly::new(&disc, &topology, &config);
        let upwinding = match config.scheme {
            MonotoneScheme::DiscreteUpwind => {
                Some(DiscreteUpwinding::new(upwind_source(&disc, &config))?)
            }
            _ => None,
        };

        let n = disc.n_dofs();
        info!(
            "evolution operator: {:?}, scheme {:?}, fct {}, subcell {}, {} dofs",
            config.mode, config.scheme, config.apply_fct, config.subcell, n
        );

        let start_positions = disc.node_positions().to_vec();
        let mut op = Self {
            positions: start_positions.clone(),
            start_positions,
            disc,
            config,
            context: EvolutionContext {
                topology,
                stencils,
                upwinding,
            },
            dt: 0.0,
            ranges: ElementRange::default(),
            y_low: vec![0.0; n],
            y_high: vec![0.0; n],
            scratch: vec![0.0; n],
            last_solve: None,
        };
        // No flow gives no limit; any positive step bounds a zero update
        let limit = op.low_order_time_step_limit();
        op.dt = if limit.is_finite() && limit > 0.0 { limit } else { 1.0 };
        Ok(op)
    }

    /// Time step used by the FCT bounds.
    ///
    /// Defaults to the low-order forward Euler limit of the initial mesh.
    pub fn set_time_step(&mut self, dt: f64) -> Result<()> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(ConfigError::InvalidTimeStep(dt).into());
        }
        self.dt = dt;
        Ok(())
    }

    /// Node positions at t = 0 of the mesh motion x(t) = x0 + t v.
    pub fn set_remap_start_position(&mut self, positions: &[f64]) {
        assert_eq!(positions.len(), self.start_positions.len());
        self.start_positions.copy_from_slice(positions);
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn context(&self) -> &EvolutionContext {
        &self.context
    }

    pub fn discretization(&self) -> &D {
        &self.disc
    }

    pub fn time_step(&self) -> f64 {
        self.dt
    }

    /// Element ranges of the state passed to the last low-order evaluation.
    pub fn element_ranges(&self) -> &ElementRange {
        &self.ranges
    }

    /// Outcome of the last high-order mass solve.
    pub fn last_neumann_outcome(&self) -> Option<NeumannOutcome> {
        self.last_solve
    }

    /// du/dt at state `x` and absolute time `t`.
    pub fn evaluate_derivative(&mut self, x: &[f64], t: f64) -> Vec<f64> {
        let mut y = vec![0.0; x.len()];
        self.evaluate_derivative_into(x, t, &mut y);
        y
    }

    /// du/dt at state `x` and absolute time `t`, written into `y`.
    pub fn evaluate_derivative_into(&mut self, x: &[f64], t: f64, y: &mut [f64]) {
        let n = self.disc.n_dofs();
        assert_eq!(x.len(), n, "state length");
        assert_eq!(y.len(), n, "derivative length");

        if self.config.mode == ExecMode::Remap {
            self.move_mesh(t);
        }

        match (self.config.has_low_order(), self.config.has_high_order()) {
            (false, _) => {
                let solve = self.high_order(x, y);
                self.last_solve = Some(solve);
            }
            (true, false) => self.low_order(x, y),
            (true, true) => {
                let mut y_low = std::mem::take(&mut self.y_low);
                let mut y_high = std::mem::take(&mut self.y_high);
                self.low_order(x, &mut y_low);
                let solve = self.high_order(x, &mut y_high);
                self.last_solve = Some(solve);
                let input = FctInput {
                    topology: &self.context.topology,
                    ranges: &self.ranges,
                    lumped_mass: self.disc.lumped_mass(),
                    x,
                    dt: self.dt,
                    y_low: &y_low,
                    y_high: &y_high,
                };
                fct_blend(&input, y);
                self.y_low = y_low;
                self.y_high = y_high;
            }
        }
    }

    /// Place the mesh at time `t` and refresh every geometry-dependent operator.
    fn move_mesh(&mut self, t: f64) {
        let velocity = self.disc.mesh_velocity();
        for ((p, x0), v) in self
            .positions
            .iter_mut()
            .zip(&self.start_positions)
            .zip(velocity)
        {
            *p = x0 + t * v;
        }
        self.disc.set_node_positions(&self.positions);
        if let Some(up) = self.context.upwinding.as_mut() {
            up.update(upwind_source(&self.disc, &self.config));
        }
        self.context
            .stencils
            .rebuild(&self.disc, &self.context.topology, &self.config);
        debug!("mesh moved to t = {t}");
    }

    fn low_order(&mut self, x: &[f64], y: &mut [f64]) {
        let nd = self.disc.dofs_per_element();
        let ctx = &self.context;
        match &ctx.upwinding {
            Some(up) => discrete_upwind_derivative(
                up.matrix(),
                self.disc.boundary_inflow(),
                self.disc.lumped_mass(),
                ctx.lumping(self.config.preconditioned_upwinding()),
                nd,
                x,
                y,
            ),
            None => residual_distribution_derivative(
                self.disc.convection(),
                self.disc.boundary_inflow(),
                self.disc.lumped_mass(),
                &ctx.topology,
                ctx.stencils.current(),
                x,
                &mut self.scratch,
                y,
            ),
        }
        self.ranges.update(x, nd);
    }

    fn high_order(&mut self, x: &[f64], y: &mut [f64]) -> NeumannOutcome {
        high_order_derivative(
            self.disc.convection(),
            self.disc.boundary_inflow(),
            self.disc.mass(),
            self.disc.lumped_mass(),
            self.context.lumping(!self.disc.convection_has_face_terms()),
            self.disc.dofs_per_element(),
            x,
            &mut self.scratch,
            y,
        )
    }

    /// Advance `u` from `t` to `t + dt`.
    ///
    /// In remap mode the mesh is left at `t + dt` afterwards.
    pub fn advance(&mut self, u: &mut [f64], t: f64, dt: f64, scheme: TimeScheme) -> Result<()> {
        self.set_time_step(dt)?;
        scheme.step(u, |x, s| self.evaluate_derivative(x, s), t, dt);
        if self.config.mode == ExecMode::Remap {
            self.move_mesh(t + dt);
        }
        Ok(())
    }

    /// Total mass sum_i m_i x_i on the current mesh.
    pub fn lumped_mass_integral(&self, x: &[f64]) -> f64 {
        self.disc
            .lumped_mass()
            .iter()
            .zip(x)
            .map(|(m, u)| m * u)
            .sum()
    }

    /// Forward Euler limit of the low-order update on the current mesh.
    ///
    /// Residual distribution uses the discrete upwinding estimate of K.
    pub fn low_order_time_step_limit(&self) -> f64 {
        let mut diagonal = match &self.context.upwinding {
            Some(up) => up.matrix().diagonal(),
            None => upwind_diagonal(self.disc.convection()),
        };
        if !self.disc.convection_has_face_terms() {
            let flux = lumped_flux_diagonal(&self.context.topology, self.context.stencils.current());
            for (d, f) in diagonal.iter_mut().zip(flux) {
                *d -= f;
            }
        }
        forward_euler_limit(&diagonal, self.disc.lumped_mass())
    }
}

/// Matrix discrete upwinding acts on.
fn upwind_source<'a, D: Discretization>(disc: &'a D, config: &EvolutionConfig) -> &'a CsrMatrix {
    if config.preconditioned_upwinding() {
        disc.preconditioned_convection()
            .unwrap_or_else(|| disc.convection())
    } else {
        disc.convection()
    }
}

/// Minimum and maximum of a state.
pub fn value_range(x: &[f64]) -> (f64, f64) {
    x.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
