//! Scheme configuration.
//!
//! The configuration is an immutable value decided once at setup and passed to
//! every constructor that depends on it. [`EvolutionConfig::resolve`] applies
//! the order-dependent downgrades before anything is assembled.

use log::warn;

use crate::error::ConfigError;

/// What moves: the field or the mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecMode {
    /// Fixed mesh, the field is advected by the velocity.
    #[default]
    Transport,
    /// The mesh moves with the velocity, the field stays put.
    Remap,
}

impl ExecMode {
    /// Sign applied to the velocity to obtain the advection velocity.
    ///
    /// Remap advects the mesh, so relative to the mesh the field moves with the
    /// negated mesh velocity.
    pub fn advection_sign(self) -> f64 {
        match self {
            ExecMode::Transport => 1.0,
            ExecMode::Remap => -1.0,
        }
    }

    /// Execution mode implied by a legacy problem number.
    pub fn from_problem_number(problem: u32) -> Result<Self, ConfigError> {
        match problem {
            0..=9 => Ok(ExecMode::Transport),
            10..=19 => Ok(ExecMode::Remap),
            _ => Err(ConfigError::UnknownProblem(problem)),
        }
    }
}

/// Low-order monotonicity treatment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MonotoneScheme {
    /// Plain high-order Galerkin, no bounds.
    None,
    /// Matrix-level discrete upwinding.
    DiscreteUpwind,
    /// Element-level residual distribution.
    #[default]
    ResidualDistribution,
}

/// Immutable configuration of the evolution operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EvolutionConfig {
    /// Transport or remap
    pub mode: ExecMode,
    /// Low-order scheme
    pub scheme: MonotoneScheme,
    /// Blend low and high order with FCT (ignored for [`MonotoneScheme::None`])
    pub apply_fct: bool,
    /// Optimized variant: preconditioned discrete upwinding with lumped face
    /// fluxes, or residual distribution with subcell fluctuations
    pub subcell: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self::new(ExecMode::Transport)
    }
}

impl EvolutionConfig {
    /// Residual distribution with subcells and FCT.
    pub fn new(mode: ExecMode) -> Self {
        Self {
            mode,
            scheme: MonotoneScheme::ResidualDistribution,
            apply_fct: true,
            subcell: true,
        }
    }

    /// Unlimited high-order scheme.
    pub fn high_order(mode: ExecMode) -> Self {
        Self {
            mode,
            scheme: MonotoneScheme::None,
            apply_fct: false,
            subcell: false,
        }
    }

    /// Low-order scheme only.
    pub fn low_order(mode: ExecMode, scheme: MonotoneScheme) -> Self {
        Self {
            mode,
            scheme,
            apply_fct: false,
            subcell: false,
        }
    }

    /// Low-order scheme blended with high order through FCT.
    pub fn fct(mode: ExecMode, scheme: MonotoneScheme) -> Self {
        Self {
            mode,
            scheme,
            apply_fct: true,
            subcell: false,
        }
    }

    /// Set the low-order scheme.
    pub fn with_scheme(mut self, scheme: MonotoneScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Enable or disable FCT blending.
    pub fn with_fct(mut self, apply_fct: bool) -> Self {
        self.apply_fct = apply_fct;
        self
    }

    /// Enable or disable the optimized (subcell) variant.
    pub fn with_subcell(mut self, subcell: bool) -> Self {
        self.subcell = subcell;
        self
    }

    /// Decode the legacy integer encoding.
    ///
    /// 0 none, 1 discrete upwinding, 2 discrete upwinding + FCT,
    /// 3 residual distribution, 4 residual distribution + FCT.
    pub fn from_legacy_code(mode: ExecMode, code: i32, subcell: bool) -> Result<Self, ConfigError> {
        let (scheme, apply_fct) = match code {
            0 => (MonotoneScheme::None, false),
            1 => (MonotoneScheme::DiscreteUpwind, false),
            2 => (MonotoneScheme::DiscreteUpwind, true),
            3 => (MonotoneScheme::ResidualDistribution, false),
            4 => (MonotoneScheme::ResidualDistribution, true),
            other => return Err(ConfigError::UnknownSchemeCode(other)),
        };
        Ok(Self {
            mode,
            scheme,
            apply_fct,
            subcell,
        })
    }

    /// Apply the order-dependent downgrades.
    ///
    /// - order 0 disables monotonicity treatment
    /// - no monotonicity treatment means no subcells and no FCT
    /// - linear residual distribution has no subcells to work with
    pub fn resolve(self, order: usize) -> Self {
        let mut cfg = self;
        if cfg.scheme != MonotoneScheme::None && order == 0 {
            warn!("monotonicity treatment disabled for piecewise constants");
            cfg.scheme = MonotoneScheme::None;
        }
        if cfg.scheme == MonotoneScheme::None {
            cfg.subcell = false;
            cfg.apply_fct = false;
        }
        if cfg.scheme == MonotoneScheme::ResidualDistribution && order == 1 && cfg.subcell {
            warn!("subcell residual distribution disabled for linear elements");
            cfg.subcell = false;
        }
        cfg
    }

    /// The convection matrix carries the upwind face terms itself.
    ///
    /// Only basic discrete upwinding folds faces into K; every other scheme
    /// handles faces through the lumped flux stencils.
    pub fn face_terms_in_convection(&self) -> bool {
        self.scheme == MonotoneScheme::DiscreteUpwind && !self.subcell
    }

    /// Face flux stencils are needed by some part of the scheme.
    pub fn needs_flux_stencils(&self) -> bool {
        !self.face_terms_in_convection()
    }

    /// Subcell residual weights are needed.
    pub fn needs_subcell_weights(&self) -> bool {
        self.scheme == MonotoneScheme::ResidualDistribution && self.subcell
    }

    /// Discrete upwinding acts on the element-preconditioned convection matrix.
    pub fn preconditioned_upwinding(&self) -> bool {
        self.scheme == MonotoneScheme::DiscreteUpwind && self.subcell
    }

    /// A low-order derivative is computed.
    pub fn has_low_order(&self) -> bool {
        self.scheme != MonotoneScheme::None
    }

    /// A high-order derivative is computed.
    pub fn has_high_order(&self) -> bool {
        self.scheme == MonotoneScheme::None || self.apply_fct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_codes() {
        let cfg = EvolutionConfig::from_legacy_code(ExecMode::Transport, 2, false).unwrap();
        assert_eq!(cfg.scheme, MonotoneScheme::DiscreteUpwind);
        assert!(cfg.apply_fct);

        let cfg = EvolutionConfig::from_legacy_code(ExecMode::Remap, 3, true).unwrap();
        assert_eq!(cfg.scheme, MonotoneScheme::ResidualDistribution);
        assert!(!cfg.apply_fct);
        assert_eq!(cfg.mode, ExecMode::Remap);

        assert_eq!(
            EvolutionConfig::from_legacy_code(ExecMode::Transport, 5, false),
            Err(ConfigError::UnknownSchemeCode(5))
        );
    }

    #[test]
    fn test_resolve_order_zero() {
        let cfg = EvolutionConfig::new(ExecMode::Transport).resolve(0);
        assert_eq!(cfg.scheme, MonotoneScheme::None);
        assert!(!cfg.subcell);
        assert!(!cfg.apply_fct);
    }

    #[test]
    fn test_resolve_linear_residual_distribution() {
        let cfg = EvolutionConfig::new(ExecMode::Transport).resolve(1);
        assert_eq!(cfg.scheme, MonotoneScheme::ResidualDistribution);
        assert!(!cfg.subcell);

        // Discrete upwinding keeps its preconditioned variant at order 1
        let cfg = EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::DiscreteUpwind)
            .with_subcell(true)
            .resolve(1);
        assert!(cfg.subcell);
    }

    #[test]
    fn test_face_term_placement() {
        let basic = EvolutionConfig::fct(ExecMode::Transport, MonotoneScheme::DiscreteUpwind);
        assert!(basic.face_terms_in_convection());
        assert!(!basic.needs_flux_stencils());

        let pdu = basic.with_subcell(true);
        assert!(!pdu.face_terms_in_convection());
        assert!(pdu.preconditioned_upwinding());

        let ho = EvolutionConfig::high_order(ExecMode::Transport);
        assert!(ho.needs_flux_stencils());
        assert!(ho.has_high_order());
        assert!(!ho.has_low_order());
    }

    #[test]
    fn test_problem_numbers() {
        assert_eq!(ExecMode::from_problem_number(4), Ok(ExecMode::Transport));
        assert_eq!(ExecMode::from_problem_number(14), Ok(ExecMode::Remap));
        assert!(ExecMode::from_problem_number(20).is_err());
    }
}
