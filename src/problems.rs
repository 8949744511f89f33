//! Benchmark velocity fields and initial conditions.
//!
//! Problems are numbered: below 10 transport, 10 to 19 remap. The velocity is
//! selected by `number % 20` and the initial condition by `number % 10`. Both
//! are evaluated in bounding-box coordinates X mapped to [-1, 1]^d.

use std::f64::consts::PI;

use statrs::function::erf::erfc;

use crate::config::ExecMode;
use crate::error::ConfigError;

/// Velocity field of a problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VelocityProfile {
    /// Constant unit-speed translation
    Translation,
    /// Solid body rotation about the origin
    Rotation,
    /// Rotation damped towards the boundary of the box
    TwistingRotation,
    /// Constant translation along the diagonal
    Diagonal,
    /// Taylor-Green vortex on [0, 1]^d, used as mesh motion
    TaylorGreen,
}

/// Initial condition of a problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitialCondition {
    /// Gaussian in 1D, smoothed box in 2D and 3D
    SmoothHump,
    /// sin^2(pi r) sin(3 phi)
    PolarSine,
    /// (sin(pi X) sin(pi Y) + 1) / 2
    SineProduct,
    /// Slotted cylinder, cone and cosine hump
    SlottedCylinder,
    /// 1 for X < 0, 0 otherwise
    Step,
}

/// A numbered benchmark on a given bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Problem {
    pub number: u32,
    pub dim: usize,
    pub mode: ExecMode,
    pub velocity: VelocityProfile,
    pub initial: InitialCondition,
    bb_min: [f64; 3],
    bb_max: [f64; 3],
}

impl Problem {
    /// Look up problem `number` in `dim` dimensions on the box [bb_min, bb_max].
    pub fn new(number: u32, dim: usize, bb_min: [f64; 3], bb_max: [f64; 3]) -> Result<Self, ConfigError> {
        let mode = ExecMode::from_problem_number(number)?;
        let unsupported = ConfigError::UnsupportedDimension {
            problem: number,
            dim,
        };
        if !(1..=3).contains(&dim) {
            return Err(unsupported);
        }

        let velocity = match number % 20 {
            0 => VelocityProfile::Translation,
            1 | 2 | 4 => VelocityProfile::Rotation,
            3 => VelocityProfile::TwistingRotation,
            5 => VelocityProfile::Diagonal,
            10..=15 if dim > 1 => VelocityProfile::TaylorGreen,
            10..=15 => return Err(unsupported),
            _ => return Err(ConfigError::UnknownProblem(number)),
        };
        let initial = match number % 10 {
            0 | 1 => InitialCondition::SmoothHump,
            2 => InitialCondition::PolarSine,
            3 => InitialCondition::SineProduct,
            4 => InitialCondition::SlottedCylinder,
            5 => InitialCondition::Step,
            _ => return Err(ConfigError::UnknownProblem(number)),
        };
        let planar = matches!(
            initial,
            InitialCondition::PolarSine | InitialCondition::SineProduct | InitialCondition::SlottedCylinder
        );
        if planar && dim < 2 {
            return Err(unsupported);
        }

        Ok(Self {
            number,
            dim,
            mode,
            velocity,
            initial,
            bb_min,
            bb_max,
        })
    }

    /// Replace the initial condition.
    pub fn with_initial(mut self, initial: InitialCondition) -> Self {
        self.initial = initial;
        self
    }

    /// Map a physical point to [-1, 1]^d.
    fn reference(&self, x: &[f64]) -> [f64; 3] {
        let mut r = [0.0; 3];
        for d in 0..self.dim {
            let center = 0.5 * (self.bb_min[d] + self.bb_max[d]);
            r[d] = 2.0 * (x[d] - center) / (self.bb_max[d] - self.bb_min[d]);
        }
        r
    }

    /// Velocity at physical point `x`.
    pub fn velocity(&self, x: &[f64]) -> [f64; 3] {
        let r = self.reference(x);
        let mut v = [0.0; 3];
        let w = PI / 2.0;
        match (self.velocity, self.dim) {
            (_, 1) => v[0] = 1.0,
            (VelocityProfile::Translation, 2) => {
                v[0] = (2.0_f64 / 3.0).sqrt();
                v[1] = (1.0_f64 / 3.0).sqrt();
            }
            (VelocityProfile::Translation, _) => {
                v[0] = (3.0_f64 / 6.0).sqrt();
                v[1] = (2.0_f64 / 6.0).sqrt();
                v[2] = (1.0_f64 / 6.0).sqrt();
            }
            (VelocityProfile::Rotation, _) => {
                v[0] = -w * r[1];
                v[1] = w * r[0];
            }
            (VelocityProfile::TwistingRotation, _) => {
                let d = ((r[0] + 1.0) * (1.0 - r[0])).max(0.0) * ((r[1] + 1.0) * (1.0 - r[1])).max(0.0);
                let d = d * d;
                v[0] = d * w * r[1];
                v[1] = -d * w * r[0];
            }
            (VelocityProfile::Diagonal, dim) => v[..dim].fill(1.0),
            (VelocityProfile::TaylorGreen, dim) => {
                let s: Vec<f64> = (0..dim).map(|d| 0.5 * r[d] + 0.5).collect();
                v[0] = (PI * s[0]).sin() * (PI * s[1]).cos();
                v[1] = -(PI * s[0]).cos() * (PI * s[1]).sin();
                if dim == 3 {
                    let c = (PI * s[2]).cos();
                    v[0] *= c;
                    v[1] *= c;
                }
            }
        }
        v
    }

    /// Initial value at physical point `x`.
    pub fn initial_value(&self, x: &[f64]) -> f64 {
        let r = self.reference(x);
        match self.initial {
            InitialCondition::SmoothHump if self.dim == 1 => (-40.0 * (r[0] - 0.5).powi(2)).exp(),
            InitialCondition::SmoothHump => {
                let (mut rx, mut ry, cx, cy, w) = (0.45, 0.25, 0.0, -0.2, 10.0);
                if self.dim == 3 {
                    let s = 1.0 + 0.25 * (2.0 * PI * r[2]).cos();
                    rx *= s;
                    ry *= s;
                }
                erfc(w * (r[0] - cx - rx))
                    * erfc(-w * (r[0] - cx + rx))
                    * erfc(w * (r[1] - cy - ry))
                    * erfc(-w * (r[1] - cy + ry))
                    / 16.0
            }
            InitialCondition::PolarSine => {
                let rho = r[0].hypot(r[1]);
                let phi = r[1].atan2(r[0]);
                (PI * rho).sin().powi(2) * (3.0 * phi).sin()
            }
            InitialCondition::SineProduct => 0.5 * ((PI * r[0]).sin() * (PI * r[1]).sin() + 1.0),
            InitialCondition::SlottedCylinder => slotted_cylinder(r[0], r[1]),
            InitialCondition::Step => {
                if r[0] < 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Inflow boundary value; zero for every benchmark.
    pub fn inflow_value(&self, _x: &[f64]) -> f64 {
        0.0
    }
}

fn slotted_cylinder(x: f64, y: f64) -> f64 {
    let scale = 0.0225;
    let coef = 0.5 / f64::sqrt(scale);
    let slit = x <= -0.05 || x >= 0.05 || y >= 0.7;
    if slit && x * x + (y - 0.5).powi(2) <= 4.0 * scale {
        return 1.0;
    }
    let mut u = 0.0;
    if x * x + (y + 0.5).powi(2) <= 4.0 * scale {
        u += 1.0 - coef * x.hypot(y + 0.5);
    }
    if (x + 0.5).powi(2) + y * y <= 4.0 * scale {
        u += 0.25 * (1.0 + (PI * coef * (x + 0.5).hypot(y)).cos());
    }
    u
}
