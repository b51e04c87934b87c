use anyhow::{ensure, Result};
use nalgebra as na;

use crate::State;

/// Physical constants of the planar birotor and the integration step.
#[derive(Debug, Clone, Copy)]
pub struct Plant {
    /// Vehicle mass [kg].
    pub mass: f64,
    /// Moment of inertia about the body axis [kg m^2].
    pub inertia: f64,
    /// Gravitational acceleration [m/s^2].
    pub gravity: f64,
    /// Rotor arm length [m].
    pub arm: f64,
    /// Upper bound of the smooth force saturation [N].
    pub u_max: f64,
    /// Integration time step [s].
    pub dt: f64,
}

impl Default for Plant {
    fn default() -> Self {
        Self {
            mass: 0.1,
            inertia: 0.1,
            gravity: 9.81,
            arm: 0.1,
            u_max: 2.0,
            dt: 0.1,
        }
    }
}

impl Plant {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.mass > 0.0, "mass must be positive, got {}", self.mass);
        ensure!(
            self.inertia > 0.0,
            "inertia must be positive, got {}",
            self.inertia
        );
        ensure!(self.arm > 0.0, "arm must be positive, got {}", self.arm);
        ensure!(
            self.u_max > 0.0,
            "u_max must be positive, got {}",
            self.u_max
        );
        ensure!(self.dt > 0.0, "dt must be positive, got {}", self.dt);
        Ok(())
    }
}

/// Quadratic cost weights and the tracking target.
#[derive(Debug, Clone)]
pub struct Weights {
    /// Stage state weight.
    pub q: na::Matrix6<f64>,
    /// Terminal state weight.
    pub qf: na::Matrix6<f64>,
    /// Stage effort weight on the saturated controls.
    pub r: na::Matrix2<f64>,
    /// Desired state.
    pub target: State,
}

impl Default for Weights {
    fn default() -> Self {
        let q = na::Matrix6::from_diagonal(&na::Vector6::new(1.0, 1.0, 5.0, 0.1, 0.1, 0.1));
        Self {
            q,
            qf: 10.0 * q,
            r: na::Matrix2::from_diagonal_element(0.01),
            // One full turn: equivalent to upright but forces the optimizer
            // to plan a rotation rather than sit at the trivial optimum.
            target: State::new(0.0, 0.0, std::f64::consts::TAU, 0.0, 0.0, 0.0),
        }
    }
}

impl Weights {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.target.iter().all(|v| v.is_finite()), "target must be finite");
        ensure_psd_6("Q", &self.q)?;
        ensure_psd_6("Q_f", &self.qf)?;
        ensure!(
            (self.r - self.r.transpose()).norm() <= 1e-9,
            "R must be symmetric"
        );
        ensure!(
            self.r.symmetric_eigenvalues().iter().all(|&l| l >= -1e-9),
            "R must be positive semi-definite"
        );
        Ok(())
    }
}

fn ensure_psd_6(name: &str, m: &na::Matrix6<f64>) -> Result<()> {
    ensure!((m - m.transpose()).norm() <= 1e-9, "{name} must be symmetric");
    ensure!(
        m.symmetric_eigenvalues().iter().all(|&l| l >= -1e-9),
        "{name} must be positive semi-definite"
    );
    Ok(())
}

/// Hyperparameters of the annealed Langevin sampler.
#[derive(Debug, Clone, Copy)]
pub struct Anneal {
    /// Step size at the start of a control cycle.
    pub step_size: f64,
    /// Geometric decay applied after every inner iteration, in (0, 1].
    pub decay: f64,
    /// Inner iterations per control cycle.
    pub iters: usize,
    /// Gain on the gradient term relative to the injected noise.
    pub j_scale: f64,
    /// Root seed for the per-candidate random streams.
    pub seed: u64,
    /// Continue the anneal schedule across cycles instead of resetting
    /// `step_size` each cycle. Off by default: re-exploring each shifted
    /// horizon is the behavior the controller was tuned with.
    pub carry_anneal: bool,
}

impl Default for Anneal {
    fn default() -> Self {
        Self {
            step_size: 0.02,
            decay: 0.95,
            iters: 100,
            j_scale: 0.01,
            seed: 0,
            carry_anneal: false,
        }
    }
}

impl Anneal {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.step_size > 0.0,
            "step_size must be positive, got {}",
            self.step_size
        );
        ensure!(
            self.decay > 0.0 && self.decay <= 1.0,
            "decay must be in (0, 1], got {}",
            self.decay
        );
        ensure!(self.iters > 0, "iters must be positive");
        ensure!(
            self.j_scale > 0.0,
            "j_scale must be positive, got {}",
            self.j_scale
        );
        Ok(())
    }
}
