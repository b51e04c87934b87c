extern crate nalgebra as na;

pub mod config;
pub mod cost;
pub mod driver;
pub mod dynamics;
pub mod rollout;
pub mod sampler;

/// Plant state `[px, py, theta, vx, vy, omega]`.
pub type State = na::Vector6<f64>;
/// Rotor forces `[u1, u2]`, raw (pre-saturation) unless stated otherwise.
pub type Control = na::Vector2<f64>;
/// Control plan over a horizon of `H` steps, one column per step.
/// A rollout of `H` controls visits `H + 1` states.
pub type ControlSeq<const H: usize> = na::SMatrix<f64, 2, H>;
