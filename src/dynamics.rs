use nalgebra as na;

use crate::config::Plant;
use crate::{Control, State};

/// One forward-Euler step of the planar birotor.
///
/// The rotors push along the body normal, so the total force `u1 + u2`
/// tilts with the orientation while `u1 - u2` produces torque about the
/// body axis. Pure and deterministic: the cost gradient differentiates
/// through repeated calls.
pub fn step(plant: &Plant, x: &State, u: &Control) -> State {
    let (sin_t, cos_t) = x[2].sin_cos();
    let force = u[0] + u[1];
    let torque = u[0] - u[1];

    let ax = -force * sin_t / plant.mass;
    let ay = force * cos_t / plant.mass - plant.gravity;
    let alpha = plant.arm * torque / plant.inertia;

    let dt = plant.dt;
    State::new(
        x[0] + dt * x[3],
        x[1] + dt * x[4],
        x[2] + dt * x[5],
        x[3] + dt * ax,
        x[4] + dt * ay,
        x[5] + dt * alpha,
    )
}

/// Jacobians of one Euler step: `A = d step / d x`, `B = d step / d u`.
///
/// Consumed by the backward (adjoint) sweep of the cost gradient. Only the
/// trigonometric terms depend on the operating point; everything else is
/// constant in `dt` and the plant constants.
pub fn step_jacobians(plant: &Plant, x: &State, u: &Control) -> (na::Matrix6<f64>, na::Matrix6x2<f64>) {
    let (sin_t, cos_t) = x[2].sin_cos();
    let force = u[0] + u[1];
    let dt = plant.dt;

    let mut a = na::Matrix6::identity();
    a[(0, 3)] = dt;
    a[(1, 4)] = dt;
    a[(2, 5)] = dt;
    a[(3, 2)] = -dt * force * cos_t / plant.mass;
    a[(4, 2)] = -dt * force * sin_t / plant.mass;

    let mut b = na::Matrix6x2::zeros();
    b[(3, 0)] = -dt * sin_t / plant.mass;
    b[(3, 1)] = b[(3, 0)];
    b[(4, 0)] = dt * cos_t / plant.mass;
    b[(4, 1)] = b[(4, 0)];
    b[(5, 0)] = dt * plant.arm / plant.inertia;
    b[(5, 1)] = -b[(5, 0)];

    (a, b)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn step_is_deterministic() {
        let plant = Plant::default();
        let x = State::new(0.3, -0.2, 0.7, 1.0, -0.5, 0.2);
        let u = Control::new(0.8, 1.1);
        let a = step(&plant, &x, &u);
        let b = step(&plant, &x, &u);
        assert_eq!(a, b);
    }

    #[test]
    fn hover_is_an_equilibrium() {
        let plant = Plant::default();
        // Equal rotor forces summing to m*g at zero tilt: nothing moves.
        let hover = plant.mass * plant.gravity / 2.0;
        let x = State::zeros();
        let u = Control::new(hover, hover);
        let next = step(&plant, &x, &u);
        assert_relative_eq!(next, x, epsilon = 1e-12);
    }

    #[test]
    fn gravity_pulls_down_without_thrust() {
        let plant = Plant::default();
        let next = step(&plant, &State::zeros(), &Control::zeros());
        assert_relative_eq!(next[4], -plant.dt * plant.gravity, epsilon = 1e-12);
    }

    #[test]
    fn jacobians_match_finite_differences() {
        let plant = Plant::default();
        let x = State::new(0.1, -0.4, 1.2, 0.3, 0.6, -0.9);
        let u = Control::new(1.3, 0.4);
        let (a, b) = step_jacobians(&plant, &x, &u);

        let h = 1e-6;
        for j in 0..6 {
            let mut xp = x;
            let mut xm = x;
            xp[j] += h;
            xm[j] -= h;
            let col = (step(&plant, &xp, &u) - step(&plant, &xm, &u)) / (2.0 * h);
            assert_relative_eq!(a.column(j).into_owned(), col, epsilon = 1e-8, max_relative = 1e-6);
        }
        for j in 0..2 {
            let mut up = u;
            let mut um = u;
            up[j] += h;
            um[j] -= h;
            let col = (step(&plant, &x, &up) - step(&plant, &x, &um)) / (2.0 * h);
            assert_relative_eq!(b.column(j).into_owned(), col, epsilon = 1e-8, max_relative = 1e-6);
        }
    }
}
