use crate::config::{Plant, Weights};
use crate::{dynamics, rollout, ControlSeq, State};

/// Tracking-plus-effort cost of one control plan.
///
/// `J = ((sum_k e_k' Q e_k + v_k' R v_k + e_H' Q_f e_H) / (H + 1))^2`
/// with `e = x - target` and `v` the saturated controls. Dividing by the
/// trajectory length keeps values comparable across horizon choices;
/// squaring the normalized sum steepens the landscape away from the target,
/// which the stochastic sampler relies on.
pub fn cost<const H: usize>(plant: &Plant, weights: &Weights, x0: &State, raw: &ControlSeq<H>) -> f64 {
    let (trajectory, sat) = rollout::rollout(plant, x0, raw);
    normalize::<H>(accumulate(weights, &trajectory, &sat))
}

/// Cost and its gradient with respect to the raw control sequence.
///
/// Reverse sweep through the unrolled rollout: the adjoint `lambda_k = dS/dx_k`
/// is propagated backwards with the per-step Jacobians, each step's control
/// sensitivity is pulled through the saturation slope, and the outer
/// normalize-then-square is applied by the chain rule at the end.
pub fn cost_grad<const H: usize>(
    plant: &Plant,
    weights: &Weights,
    x0: &State,
    raw: &ControlSeq<H>,
) -> (f64, ControlSeq<H>) {
    let (trajectory, sat) = rollout::rollout(plant, x0, raw);
    let s = accumulate(weights, &trajectory, &sat);

    let mut grad = ControlSeq::<H>::zeros();
    let e_terminal = trajectory[H] - weights.target;
    let mut lambda: State = 2.0 * (weights.qf * e_terminal);

    for k in (0..H).rev() {
        let v = sat.column(k).into_owned();
        let (a, b) = dynamics::step_jacobians(plant, &trajectory[k], &v);

        // dS/dv_k: the effort term plus everything downstream of x_{k+1}.
        let dv = b.transpose() * lambda + 2.0 * (weights.r * v);
        let slope = rollout::saturate_slope(plant.u_max, &raw.column(k).into_owned());
        grad[(0, k)] = slope[0] * dv[0];
        grad[(1, k)] = slope[1] * dv[1];

        let e = trajectory[k] - weights.target;
        lambda = a.transpose() * lambda + 2.0 * (weights.q * e);
    }

    // J = (S/N)^2  =>  dJ/dU = 2 S / N^2 * dS/dU
    let n = (H + 1) as f64;
    grad *= 2.0 * s / (n * n);
    (normalize::<H>(s), grad)
}

/// Unnormalized sum `S` over one rollout: stage terms on the first `H`
/// states and the saturated controls, terminal term on the last state.
fn accumulate<const H: usize>(weights: &Weights, trajectory: &[State], sat: &ControlSeq<H>) -> f64 {
    let mut s = 0.0;
    for k in 0..H {
        let e = trajectory[k] - weights.target;
        let v = sat.column(k).into_owned();
        s += e.dot(&(weights.q * e)) + v.dot(&(weights.r * v));
    }
    let e = trajectory[H] - weights.target;
    s + e.dot(&(weights.qf * e))
}

fn normalize<const H: usize>(s: f64) -> f64 {
    let n = (H + 1) as f64;
    (s / n).powi(2)
}
