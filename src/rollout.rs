use crate::config::Plant;
use crate::{dynamics, Control, ControlSeq, State};

/// Smooth force limit: `u_max * (tanh(u) / 2 + 0.5)`, componentwise.
///
/// A bijection from the reals onto `(0, u_max)`. Unlike a hard clamp it
/// keeps the whole rollout differentiable, so the optimizer can push
/// gradients through the control limit.
pub fn saturate(u_max: f64, u: &Control) -> Control {
    u.map(|v| u_max * (v.tanh() / 2.0 + 0.5))
}

/// Componentwise derivative of [`saturate`] with respect to the raw control.
pub fn saturate_slope(u_max: f64, u: &Control) -> Control {
    u.map(|v| {
        let t = v.tanh();
        u_max / 2.0 * (1.0 - t * t)
    })
}

/// Shooting rollout: apply `H` raw controls from `x0` through the dynamics.
///
/// Each control column is saturated before it reaches the plant. Returns the
/// full trajectory (`H + 1` states, `x0` first) and the saturated controls
/// actually applied; the cost needs both, and the driver steps the true
/// plant with the first saturated column. The input sequence is never
/// mutated and the trajectory is owned by the caller.
pub fn rollout<const H: usize>(
    plant: &Plant,
    x0: &State,
    raw: &ControlSeq<H>,
) -> (Vec<State>, ControlSeq<H>) {
    let mut sat = ControlSeq::<H>::zeros();
    let mut trajectory = Vec::with_capacity(H + 1);
    trajectory.push(*x0);

    let mut x = *x0;
    for k in 0..H {
        let v = saturate(plant.u_max, &raw.column(k).into_owned());
        x = dynamics::step(plant, &x, &v);
        trajectory.push(x);
        sat.set_column(k, &v);
    }
    (trajectory, sat)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn saturation_stays_inside_the_open_interval() {
        let u_max = 2.0;
        // tanh rounds to exactly +-1 beyond |u| ~ 19, so the strictly-open
        // bound is checked where f64 can still resolve it, and the closed
        // bound plus finiteness everywhere else.
        for raw in [-18.0, -5.0, -1.0, 0.0, 1.0, 5.0, 18.0] {
            let v = saturate(u_max, &Control::new(raw, -raw));
            assert!(v[0] > 0.0 && v[0] < u_max, "sat({raw}) = {} out of range", v[0]);
            assert!(v[1] > 0.0 && v[1] < u_max);
        }
        for raw in [-1e9, -100.0, 100.0, 1e9] {
            let v = saturate(u_max, &Control::new(raw, -raw));
            assert!(v.iter().all(|x| x.is_finite() && *x >= 0.0 && *x <= u_max));
        }
    }

    #[test]
    fn saturation_is_monotonic_with_midpoint_at_zero() {
        let u_max = 2.0;
        assert_relative_eq!(saturate(u_max, &Control::zeros())[0], u_max / 2.0);

        let mut prev = f64::NEG_INFINITY;
        let mut raw = -15.0;
        while raw <= 15.0 {
            let v = saturate(u_max, &Control::new(raw, 0.0))[0];
            assert!(v > prev, "saturation not increasing at {raw}");
            prev = v;
            raw += 0.25;
        }
    }

    #[test]
    fn slope_matches_finite_differences() {
        let u_max = 2.0;
        let h = 1e-6;
        for raw in [-3.0, -0.7, 0.0, 0.4, 2.5] {
            let u = Control::new(raw, raw / 2.0);
            let slope = saturate_slope(u_max, &u);
            for i in 0..2 {
                let mut up = u;
                let mut um = u;
                up[i] += h;
                um[i] -= h;
                let fd = (saturate(u_max, &up)[i] - saturate(u_max, &um)[i]) / (2.0 * h);
                assert_relative_eq!(slope[i], fd, epsilon = 1e-8, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn rollout_has_one_more_state_than_controls() {
        const H: usize = 12;
        let plant = Plant::default();
        let raw = ControlSeq::<H>::from_fn(|i, j| 0.1 * (i as f64 - j as f64));
        let (trajectory, sat) = rollout(&plant, &State::zeros(), &raw);
        assert_eq!(trajectory.len(), H + 1);
        assert_eq!(sat.ncols(), H);
        assert_eq!(trajectory[0], State::zeros());
    }

    #[test]
    fn rollout_is_reproducible() {
        const H: usize = 6;
        let plant = Plant::default();
        let x0 = State::new(0.1, 0.2, -0.3, 0.0, 0.0, 0.1);
        let raw = ControlSeq::<H>::from_element(0.3);
        let (ta, sa) = rollout(&plant, &x0, &raw);
        let (tb, sb) = rollout(&plant, &x0, &raw);
        assert_eq!(ta, tb);
        assert_eq!(sa, sb);
    }
}
