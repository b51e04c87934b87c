use log::warn;
use rand::prelude::*;
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

use crate::config::{Plant, Weights};
use crate::{cost, ControlSeq, State};

/// Per-call health report of a batch update.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    /// Candidates whose proposed update contained a non-finite entry and
    /// therefore kept their previous sequence.
    pub rejected: usize,
}

/// Annealed Langevin sampler over a population of control plans.
///
/// One inner iteration moves every candidate independently:
///
/// `U' = U - step_size * j_scale * grad J(x0, U) + sqrt(2 * step_size) * z`
///
/// with `z` i.i.d. standard normal over the flattened sequence. The caller
/// owns the anneal schedule and shrinks `step_size` between iterations, so
/// late iterations inject less noise and the population settles into the
/// cost minimum. Candidates are embarrassingly parallel; each owns its RNG
/// stream, which keeps runs reproducible under rayon scheduling.
pub struct Langevin<const H: usize> {
    plant: Plant,
    weights: Weights,
    j_scale: f64,
}

impl<const H: usize> Langevin<H> {
    pub fn new(plant: Plant, weights: Weights, j_scale: f64) -> Self {
        Self {
            plant,
            weights,
            j_scale,
        }
    }

    /// One noisy gradient step for every candidate in the population.
    pub fn step(
        &self,
        x0: &State,
        population: &mut [ControlSeq<H>],
        rngs: &mut [Xoshiro256PlusPlus],
        step_size: f64,
    ) -> Diagnostics {
        debug_assert_eq!(population.len(), rngs.len());
        let noise_scale = (2.0 * step_size).sqrt();

        let rejected: usize = population
            .par_iter_mut()
            .zip(rngs.par_iter_mut())
            .map(|(u, rng)| {
                let (_, grad) = cost::cost_grad(&self.plant, &self.weights, x0, u);
                let noise = ControlSeq::<H>::from_fn(|_, _| rng.sample(StandardNormal));
                let proposal = *u - step_size * self.j_scale * grad + noise_scale * noise;
                if proposal.iter().all(|v| v.is_finite()) {
                    *u = proposal;
                    0
                } else {
                    1
                }
            })
            .sum();

        if rejected > 0 {
            warn!("langevin: {rejected} candidate update(s) non-finite, kept previous sequences");
        }
        Diagnostics { rejected }
    }

    /// Cost of every candidate at the current plant state.
    pub fn evaluate(&self, x0: &State, population: &[ControlSeq<H>]) -> Vec<f64> {
        population
            .par_iter()
            .map(|u| cost::cost(&self.plant, &self.weights, x0, u))
            .collect()
    }
}
