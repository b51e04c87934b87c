use anyhow::{ensure, Result};
use log::debug;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::{Anneal, Plant, Weights};
use crate::sampler::Langevin;
use crate::{dynamics, rollout, Control, ControlSeq, State};

/// What one control cycle hands to the logging/visualization sink.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// True plant state after applying the chosen action.
    pub state: State,
    /// Saturated control actually applied to the plant.
    pub control: Control,
    /// Cost of the winning candidate.
    pub best_cost: f64,
    /// Index of the winning candidate within the population.
    pub best_index: usize,
    /// Non-finite candidate updates skipped during this cycle.
    pub rejected: usize,
}

/// Receding-horizon controller: owns the true plant state and a population
/// of candidate plans, re-optimizes every cycle and executes only the first
/// action of the winner.
pub struct Controller<const H: usize> {
    sampler: Langevin<H>,
    plant: Plant,
    anneal: Anneal,
    x: State,
    population: Vec<ControlSeq<H>>,
    rngs: Vec<Xoshiro256PlusPlus>,
    step_size: f64,
}

impl<const H: usize> Controller<H> {
    /// Fails fast on invalid configuration; after this, a run has no error
    /// conditions. Candidate RNGs are `jump()`-separated sub-streams of the
    /// root seed, one per candidate for the whole run.
    pub fn new(
        plant: Plant,
        weights: Weights,
        anneal: Anneal,
        x0: State,
        samples: usize,
    ) -> Result<Self> {
        plant.validate()?;
        weights.validate()?;
        anneal.validate()?;
        ensure!(H > 0, "horizon must be at least one step");
        ensure!(samples > 0, "population must not be empty");
        ensure!(x0.iter().all(|v| v.is_finite()), "initial state must be finite");

        let mut root = Xoshiro256PlusPlus::seed_from_u64(anneal.seed);
        let rngs = (0..samples)
            .map(|_| {
                let rng = root.clone();
                root.jump();
                rng
            })
            .collect();

        Ok(Self {
            sampler: Langevin::new(plant, weights, anneal.j_scale),
            plant,
            anneal,
            x: x0,
            population: vec![ControlSeq::<H>::zeros(); samples],
            rngs,
            step_size: anneal.step_size,
        })
    }

    pub fn state(&self) -> &State {
        &self.x
    }

    /// Current anneal step size (end-of-cycle value when `carry_anneal`).
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Warm start: shift the plan one step left and duplicate the tail, so
    /// the next cycle refines last cycle's plan instead of starting over.
    fn shift(u: &mut ControlSeq<H>) {
        for k in 0..H.saturating_sub(1) {
            let next = u.column(k + 1).into_owned();
            u.set_column(k, &next);
        }
        // Last column keeps the former final value.
    }

    /// One control cycle: warm-start, anneal the sampler, pick the cheapest
    /// candidate, apply its first saturated control to the true plant.
    pub fn cycle(&mut self) -> CycleOutcome {
        for u in &mut self.population {
            Self::shift(u);
        }

        if !self.anneal.carry_anneal {
            self.step_size = self.anneal.step_size;
        }
        let mut rejected = 0;
        for _ in 0..self.anneal.iters {
            let diag = self
                .sampler
                .step(&self.x, &mut self.population, &mut self.rngs, self.step_size);
            rejected += diag.rejected;
            self.step_size *= self.anneal.decay;
        }

        let costs = self.sampler.evaluate(&self.x, &self.population);
        // First index wins ties: selection must be deterministic.
        let (best_index, best_cost) = costs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |(bi, bc), (i, c)| {
                if c < bc {
                    (i, c)
                } else {
                    (bi, bc)
                }
            });

        let (_, sat) = rollout::rollout(&self.plant, &self.x, &self.population[best_index]);
        let control = sat.column(0).into_owned();
        self.x = dynamics::step(&self.plant, &self.x, &control);

        debug!(
            "cycle: best candidate {best_index}, cost {best_cost:.4e}, theta {:.3}",
            self.x[2]
        );
        CycleOutcome {
            state: self.x,
            control,
            best_cost,
            best_index,
            rejected,
        }
    }

    /// Run a fixed number of cycles, handing each outcome to the sink.
    /// Best-effort: a poorly optimized cycle still advances the plant.
    pub fn run(&mut self, cycles: usize, mut sink: impl FnMut(usize, &CycleOutcome)) {
        for i in 0..cycles {
            let outcome = self.cycle();
            sink(i, &outcome);
        }
    }
}
