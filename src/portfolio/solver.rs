//! # Projected Gradient
//!
//! $$
//! \mathbf{w}_{k+1} = \Pi_\Delta\big(\mathbf{w}_k - t_k \nabla f(\mathbf{w}_k)\big),\qquad
//! \Delta = \{\mathbf{w}\ge 0,\ \mathbf 1^\top\mathbf{w}=1\}
//! $$
//!
//! Projected gradient descent on the probability simplex with Armijo
//! backtracking. Every iterate satisfies the box and budget constraints.

use argmin::core::CostFunction;
use argmin::core::Error;
use argmin::core::Gradient;
use argmin::core::IterState;
use argmin::core::Problem;
use argmin::core::Solver;
use argmin::core::State;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::core::KV;
use argmin::kv;

/// Iteration state used by [`ProjectedGradient`].
pub type SimplexState = IterState<Vec<f64>, Vec<f64>, (), (), (), f64>;

const SHRINK: f64 = 0.5;
const GROW: f64 = 2.0;
const MAX_STEP_SCALE: f64 = 1e3;
const MIN_STEP_SCALE: f64 = 1e-20;

/// Euclidean projection onto the probability simplex (sort-based).
pub fn project_simplex(v: &[f64]) -> Vec<f64> {
  if v.is_empty() {
    return Vec::new();
  }

  let mut u = v.to_vec();
  u.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

  let mut cssv = 0.0;
  let mut rho = 0;
  let mut theta = 0.0;
  for (i, ui) in u.iter().enumerate() {
    cssv += ui;
    let t = (cssv - 1.0) / (i + 1) as f64;
    if ui - t > 0.0 {
      rho = i + 1;
      theta = t;
    }
  }

  if rho == 0 {
    return vec![1.0 / v.len() as f64; v.len()];
  }

  let mut w: Vec<f64> = v.iter().map(|x| (x - theta).max(0.0)).collect();
  let total: f64 = w.iter().sum();
  if total > 1e-15 {
    for x in &mut w {
      *x /= total;
    }
  }
  w
}

/// Projected gradient solver for smooth objectives over the simplex.
#[derive(Clone, Debug)]
pub struct ProjectedGradient {
  initial_step: f64,
  tolerance: f64,
  step: f64,
  last_move: f64,
}

impl ProjectedGradient {
  pub fn new(initial_step: f64, tolerance: f64) -> Self {
    Self {
      initial_step,
      tolerance,
      step: initial_step / GROW,
      last_move: f64::INFINITY,
    }
  }
}

impl<O> Solver<O, SimplexState> for ProjectedGradient
where
  O: CostFunction<Param = Vec<f64>, Output = f64> + Gradient<Param = Vec<f64>, Gradient = Vec<f64>>,
{
  const NAME: &'static str = "Projected Gradient";

  fn init(
    &mut self,
    problem: &mut Problem<O>,
    state: SimplexState,
  ) -> Result<(SimplexState, Option<KV>), Error> {
    let w = state
      .get_param()
      .ok_or_else(|| anyhow::anyhow!("projected gradient needs an initial allocation"))?;
    let w = project_simplex(w);
    let cost = problem.cost(&w)?;
    if !cost.is_finite() {
      anyhow::bail!("objective is not finite at the initial allocation");
    }
    Ok((state.param(w).cost(cost), None))
  }

  fn next_iter(
    &mut self,
    problem: &mut Problem<O>,
    mut state: SimplexState,
  ) -> Result<(SimplexState, Option<KV>), Error> {
    let w = state
      .take_param()
      .ok_or_else(|| anyhow::anyhow!("projected gradient lost its current allocation"))?;
    let cost = problem.cost(&w)?;
    let grad = problem.gradient(&w)?;
    if !cost.is_finite() || grad.iter().any(|g| !g.is_finite()) {
      anyhow::bail!("objective or gradient is not finite at {w:?}");
    }

    let min_step = self.initial_step * MIN_STEP_SCALE;
    let mut step = (self.step * GROW).min(self.initial_step * MAX_STEP_SCALE);

    loop {
      let trial: Vec<f64> = w.iter().zip(&grad).map(|(wi, gi)| wi - step * gi).collect();
      let candidate = project_simplex(&trial);
      let delta: Vec<f64> = candidate.iter().zip(&w).map(|(c, wi)| c - wi).collect();
      let new_cost = problem.cost(&candidate)?;

      let linear: f64 = grad.iter().zip(&delta).map(|(g, d)| g * d).sum();
      let quad: f64 = delta.iter().map(|d| d * d).sum::<f64>() / (2.0 * step);
      if new_cost.is_finite() && new_cost <= cost + linear + quad {
        self.step = step;
        self.last_move = delta.iter().fold(0.0f64, |acc, d| acc.max(d.abs()));
        let kv = kv!("step" => step; "move" => self.last_move;);
        return Ok((state.param(candidate).cost(new_cost).gradient(grad), Some(kv)));
      }

      step *= SHRINK;
      if step < min_step {
        // No descent along the projected arc: the current point is stationary.
        self.step = min_step;
        self.last_move = 0.0;
        return Ok((state.param(w).cost(cost).gradient(grad), None));
      }
    }
  }

  fn terminate(&mut self, _state: &SimplexState) -> TerminationStatus {
    if self.last_move <= self.tolerance {
      TerminationStatus::Terminated(TerminationReason::SolverConverged)
    } else {
      TerminationStatus::NotTerminated
    }
  }
}
