use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sched_core::{Schedule, ScheduleConfig, SolveParams, SolveReport, SolveStatus, Solver, State};
use tracing::{debug, info};

pub struct HeurSolver;
impl HeurSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeurSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for HeurSolver {
    fn solve(&self, config: &ScheduleConfig, params: &SolveParams) -> anyhow::Result<SolveReport> {
        sched_core::validate(config)?;
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

        let mut initial = State::new(Schedule::new(config));
        initial.generate_initial_schedule(&mut rng);
        info!(
            hard = initial.hard_conflicts(),
            soft = initial.soft_conflicts(),
            "initial schedule built"
        );

        let outcome = stochastic_hill_climbing(
            &initial,
            ClimbParams {
                max_iters: params.max_iters,
                max_no_improvement: params.max_no_improvement,
            },
            &mut rng,
        );
        info!(
            hard = outcome.state.hard_conflicts(),
            soft = outcome.state.soft_conflicts(),
            iterations = outcome.iterations,
            states = outcome.states_explored,
            "hill climbing finished"
        );

        let status = if outcome.solved {
            SolveStatus::Solved
        } else {
            SolveStatus::LocalOptimum
        };
        Ok(outcome.state.to_report(
            status,
            serde_json::json!({
                "method": "hc",
                "iterations": outcome.iterations,
                "states": outcome.states_explored,
                "initial_hard": initial.hard_conflicts(),
                "initial_soft": initial.soft_conflicts(),
            }),
        ))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ClimbParams {
    pub max_iters: usize,
    pub max_no_improvement: usize,
}

impl Default for ClimbParams {
    fn default() -> Self {
        Self {
            max_iters: 10_000,
            max_no_improvement: 100,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClimbOutcome {
    /// Final state has neither hard nor soft conflicts.
    pub solved: bool,
    pub iterations: usize,
    /// Every neighbour generated, duplicates included.
    pub states_explored: usize,
    /// Consecutive accepted moves without a strict improvement at exit.
    pub stalled: usize,
    pub state: State,
}

/// Plateau-tolerant descent: each round draws uniformly among the neighbours
/// that are no worse on both hard and soft conflicts.
pub fn stochastic_hill_climbing<R: Rng>(
    initial: &State,
    params: ClimbParams,
    rng: &mut R,
) -> ClimbOutcome {
    let mut state = initial.clone();
    let mut iterations = 0usize;
    let mut states_explored = 0usize;
    let mut stalled = 0usize;

    while iterations < params.max_iters && stalled < params.max_no_improvement {
        iterations += 1;

        let neighbors = state.get_next_states(rng);
        states_explored += neighbors.len();

        let mut accepted: Vec<State> = neighbors
            .into_iter()
            .filter(|n| {
                n.hard_conflicts() <= state.hard_conflicts()
                    && n.soft_conflicts() <= state.soft_conflicts()
            })
            .collect();
        if accepted.is_empty() {
            debug!(iterations, "local optimum reached");
            break;
        }

        let next = accepted.swap_remove(rng.gen_range(0..accepted.len()));
        if next.hard_conflicts() < state.hard_conflicts()
            || next.soft_conflicts() < state.soft_conflicts()
        {
            stalled = 0;
        } else {
            stalled += 1;
        }
        debug!(
            iterations,
            hard = next.hard_conflicts(),
            soft = next.soft_conflicts(),
            stalled,
            "accepted neighbour"
        );
        state = next;

        if state.is_final() {
            break;
        }
    }

    ClimbOutcome {
        solved: state.is_final(),
        iterations,
        states_explored,
        stalled,
        state,
    }
}
