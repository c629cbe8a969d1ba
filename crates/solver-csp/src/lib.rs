mod backtrack;

pub use backtrack::{generate_domains, Constraint, Csp, Domains, SearchStats, CONSTRAINTS};

use sched_core::{Schedule, ScheduleConfig, SolveParams, SolveReport, SolveStatus, Solver, State};
use tracing::info;

pub struct CspSolver;
impl CspSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CspSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for CspSolver {
    fn solve(&self, config: &ScheduleConfig, _params: &SolveParams) -> anyhow::Result<SolveReport> {
        sched_core::validate(config)?;
        info!("received config with {} courses", config.courses.len());

        let schedule = Schedule::new(config);
        let (solution, stats) = Csp::new(State::new(schedule.clone())).solve();
        info!(
            nodes = stats.nodes,
            backtracks = stats.backtracks,
            solved = solution.is_some(),
            "csp search finished"
        );

        let stats_json = serde_json::json!({
            "method": "csp",
            "nodes": stats.nodes,
            "backtracks": stats.backtracks,
        });
        Ok(match solution {
            Some(state) => state.to_report(SolveStatus::Solved, stats_json),
            None => {
                // Scored on the empty schedule, so every course with demand is short.
                let mut unsolved = State::new(schedule);
                unsolved.compute_hard_conflicts();
                unsolved.compute_soft_conflicts();
                unsolved.to_report(SolveStatus::Infeasible, stats_json)
            }
        })
    }
}
