pub mod classroom;
pub mod moves;
pub mod occupancy;
pub mod schedule;
pub mod scoring;
pub mod state;
pub mod teacher;

#[cfg(test)]
mod test_utils;

use thiserror::Error;

pub use classroom::Classroom;
pub use moves::{MoveError, MoveKind};
pub use occupancy::Occupancy;
pub use schedule::Schedule;
pub use state::State;
pub use teacher::Teacher;
pub use types::{
    Assignment, Interval, Placement, ScheduleConfig, SolveParams, SolveReport, SolveStatus,
    TimeSlot, Timetable,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid config: {0}")]
    Msg(String),
}

/// Structural checks only: unique names and well-formed intervals.
/// Feasibility problems surface later as conflicts or an infeasible solve.
pub fn validate(cfg: &ScheduleConfig) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    fn chk_unique<'a>(name: &str, ids: impl Iterator<Item = &'a str>, errors: &mut Vec<String>) {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                errors.push(format!("duplicate {name}: {id}"));
            }
        }
    }
    chk_unique("day", cfg.days.iter().map(String::as_str), &mut errors);
    chk_unique("course", cfg.courses.iter().map(|c| c.name.as_str()), &mut errors);
    chk_unique(
        "classroom",
        cfg.classrooms.iter().map(|c| c.name.as_str()),
        &mut errors,
    );
    chk_unique(
        "teacher",
        cfg.teachers.iter().map(|t| t.name.as_str()),
        &mut errors,
    );

    for i in &cfg.intervals {
        if i.start >= i.end {
            errors.push(format!("interval {i} is empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

pub trait Solver {
    fn solve(&self, config: &ScheduleConfig, params: &SolveParams) -> anyhow::Result<SolveReport>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::feasible_config;

    #[test]
    fn accepts_well_formed_config() {
        assert!(validate(&feasible_config()).is_ok());
    }

    #[test]
    fn reports_every_structural_problem() {
        let mut cfg = feasible_config();
        cfg.teachers.push(cfg.teachers[0].clone());
        cfg.intervals.push(Interval::new(14, 14));
        let err = validate(&cfg).unwrap_err().to_string();
        assert!(err.contains("duplicate teacher: Ana"));
        assert!(err.contains("interval 14-14 is empty"));
    }
}
