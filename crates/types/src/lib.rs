use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open hour range `[start, end)` of one teaching interval.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord,
)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// True when `self` lies entirely within the closed range `[outer.start, outer.end]`.
    pub fn is_within(&self, outer: &Interval) -> bool {
        self.start >= outer.start && self.end <= outer.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(
    Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord,
)]
pub struct TimeSlot {
    pub day: String,
    pub interval: Interval,
}

impl TimeSlot {
    pub fn new(day: impl Into<String>, interval: Interval) -> Self {
        Self {
            day: day.into(),
            interval,
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.interval)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct CourseSpec {
    pub name: String,
    pub students: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClassroomSpec {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub subjects: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct TeacherSpec {
    pub name: String,
    #[serde(default)]
    pub courses: Vec<String>,
    /// Raw preference tokens: `!<day>` bans a day, `!<h1>-<h2>` bans intervals inside `[h1, h2]`.
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// Parsed input handed over by the configuration reader. Every table keeps
/// declaration order.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ScheduleConfig {
    pub days: Vec<String>,
    pub intervals: Vec<Interval>,
    pub courses: Vec<CourseSpec>,
    pub classrooms: Vec<ClassroomSpec>,
    pub teachers: Vec<TeacherSpec>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Greedy construction followed by stochastic hill climbing.
    Hc,
    /// Most-constrained-first backtracking.
    Csp,
}

fn default_max_iters() -> usize {
    10_000
}

fn default_max_no_improvement() -> usize {
    100
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct SolveParams {
    pub solver: SolverKind,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
    #[serde(default = "default_max_no_improvement")]
    pub max_no_improvement: usize,
}

impl SolveParams {
    pub fn new(solver: SolverKind, seed: u64) -> Self {
        Self {
            solver,
            seed,
            max_iters: default_max_iters(),
            max_no_improvement: default_max_no_improvement(),
        }
    }
}

/// One scheduled instance of a course: where, by whom and when.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash)]
pub struct Placement {
    pub classroom: String,
    pub teacher: String,
    pub slot: TimeSlot,
}

impl Placement {
    pub fn new(classroom: impl Into<String>, teacher: impl Into<String>, slot: TimeSlot) -> Self {
        Self {
            classroom: classroom.into(),
            teacher: teacher.into(),
            slot,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct Assignment {
    pub course: String,
    #[serde(flatten)]
    pub placement: Placement,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct Booking {
    pub teacher: String,
    pub course: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct RoomCell {
    pub classroom: String,
    pub booking: Option<Booking>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct IntervalRow {
    pub interval: Interval,
    pub rooms: Vec<RoomCell>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct DayRow {
    pub day: String,
    pub intervals: Vec<IntervalRow>,
}

/// Day -> interval -> classroom grid consumed by the presentation layer.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct Timetable {
    pub days: Vec<DayRow>,
}

impl Timetable {
    pub fn cell(&self, day: &str, interval: Interval, classroom: &str) -> Option<&Booking> {
        self.days
            .iter()
            .find(|d| d.day == day)?
            .intervals
            .iter()
            .find(|i| i.interval == interval)?
            .rooms
            .iter()
            .find(|r| r.classroom == classroom)?
            .booking
            .as_ref()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Solved,
    LocalOptimum,
    Infeasible,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub hard_conflicts: u32,
    pub soft_conflicts: u32,
    pub assignments: Vec<Assignment>,
    pub timetable: Timetable,
    pub stats: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_containment_is_inclusive_on_both_bounds() {
        let banned = Interval::new(8, 12);
        assert!(Interval::new(8, 10).is_within(&banned));
        assert!(Interval::new(10, 12).is_within(&banned));
        assert!(!Interval::new(12, 14).is_within(&banned));
        assert!(!Interval::new(6, 10).is_within(&banned));
    }

    #[test]
    fn params_fill_defaults() {
        let p: SolveParams = serde_json::from_str(r#"{"solver":"csp"}"#).unwrap();
        assert_eq!(p.solver, SolverKind::Csp);
        assert_eq!(p.seed, 0);
        assert_eq!(p.max_iters, 10_000);
        assert_eq!(p.max_no_improvement, 100);
    }

    #[test]
    fn config_parses_with_optional_tables_omitted() {
        let cfg: ScheduleConfig = serde_json::from_value(serde_json::json!({
            "days": ["Mon"],
            "intervals": [{"start": 8, "end": 10}],
            "courses": [{"name": "Math", "students": 20}],
            "classrooms": [{"name": "R1", "capacity": 30}],
            "teachers": [{"name": "Ana"}]
        }))
        .unwrap();
        assert!(cfg.classrooms[0].subjects.is_empty());
        assert!(cfg.teachers[0].constraints.is_empty());
    }
}
