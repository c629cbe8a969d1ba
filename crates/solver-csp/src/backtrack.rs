use std::collections::HashMap;

use sched_core::{Placement, Schedule, State};
use serde::Serialize;
use tracing::trace;

/// Precomputed candidate triples per course.
pub type Domains = HashMap<String, Vec<Placement>>;

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub backtracks: u64,
}

/// Static filter over every (classroom, teacher, slot) combination, evaluated
/// once against the schedule as it stands now.
pub fn generate_domains(schedule: &Schedule) -> Domains {
    let mut domains = Domains::new();
    for course in schedule.courses() {
        let values = domains.entry(course.name.clone()).or_default();
        for room in schedule.classrooms() {
            for teacher in schedule.teachers() {
                for slot in schedule.available_time_slots() {
                    if teacher.prefers(slot)
                        && !room.is_occupied_at_time(slot)
                        && room.can_host_course(&course.name)
                        && teacher.can_teach_course(&course.name)
                    {
                        values.push(Placement::new(room.name(), teacher.name(), slot.clone()));
                    }
                }
            }
        }
    }
    domains
}

pub struct Constraint {
    pub name: &'static str,
    check: fn(&Schedule, &str, &Placement) -> bool,
}

impl Constraint {
    pub fn holds(&self, schedule: &Schedule, course: &str, value: &Placement) -> bool {
        (self.check)(schedule, course, value)
    }
}

/// Checked in order against the tentative assignment; the first failure rejects the value.
pub const CONSTRAINTS: [Constraint; 9] = [
    Constraint {
        name: "classroom_free",
        check: |s, _, v| {
            s.classroom(&v.classroom)
                .is_some_and(|r| !r.is_occupied_at_time(&v.slot))
        },
    },
    Constraint {
        name: "classroom_hosts_course",
        check: |s, course, v| {
            s.classroom(&v.classroom)
                .is_some_and(|r| r.can_host_course(course))
        },
    },
    Constraint {
        name: "teacher_qualified",
        check: |s, course, v| {
            s.teacher(&v.teacher)
                .is_some_and(|t| t.can_teach_course(course))
        },
    },
    Constraint {
        name: "preferred_slot",
        check: |s, _, v| s.teacher(&v.teacher).is_some_and(|t| t.prefers(&v.slot)),
    },
    Constraint {
        name: "teacher_free",
        check: |s, _, v| {
            s.teacher(&v.teacher)
                .is_some_and(|t| t.is_free_at_time(&v.slot))
        },
    },
    Constraint {
        name: "teacher_has_capacity",
        check: |s, _, v| {
            s.teacher(&v.teacher)
                .is_some_and(|t| t.has_available_time_slot())
        },
    },
    Constraint {
        name: "teacher_not_overloaded",
        check: |s, _, v| {
            s.teacher(&v.teacher)
                .is_some_and(|t| !t.is_teaching_too_much())
        },
    },
    Constraint {
        name: "classroom_without_overlaps",
        check: |s, _, v| {
            s.classroom(&v.classroom)
                .is_some_and(|r| r.count_overlaps() == 0)
        },
    },
    Constraint {
        name: "teacher_without_overlaps",
        check: |s, _, v| s.teacher(&v.teacher).is_some_and(|t| t.count_overlaps() == 0),
    },
];

/// Most-constrained-first backtracking over fixed domains, mutating one
/// shared state and undoing every commit on failure.
pub struct Csp {
    state: State,
    stats: SearchStats,
}

impl Csp {
    pub fn new(state: State) -> Self {
        Self {
            state,
            stats: SearchStats::default(),
        }
    }

    pub fn solve(mut self) -> (Option<State>, SearchStats) {
        let domains = generate_domains(self.state.schedule());
        self.state.schedule_mut().reorder_by_nr_teachers();
        // Sync the seat counter with whatever is already assigned.
        self.state.compute_hard_conflicts();

        if backtrack(&mut self.state, &domains, &mut self.stats) {
            self.state.compute_hard_conflicts();
            self.state.compute_soft_conflicts();
            (Some(self.state), self.stats)
        } else {
            (None, self.stats)
        }
    }
}

fn backtrack(state: &mut State, domains: &Domains, stats: &mut SearchStats) -> bool {
    stats.nodes += 1;
    if state.conflicts_caused_by_not_enough_seats() == 0 {
        return true;
    }

    let Some(course) = state
        .schedule()
        .courses()
        .iter()
        .find(|c| state.seats_filled(&c.name) < c.students)
        .map(|c| c.name.clone())
    else {
        return true;
    };

    for value in domains.get(&course).map(Vec::as_slice).unwrap_or_default() {
        state.schedule_mut().push_assignment(&course, value.clone());

        if let Some(failed) = CONSTRAINTS
            .iter()
            .find(|c| !c.holds(state.schedule(), &course, value))
        {
            trace!(
                %course,
                constraint = failed.name,
                "rejected {} / {} at {}",
                value.classroom,
                value.teacher,
                value.slot
            );
            state.schedule_mut().remove_assignment(&course, value);
            continue;
        }

        let capacity = state
            .schedule()
            .classroom(&value.classroom)
            .map_or(0, |r| r.capacity());
        state.schedule_mut().book(&course, value);
        state.increase_seats(&course, capacity);

        if backtrack(state, domains, stats) {
            return true;
        }

        stats.backtracks += 1;
        state.decrease_seats(&course, capacity);
        state.schedule_mut().unbook(&course, value);
        state.schedule_mut().remove_assignment(&course, value);
    }

    state.schedule_mut().prune_empty_assignment(&course);
    false
}
