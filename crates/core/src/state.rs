use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, error};
use types::{Placement, SolveReport, SolveStatus};

use crate::moves::{MoveError, MoveKind};
use crate::schedule::{Schedule, FREE_SLOT_ATTEMPTS};
use crate::scoring;

/// Attempts spent looking for two teachers that can trade a soft-conflicting course.
pub const SWITCH_TEACHER_ATTEMPTS: usize = 1000;

/// How many times a neighbour applies its move before being scored.
pub const MOVE_REPEATS: usize = 3;

/// A schedule together with its scored conflicts and per-course seat counter.
#[derive(Clone, Debug)]
pub struct State {
    schedule: Schedule,
    hard_conflicts: u32,
    soft_conflicts: u32,
    seats_filled: HashMap<String, u32>,
}

impl State {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            hard_conflicts: 0,
            soft_conflicts: 0,
            seats_filled: HashMap::new(),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    pub fn hard_conflicts(&self) -> u32 {
        self.hard_conflicts
    }

    pub fn soft_conflicts(&self) -> u32 {
        self.soft_conflicts
    }

    pub fn all_conflicts(&self) -> u32 {
        self.hard_conflicts + self.soft_conflicts
    }

    pub fn is_final(&self) -> bool {
        self.hard_conflicts == 0 && self.soft_conflicts == 0
    }

    pub fn seats_filled(&self, course: &str) -> u32 {
        self.seats_filled.get(course).copied().unwrap_or(0)
    }

    pub fn increase_seats(&mut self, course: &str, seats: u32) {
        *self.seats_filled.entry(course.to_string()).or_insert(0) += seats;
    }

    pub fn decrease_seats(&mut self, course: &str, seats: u32) {
        if let Some(filled) = self.seats_filled.get_mut(course) {
            *filled = filled.saturating_sub(seats);
        }
    }

    pub fn conflicts_caused_by_not_enough_seats(&self) -> u32 {
        scoring::seat_shortfalls(self.schedule.courses(), &self.seats_filled)
    }

    /// Rescans the whole schedule, rebuilding the seat counter on the way.
    pub fn compute_hard_conflicts(&mut self) -> u32 {
        let hc = scoring::compute_hard_conflicts(&self.schedule, &mut self.seats_filled);
        debug!(?hc, "hard conflicts");
        self.hard_conflicts = hc.total();
        self.hard_conflicts
    }

    pub fn compute_soft_conflicts(&mut self) -> u32 {
        self.soft_conflicts = scoring::compute_soft_conflicts(&self.schedule);
        self.soft_conflicts
    }

    /// Greedy randomized construction: each course in table order takes
    /// (classroom, teacher, slot) triples until its demand is seated or a
    /// full pass over the classrooms places nothing.
    pub fn generate_initial_schedule<R: Rng>(&mut self, rng: &mut R) {
        let courses = self.schedule.courses().to_vec();
        let universe = self.schedule.available_time_slots().to_vec();

        for course in &courses {
            let mut remaining = i64::from(course.students);

            let mut classrooms: Vec<String> = self
                .schedule
                .classrooms()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            let mut teachers: Vec<String> = self
                .schedule
                .teachers()
                .iter()
                .map(|t| t.name().to_string())
                .collect();
            classrooms.shuffle(rng);
            teachers.shuffle(rng);

            while remaining > 0 {
                let mut assigned = false;

                for classroom in &classrooms {
                    let Some(slot) =
                        self.schedule
                            .find_free_time_slot(classroom, &universe, FREE_SLOT_ATTEMPTS, rng)
                    else {
                        continue;
                    };
                    let Some(room) = self.schedule.classroom(classroom) else {
                        continue;
                    };
                    if !room.can_host_course(&course.name) || room.is_occupied_at_time(&slot) {
                        continue;
                    }
                    let capacity = room.capacity();

                    let teacher = teachers.iter().find(|name| {
                        self.schedule.teacher(name).is_some_and(|t| {
                            !t.is_teaching_too_much()
                                && t.is_free_at_time(&slot)
                                && t.has_available_time_slot()
                                && t.can_teach_course(&course.name)
                        })
                    });
                    if let Some(teacher) = teacher {
                        self.schedule.assign(
                            &course.name,
                            Placement::new(classroom.clone(), teacher.clone(), slot),
                        );
                        remaining -= i64::from(capacity);
                        assigned = true;
                        break;
                    }
                }

                if !assigned {
                    debug!(
                        course = %course.name,
                        remaining,
                        "no placement left, course stays short"
                    );
                    break;
                }
            }
        }

        self.compute_hard_conflicts();
        self.compute_soft_conflicts();
    }

    /// Neighbour produced by repeating `kind` on an independent copy.
    pub fn apply_move<R: Rng>(&self, kind: MoveKind, rng: &mut R) -> State {
        let mut neighbor = self.clone();
        for _ in 0..MOVE_REPEATS {
            match kind {
                MoveKind::SwitchTeachersSoftConflict => {
                    neighbor.switch_teachers_soft_conflict(rng);
                }
                MoveKind::MoveCourseToFreeSlot => {
                    neighbor.schedule.move_course_to_free_slot(rng);
                }
                MoveKind::SwitchCoursesSameClassroom => {
                    neighbor.schedule.switch_courses_same_classroom();
                }
                MoveKind::MoveCourseToFreeSlotNoConflicts => {
                    neighbor.schedule.move_course_to_free_slot_no_conflicts(rng);
                }
            }
        }
        neighbor.compute_hard_conflicts();
        neighbor.compute_soft_conflicts();
        neighbor
    }

    pub fn apply_named_move<R: Rng>(&self, name: &str, rng: &mut R) -> Result<State, MoveError> {
        let kind = name.parse::<MoveKind>().map_err(|e| {
            error!(%name, "invalid move");
            e
        })?;
        Ok(self.apply_move(kind, rng))
    }

    /// One neighbour per move kind, in `MoveKind::ALL` order.
    pub fn get_next_states<R: Rng>(&self, rng: &mut R) -> Vec<State> {
        MoveKind::ALL
            .iter()
            .map(|&kind| self.apply_move(kind, rng))
            .collect()
    }

    /// Trades one soft-conflicting course instance between two teachers that
    /// can each teach the other's course at a slot they do not prefer.
    pub fn switch_teachers_soft_conflict<R: Rng>(&mut self, rng: &mut R) -> bool {
        for _ in 0..SWITCH_TEACHER_ATTEMPTS {
            let candidates: Vec<&str> = self
                .schedule
                .teachers()
                .iter()
                .filter(|t| t.has_soft_conflicts())
                .map(|t| t.name())
                .collect();
            let Some(&name1) = candidates.choose(rng) else {
                return false;
            };
            let others: Vec<&str> =
                candidates.iter().copied().filter(|&n| n != name1).collect();
            let Some(&name2) = others.choose(rng) else {
                return false;
            };

            let (Some(teacher1), Some(teacher2)) =
                (self.schedule.teacher(name1), self.schedule.teacher(name2))
            else {
                return false;
            };
            let conflicts1 = teacher1.courses_that_cause_soft_conflicts();
            let conflicts2 = teacher2.courses_that_cause_soft_conflicts();
            let from_t1 = teacher2.find_course_in_other_teacher_conflicts(&conflicts1);
            let from_t2 = teacher1.find_course_in_other_teacher_conflicts(&conflicts2);

            let (Some((slot1, course1)), Some((slot2, course2))) = (from_t1, from_t2) else {
                continue;
            };
            if !teacher1.is_free_at_time(&slot2) || !teacher2.is_free_at_time(&slot1) {
                continue;
            }

            let (name1, name2) = (name1.to_string(), name2.to_string());
            debug!(%name1, %name2, %course1, %course2, "switching teachers");
            if let Some(t1) = self.schedule.teacher_mut(&name1) {
                t1.remove_course(&course1, &slot1);
                t1.add_course(&course2, &slot2);
            }
            if let Some(t2) = self.schedule.teacher_mut(&name2) {
                t2.remove_course(&course2, &slot2);
                t2.add_course(&course1, &slot1);
            }
            self.schedule.switch_teachers_in_assignments(
                &name1,
                &name2,
                (&slot1, &course1),
                (&slot2, &course2),
            );
            return true;
        }
        false
    }

    pub fn to_report(&self, status: SolveStatus, stats: serde_json::Value) -> SolveReport {
        SolveReport {
            status,
            hard_conflicts: self.hard_conflicts,
            soft_conflicts: self.soft_conflicts,
            assignments: self.schedule.flat_assignments(),
            timetable: self.schedule.to_timetable(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn hard_conflict_recount_is_idempotent() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut state = State::new(Schedule::new(&feasible_config()));
        state.generate_initial_schedule(&mut rng);
        let first = state.compute_hard_conflicts();
        let seats: Vec<u32> = ["Math", "Art"].iter().map(|c| state.seats_filled(c)).collect();
        let second = state.compute_hard_conflicts();
        assert_eq!(first, second);
        let again: Vec<u32> = ["Math", "Art"].iter().map(|c| state.seats_filled(c)).collect();
        assert_eq!(seats, again);
    }

    #[test]
    fn all_conflicts_sums_hard_and_soft() {
        // Art is never seated and Ana teaches outside her preferred slot.
        let mut schedule = Schedule::new(&preference_config());
        schedule.assign("Math", Placement::new("R1", "Ana", slot("Mon", 8, 10)));
        let mut state = State::new(schedule);
        assert_eq!(state.compute_hard_conflicts(), 1);
        assert_eq!(state.compute_soft_conflicts(), 1);
        assert_eq!(state.all_conflicts(), 2);
        assert!(!state.is_final());
    }

    #[test]
    fn greedy_leaves_oversized_course_short() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut state = State::new(Schedule::new(&single_slot_config(40)));
        state.generate_initial_schedule(&mut rng);
        assert_eq!(state.schedule().placements_of("Math").len(), 1);
        assert_eq!(state.seats_filled("Math"), 30);
        assert!(state.hard_conflicts() >= 1);
        assert_eq!(state.conflicts_caused_by_not_enough_seats(), 1);
    }

    #[test]
    fn greedy_keeps_map_and_occupancy_in_step() {
        for seed in 0..10 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut state = State::new(Schedule::new(&feasible_config()));
            state.generate_initial_schedule(&mut rng);
            assert_consistent(state.schedule());
            for (course, placements) in state.schedule().assignments() {
                for p in placements {
                    let room = state.schedule().classroom(&p.classroom).unwrap();
                    assert!(room.can_host_course(course));
                    let teacher = state.schedule().teacher(&p.teacher).unwrap();
                    assert!(teacher.can_teach_course(course));
                }
            }
        }
    }

    #[test]
    fn neighbours_come_one_per_move_and_leave_parent_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut state = State::new(Schedule::new(&feasible_config()));
        state.generate_initial_schedule(&mut rng);
        let before = state.schedule().flat_assignments();

        let neighbours = state.get_next_states(&mut rng);
        assert_eq!(neighbours.len(), MoveKind::ALL.len());
        assert_eq!(state.schedule().flat_assignments(), before);
        for n in &neighbours {
            assert_consistent(n.schedule());
        }
    }

    #[test]
    fn unknown_move_yields_no_state() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let state = State::new(Schedule::new(&feasible_config()));
        assert_eq!(
            state.apply_named_move("shuffle_everything", &mut rng).err(),
            Some(MoveError::Unknown("shuffle_everything".into()))
        );
        assert!(state
            .apply_named_move("move_course_to_free_slot", &mut rng)
            .is_ok());
    }

    #[test]
    fn teachers_trade_soft_conflicting_courses() {
        // Bob prefers the slot Ana would hand over, so no trade qualifies.
        let mut schedule = Schedule::new(&preference_config());
        schedule.assign("Math", Placement::new("R1", "Ana", slot("Mon", 8, 10)));
        schedule.assign("Art", Placement::new("R2", "Bob", slot("Mon", 10, 12)));
        let mut state = State::new(schedule);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        assert!(!state.switch_teachers_soft_conflict(&mut rng));

        let mut schedule = Schedule::new(&trade_config());
        schedule.assign("Math", Placement::new("R1", "Ana", slot("Mon", 8, 10)));
        schedule.assign("Art", Placement::new("R2", "Bob", slot("Mon", 10, 12)));
        let mut state = State::new(schedule);

        assert!(state.switch_teachers_soft_conflict(&mut rng));
        assert_eq!(
            state.schedule().placements_of("Math"),
            &[Placement::new("R1", "Bob", slot("Mon", 8, 10))]
        );
        assert_eq!(
            state.schedule().placements_of("Art"),
            &[Placement::new("R2", "Ana", slot("Mon", 10, 12))]
        );
        assert_consistent(state.schedule());
    }
}
