use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::debug;
use types::{Placement, TimeSlot};

use crate::schedule::{Schedule, FREE_SLOT_ATTEMPTS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("unknown move: {0}")]
    Unknown(String),
}

/// Neighbourhood moves of the local search, in the order neighbours are generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKind {
    SwitchTeachersSoftConflict,
    MoveCourseToFreeSlot,
    SwitchCoursesSameClassroom,
    MoveCourseToFreeSlotNoConflicts,
}

impl MoveKind {
    pub const ALL: [MoveKind; 4] = [
        MoveKind::SwitchTeachersSoftConflict,
        MoveKind::MoveCourseToFreeSlot,
        MoveKind::SwitchCoursesSameClassroom,
        MoveKind::MoveCourseToFreeSlotNoConflicts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MoveKind::SwitchTeachersSoftConflict => "switch_teachers_soft_conflict",
            MoveKind::MoveCourseToFreeSlot => "move_course_to_free_slot",
            MoveKind::SwitchCoursesSameClassroom => "switch_courses_same_classroom",
            MoveKind::MoveCourseToFreeSlotNoConflicts => "move_course_to_free_slot_no_conflicts",
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MoveKind {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoveKind::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| MoveError::Unknown(s.to_string()))
    }
}

impl Schedule {
    /// Relocates the first instance whose teacher has soft conflicts to a
    /// free preferred slot of the same classroom. Returns whether anything moved.
    pub fn move_course_to_free_slot<R: Rng>(&mut self, rng: &mut R) -> bool {
        for (course, placement) in self.assignment_instances() {
            let Some(teacher) = self.teacher(&placement.teacher) else {
                continue;
            };
            if !teacher.has_soft_conflicts() {
                continue;
            }
            let preferred = teacher.preferred_time_slots().to_vec();
            let Some(free) =
                self.find_free_time_slot(&placement.classroom, &preferred, FREE_SLOT_ATTEMPTS, rng)
            else {
                continue;
            };
            if !self
                .teacher(&placement.teacher)
                .is_some_and(|t| t.is_free_at_time(&free))
            {
                continue;
            }
            debug!(%course, from = %placement.slot, to = %free, "moving course to preferred slot");
            self.relocate(&course, &placement, free);
            return true;
        }
        false
    }

    /// First other instance held in `classroom` whose teacher prefers `future_slot`.
    pub fn find_course_that_moved_causes_no_conflicts(
        &self,
        classroom: &str,
        future_slot: &TimeSlot,
        exclude: (&str, &Placement),
    ) -> Option<(String, Placement)> {
        let room = self.classroom(classroom)?;
        self.assignment_instances().into_iter().find(|(course, p)| {
            (course.as_str(), p) != exclude
                && p.classroom == classroom
                && room.can_host_course(course)
                && self
                    .teacher(&p.teacher)
                    .is_some_and(|t| t.prefers(future_slot))
        })
    }

    /// Swaps the timeslots of two instances sharing a classroom when the
    /// partner's teacher prefers the slot it would receive.
    pub fn switch_courses_same_classroom(&mut self) -> bool {
        for (course, placement) in self.assignment_instances() {
            if !self
                .teacher(&placement.teacher)
                .is_some_and(|t| t.has_soft_conflicts())
            {
                continue;
            }
            let Some((other_course, other)) = self.find_course_that_moved_causes_no_conflicts(
                &placement.classroom,
                &placement.slot,
                (course.as_str(), &placement),
            ) else {
                continue;
            };

            debug!(
                %course, %other_course, a = %placement.slot, b = %other.slot,
                "swapping slots inside classroom {}", placement.classroom
            );
            self.relocate(&course, &placement, other.slot.clone());
            // Removal takes the earliest equal placement, so `other` is still the
            // original instance even if the first relocation produced its twin.
            self.relocate(&other_course, &other, placement.slot.clone());
            return true;
        }
        false
    }

    /// Moves one random instance to any free slot of its classroom, ignoring preferences.
    pub fn move_course_to_free_slot_no_conflicts<R: Rng>(&mut self, rng: &mut R) -> bool {
        let instances = self.assignment_instances();
        let Some((course, placement)) = instances.choose(rng) else {
            return false;
        };
        let universe = self.available_time_slots().to_vec();
        let Some(free) =
            self.find_free_time_slot(&placement.classroom, &universe, FREE_SLOT_ATTEMPTS, rng)
        else {
            return false;
        };
        debug!(%course, from = %placement.slot, to = %free, "moving course to free slot");
        self.relocate(course, placement, free);
        true
    }

    /// Rewrites the assignment map after two teachers trade one instance each:
    /// `first` moves from `teacher1` to `teacher2`, `second` the other way.
    /// Occupancy is the caller's job.
    pub fn switch_teachers_in_assignments(
        &mut self,
        teacher1: &str,
        teacher2: &str,
        first: (&TimeSlot, &str),
        second: (&TimeSlot, &str),
    ) {
        self.hand_over(first.1, first.0, teacher1, teacher2);
        self.hand_over(second.1, second.0, teacher2, teacher1);
    }

    fn hand_over(&mut self, course: &str, slot: &TimeSlot, from: &str, to: &str) {
        let Some(current) = self
            .placements_of(course)
            .iter()
            .find(|p| &p.slot == slot && p.teacher == from)
            .cloned()
        else {
            return;
        };
        self.remove_assignment(course, &current);
        self.push_assignment(
            course,
            Placement {
                teacher: to.to_string(),
                ..current
            },
        );
    }
}
