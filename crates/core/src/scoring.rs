use std::collections::HashMap;

use types::CourseSpec;

use crate::schedule::Schedule;

/// Hard-conflict tally split by cause.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HardConflicts {
    pub unqualified_teachers: u32,
    pub unsuitable_classrooms: u32,
    pub seat_shortfalls: u32,
    pub overloaded_teachers: u32,
    pub teacher_overlaps: u32,
    pub classroom_overlaps: u32,
}

impl HardConflicts {
    pub fn total(&self) -> u32 {
        self.unqualified_teachers
            + self.unsuitable_classrooms
            + self.seat_shortfalls
            + self.overloaded_teachers
            + self.teacher_overlaps
            + self.classroom_overlaps
    }
}

/// Courses whose seated total is still below their demand.
pub fn seat_shortfalls(courses: &[CourseSpec], seats: &HashMap<String, u32>) -> u32 {
    courses
        .iter()
        .filter(|c| seats.get(&c.name).copied().unwrap_or(0) < c.students)
        .count() as u32
}

/// Full rescan of the schedule. `seats` is cleared and rebuilt from the
/// assignment map.
pub fn compute_hard_conflicts(
    schedule: &Schedule,
    seats: &mut HashMap<String, u32>,
) -> HardConflicts {
    seats.clear();
    let mut hc = HardConflicts::default();

    for (course, placements) in schedule.assignments() {
        for p in placements {
            if !schedule
                .teacher(&p.teacher)
                .is_some_and(|t| t.can_teach_course(course))
            {
                hc.unqualified_teachers += 1;
            }
            let room = schedule.classroom(&p.classroom);
            if !room.is_some_and(|r| r.can_host_course(course)) {
                hc.unsuitable_classrooms += 1;
            }
            *seats.entry(course.clone()).or_insert(0) += room.map_or(0, |r| r.capacity());
        }
    }

    hc.seat_shortfalls = seat_shortfalls(schedule.courses(), seats);

    for t in schedule.teachers() {
        if t.is_teaching_too_much() {
            hc.overloaded_teachers += 1;
        }
        hc.teacher_overlaps += t.count_overlaps();
    }
    for c in schedule.classrooms() {
        hc.classroom_overlaps += c.count_overlaps();
    }
    hc
}

/// One point per occupied slot outside the teacher's preferred set.
pub fn compute_soft_conflicts(schedule: &Schedule) -> u32 {
    schedule
        .teachers()
        .iter()
        .map(|t| {
            t.occupancy()
                .iter()
                .filter(|(slot, _)| !t.prefers(slot))
                .count() as u32
        })
        .sum()
}
