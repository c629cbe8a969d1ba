use std::collections::HashMap;

use rand::Rng;
use tracing::warn;
use types::{
    Assignment, Booking, CourseSpec, DayRow, Interval, IntervalRow, Placement, RoomCell,
    ScheduleConfig, TimeSlot, Timetable,
};

use crate::classroom::Classroom;
use crate::teacher::Teacher;

/// Random draws spent looking for a free slot before giving up.
pub const FREE_SLOT_ATTEMPTS: usize = 100;

/// Classrooms, teachers, course demand and the current assignment map.
///
/// The assignment map and the classroom/teacher occupancy ledgers are kept in
/// agreement by the mutation helpers below; occupancy can only be touched
/// through them or through the `add_course`/`remove_course` calls of a
/// borrowed classroom or teacher.
#[derive(Clone, Debug)]
pub struct Schedule {
    days: Vec<String>,
    intervals: Vec<Interval>,
    courses: Vec<CourseSpec>,
    classrooms: Vec<Classroom>,
    teachers: Vec<Teacher>,
    classroom_index: HashMap<String, usize>,
    teacher_index: HashMap<String, usize>,
    available_time_slots: Vec<TimeSlot>,
    assignments: Vec<(String, Vec<Placement>)>,
}

impl Schedule {
    pub fn new(config: &ScheduleConfig) -> Self {
        let available_time_slots = generate_available_time_slots(&config.days, &config.intervals);

        let classrooms: Vec<Classroom> =
            config.classrooms.iter().map(Classroom::from_spec).collect();
        let teachers: Vec<Teacher> = config
            .teachers
            .iter()
            .map(|t| {
                let preferred =
                    find_preferred_time_slots(&t.constraints, &config.days, &config.intervals);
                Teacher::new(t.name.clone(), t.courses.iter().cloned(), preferred)
            })
            .collect();

        let classroom_index = classrooms
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name().to_string(), i))
            .collect();
        let teacher_index = teachers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();

        Self {
            days: config.days.clone(),
            intervals: config.intervals.clone(),
            courses: config.courses.clone(),
            classrooms,
            teachers,
            classroom_index,
            teacher_index,
            available_time_slots,
            assignments: Vec::new(),
        }
    }

    pub fn days(&self) -> &[String] {
        &self.days
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Course demand table in its current order.
    pub fn courses(&self) -> &[CourseSpec] {
        &self.courses
    }

    pub fn classrooms(&self) -> &[Classroom] {
        &self.classrooms
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn classroom(&self, name: &str) -> Option<&Classroom> {
        self.classroom_index.get(name).map(|&i| &self.classrooms[i])
    }

    pub fn teacher(&self, name: &str) -> Option<&Teacher> {
        self.teacher_index.get(name).map(|&i| &self.teachers[i])
    }

    pub fn classroom_mut(&mut self, name: &str) -> Option<&mut Classroom> {
        self.classroom_index
            .get(name)
            .map(|&i| &mut self.classrooms[i])
    }

    pub fn teacher_mut(&mut self, name: &str) -> Option<&mut Teacher> {
        self.teacher_index.get(name).map(|&i| &mut self.teachers[i])
    }

    pub fn available_time_slots(&self) -> &[TimeSlot] {
        &self.available_time_slots
    }

    pub fn assignments(&self) -> &[(String, Vec<Placement>)] {
        &self.assignments
    }

    pub fn placements_of(&self, course: &str) -> &[Placement] {
        self.assignments
            .iter()
            .find(|(c, _)| c == course)
            .map(|(_, p)| p.as_slice())
            .unwrap_or_default()
    }

    /// Every assigned (course, placement) pair in map order.
    pub fn assignment_instances(&self) -> Vec<(String, Placement)> {
        self.assignments
            .iter()
            .flat_map(|(course, ps)| ps.iter().map(move |p| (course.clone(), p.clone())))
            .collect()
    }

    pub fn flat_assignments(&self) -> Vec<Assignment> {
        self.assignment_instances()
            .into_iter()
            .map(|(course, placement)| Assignment { course, placement })
            .collect()
    }

    /// Appends to the assignment map only; occupancy is left alone.
    pub fn push_assignment(&mut self, course: &str, placement: Placement) {
        match self.assignments.iter_mut().find(|(c, _)| c == course) {
            Some((_, ps)) => ps.push(placement),
            None => self.assignments.push((course.to_string(), vec![placement])),
        }
    }

    /// Removes the first equal placement from the assignment map only.
    pub fn remove_assignment(&mut self, course: &str, placement: &Placement) -> bool {
        let Some((_, ps)) = self.assignments.iter_mut().find(|(c, _)| c == course) else {
            return false;
        };
        match ps.iter().position(|p| p == placement) {
            Some(i) => {
                ps.remove(i);
                true
            }
            None => false,
        }
    }

    /// Drops the course's entry from the assignment map if no placement is left.
    pub fn prune_empty_assignment(&mut self, course: &str) {
        self.assignments
            .retain(|(c, ps)| c != course || !ps.is_empty());
    }

    /// Records the placement in the named classroom's and teacher's occupancy.
    pub fn book(&mut self, course: &str, placement: &Placement) {
        if let Some(room) = self.classroom_mut(&placement.classroom) {
            room.add_course(course, &placement.slot);
        }
        if let Some(teacher) = self.teacher_mut(&placement.teacher) {
            teacher.add_course(course, &placement.slot);
        }
    }

    pub fn unbook(&mut self, course: &str, placement: &Placement) {
        if let Some(room) = self.classroom_mut(&placement.classroom) {
            room.remove_course(course, &placement.slot);
        }
        if let Some(teacher) = self.teacher_mut(&placement.teacher) {
            teacher.remove_course(course, &placement.slot);
        }
    }

    /// Appends and books in one step.
    pub fn assign(&mut self, course: &str, placement: Placement) {
        self.book(course, &placement);
        self.push_assignment(course, placement);
    }

    /// Moves one instance to `slot`, keeping classroom and teacher.
    pub fn relocate(&mut self, course: &str, placement: &Placement, slot: TimeSlot) {
        self.unbook(course, placement);
        self.remove_assignment(course, placement);
        let moved = Placement {
            slot,
            ..placement.clone()
        };
        self.book(course, &moved);
        self.push_assignment(course, moved);
    }

    /// Samples `candidates` uniformly until the classroom is free at the draw.
    /// Gives up after `max_attempts` misses, so a free slot can be missed.
    pub fn find_free_time_slot<R: Rng>(
        &self,
        classroom: &str,
        candidates: &[TimeSlot],
        max_attempts: usize,
        rng: &mut R,
    ) -> Option<TimeSlot> {
        let room = self.classroom(classroom)?;
        if candidates.is_empty() {
            return None;
        }
        for _ in 0..max_attempts {
            let slot = &candidates[rng.gen_range(0..candidates.len())];
            if !room.is_occupied_at_time(slot) {
                return Some(slot.clone());
            }
        }
        None
    }

    /// Stable sort of the course table by how many teachers can teach each course.
    pub fn reorder_by_nr_teachers(&mut self) {
        let teachers = &self.teachers;
        self.courses.sort_by_key(|c| {
            teachers
                .iter()
                .filter(|t| t.can_teach_course(&c.name))
                .count()
        });
    }

    pub fn to_timetable(&self) -> Timetable {
        let mut timetable = Timetable {
            days: self
                .days
                .iter()
                .map(|day| DayRow {
                    day: day.clone(),
                    intervals: self
                        .intervals
                        .iter()
                        .map(|&interval| IntervalRow {
                            interval,
                            rooms: self
                                .classrooms
                                .iter()
                                .map(|c| RoomCell {
                                    classroom: c.name().to_string(),
                                    booking: None,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        };

        for (course, placements) in &self.assignments {
            for p in placements {
                let cell = timetable
                    .days
                    .iter_mut()
                    .find(|d| d.day == p.slot.day)
                    .and_then(|d| d.intervals.iter_mut().find(|i| i.interval == p.slot.interval))
                    .and_then(|i| i.rooms.iter_mut().find(|r| r.classroom == p.classroom));
                if let Some(cell) = cell {
                    cell.booking = Some(Booking {
                        teacher: p.teacher.clone(),
                        course: course.clone(),
                    });
                }
            }
        }
        timetable
    }
}

pub fn generate_available_time_slots(days: &[String], intervals: &[Interval]) -> Vec<TimeSlot> {
    days.iter()
        .flat_map(|d| intervals.iter().map(move |&i| TimeSlot::new(d.clone(), i)))
        .collect()
}

/// Applies `!<day>` and `!<h1>-<h2>` tokens in order to working copies of
/// the day and interval lists and returns the cross product of what is left.
pub fn find_preferred_time_slots(
    constraints: &[String],
    days: &[String],
    intervals: &[Interval],
) -> Vec<TimeSlot> {
    let mut days = days.to_vec();
    let mut intervals = intervals.to_vec();

    for constraint in constraints {
        let Some(banned) = constraint.strip_prefix('!') else {
            continue;
        };
        if banned.contains('-') {
            match parse_interval(banned) {
                Some(range) => intervals.retain(|i| !i.is_within(&range)),
                None => warn!(%constraint, "skipping malformed interval constraint"),
            }
        } else {
            days.retain(|d| d != banned);
        }
    }

    generate_available_time_slots(&days, &intervals)
}

fn parse_interval(s: &str) -> Option<Interval> {
    let (start, end) = s.split_once('-')?;
    Some(Interval::new(
        start.trim().parse().ok()?,
        end.trim().parse().ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn universe_is_day_major_cross_product() {
        let slots = generate_available_time_slots(
            &strings(&["Mon", "Tue"]),
            &[Interval::new(8, 10), Interval::new(10, 12)],
        );
        assert_eq!(
            slots,
            vec![
                slot("Mon", 8, 10),
                slot("Mon", 10, 12),
                slot("Tue", 8, 10),
                slot("Tue", 10, 12),
            ]
        );
    }

    #[test]
    fn day_and_interval_bans_compose() {
        let intervals = [Interval::new(8, 10), Interval::new(10, 12), Interval::new(12, 14)];
        let preferred = find_preferred_time_slots(
            &strings(&["!Tue", "!8-12", "Lunch", "!x-y"]),
            &strings(&["Mon", "Tue", "Wed"]),
            &intervals,
        );
        assert_eq!(preferred, vec![slot("Mon", 12, 14), slot("Wed", 12, 14)]);
    }

    #[test]
    fn partially_overlapping_interval_is_kept() {
        let preferred = find_preferred_time_slots(
            &strings(&["!9-12"]),
            &strings(&["Mon"]),
            &[Interval::new(8, 10), Interval::new(10, 12)],
        );
        assert_eq!(preferred, vec![slot("Mon", 8, 10)]);
    }

    #[test]
    fn free_slot_search_skips_occupied_slots() {
        let mut schedule = Schedule::new(&two_slot_config());
        let taken = slot("Mon", 8, 10);
        schedule.assign("Math", Placement::new("R1", "Ana", taken.clone()));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let universe = schedule.available_time_slots().to_vec();
        for _ in 0..20 {
            let found = schedule
                .find_free_time_slot("R1", &universe, FREE_SLOT_ATTEMPTS, &mut rng)
                .unwrap();
            assert_ne!(found, taken);
        }
        assert_eq!(
            schedule.find_free_time_slot("R1", &[taken], FREE_SLOT_ATTEMPTS, &mut rng),
            None
        );
        assert_eq!(
            schedule.find_free_time_slot("R1", &[], FREE_SLOT_ATTEMPTS, &mut rng),
            None
        );
    }

    #[test]
    fn reorder_puts_most_constrained_course_first() {
        let mut schedule = Schedule::new(&two_slot_config());
        let order: Vec<_> = schedule.courses().iter().map(|c| c.name.clone()).collect();
        assert_eq!(order, ["Math", "Art"]);
        schedule.reorder_by_nr_teachers();
        let order: Vec<_> = schedule.courses().iter().map(|c| c.name.clone()).collect();
        assert_eq!(order, ["Art", "Math"]);
    }

    #[test]
    fn relocate_keeps_map_and_occupancy_in_step() {
        let mut schedule = Schedule::new(&two_slot_config());
        let from = Placement::new("R1", "Ana", slot("Mon", 8, 10));
        schedule.assign("Math", from.clone());
        schedule.relocate("Math", &from, slot("Mon", 10, 12));

        assert_eq!(
            schedule.placements_of("Math"),
            &[Placement::new("R1", "Ana", slot("Mon", 10, 12))]
        );
        let room = schedule.classroom("R1").unwrap();
        assert!(room.is_free_at_time(&slot("Mon", 8, 10)));
        assert!(room.is_occupied_at_time(&slot("Mon", 10, 12)));
        let ana = schedule.teacher("Ana").unwrap();
        assert!(ana.is_occupied_at_time(&slot("Mon", 10, 12)));
    }

    #[test]
    fn timetable_lists_every_cell() {
        let mut schedule = Schedule::new(&two_slot_config());
        schedule.assign("Math", Placement::new("R1", "Ana", slot("Mon", 10, 12)));
        let grid = schedule.to_timetable();
        assert_eq!(grid.days.len(), 1);
        assert_eq!(grid.days[0].intervals.len(), 2);
        assert!(grid.cell("Mon", Interval::new(8, 10), "R1").is_none());
        let booked = grid.cell("Mon", Interval::new(10, 12), "R1").unwrap();
        assert_eq!(booked.teacher, "Ana");
        assert_eq!(booked.course, "Math");
    }

    #[test]
    fn pruning_only_drops_empty_entries() {
        let mut schedule = Schedule::new(&two_slot_config());
        let p = Placement::new("R1", "Ana", slot("Mon", 8, 10));
        schedule.push_assignment("Math", p.clone());
        schedule.prune_empty_assignment("Math");
        assert_eq!(schedule.assignments().len(), 1);
        assert!(schedule.remove_assignment("Math", &p));
        schedule.prune_empty_assignment("Math");
        assert!(schedule.assignments().is_empty());
    }
}
