use std::collections::HashSet;

use types::TimeSlot;

use crate::occupancy::Occupancy;

/// Distinct occupied slots at which a teacher counts as overloaded.
pub const MAX_WEEKLY_SLOTS: usize = 7;

/// Slots of one teacher's occupancy that fall outside their preferred set.
pub type SoftConflicts = Vec<(TimeSlot, Vec<String>)>;

#[derive(Clone, Debug)]
pub struct Teacher {
    name: String,
    courses: HashSet<String>,
    preferred: Vec<TimeSlot>,
    preferred_set: HashSet<TimeSlot>,
    occupancy: Occupancy,
}

impl Teacher {
    pub fn new(
        name: impl Into<String>,
        courses: impl IntoIterator<Item = String>,
        preferred: Vec<TimeSlot>,
    ) -> Self {
        let preferred_set = preferred.iter().cloned().collect();
        Self {
            name: name.into(),
            courses: courses.into_iter().collect(),
            preferred,
            preferred_set,
            occupancy: Occupancy::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn preferred_time_slots(&self) -> &[TimeSlot] {
        &self.preferred
    }

    pub fn prefers(&self, slot: &TimeSlot) -> bool {
        self.preferred_set.contains(slot)
    }

    pub fn can_teach_course(&self, course: &str) -> bool {
        self.courses.contains(course)
    }

    pub fn is_occupied_at_time(&self, slot: &TimeSlot) -> bool {
        self.occupancy.is_occupied(slot)
    }

    pub fn is_free_at_time(&self, slot: &TimeSlot) -> bool {
        !self.occupancy.is_occupied(slot)
    }

    pub fn add_course(&mut self, course: &str, slot: &TimeSlot) {
        self.occupancy.add(course, slot);
    }

    pub fn remove_course(&mut self, course: &str, slot: &TimeSlot) {
        self.occupancy.remove(course, slot);
    }

    /// A teacher takes at most as many course instances as they have preferred slots.
    pub fn has_available_time_slot(&self) -> bool {
        self.occupancy.bookings() < self.preferred.len()
    }

    pub fn is_teaching_too_much(&self) -> bool {
        self.occupancy.occupied_slots() >= MAX_WEEKLY_SLOTS
    }

    pub fn courses_that_cause_soft_conflicts(&self) -> SoftConflicts {
        self.occupancy
            .iter()
            .filter(|(slot, _)| !self.prefers(slot))
            .map(|(slot, courses)| (slot.clone(), courses.to_vec()))
            .collect()
    }

    pub fn has_soft_conflicts(&self) -> bool {
        self.occupancy.iter().any(|(slot, _)| !self.prefers(slot))
    }

    /// Scans another teacher's soft conflicts for a course this teacher could
    /// take over at a slot it does not prefer either. The last match in scan
    /// order is returned.
    pub fn find_course_in_other_teacher_conflicts(
        &self,
        other: &[(TimeSlot, Vec<String>)],
    ) -> Option<(TimeSlot, String)> {
        let mut found = None;
        for (slot, courses) in other {
            for course in courses {
                if self.can_teach_course(course) && !self.prefers(slot) {
                    found = Some((slot.clone(), course.clone()));
                }
            }
        }
        found
    }

    /// Excess bookings: every course beyond the first in a shared slot counts.
    pub fn count_overlaps(&self) -> u32 {
        self.occupancy.excess_bookings() as u32
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }
}
