use std::collections::HashSet;

use types::{ClassroomSpec, TimeSlot};

use crate::occupancy::Occupancy;

#[derive(Clone, Debug)]
pub struct Classroom {
    name: String,
    capacity: u32,
    subjects: HashSet<String>,
    occupancy: Occupancy,
}

impl Classroom {
    pub fn new(
        name: impl Into<String>,
        capacity: u32,
        subjects: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: name.into(),
            capacity,
            subjects: subjects.into_iter().collect(),
            occupancy: Occupancy::new(),
        }
    }

    pub fn from_spec(spec: &ClassroomSpec) -> Self {
        Self::new(spec.name.clone(), spec.capacity, spec.subjects.iter().cloned())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn can_host_course(&self, course: &str) -> bool {
        self.subjects.contains(course)
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

    /// Hard conflicts from double-booking this room: one per shared slot,
    /// however many courses share it.
    pub fn count_overlaps(&self) -> u32 {
        self.occupancy.slots_with_overlap() as u32
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }
}
