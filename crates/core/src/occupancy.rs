use types::TimeSlot;

/// Slot -> courses ledger kept by classrooms and teachers.
///
/// Slots iterate in the order they were first booked. A slot holding more
/// than one course is an overlap, not an error; the scorers decide how to
/// count it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Occupancy {
    slots: Vec<(TimeSlot, Vec<String>)>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, slot: &TimeSlot) -> Option<usize> {
        self.slots.iter().position(|(s, _)| s == slot)
    }

    pub fn is_occupied(&self, slot: &TimeSlot) -> bool {
        self.position(slot).is_some()
    }

    pub fn courses_at(&self, slot: &TimeSlot) -> Option<&[String]> {
        self.position(slot).map(|i| self.slots[i].1.as_slice())
    }

    pub fn add(&mut self, course: &str, slot: &TimeSlot) {
        match self.position(slot) {
            Some(i) => self.slots[i].1.push(course.to_string()),
            None => self.slots.push((slot.clone(), vec![course.to_string()])),
        }
    }

    /// Removes the most recently added matching entry and drops the slot
    /// once it is empty. Absent pairs are ignored.
    pub fn remove(&mut self, course: &str, slot: &TimeSlot) {
        let Some(i) = self.position(slot) else {
            return;
        };
        let courses = &mut self.slots[i].1;
        if let Some(j) = courses.iter().rposition(|c| c == course) {
            courses.remove(j);
        }
        if courses.is_empty() {
            self.slots.remove(i);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TimeSlot, &[String])> {
        self.slots.iter().map(|(s, c)| (s, c.as_slice()))
    }

    pub fn occupied_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn bookings(&self) -> usize {
        self.slots.iter().map(|(_, c)| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots shared by two or more courses.
    pub fn slots_with_overlap(&self) -> usize {
        self.slots.iter().filter(|(_, c)| c.len() > 1).count()
    }

    /// Bookings beyond the first in every slot.
    pub fn excess_bookings(&self) -> usize {
        self.slots
            .iter()
            .filter(|(_, c)| c.len() > 1)
            .map(|(_, c)| c.len() - 1)
            .sum()
    }
}
