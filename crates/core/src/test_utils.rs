use serde_json::json;
use types::{Interval, ScheduleConfig, TimeSlot};

use crate::schedule::Schedule;

pub fn slot(day: &str, start: u32, end: u32) -> TimeSlot {
    TimeSlot::new(day, Interval::new(start, end))
}

fn config(value: serde_json::Value) -> ScheduleConfig {
    serde_json::from_value(value).expect("fixture config")
}

/// One room, one teacher, one slot; `students` decides feasibility.
pub fn single_slot_config(students: u32) -> ScheduleConfig {
    config(json!({
        "days": ["Mon"],
        "intervals": [{"start": 8, "end": 10}],
        "courses": [{"name": "Math", "students": students}],
        "classrooms": [{"name": "R1", "capacity": 30, "subjects": ["Math"]}],
        "teachers": [{"name": "Ana", "courses": ["Math"]}]
    }))
}

pub fn two_slot_config() -> ScheduleConfig {
    config(json!({
        "days": ["Mon"],
        "intervals": [{"start": 8, "end": 10}, {"start": 10, "end": 12}],
        "courses": [
            {"name": "Math", "students": 20},
            {"name": "Art", "students": 10}
        ],
        "classrooms": [{"name": "R1", "capacity": 30, "subjects": ["Math", "Art"]}],
        "teachers": [
            {"name": "Ana", "courses": ["Math"]},
            {"name": "Bob", "courses": ["Math", "Art"]}
        ]
    }))
}

/// Ana prefers Mon 10-12 only, Bob prefers Mon 8-10 only.
pub fn preference_config() -> ScheduleConfig {
    config(json!({
        "days": ["Mon"],
        "intervals": [{"start": 8, "end": 10}, {"start": 10, "end": 12}],
        "courses": [
            {"name": "Math", "students": 20},
            {"name": "Art", "students": 20}
        ],
        "classrooms": [
            {"name": "R1", "capacity": 30, "subjects": ["Math", "Art"]},
            {"name": "R2", "capacity": 25, "subjects": ["Math"]}
        ],
        "teachers": [
            {"name": "Ana", "courses": ["Math"], "constraints": ["!8-10"]},
            {"name": "Bob", "courses": ["Art", "Math"], "constraints": ["!10-12"]}
        ]
    }))
}

/// Both teachers can teach both courses and only like Mon 12-14.
pub fn trade_config() -> ScheduleConfig {
    config(json!({
        "days": ["Mon"],
        "intervals": [
            {"start": 8, "end": 10},
            {"start": 10, "end": 12},
            {"start": 12, "end": 14}
        ],
        "courses": [
            {"name": "Math", "students": 20},
            {"name": "Art", "students": 20}
        ],
        "classrooms": [
            {"name": "R1", "capacity": 30, "subjects": ["Math", "Art"]},
            {"name": "R2", "capacity": 30, "subjects": ["Math", "Art"]}
        ],
        "teachers": [
            {"name": "Ana", "courses": ["Math", "Art"], "constraints": ["!8-12"]},
            {"name": "Bob", "courses": ["Math", "Art"], "constraints": ["!8-12"]}
        ]
    }))
}

pub fn feasible_config() -> ScheduleConfig {
    config(json!({
        "days": ["Mon", "Tue"],
        "intervals": [{"start": 8, "end": 10}, {"start": 10, "end": 12}],
        "courses": [
            {"name": "Math", "students": 40},
            {"name": "Art", "students": 20}
        ],
        "classrooms": [
            {"name": "R1", "capacity": 30, "subjects": ["Math", "Art"]},
            {"name": "R2", "capacity": 25, "subjects": ["Math"]}
        ],
        "teachers": [
            {"name": "Ana", "courses": ["Math"]},
            {"name": "Bob", "courses": ["Art", "Math"], "constraints": ["!Tue"]}
        ]
    }))
}

/// Every placement is booked in its classroom and teacher, and the ledgers
/// hold nothing else.
pub fn assert_consistent(schedule: &Schedule) {
    let mut per_room = std::collections::HashMap::<&str, usize>::new();
    let mut per_teacher = std::collections::HashMap::<&str, usize>::new();
    for (course, placements) in schedule.assignments() {
        for p in placements {
            let room = schedule.classroom(&p.classroom).expect("known classroom");
            let courses = room.occupancy().courses_at(&p.slot).unwrap_or_default();
            assert!(
                courses.contains(course),
                "{course} missing from {} at {}",
                p.classroom,
                p.slot
            );
            let teacher = schedule.teacher(&p.teacher).expect("known teacher");
            let courses = teacher.occupancy().courses_at(&p.slot).unwrap_or_default();
            assert!(
                courses.contains(course),
                "{course} missing from {} at {}",
                p.teacher,
                p.slot
            );
            *per_room.entry(room.name()).or_default() += 1;
            *per_teacher.entry(teacher.name()).or_default() += 1;
        }
    }
    for room in schedule.classrooms() {
        assert_eq!(room.occupancy().bookings(), per_room.get(room.name()).copied().unwrap_or(0));
    }
    for teacher in schedule.teachers() {
        assert_eq!(
            teacher.occupancy().bookings(),
            per_teacher.get(teacher.name()).copied().unwrap_or(0)
        );
    }
}
