//! Canned class schedule and rosters for demos and manual testing. No
//! backing store exists; this is the data a fresh process starts with.

use chrono::{DateTime, Duration, Utc};

use rollcall_core::model::{ClassSession, Student};

const SAMPLE_NAMES: [&str; 20] = [
    "Priya Sharma",
    "Arjun Mehta",
    "Sana Qureshi",
    "Rahul Verma",
    "Ananya Iyer",
    "Kabir Malhotra",
    "Divya Nair",
    "Rohan Gupta",
    "Meera Pillai",
    "Aditya Rao",
    "Fatima Khan",
    "Vikram Singh",
    "Ishita Bose",
    "Nikhil Joshi",
    "Tanvi Desai",
    "Omar Siddiqui",
    "Lakshmi Menon",
    "Siddharth Kulkarni",
    "Zara Ahmed",
    "Varun Reddy",
];

/// An all-absent roster of `count` students with sequential roll numbers.
/// Names repeat once the sample pool is exhausted.
pub fn sample_roster(count: usize) -> Vec<Student> {
    (0..count)
        .map(|i| {
            Student::new(
                SAMPLE_NAMES[i % SAMPLE_NAMES.len()],
                format!("CS-2024-{:03}", i + 1),
            )
        })
        .collect()
}

/// The demo schedule relative to `now`: one class in progress, one
/// already over, one later today.
pub fn sample_classes(now: DateTime<Utc>) -> Vec<(ClassSession, Vec<Student>)> {
    vec![
        (
            ClassSession::new(
                "Data Structures",
                "CS-3A",
                "LH-204",
                now - Duration::minutes(10),
                now + Duration::minutes(40),
                0,
                now,
            ),
            sample_roster(10),
        ),
        (
            ClassSession::new(
                "Operating Systems",
                "CS-3A",
                "LH-101",
                now - Duration::hours(2),
                now - Duration::hours(1),
                0,
                now,
            ),
            sample_roster(12),
        ),
        (
            ClassSession::new(
                "Computer Networks",
                "CS-3B",
                "LH-305",
                now + Duration::hours(1),
                now + Duration::hours(2),
                0,
                now,
            ),
            sample_roster(8),
        ),
    ]
}
