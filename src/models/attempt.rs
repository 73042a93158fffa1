use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One student's timed run through a test.
///
/// Invariant enforced by the store and lifecycle service: at most one
/// attempt per (test, student) has `completed = false` at any instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub test_id: Uuid,
    pub student_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub score: Option<i32>,
    /// Point total of this attempt's pinned question subset, not of the
    /// whole test. Zero until the sampler pins the questions.
    pub max_score: i32,
    /// 1-based, per student per test.
    pub attempt_number: u32,
    /// Pinned question ids in presentation order; empty means "all
    /// questions of the test apply".
    pub selected_question_ids: Vec<Uuid>,
    pub answers: Vec<StudentAnswer>,
}

impl Attempt {
    pub fn new(test_id: Uuid, student_id: Uuid, attempt_number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            test_id,
            student_id,
            started_at: Utc::now(),
            completed_at: None,
            completed: false,
            score: None,
            max_score: 0,
            attempt_number,
            selected_question_ids: Vec::new(),
            answers: Vec::new(),
        }
    }

    pub fn deadline(&self, time_limit_minutes: i64) -> DateTime<Utc> {
        self.started_at + Duration::minutes(time_limit_minutes)
    }

    pub fn is_expired(&self, time_limit_minutes: i64, now: DateTime<Utc>) -> bool {
        now > self.deadline(time_limit_minutes)
    }
}

/// Scored answer to one question, created once during submission and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAnswer {
    pub id: Uuid,
    pub question_id: Uuid,
    /// Submitted text for TextAnswer questions.
    pub text_answer: Option<String>,
    /// Selected answer ids for choice questions.
    pub selected_answer_ids: HashSet<Uuid>,
    pub is_correct: bool,
    pub earned_points: i32,
    /// Fractional correctness in [0, 1], recorded for multi-select
    /// questions only.
    pub partial_ratio: Option<f64>,
}
