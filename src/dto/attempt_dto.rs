use crate::models::attempt::{Attempt, StudentAnswer};
use crate::models::test::Test;
use crate::models::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmissionRequest {
    #[validate(length(max = 500, message = "Too many answers in one submission"))]
    pub answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: Uuid,
    /// For TEXT_ANSWER questions.
    pub text_answer: Option<String>,
    /// For choice questions.
    #[serde(default)]
    pub selected_answer_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptDto {
    pub id: Uuid,
    pub test_id: Uuid,
    pub test_title: String,
    pub student_id: Uuid,
    pub student_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub score: Option<i32>,
    pub max_score: i32,
    pub attempt_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AttemptDto {
    pub fn from_attempt(attempt: &Attempt, test: Option<&Test>, student: Option<&User>) -> Self {
        Self {
            id: attempt.id,
            test_id: attempt.test_id,
            test_title: test.map(|t| t.title.clone()).unwrap_or_default(),
            student_id: attempt.student_id,
            student_name: student.map(|s| s.full_name.clone()).unwrap_or_default(),
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
            completed: attempt.completed,
            score: attempt.score,
            max_score: attempt.max_score,
            attempt_number: attempt.attempt_number,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAnswerDto {
    pub id: Uuid,
    pub question_id: Uuid,
    pub question_text: String,
    pub text_answer: Option<String>,
    pub selected_answer_ids: Vec<Uuid>,
    pub is_correct: bool,
    pub earned_points: i32,
    pub partial_ratio: Option<f64>,
}

impl StudentAnswerDto {
    pub fn from_answer(answer: &StudentAnswer, test: &Test) -> Self {
        let mut selected: Vec<Uuid> = answer.selected_answer_ids.iter().copied().collect();
        selected.sort();
        Self {
            id: answer.id,
            question_id: answer.question_id,
            question_text: test
                .question(answer.question_id)
                .map(|q| q.text.clone())
                .unwrap_or_default(),
            text_answer: answer.text_answer.clone(),
            selected_answer_ids: selected,
            is_correct: answer.is_correct,
            earned_points: answer.earned_points,
            partial_ratio: answer.partial_ratio,
        }
    }
}

/// Full audit view of a completed attempt, for the owner student, the
/// test's teacher or an admin.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptDetailsDto {
    pub id: Uuid,
    pub test_id: Uuid,
    pub test_title: String,
    pub student_id: Uuid,
    pub student_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub score: i32,
    pub max_score: i32,
    pub attempt_number: u32,
    pub answers: Vec<StudentAnswerDto>,
    pub correct_answers_count: usize,
    pub total_questions_count: usize,
    pub percentage_correct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> AnswerSubmission {
        AnswerSubmission {
            question_id: Uuid::new_v4(),
            text_answer: None,
            selected_answer_ids: vec![],
        }
    }

    #[test]
    fn submission_request_rejects_oversized_answer_lists() {
        let request = SubmissionRequest {
            answers: (0..501).map(|_| submission()).collect(),
        };
        assert!(request.validate().is_err());

        let request = SubmissionRequest {
            answers: vec![submission()],
        };
        assert!(request.validate().is_ok());
    }
}
