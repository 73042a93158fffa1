use crate::models::test::{Question, QuestionType};
use serde::Serialize;
use uuid::Uuid;

/// Answer as shown to a student taking the test: no correctness flag.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerView {
    pub id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub points: i32,
    pub answers: Vec<AnswerView>,
}

impl QuestionView {
    pub fn from_question(question: &Question) -> Self {
        // Text questions carry the canonical answer in their answer list,
        // so students get no answers for them at all.
        let answers = if question.question_type == QuestionType::TextAnswer {
            Vec::new()
        } else {
            question
                .answers
                .iter()
                .map(|a| AnswerView {
                    id: a.id,
                    text: a.text.clone(),
                })
                .collect()
        };

        Self {
            id: question.id,
            text: question.text.clone(),
            question_type: question.question_type,
            points: question.points,
            answers,
        }
    }
}
