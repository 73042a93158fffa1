use crate::dto::attempt_dto::AnswerSubmission;
use crate::models::attempt::StudentAnswer;
use crate::models::test::{Question, QuestionType};
use std::collections::HashSet;
use uuid::Uuid;

pub struct ScoringService;

impl ScoringService {
    /// Scores one submitted answer against its question. Selected answer ids
    /// that do not belong to the question are dropped before scoring.
    pub fn score_answer(question: &Question, submission: &AnswerSubmission) -> StudentAnswer {
        let mut answer = StudentAnswer {
            id: Uuid::new_v4(),
            question_id: question.id,
            text_answer: None,
            selected_answer_ids: HashSet::new(),
            is_correct: false,
            earned_points: 0,
            partial_ratio: None,
        };

        match question.question_type {
            QuestionType::TextAnswer => {
                answer.text_answer = submission.text_answer.clone();
                if let Some(canonical) = question.answers.first() {
                    let expected = canonical.text.trim().to_lowercase();
                    let provided = submission
                        .text_answer
                        .as_deref()
                        .unwrap_or("")
                        .trim()
                        .to_lowercase();
                    answer.is_correct = expected == provided;
                }
                if answer.is_correct {
                    answer.earned_points = question.points;
                }
            }
            QuestionType::SingleChoice => {
                let selected = valid_selection(question, &submission.selected_answer_ids);
                if selected.len() == 1 {
                    let selected_id = selected.iter().next().copied();
                    answer.is_correct = question
                        .answers
                        .iter()
                        .any(|a| Some(a.id) == selected_id && a.is_correct);
                }
                answer.selected_answer_ids = selected;
                if answer.is_correct {
                    answer.earned_points = question.points;
                }
            }
            QuestionType::MultipleChoice => {
                let selected = valid_selection(question, &submission.selected_answer_ids);
                let correct_count = question.correct_answer_count();

                if correct_count == 0 {
                    // Degenerate question: correct only when nothing is picked.
                    answer.is_correct = selected.is_empty();
                    if answer.is_correct {
                        answer.earned_points = question.points;
                    }
                } else {
                    let correct_selected = question
                        .answers
                        .iter()
                        .filter(|a| a.is_correct && selected.contains(&a.id))
                        .count();
                    let incorrect_selected = selected.len() - correct_selected;
                    let incorrect_options = question.answers.len() - correct_count;

                    let correct_ratio = correct_selected as f64 / correct_count as f64;
                    // Penalty scales with the number of wrong options so one
                    // slip does not zero out the question.
                    let incorrect_penalty = if incorrect_options > 0 {
                        incorrect_selected as f64 / incorrect_options as f64
                    } else {
                        0.0
                    };
                    let ratio = (correct_ratio - incorrect_penalty * 0.5).max(0.0);

                    answer.earned_points = (question.points as f64 * ratio).round() as i32;
                    answer.is_correct = ratio >= 1.0;
                    answer.partial_ratio = Some(ratio);
                }
                answer.selected_answer_ids = selected;
            }
        }

        answer
    }
}

fn valid_selection(question: &Question, selected_ids: &[Uuid]) -> HashSet<Uuid> {
    selected_ids
        .iter()
        .copied()
        .filter(|id| question.answers.iter().any(|a| a.id == *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test::Answer;

    fn answer(text: &str, is_correct: bool) -> Answer {
        Answer {
            id: Uuid::new_v4(),
            text: text.to_string(),
            is_correct,
        }
    }

    fn question(question_type: QuestionType, points: i32, answers: Vec<Answer>) -> Question {
        Question {
            id: Uuid::new_v4(),
            text: "q".to_string(),
            question_type,
            points,
            answers,
        }
    }

    fn submission(question_id: Uuid, text: Option<&str>, selected: Vec<Uuid>) -> AnswerSubmission {
        AnswerSubmission {
            question_id,
            text_answer: text.map(str::to_string),
            selected_answer_ids: selected,
        }
    }

    #[test]
    fn text_answer_matches_trimmed_and_case_folded() {
        let q = question(QuestionType::TextAnswer, 2, vec![answer("Paris", true)]);
        let scored = ScoringService::score_answer(&q, &submission(q.id, Some(" paris "), vec![]));
        assert!(scored.is_correct);
        assert_eq!(scored.earned_points, 2);
        assert_eq!(scored.partial_ratio, None);
    }

    #[test]
    fn text_answer_mismatch_earns_zero() {
        let q = question(QuestionType::TextAnswer, 2, vec![answer("Paris", true)]);
        let scored = ScoringService::score_answer(&q, &submission(q.id, Some("London"), vec![]));
        assert!(!scored.is_correct);
        assert_eq!(scored.earned_points, 0);
    }

    #[test]
    fn single_choice_requires_exactly_one_correct_selection() {
        let q = question(
            QuestionType::SingleChoice,
            1,
            vec![answer("a", false), answer("b", true), answer("c", false)],
        );
        let correct_id = q.answers[1].id;
        let wrong_id = q.answers[0].id;

        let scored = ScoringService::score_answer(&q, &submission(q.id, None, vec![correct_id]));
        assert!(scored.is_correct);
        assert_eq!(scored.earned_points, 1);

        let scored = ScoringService::score_answer(&q, &submission(q.id, None, vec![wrong_id]));
        assert!(!scored.is_correct);
        assert_eq!(scored.earned_points, 0);

        let scored =
            ScoringService::score_answer(&q, &submission(q.id, None, vec![correct_id, wrong_id]));
        assert!(!scored.is_correct);
        assert_eq!(scored.earned_points, 0);
    }

    #[test]
    fn multiple_choice_partial_credit_with_penalty() {
        // 4 points, 2 correct of 4; picking 1 correct + 1 incorrect gives
        // ratio max(0, 0.5 - 0.5 * 0.5) = 0.25 and round(4 * 0.25) = 1.
        let q = question(
            QuestionType::MultipleChoice,
            4,
            vec![
                answer("a", true),
                answer("b", true),
                answer("c", false),
                answer("d", false),
            ],
        );
        let scored = ScoringService::score_answer(
            &q,
            &submission(q.id, None, vec![q.answers[0].id, q.answers[2].id]),
        );
        assert!(!scored.is_correct);
        assert_eq!(scored.earned_points, 1);
        assert_eq!(scored.partial_ratio, Some(0.25));
    }

    #[test]
    fn multiple_choice_exact_set_is_fully_correct() {
        let q = question(
            QuestionType::MultipleChoice,
            3,
            vec![answer("a", true), answer("b", true), answer("c", false)],
        );
        let scored = ScoringService::score_answer(
            &q,
            &submission(q.id, None, vec![q.answers[0].id, q.answers[1].id]),
        );
        assert!(scored.is_correct);
        assert_eq!(scored.earned_points, 3);
        assert_eq!(scored.partial_ratio, Some(1.0));
    }

    #[test]
    fn multiple_choice_without_correct_answers_rewards_empty_selection() {
        let q = question(
            QuestionType::MultipleChoice,
            2,
            vec![answer("a", false), answer("b", false)],
        );
        let scored = ScoringService::score_answer(&q, &submission(q.id, None, vec![]));
        assert!(scored.is_correct);
        assert_eq!(scored.earned_points, 2);
        assert_eq!(scored.partial_ratio, None);

        let scored =
            ScoringService::score_answer(&q, &submission(q.id, None, vec![q.answers[0].id]));
        assert!(!scored.is_correct);
        assert_eq!(scored.earned_points, 0);
    }

    #[test]
    fn multiple_choice_empty_selection_records_a_zero_ratio() {
        let q = question(
            QuestionType::MultipleChoice,
            3,
            vec![answer("a", true), answer("b", false)],
        );
        let scored = ScoringService::score_answer(&q, &submission(q.id, None, vec![]));
        assert!(!scored.is_correct);
        assert_eq!(scored.earned_points, 0);
        assert_eq!(scored.partial_ratio, Some(0.0));
    }

    #[test]
    fn unknown_answer_ids_are_ignored() {
        let q = question(
            QuestionType::MultipleChoice,
            2,
            vec![answer("a", true), answer("b", false)],
        );
        let scored = ScoringService::score_answer(
            &q,
            &submission(q.id, None, vec![q.answers[0].id, Uuid::new_v4()]),
        );
        assert!(scored.is_correct);
        assert_eq!(scored.earned_points, 2);
        assert_eq!(scored.selected_answer_ids.len(), 1);
    }
}
