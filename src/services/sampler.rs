use crate::models::test::{Question, Test};
use rand::seq::SliceRandom;
use uuid::Uuid;

pub struct Sampler;

impl Sampler {
    /// Whether attempts at this test get a sampled subset at all.
    pub fn sampling_applies(test: &Test) -> bool {
        match test.questions_to_show {
            Some(n) => n > 0 && n < test.questions.len(),
            None => false,
        }
    }

    /// Draws the question subset to pin for a fresh attempt: a uniformly
    /// random selection of `questions_to_show` questions without
    /// replacement. Returns the pinned ids and their point total.
    pub fn draw(test: &Test) -> (Vec<Uuid>, i32) {
        let count = test.questions_to_show.unwrap_or(0);
        let mut pool: Vec<&Question> = test.questions.iter().collect();
        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(count);

        let max_score = pool.iter().map(|q| q.points).sum();
        (pool.iter().map(|q| q.id).collect(), max_score)
    }

    /// Resolves previously pinned question ids against the current catalog,
    /// preserving pinned order. Questions deleted since pinning are dropped,
    /// never replaced; the caller recomputes max_score from the survivors.
    pub fn resolve<'a>(test: &'a Test, selected_question_ids: &[Uuid]) -> Vec<&'a Question> {
        selected_question_ids
            .iter()
            .filter_map(|id| test.question(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test::{Answer, QuestionType};
    use chrono::Utc;
    use std::collections::HashSet;

    fn test_with_questions(count: usize, questions_to_show: Option<usize>) -> Test {
        let questions = (0..count)
            .map(|i| Question {
                id: Uuid::new_v4(),
                text: format!("q{}", i),
                question_type: QuestionType::SingleChoice,
                points: (i + 1) as i32,
                answers: vec![Answer {
                    id: Uuid::new_v4(),
                    text: "a".to_string(),
                    is_correct: true,
                }],
            })
            .collect();
        Test {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: None,
            subject_id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: None,
            time_limit_minutes: 30,
            is_active: true,
            max_attempts: 1,
            questions_to_show,
            grade_ids: HashSet::new(),
            questions,
        }
    }

    #[test]
    fn sampling_only_applies_to_proper_subsets() {
        assert!(Sampler::sampling_applies(&test_with_questions(5, Some(3))));
        assert!(!Sampler::sampling_applies(&test_with_questions(5, None)));
        assert!(!Sampler::sampling_applies(&test_with_questions(5, Some(0))));
        assert!(!Sampler::sampling_applies(&test_with_questions(5, Some(5))));
        assert!(!Sampler::sampling_applies(&test_with_questions(5, Some(9))));
    }

    #[test]
    fn draw_pins_the_requested_count_without_duplicates() {
        let test = test_with_questions(10, Some(4));
        let (ids, max_score) = Sampler::draw(&test);
        assert_eq!(ids.len(), 4);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 4);
        let expected: i32 = ids
            .iter()
            .map(|id| test.question(*id).unwrap().points)
            .sum();
        assert_eq!(max_score, expected);
    }

    #[test]
    fn resolve_keeps_pinned_order_and_drops_deleted_questions() {
        let mut test = test_with_questions(5, Some(3));
        let pinned: Vec<Uuid> = vec![
            test.questions[4].id,
            test.questions[1].id,
            test.questions[2].id,
        ];

        let resolved = Sampler::resolve(&test, &pinned);
        let resolved_ids: Vec<Uuid> = resolved.iter().map(|q| q.id).collect();
        assert_eq!(resolved_ids, pinned);

        // Simulate catalog mutation after pinning.
        let deleted = test.questions.remove(1).id;
        let resolved = Sampler::resolve(&test, &pinned);
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|q| q.id != deleted));
    }
}
