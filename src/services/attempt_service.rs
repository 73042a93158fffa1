use crate::dto::attempt_dto::{AnswerSubmission, AttemptDetailsDto, AttemptDto, StudentAnswerDto};
use crate::dto::question_dto::QuestionView;
use crate::error::{Error, Result};
use crate::models::attempt::Attempt;
use crate::models::test::Test;
use crate::models::user::{User, UserRole};
use crate::services::sampler::Sampler;
use crate::services::scoring_service::ScoringService;
use crate::store::MemoryStore;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const TIME_EXPIRED_MESSAGE: &str =
    "Time limit exceeded; only the answers provided before submission were scored.";

/// Orchestrates the attempt state machine: start, question fetch, submit
/// and the read side over attempt rows. Start, FetchQuestions and Submit
/// all run under the store's (test, student) pair lock, so concurrent
/// calls for one pair serialize while other pairs proceed in parallel.
#[derive(Clone)]
pub struct AttemptService {
    store: Arc<MemoryStore>,
}

impl AttemptService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub async fn start_attempt(&self, test_id: Uuid, caller: &User) -> Result<AttemptDto> {
        if caller.role != UserRole::Student {
            return Err(Error::Forbidden("Only students can take tests".to_string()));
        }

        let test = self.find_test(test_id).await?;

        if !test.available_to_grade(caller.grade_id) {
            return Err(Error::Forbidden(
                "This test is not available to your grade".to_string(),
            ));
        }
        if !test.is_active {
            return Err(Error::InvalidState("This test is not active".to_string()));
        }

        let lock = self.store.attempt_lock(test_id, caller.id);
        let _guard = lock.lock().await;

        let completed_count = self.store.completed_attempt_count(test_id, caller.id).await;
        if completed_count >= test.max_attempts as usize {
            return Err(Error::LimitExceeded(format!(
                "You have reached the maximum number of attempts ({}) for this test",
                test.max_attempts
            )));
        }

        let mut incomplete = self.store.incomplete_attempts(test_id, caller.id).await;
        incomplete.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        // Earlier races or crashes can leave several incomplete rows behind;
        // only the most recent one survives.
        for stale in incomplete.iter().skip(1) {
            tracing::warn!(attempt_id = %stale.id, "discarding duplicate incomplete attempt");
            self.store.remove_attempt(stale.id).await;
        }

        if let Some(mut current) = incomplete.into_iter().next() {
            if current.is_expired(test.time_limit_minutes, Utc::now()) {
                // Abandoned attempt: close it with a zero score and hand the
                // student a fresh one.
                tracing::warn!(
                    attempt_id = %current.id,
                    "finalizing expired attempt with zero score"
                );
                current.completed = true;
                current.completed_at = Some(Utc::now());
                current.score = Some(0);
                self.store.upsert_attempt(current).await;

                let completed_count =
                    self.store.completed_attempt_count(test_id, caller.id).await;
                return self
                    .create_attempt(&test, caller, (completed_count + 1) as u32)
                    .await;
            }

            // Idempotent resume of the running attempt.
            return Ok(AttemptDto::from_attempt(&current, Some(&test), Some(caller)));
        }

        self.create_attempt(&test, caller, (completed_count + 1) as u32)
            .await
    }

    async fn create_attempt(
        &self,
        test: &Test,
        student: &User,
        attempt_number: u32,
    ) -> Result<AttemptDto> {
        let attempt = Attempt::new(test.id, student.id, attempt_number);
        tracing::info!(
            attempt_id = %attempt.id,
            test_id = %test.id,
            student_id = %student.id,
            attempt_number,
            "created attempt"
        );
        let dto = AttemptDto::from_attempt(&attempt, Some(test), Some(student));
        self.store.upsert_attempt(attempt).await;
        Ok(dto)
    }

    /// Read-only lookup of the caller's running attempt, used to resume a
    /// client session without creating a new attempt.
    pub async fn get_in_progress(&self, test_id: Uuid, caller: &User) -> Result<Option<AttemptDto>> {
        if caller.role != UserRole::Student {
            return Err(Error::Forbidden("Only students can take tests".to_string()));
        }
        let test = self.find_test(test_id).await?;

        let incomplete = self.store.incomplete_attempts(test_id, caller.id).await;
        Ok(incomplete
            .into_iter()
            .max_by_key(|a| a.started_at)
            .map(|a| AttemptDto::from_attempt(&a, Some(&test), Some(caller))))
    }

    /// Returns the attempt's question set, pinning it on the first call.
    pub async fn fetch_questions(
        &self,
        test_id: Uuid,
        attempt_id: Uuid,
        caller: &User,
    ) -> Result<Vec<QuestionView>> {
        let attempt = self.find_attempt(attempt_id).await?;

        if attempt.student_id != caller.id {
            return Err(Error::Forbidden(
                "You do not have access to this attempt".to_string(),
            ));
        }
        if attempt.test_id != test_id {
            return Err(Error::InvalidState(
                "Attempt does not belong to this test".to_string(),
            ));
        }
        let test = self.find_test(attempt.test_id).await?;

        // The pair lock makes pinning write-once: a racing fetch either
        // pins first or re-reads the committed selection below.
        let lock = self.store.attempt_lock(attempt.test_id, attempt.student_id);
        let _guard = lock.lock().await;
        let mut attempt = self.find_attempt(attempt_id).await?;

        // Re-checked under the lock: a submit may have completed the
        // attempt while this call was waiting, and completed attempts
        // must never be written to.
        if attempt.completed {
            return Err(Error::InvalidState(
                "This attempt is already completed".to_string(),
            ));
        }

        if !Sampler::sampling_applies(&test) {
            // The whole test applies; selected ids stay empty.
            let total = test.total_points();
            if attempt.max_score != total {
                attempt.max_score = total;
                self.store.upsert_attempt(attempt).await;
            }
            return Ok(test.questions.iter().map(QuestionView::from_question).collect());
        }

        if attempt.selected_question_ids.is_empty() {
            let (selected_ids, max_score) = Sampler::draw(&test);
            tracing::info!(
                attempt_id = %attempt.id,
                pinned = selected_ids.len(),
                max_score,
                "pinned question subset"
            );
            attempt.selected_question_ids = selected_ids;
            attempt.max_score = max_score;
            let views = Sampler::resolve(&test, &attempt.selected_question_ids)
                .into_iter()
                .map(QuestionView::from_question)
                .collect();
            self.store.upsert_attempt(attempt).await;
            return Ok(views);
        }

        // Previously pinned set, in pinned order. Questions deleted from
        // the catalog since pinning are dropped and max_score re-summed
        // over the survivors.
        let selected = Sampler::resolve(&test, &attempt.selected_question_ids);
        let max_score: i32 = selected.iter().map(|q| q.points).sum();
        let views = selected.into_iter().map(QuestionView::from_question).collect();
        if attempt.max_score != max_score {
            attempt.max_score = max_score;
            self.store.upsert_attempt(attempt).await;
        }
        Ok(views)
    }

    /// Scores the submitted answers and finalizes the attempt. A submission
    /// after the time limit is still scored; the result only carries an
    /// informational message.
    pub async fn submit(
        &self,
        attempt_id: Uuid,
        caller: &User,
        answers: &[AnswerSubmission],
    ) -> Result<AttemptDto> {
        let attempt = self.find_attempt(attempt_id).await?;

        if attempt.student_id != caller.id {
            return Err(Error::Forbidden(
                "You do not have access to this attempt".to_string(),
            ));
        }

        let test = self.find_test(attempt.test_id).await?;

        let lock = self.store.attempt_lock(attempt.test_id, attempt.student_id);
        let _guard = lock.lock().await;
        let mut attempt = self.find_attempt(attempt_id).await?;

        if attempt.completed {
            return Err(Error::InvalidState(
                "This attempt is already completed".to_string(),
            ));
        }

        let now = Utc::now();
        let time_expired = attempt.is_expired(test.time_limit_minutes, now);

        // The set to score against: the pinned subset if one was recorded,
        // otherwise every question of the test.
        let scorable: Vec<Uuid> = if attempt.selected_question_ids.is_empty() {
            test.questions.iter().map(|q| q.id).collect()
        } else {
            attempt
                .selected_question_ids
                .iter()
                .copied()
                .filter(|id| test.question(*id).is_some())
                .collect()
        };

        // Self-heal attempts whose max_score never got finalized or no
        // longer matches the resolved set.
        let expected_max: i32 = scorable
            .iter()
            .filter_map(|id| test.question(*id))
            .map(|q| q.points)
            .sum();
        if attempt.max_score != expected_max {
            tracing::warn!(
                attempt_id = %attempt.id,
                stored = attempt.max_score,
                expected = expected_max,
                "recomputing stale max_score"
            );
            attempt.max_score = expected_max;
        }

        let scorable: HashSet<Uuid> = scorable.into_iter().collect();
        let mut total_score = 0;
        let mut scored_questions: HashSet<Uuid> = HashSet::new();

        for submission in answers {
            let Some(question) = test.question(submission.question_id) else {
                continue;
            };
            // Answers outside the pinned set are ignored, and each question
            // is scored at most once per attempt.
            if !scorable.contains(&question.id) || !scored_questions.insert(question.id) {
                continue;
            }

            let scored = ScoringService::score_answer(question, submission);
            total_score += scored.earned_points;
            attempt.answers.push(scored);
        }

        attempt.completed = true;
        attempt.completed_at = Some(now);
        attempt.score = Some(total_score);

        tracing::info!(
            attempt_id = %attempt.id,
            score = total_score,
            max_score = attempt.max_score,
            time_expired,
            "attempt submitted"
        );

        let mut dto = AttemptDto::from_attempt(&attempt, Some(&test), Some(caller));
        if time_expired {
            dto = dto.with_message(TIME_EXPIRED_MESSAGE);
        }
        self.store.upsert_attempt(attempt).await;
        Ok(dto)
    }

    /// Full answer-level view of a completed attempt. Accessible to the
    /// owner student, the test's creator, teachers of the test's subject
    /// and admins.
    pub async fn attempt_details(
        &self,
        attempt_id: Uuid,
        caller: &User,
    ) -> Result<AttemptDetailsDto> {
        let attempt = self.find_attempt(attempt_id).await?;
        let test = self.find_test(attempt.test_id).await?;

        self.check_result_access(&attempt, &test, caller)?;

        if !attempt.completed {
            return Err(Error::InvalidState(
                "This attempt is not completed yet".to_string(),
            ));
        }

        let student = self.store.find_user(attempt.student_id).await;
        let answers: Vec<StudentAnswerDto> = attempt
            .answers
            .iter()
            .map(|a| StudentAnswerDto::from_answer(a, &test))
            .collect();
        let correct_answers_count = answers.iter().filter(|a| a.is_correct).count();

        let score = attempt.score.unwrap_or(0);
        let percentage_correct = if attempt.max_score > 0 {
            (score as f64 / attempt.max_score as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };

        Ok(AttemptDetailsDto {
            id: attempt.id,
            test_id: attempt.test_id,
            test_title: test.title.clone(),
            student_id: attempt.student_id,
            student_name: student.map(|s| s.full_name).unwrap_or_default(),
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
            completed: attempt.completed,
            score,
            max_score: attempt.max_score,
            attempt_number: attempt.attempt_number,
            total_questions_count: answers.len(),
            correct_answers_count,
            percentage_correct,
            answers,
        })
    }

    /// The calling student's own attempt history across tests.
    pub async fn student_results(&self, caller: &User) -> Result<Vec<AttemptDto>> {
        if caller.role != UserRole::Student {
            return Err(Error::Forbidden(
                "Only students have their own result list".to_string(),
            ));
        }

        let attempts = self.store.attempts_for_student(caller.id).await;
        let mut results = Vec::with_capacity(attempts.len());
        for attempt in &attempts {
            let test = self.store.find_test(attempt.test_id).await;
            results.push(AttemptDto::from_attempt(attempt, test.as_ref(), Some(caller)));
        }
        Ok(results)
    }

    /// Every attempt at one test, for its creator, teachers of its subject
    /// and admins.
    pub async fn test_results(&self, test_id: Uuid, caller: &User) -> Result<Vec<AttemptDto>> {
        let test = self.find_test(test_id).await?;

        let allowed = match caller.role {
            UserRole::Admin => true,
            UserRole::Teacher => {
                test.creator_id == caller.id || caller.teaches_subject(test.subject_id)
            }
            UserRole::Student => false,
        };
        if !allowed {
            return Err(Error::Forbidden(
                "You do not have access to this test's results".to_string(),
            ));
        }

        let attempts = self.store.attempts_for_test(test_id).await;
        let mut results = Vec::with_capacity(attempts.len());
        for attempt in &attempts {
            let student = self.store.find_user(attempt.student_id).await;
            results.push(AttemptDto::from_attempt(attempt, Some(&test), student.as_ref()));
        }
        Ok(results)
    }

    fn check_result_access(&self, attempt: &Attempt, test: &Test, caller: &User) -> Result<()> {
        let allowed = match caller.role {
            UserRole::Admin => true,
            UserRole::Student => attempt.student_id == caller.id,
            UserRole::Teacher => {
                test.creator_id == caller.id || caller.teaches_subject(test.subject_id)
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "You do not have access to this attempt".to_string(),
            ))
        }
    }

    async fn find_test(&self, test_id: Uuid) -> Result<Test> {
        self.store
            .find_test(test_id)
            .await
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))
    }

    async fn find_attempt(&self, attempt_id: Uuid) -> Result<Attempt> {
        self.store
            .find_attempt(attempt_id)
            .await
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))
    }
}
