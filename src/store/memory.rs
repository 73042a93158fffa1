use crate::models::attempt::Attempt;
use crate::models::test::Test;
use crate::models::user::{Grade, Subject, User};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;
use uuid::Uuid;

/// Storage boundary for the assessment engine.
///
/// All attempt mutations for one (test, student) pair happen under that
/// pair's lock, which stands in for the row lock a transactional store
/// would take. Operations on different pairs never contend.
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    users_by_token: RwLock<HashMap<String, Uuid>>,
    grades: RwLock<HashMap<Uuid, Grade>>,
    subjects: RwLock<HashMap<Uuid, Subject>>,
    tests: RwLock<HashMap<Uuid, Test>>,
    attempts: RwLock<HashMap<Uuid, Attempt>>,
    attempt_locks: DashMap<(Uuid, Uuid), Arc<Mutex<()>>>,
    snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistentSnapshot {
    users: HashMap<Uuid, User>,
    grades: HashMap<Uuid, Grade>,
    subjects: HashMap<Uuid, Subject>,
    tests: HashMap<Uuid, Test>,
    attempts: HashMap<Uuid, Attempt>,
}

impl MemoryStore {
    pub fn new(snapshot_path: Option<&str>) -> Self {
        let snapshot = snapshot_path.and_then(|path| {
            let raw = fs::read_to_string(path).ok()?;
            match serde_json::from_str::<PersistentSnapshot>(&raw) {
                Ok(s) => Some(s),
                Err(err) => {
                    warn!("failed to read local snapshot {}: {}", path, err);
                    None
                }
            }
        });

        let users = snapshot.as_ref().map(|s| s.users.clone()).unwrap_or_default();
        let users_by_token = users
            .values()
            .filter_map(|u| u.token.clone().map(|t| (t, u.id)))
            .collect();

        Self {
            users: RwLock::new(users),
            users_by_token: RwLock::new(users_by_token),
            grades: RwLock::new(snapshot.as_ref().map(|s| s.grades.clone()).unwrap_or_default()),
            subjects: RwLock::new(
                snapshot.as_ref().map(|s| s.subjects.clone()).unwrap_or_default(),
            ),
            tests: RwLock::new(snapshot.as_ref().map(|s| s.tests.clone()).unwrap_or_default()),
            attempts: RwLock::new(snapshot.map(|s| s.attempts).unwrap_or_default()),
            attempt_locks: DashMap::new(),
            snapshot_path: snapshot_path.map(PathBuf::from),
        }
    }

    /// Exclusive logical lock on the incomplete-attempt key for one
    /// (test, student) pair. Hold the guard across the whole read-check-write
    /// sequence of Start, FetchQuestions and Submit.
    pub fn attempt_lock(&self, test_id: Uuid, student_id: Uuid) -> Arc<Mutex<()>> {
        self.attempt_locks
            .entry((test_id, student_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // Users and reference data

    pub async fn insert_user(&self, user: User) {
        if let Some(token) = user.token.clone() {
            self.users_by_token.write().await.insert(token, user.id);
        }
        self.users.write().await.insert(user.id, user);
    }

    pub async fn find_user(&self, user_id: Uuid) -> Option<User> {
        self.users.read().await.get(&user_id).cloned()
    }

    pub async fn find_user_by_token(&self, token: &str) -> Option<User> {
        let user_id = *self.users_by_token.read().await.get(token)?;
        let user = self.users.read().await.get(&user_id).cloned()?;
        user.active.then_some(user)
    }

    pub async fn insert_grade(&self, grade: Grade) {
        self.grades.write().await.insert(grade.id, grade);
    }

    pub async fn find_grade(&self, grade_id: Uuid) -> Option<Grade> {
        self.grades.read().await.get(&grade_id).cloned()
    }

    pub async fn insert_subject(&self, subject: Subject) {
        self.subjects.write().await.insert(subject.id, subject);
    }

    // Test catalog (owned by the authoring collaborator; the engine only
    // reads it, and tolerates it changing between calls)

    pub async fn insert_test(&self, test: Test) {
        self.tests.write().await.insert(test.id, test);
    }

    pub async fn find_test(&self, test_id: Uuid) -> Option<Test> {
        self.tests.read().await.get(&test_id).cloned()
    }

    // Attempts

    pub async fn find_attempt(&self, attempt_id: Uuid) -> Option<Attempt> {
        self.attempts.read().await.get(&attempt_id).cloned()
    }

    pub async fn incomplete_attempts(&self, test_id: Uuid, student_id: Uuid) -> Vec<Attempt> {
        self.attempts
            .read()
            .await
            .values()
            .filter(|a| a.test_id == test_id && a.student_id == student_id && !a.completed)
            .cloned()
            .collect()
    }

    pub async fn completed_attempt_count(&self, test_id: Uuid, student_id: Uuid) -> usize {
        self.attempts
            .read()
            .await
            .values()
            .filter(|a| a.test_id == test_id && a.student_id == student_id && a.completed)
            .count()
    }

    pub async fn attempts_for_student(&self, student_id: Uuid) -> Vec<Attempt> {
        let mut attempts: Vec<Attempt> = self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.started_at);
        attempts
    }

    pub async fn attempts_for_test(&self, test_id: Uuid) -> Vec<Attempt> {
        let mut attempts: Vec<Attempt> = self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.test_id == test_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.started_at);
        attempts
    }

    /// Inserts or replaces the attempt row in one step, so score, completion
    /// flag and answer rows land together.
    pub async fn upsert_attempt(&self, attempt: Attempt) {
        self.attempts.write().await.insert(attempt.id, attempt);
        self.persist().await;
    }

    pub async fn remove_attempt(&self, attempt_id: Uuid) {
        self.attempts.write().await.remove(&attempt_id);
        self.persist().await;
    }

    /// Best-effort snapshot write; a failure is logged, never surfaced.
    async fn persist(&self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let snapshot = PersistentSnapshot {
            users: self.users.read().await.clone(),
            grades: self.grades.read().await.clone(),
            subjects: self.subjects.read().await.clone(),
            tests: self.tests.read().await.clone(),
            attempts: self.attempts.read().await.clone(),
        };
        match serde_json::to_string(&snapshot) {
            Ok(raw) => {
                if let Err(err) = fs::write(path, raw) {
                    warn!("failed to write snapshot {}: {}", path.display(), err);
                }
            }
            Err(err) => warn!("failed to serialize snapshot: {}", err),
        }
    }
}
