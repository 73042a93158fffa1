use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    /// Class the student belongs to; `None` for teachers and admins.
    pub grade_id: Option<Uuid>,
    /// Subjects a teacher is allowed to author and review tests for.
    #[serde(default)]
    pub subject_ids: HashSet<Uuid>,
    #[serde(default)]
    pub teaching_grade_ids: HashSet<Uuid>,
    /// Opaque session token issued by the external auth collaborator.
    pub token: Option<String>,
    pub active: bool,
}

impl User {
    pub fn teaches_subject(&self, subject_id: Uuid) -> bool {
        self.subject_ids.contains(&subject_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: Uuid,
    pub number: i32,
    pub letter: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
}
