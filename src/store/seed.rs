use crate::models::test::{Answer, Question, QuestionType, Test};
use crate::models::user::{Grade, Subject, User, UserRole};
use crate::store::MemoryStore;
use chrono::Utc;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

const DEFAULT_SUBJECTS: &[&str] = &[
    "Mathematics",
    "Russian",
    "Literature",
    "Physics",
    "Chemistry",
    "Biology",
    "History",
    "Geography",
    "Computer Science",
    "English",
];

/// Populates reference data plus a demo teacher, student and test so a
/// fresh instance is usable right away. Tokens are fixed so demo clients
/// can authenticate without a login flow.
pub async fn seed_demo_data(store: &MemoryStore) {
    let mut grade_ids = Vec::new();
    for number in 1..=11 {
        for letter in ["A", "B", "C", "D"] {
            let grade = Grade {
                id: Uuid::new_v4(),
                number,
                letter: letter.to_string(),
                full_name: format!("{}{}", number, letter),
            };
            grade_ids.push(grade.id);
            store.insert_grade(grade).await;
        }
    }

    let mut subject_ids = Vec::new();
    for name in DEFAULT_SUBJECTS {
        let subject = Subject {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        subject_ids.push(subject.id);
        store.insert_subject(subject).await;
    }

    let demo_grade = grade_ids[0];
    let demo_subject = subject_ids[0];

    store
        .insert_user(User {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            full_name: "System Administrator".to_string(),
            role: UserRole::Admin,
            grade_id: None,
            subject_ids: HashSet::new(),
            teaching_grade_ids: HashSet::new(),
            token: Some("demo-admin-token".to_string()),
            active: true,
        })
        .await;

    let teacher_id = Uuid::new_v4();
    store
        .insert_user(User {
            id: teacher_id,
            username: "teacher".to_string(),
            full_name: "Demo Teacher".to_string(),
            role: UserRole::Teacher,
            grade_id: None,
            subject_ids: HashSet::from([demo_subject]),
            teaching_grade_ids: HashSet::from([demo_grade]),
            token: Some("demo-teacher-token".to_string()),
            active: true,
        })
        .await;

    store
        .insert_user(User {
            id: Uuid::new_v4(),
            username: "student".to_string(),
            full_name: "Demo Student".to_string(),
            role: UserRole::Student,
            grade_id: Some(demo_grade),
            subject_ids: HashSet::new(),
            teaching_grade_ids: HashSet::new(),
            token: Some("demo-student-token".to_string()),
            active: true,
        })
        .await;

    store
        .insert_test(Test {
            id: Uuid::new_v4(),
            title: "Arithmetic basics".to_string(),
            description: Some("Demo test".to_string()),
            subject_id: demo_subject,
            creator_id: teacher_id,
            created_at: Utc::now(),
            updated_at: None,
            time_limit_minutes: 15,
            is_active: true,
            max_attempts: 3,
            questions_to_show: Some(2),
            grade_ids: HashSet::from([demo_grade]),
            questions: vec![
                choice_question("2 + 2 = ?", &[("3", false), ("4", true), ("5", false)]),
                choice_question("3 * 3 = ?", &[("6", false), ("9", true), ("12", false)]),
                text_question("The square root of 16 is", "4"),
            ],
        })
        .await;

    info!("seeded demo reference data");
}

fn choice_question(text: &str, answers: &[(&str, bool)]) -> Question {
    Question {
        id: Uuid::new_v4(),
        text: text.to_string(),
        question_type: QuestionType::SingleChoice,
        points: 1,
        answers: answers
            .iter()
            .map(|(text, is_correct)| Answer {
                id: Uuid::new_v4(),
                text: text.to_string(),
                is_correct: *is_correct,
            })
            .collect(),
    }
}

fn text_question(text: &str, correct: &str) -> Question {
    Question {
        id: Uuid::new_v4(),
        text: text.to_string(),
        question_type: QuestionType::TextAnswer,
        points: 1,
        answers: vec![Answer {
            id: Uuid::new_v4(),
            text: correct.to_string(),
            is_correct: true,
        }],
    }
}
