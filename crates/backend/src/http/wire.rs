//! JSON shapes exchanged with the REST backend and their mapping to domain types.
//!
//! The backend emits snake_case while the mobile client historically sent and
//! read camelCase, so every incoming field accepts both spellings.

use chrono::{DateTime, NaiveDateTime, Utc};
use quiz_core::model::{
    ArticleId, AuthenticatedUser, Choice, CompletionId, CompletionStatus, ContentType,
    ProgressEntry, ProgressEvent, ProgressId, Question, Quiz, QuizCompletion, QuizDraft, QuizId,
    Score, UserId,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::repository::{BackendError, NewCompletionRecord};

fn decode<E: std::fmt::Display>(e: E) -> BackendError {
    BackendError::Decode(e.to_string())
}

/// Ids arrive as numbers from the backend but as strings from some client paths.
fn flexible_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Accepts RFC 3339, RFC 2822 (Flask's default) and naive `YYYY-MM-DD HH:MM:SS` as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BackendError> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| BackendError::Decode(format!("unrecognized timestamp: {raw}")))
}

//
// ─── QUIZZES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChoiceDto {
    pub text: String,
    #[serde(rename = "isCorrect", alias = "is_correct", default)]
    pub is_correct: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct QuestionDto {
    pub text: String,
    #[serde(default)]
    pub choices: Vec<ChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizDto {
    #[serde(deserialize_with = "flexible_id")]
    pub id: u64,
    #[serde(alias = "articleId", deserialize_with = "flexible_id")]
    pub article_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
}

impl QuizDto {
    pub(crate) fn into_quiz(self) -> Quiz {
        let questions = self
            .questions
            .into_iter()
            .map(|q| {
                Question::new(
                    q.text,
                    q.choices
                        .into_iter()
                        .map(|c| Choice::new(c.text, c.is_correct))
                        .collect(),
                )
            })
            .collect();
        Quiz::new(
            QuizId::new(self.id),
            ArticleId::new(self.article_id),
            self.title,
            self.description,
            questions,
        )
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizDraftBody {
    pub title: String,
    pub article_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<QuestionDto>,
}

impl QuizDraftBody {
    pub(crate) fn from_draft(draft: &QuizDraft) -> Self {
        Self {
            title: draft.title.clone(),
            article_id: draft.article_id.value(),
            description: draft.description.clone(),
            questions: draft
                .questions
                .iter()
                .map(|q| QuestionDto {
                    text: q.text.clone(),
                    choices: q
                        .choices
                        .iter()
                        .map(|c| ChoiceDto {
                            text: c.text.clone(),
                            is_correct: c.is_correct,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

//
// ─── COMPLETIONS ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct CompletionBody {
    pub user_id: u64,
    pub quiz_id: u64,
    pub article_id: u64,
    pub score: u8,
}

impl CompletionBody {
    pub(crate) fn from_record(record: &NewCompletionRecord) -> Self {
        Self {
            user_id: record.user_id.value(),
            quiz_id: record.quiz_id.value(),
            article_id: record.article_id.value(),
            score: record.score.value(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionDto {
    #[serde(deserialize_with = "flexible_id")]
    pub id: u64,
    #[serde(alias = "userId", deserialize_with = "flexible_id")]
    pub user_id: u64,
    #[serde(alias = "quizId", deserialize_with = "flexible_id")]
    pub quiz_id: u64,
    #[serde(alias = "articleId", deserialize_with = "flexible_id")]
    pub article_id: u64,
    pub score: u32,
    #[serde(alias = "completedAt")]
    pub completed_at: String,
}

impl CompletionDto {
    pub(crate) fn into_completion(self) -> Result<QuizCompletion, BackendError> {
        Ok(QuizCompletion {
            id: CompletionId::new(self.id),
            user_id: UserId::new(self.user_id),
            quiz_id: QuizId::new(self.quiz_id),
            article_id: ArticleId::new(self.article_id),
            score: Score::new(self.score).map_err(decode)?,
            completed_at: parse_timestamp(&self.completed_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionCheckDto {
    pub completed: bool,
    #[serde(default)]
    pub completion: Option<CompletionDto>,
}

impl CompletionCheckDto {
    /// A `completed: true` without a record is treated as not completed: a
    /// retake would have nothing to delete.
    pub(crate) fn into_status(self) -> Result<CompletionStatus, BackendError> {
        match (self.completed, self.completion) {
            (true, Some(dto)) => Ok(CompletionStatus::completed(dto.into_completion()?)),
            _ => Ok(CompletionStatus::not_completed()),
        }
    }
}

//
// ─── PROGRESS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct ProgressBody {
    pub user_id: u64,
    pub content_type: &'static str,
    pub points_collected: u32,
}

impl ProgressBody {
    pub(crate) fn from_event(event: &ProgressEvent) -> Self {
        Self {
            user_id: event.user_id.value(),
            content_type: event.content_type.as_str(),
            points_collected: event.points_collected,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressDto {
    #[serde(deserialize_with = "flexible_id")]
    pub id: u64,
    #[serde(alias = "userId", deserialize_with = "flexible_id")]
    pub user_id: u64,
    #[serde(alias = "contentType")]
    pub content_type: String,
    #[serde(alias = "pointsCollected")]
    pub points_collected: u32,
    pub date: String,
}

impl ProgressDto {
    pub(crate) fn into_entry(self) -> Result<ProgressEntry, BackendError> {
        Ok(ProgressEntry {
            id: ProgressId::new(self.id),
            user_id: UserId::new(self.user_id),
            content_type: self.content_type.parse::<ContentType>().map_err(decode)?,
            points_collected: self.points_collected,
            date: parse_timestamp(&self.date)?,
        })
    }
}

//
// ─── AUTH ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct LoginDto {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(deserialize_with = "flexible_id")]
    pub id: u64,
    #[serde(alias = "firstName", default)]
    pub first_name: String,
    #[serde(alias = "lastName", default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl LoginDto {
    pub(crate) fn into_user(self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            role: self.role,
            access_token: self.access_token,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct RefreshDto {
    #[serde(alias = "accessToken")]
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[test]
    fn quiz_decodes_camel_case_client_shape() {
        let raw = r#"{
            "id": 4,
            "articleId": "12",
            "title": "Stress",
            "questions": [
                {"text": "Q1", "choices": [{"text": "a", "isCorrect": true}, {"text": "b", "isCorrect": false}]}
            ],
            "createdAt": "2024-01-01T00:00:00"
        }"#;
        let quiz = serde_json::from_str::<QuizDto>(raw).unwrap().into_quiz();
        assert_eq!(quiz.id(), QuizId::new(4));
        assert_eq!(quiz.article_id(), ArticleId::new(12));
        assert_eq!(quiz.questions()[0].correct_choice(), Some(0));
    }

    #[test]
    fn quiz_decodes_snake_case_backend_shape() {
        let raw = r#"{"id": 1, "article_id": 2, "title": "T", "description": null,
            "questions": [{"text": "Q", "choices": [{"text": "x", "is_correct": true}]}]}"#;
        let quiz = serde_json::from_str::<QuizDto>(raw).unwrap().into_quiz();
        assert!(quiz.questions()[0].choices[0].is_correct);
        assert_eq!(quiz.description(), None);
    }

    #[test]
    fn completion_check_decodes_both_branches() {
        let done = r#"{"completed": true, "completion": {"id": 8, "user_id": 1, "quiz_id": 2,
            "article_id": 3, "score": 75, "completed_at": "2023-11-14T22:13:20Z"}}"#;
        let status = serde_json::from_str::<CompletionCheckDto>(done)
            .unwrap()
            .into_status()
            .unwrap();
        let completion = status.completion.unwrap();
        assert_eq!(completion.id, CompletionId::new(8));
        assert_eq!(completion.score.value(), 75);
        assert_eq!(completion.completed_at, fixed_now());

        let open = r#"{"completed": false, "completion": null}"#;
        let status = serde_json::from_str::<CompletionCheckDto>(open)
            .unwrap()
            .into_status()
            .unwrap();
        assert_eq!(status, CompletionStatus::not_completed());
    }

    #[test]
    fn completion_with_impossible_score_is_a_decode_error() {
        let raw = r#"{"id": 1, "userId": 1, "quizId": 1, "articleId": 1, "score": 250,
            "completedAt": "2023-11-14 22:13:20"}"#;
        let dto = serde_json::from_str::<CompletionDto>(raw).unwrap();
        assert!(matches!(
            dto.into_completion(),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn timestamps_in_backend_formats() {
        assert_eq!(parse_timestamp("2023-11-14 22:13:20").unwrap(), fixed_now());
        assert_eq!(parse_timestamp("2023-11-14T22:13:20").unwrap(), fixed_now());
        assert_eq!(
            parse_timestamp("Tue, 14 Nov 2023 22:13:20 +0000").unwrap(),
            fixed_now()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn progress_body_uses_wire_names() {
        let body = ProgressBody::from_event(&ProgressEvent::quiz_completed(UserId::new(9)));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"user_id": 9, "content_type": "article", "points_collected": 1})
        );
    }

    #[test]
    fn progress_entry_decodes_client_shape() {
        let raw = r#"{"id": "3", "userId": 9, "contentType": "meditation",
            "pointsCollected": 2, "date": "2023-11-14 22:13:20"}"#;
        let entry = serde_json::from_str::<ProgressDto>(raw)
            .unwrap()
            .into_entry()
            .unwrap();
        assert_eq!(entry.content_type, ContentType::Meditation);
        assert_eq!(entry.points_collected, 2);
    }

    #[test]
    fn login_decodes_snake_case() {
        let raw = r#"{"access_token": "abc", "id": 5, "first_name": "Jo", "last_name": "Ng",
            "email": "jo@example.com", "role": "User", "location": "Toronto"}"#;
        let user = serde_json::from_str::<LoginDto>(raw).unwrap().into_user();
        assert_eq!(user.id, UserId::new(5));
        assert_eq!(user.access_token, "abc");
    }

    #[test]
    fn draft_body_serializes_is_correct_in_camel_case() {
        let draft = QuizDraft {
            title: "T".into(),
            article_id: ArticleId::new(2),
            description: None,
            questions: vec![Question::new("Q", vec![Choice::correct("a")])],
        };
        let json = serde_json::to_value(QuizDraftBody::from_draft(&draft)).unwrap();
        assert_eq!(json["questions"][0]["choices"][0]["isCorrect"], true);
        assert!(json.get("description").is_none());
    }
}
