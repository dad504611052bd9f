//! Snapshot and entity record definitions.
//!
//! Field names serialize in camelCase so snapshots written by this client are
//! byte-compatible with replicas already stored in a shared channel.

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator: grades submissions, manages users.
    Admin,
    /// Regular learner account.
    User,
}

/// Difficulty level of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseLevel {
    /// Entry level.
    Beginner,
    /// Requires prior exposure.
    Intermediate,
    /// Requires solid fundamentals.
    Advanced,
}

/// What kind of work a task expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Free-text answer.
    Text,
    /// Video upload.
    Video,
    /// Live lesson attendance.
    Lesson,
}

/// Lifecycle of a live lesson task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    /// Not yet started.
    Inactive,
    /// Currently running.
    Active,
    /// Finished.
    Completed,
}

/// Review state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Awaiting review.
    Pending,
    /// Graded and accepted.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
}

/// A platform account.
///
/// The map key in [`Snapshot::users`] is always the normalized username; the
/// `username` field repeats it so a record stays self-describing when passed
/// around on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Normalized (trimmed, lowercase) username. Immutable once created.
    pub username: String,
    /// Digest of the account password, see [`password_digest`].
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Ids of courses this user is enrolled in.
    pub courses: Vec<String>,
    /// Sum of all approved submission grades.
    pub total_score: i64,
    /// Leaderboard rating.
    pub rating: i64,
    /// ISO-8601 timestamp of account creation.
    pub registration_date: String,
}

/// A course offered on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Unique course id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Instructor display name.
    pub instructor: String,
    /// Human-readable duration ("6 weeks").
    pub duration: String,
    /// Difficulty level.
    pub level: CourseLevel,
    /// Usernames of enrolled students.
    pub student_usernames: Vec<String>,
    /// Ids of tasks belonging to this course.
    pub task_ids: Vec<String>,
    /// ISO-8601 timestamp of course creation.
    pub created_date: String,
}

/// A task within a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task id.
    pub id: String,
    /// Id of the owning course.
    pub course_id: String,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// What kind of work the task expects.
    #[serde(rename = "type")]
    pub kind: TaskKind,
    /// Inline text content for text tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// Video URL for video tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Original filename of an uploaded video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_filename: Option<String>,
    /// Time limit in minutes, when the task is timed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    /// Maximum points a submission can earn.
    pub max_points: i64,
    /// ISO-8601 submission deadline.
    pub deadline: String,
    /// ISO-8601 timestamp of task creation.
    pub created_date: String,
    /// Lifecycle state for lesson tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_status: Option<LessonStatus>,
    /// ISO-8601 start time for lesson tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_start_time: Option<String>,
}

/// A student's answer to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Unique submission id.
    pub id: String,
    /// Normalized username of the author.
    pub username: String,
    /// Id of the answered task.
    pub task_id: String,
    /// Kind of the answered task.
    #[serde(rename = "type")]
    pub kind: TaskKind,
    /// Free-text answer for text tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    /// Video URL for video tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Review state.
    pub status: SubmissionStatus,
    /// Grade awarded on approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<i64>,
    /// Reviewer comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_comment: Option<String>,
    /// ISO-8601 timestamp of submission.
    pub submission_time: String,
}

/// The full application state exchanged between local storage and the remote
/// channel.
///
/// A snapshot is constructed once at boot and then continuously superseded by
/// merge results; the remote copy is a peer replica, not a master. The entity
/// maps are `BTreeMap` so serialization is canonical: equal snapshots produce
/// identical JSON and therefore identical [fingerprints](Snapshot::fingerprint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Accounts, keyed by normalized username.
    pub users: BTreeMap<String, User>,
    /// Courses, keyed by course id.
    pub courses: BTreeMap<String, Course>,
    /// Tasks, keyed by task id.
    pub tasks: BTreeMap<String, Task>,
    /// Submissions, keyed by submission id.
    pub submissions: BTreeMap<String, Submission>,
    /// Milliseconds since epoch, stamped when a mutation is finalized.
    ///
    /// The sole ordering signal between two snapshots. Never regresses across
    /// snapshots accepted into the local store.
    pub last_updated: u64,
}

/// Seeded administrator username.
pub const ADMIN_USERNAME: &str = "admin";

const ADMIN_PASSWORD_DIGEST: &str = "-1274085368";

impl Snapshot {
    /// The built-in boot state: a single seeded admin account and empty
    /// entity maps.
    ///
    /// Used when neither local storage nor the remote channel has data yet.
    pub fn initial() -> Self {
        let admin = User {
            username: ADMIN_USERNAME.to_string(),
            password_hash: ADMIN_PASSWORD_DIGEST.to_string(),
            role: Role::Admin,
            courses: Vec::new(),
            total_score: 0,
            rating: 0,
            registration_date: String::new(),
        };

        let mut users = BTreeMap::new();
        users.insert(ADMIN_USERNAME.to_string(), admin);

        Self {
            users,
            courses: BTreeMap::new(),
            tasks: BTreeMap::new(),
            submissions: BTreeMap::new(),
            last_updated: 0,
        }
    }

    /// Checks structural invariants on an imported snapshot.
    ///
    /// Every user map key must equal the record's normalized username.
    /// Referential integrity between submissions, tasks and users is the
    /// action pipeline's responsibility and is not checked here.
    pub fn validate(&self) -> ValidationResult<()> {
        for (key, user) in &self.users {
            if *key != normalize_username(&user.username) {
                return Err(ValidationError::UsernameKeyMismatch {
                    key: key.clone(),
                    username: user.username.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Normalizes a username: trims surrounding whitespace and lowercases.
///
/// All user map keys and cross-references use the normalized form.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Computes the password digest used on the wire.
///
/// This is the 32-bit string hash the existing replicas store
/// (`h = h * 31 + unit` over UTF-16 code units, wrapping i32, rendered in
/// decimal). Kept so this client can share a channel with them; swap this
/// single function to migrate the scheme.
pub fn password_digest(password: &str) -> String {
    let mut hash: i32 = 0;
    for unit in password.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    hash.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_seeds_admin() {
        let snapshot = Snapshot::initial();
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.last_updated, 0);

        let admin = &snapshot.users[ADMIN_USERNAME];
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.username, ADMIN_USERNAME);
    }

    #[test]
    fn username_normalization() {
        assert_eq!(normalize_username("  Alice "), "alice");
        assert_eq!(normalize_username("BOB"), "bob");
        assert_eq!(normalize_username("carol"), "carol");
    }

    #[test]
    fn password_digest_matches_seeded_admin() {
        // The admin seed was produced by the same hash.
        assert_eq!(password_digest("fizika"), "-1274085368");
    }

    #[test]
    fn password_digest_empty() {
        assert_eq!(password_digest(""), "0");
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let snapshot = Snapshot::initial();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = Snapshot::initial();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"lastUpdated\":0"));
        assert!(json.contains("\"passwordHash\""));
        assert!(json.contains("\"registrationDate\""));
    }

    #[test]
    fn validate_rejects_mismatched_user_key() {
        let mut snapshot = Snapshot::initial();
        let mut rogue = snapshot.users[ADMIN_USERNAME].clone();
        rogue.username = "somebody-else".to_string();
        snapshot.users.insert(ADMIN_USERNAME.to_string(), rogue);

        assert!(matches!(
            snapshot.validate(),
            Err(ValidationError::UsernameKeyMismatch { .. })
        ));
    }

    #[test]
    fn validate_accepts_initial() {
        assert!(Snapshot::initial().validate().is_ok());
    }

    #[test]
    fn task_type_field_name_on_wire() {
        let task = Task {
            id: "t1".into(),
            course_id: "c1".into(),
            title: "Intro".into(),
            description: String::new(),
            kind: TaskKind::Text,
            text_content: None,
            video_url: None,
            video_filename: None,
            time_limit: None,
            max_points: 10,
            deadline: String::new(),
            created_date: String::new(),
            lesson_status: None,
            lesson_start_time: None,
        };
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"type\":\"text\""));
        assert!(!json.contains("textContent"));
    }
}
