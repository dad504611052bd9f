//! Domain mutations over the sync engine.
//!
//! Every mutation goes through [`SyncEngine::perform_update`], so it always
//! observes the freshest reachable state and its result is persisted and
//! pushed by the engine. Referential integrity (a submission pointing at a
//! real task and user, enrollment pointing at a real course) is enforced
//! here, not in the engine or the merge.

use crate::engine::SyncEngine;
use crate::error::ActionError;
use chrono::{SecondsFormat, Utc};
use edusync_channel::RemoteChannel;
use edusync_core::{
    normalize_username, password_digest, Course, Role, Snapshot, Submission, SubmissionStatus,
    Task, User,
};
use edusync_store::LocalStore;

/// The mutate-and-sync API consumed by UI and CLI layers.
///
/// Holds a borrow of the engine; construct one wherever mutations are issued.
/// Methods return [`ActionError`] for rejections only; remote failures
/// degrade to the engine's status flags and never surface here.
pub struct ActionPipeline<'a, C: RemoteChannel, S: LocalStore> {
    engine: &'a SyncEngine<C, S>,
}

impl<'a, C: RemoteChannel, S: LocalStore> ActionPipeline<'a, C, S> {
    /// Creates a pipeline over `engine`.
    pub fn new(engine: &'a SyncEngine<C, S>) -> Self {
        Self { engine }
    }

    /// Registers a new account and returns the normalized username.
    ///
    /// Uniqueness is checked against the freshly pulled-and-merged snapshot
    /// immediately before insertion, because another device may have claimed
    /// the name since the last refresh. Exactly one of two racing
    /// registrations wins; the loser gets [`ActionError::UsernameTaken`] and
    /// nothing is pushed.
    pub fn register(&self, username: &str, password: &str) -> Result<String, ActionError> {
        let name = normalize_username(username);
        let digest = password_digest(password);
        let registered = name.clone();

        self.engine.perform_update(move |mut snapshot| {
            if snapshot.users.contains_key(&name) {
                return Err(ActionError::UsernameTaken(name));
            }
            let user = User {
                username: name.clone(),
                password_hash: digest,
                role: Role::User,
                courses: Vec::new(),
                total_score: 0,
                rating: 0,
                registration_date: now_iso(),
            };
            snapshot.users.insert(name, user);
            Ok(snapshot)
        })?;

        Ok(registered)
    }

    /// Verifies credentials against local state and returns the account.
    ///
    /// Deliberately does not touch the network: a device must be able to log
    /// in offline with whatever state it last synced.
    pub fn login(&self, username: &str, password: &str) -> Result<User, ActionError> {
        let name = normalize_username(username);
        let digest = password_digest(password);

        let snapshot = self.engine.snapshot();
        match snapshot.users.get(&name) {
            Some(user) if user.password_hash == digest => Ok(user.clone()),
            _ => Err(ActionError::InvalidCredentials),
        }
    }

    /// Adds (or replaces) a course.
    pub fn add_course(&self, course: Course) -> Result<(), ActionError> {
        self.engine.perform_update(move |mut snapshot| {
            snapshot.courses.insert(course.id.clone(), course);
            Ok(snapshot)
        })
    }

    /// Enrolls a user into a course, updating both sides of the relation.
    ///
    /// Enrolling twice is a successful no-op (and produces no remote write).
    pub fn enroll(&self, username: &str, course_id: &str) -> Result<(), ActionError> {
        let name = normalize_username(username);
        let course_id = course_id.to_string();

        self.engine.perform_update(move |mut snapshot| {
            if !snapshot.users.contains_key(&name) {
                return Err(ActionError::UnknownUser(name));
            }
            if !snapshot.courses.contains_key(&course_id) {
                return Err(ActionError::UnknownCourse(course_id));
            }

            let user = snapshot.users.get_mut(&name).ok_or_else(|| {
                ActionError::UnknownUser(name.clone())
            })?;
            if user.courses.contains(&course_id) {
                return Ok(snapshot);
            }
            user.courses.push(course_id.clone());

            let course = snapshot.courses.get_mut(&course_id).ok_or_else(|| {
                ActionError::UnknownCourse(course_id.clone())
            })?;
            course.student_usernames.push(name);
            Ok(snapshot)
        })
    }

    /// Adds a task to an existing course.
    pub fn add_task(&self, task: Task) -> Result<(), ActionError> {
        self.engine.perform_update(move |mut snapshot| {
            if !snapshot.courses.contains_key(&task.course_id) {
                return Err(ActionError::UnknownCourse(task.course_id));
            }
            snapshot.tasks.insert(task.id.clone(), task);
            Ok(snapshot)
        })
    }

    /// Applies an in-place edit to an existing task.
    pub fn update_task<F>(&self, task_id: &str, edit: F) -> Result<(), ActionError>
    where
        F: FnOnce(&mut Task),
    {
        let task_id = task_id.to_string();
        self.engine.perform_update(move |mut snapshot| {
            let task = snapshot
                .tasks
                .get_mut(&task_id)
                .ok_or(ActionError::UnknownTask(task_id))?;
            edit(task);
            Ok(snapshot)
        })
    }

    /// Records a submission after checking its task and author exist.
    pub fn submit(&self, submission: Submission) -> Result<(), ActionError> {
        self.engine.perform_update(move |mut snapshot| {
            if !snapshot.tasks.contains_key(&submission.task_id) {
                return Err(ActionError::UnknownTask(submission.task_id));
            }
            if !snapshot.users.contains_key(&submission.username) {
                return Err(ActionError::UnknownUser(submission.username));
            }
            snapshot.submissions.insert(submission.id.clone(), submission);
            Ok(snapshot)
        })
    }

    /// Approves a submission with a grade and credits the author's score.
    pub fn grade(
        &self,
        submission_id: &str,
        grade: i64,
        comment: Option<String>,
    ) -> Result<(), ActionError> {
        let submission_id = submission_id.to_string();
        self.engine.perform_update(move |mut snapshot| {
            let author = {
                let submission = snapshot
                    .submissions
                    .get_mut(&submission_id)
                    .ok_or(ActionError::UnknownSubmission(submission_id))?;
                submission.status = SubmissionStatus::Approved;
                submission.grade = Some(grade);
                submission.admin_comment = comment;
                submission.username.clone()
            };

            let user = snapshot
                .users
                .get_mut(&author)
                .ok_or(ActionError::UnknownUser(author))?;
            user.total_score += grade;
            Ok(snapshot)
        })
    }

    /// Replaces a user's password digest.
    pub fn change_password(&self, username: &str, password: &str) -> Result<(), ActionError> {
        let name = normalize_username(username);
        let digest = password_digest(password);
        self.engine.perform_update(move |mut snapshot| {
            let user = snapshot
                .users
                .get_mut(&name)
                .ok_or(ActionError::UnknownUser(name))?;
            user.password_hash = digest;
            Ok(snapshot)
        })
    }

    /// Removes a user record.
    ///
    /// The only way an entry leaves a snapshot: the merge itself never
    /// deletes, so removal must happen here before the result is persisted
    /// and pushed.
    pub fn delete_user(&self, username: &str) -> Result<(), ActionError> {
        let name = normalize_username(username);
        self.engine.perform_update(move |mut snapshot| {
            if snapshot.users.remove(&name).is_none() {
                return Err(ActionError::UnknownUser(name));
            }
            Ok(snapshot)
        })
    }

    /// Replaces the whole state with an imported backup.
    ///
    /// A parse or structural failure rejects the import and leaves state
    /// unchanged; a valid import supersedes everything, including what peers
    /// hold, once it propagates.
    pub fn import_state(&self, json: &str) -> Result<(), ActionError> {
        let imported: Snapshot =
            serde_json::from_str(json).map_err(|e| ActionError::InvalidImport(e.to_string()))?;
        imported
            .validate()
            .map_err(|e| ActionError::InvalidImport(e.to_string()))?;

        self.engine.perform_update(move |_| Ok(imported))
    }

    /// Serializes the current state as a pretty-printed backup.
    pub fn export_state(&self) -> Result<String, ActionError> {
        serde_json::to_string_pretty(&self.engine.snapshot())
            .map_err(|e| ActionError::Storage(e.to_string()))
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
