// Import necessary crates and modules
use crate::activity::{Activity, ActivityInfo};
use crate::submission::Submission;
use crate::CourseInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Structure for storing and managing student data on the platform.
///
/// Holds the essentials of an enrolled student and a link back to the course
/// (and through it, the platform credentials) for API interactions.
///
/// Fields:
/// - `id`: The unique identifier of the student.
/// - `name`: The student's full name.
/// - `email`: The student's email address.
/// - `course_info`: A thread-safe reference (`Arc`) to the enclosing course.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StudentInfo {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub course_info: Arc<CourseInfo>,
}

/// High-level representation of a student enrolled in a course.
///
/// Wrapper around `StudentInfo`, used wherever student-specific operations are
/// performed, such as associating submissions with activities.
#[derive(Debug, Clone)]
pub struct Student {
    pub info: Arc<StudentInfo>,
}

impl Student {
    /// Associates each activity with this student's latest submission for it.
    ///
    /// Filters the given submissions down to this student, then picks the most
    /// recent one per activity by `submitted_at`. Activities the student never
    /// answered map to `None`, which is how pending work is detected.
    ///
    /// Returns:
    /// - `HashMap<u64, (Arc<ActivityInfo>, Option<Submission>)>`: activity id
    ///   mapped to the activity info and the latest submission, if any.
    pub fn latest_submissions_per_activity(
        &self,
        activities: &[Activity],
        submissions: &[Submission],
    ) -> HashMap<u64, (Arc<ActivityInfo>, Option<Submission>)> {
        let mut association: HashMap<u64, (Arc<ActivityInfo>, Option<Submission>)> = HashMap::new();

        for activity in activities {
            let latest_submission = submissions
                .iter()
                .filter(|submission| {
                    submission.activity_id == activity.info.id
                        && submission.student_info.id == self.info.id
                })
                .max_by_key(|submission| submission.submitted_at);

            association.insert(
                activity.info.id,
                (Arc::clone(&activity.info), latest_submission.cloned()),
            );
        }

        association
    }
}
