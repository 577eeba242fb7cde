use crate::activity::ActivityInfo;
use crate::student::StudentInfo;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// What kind of artifact the student attached to the activity.
pub enum SubmissionKind {
    Text,
    Audio,
    Video,
    Document,
    None,
    #[serde(other)] // Unknown kinds reported by the data service
    Other,
}

impl Default for SubmissionKind {
    fn default() -> Self {
        SubmissionKind::None
    }
}

impl SubmissionKind {
    pub fn as_str(&self) -> &str {
        match self {
            SubmissionKind::Text => "text",
            SubmissionKind::Audio => "audio",
            SubmissionKind::Video => "video",
            SubmissionKind::Document => "document",
            SubmissionKind::None => "none",
            SubmissionKind::Other => "other",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Comment {
    pub id: u64,         // Comment identifier
    pub content: String, // Comment text
}

#[derive(Serialize, Deserialize, Debug, Clone)]
/// A student's artifact attached to an activity, the subject of evaluation.
pub struct Submission {
    pub id: u64,                             // Submission's unique identifier
    pub activity_id: u64,                    // Activity the submission answers
    pub kind: Option<SubmissionKind>,        // Kind of attached artifact
    pub content_url: Option<String>,         // Where the artifact lives
    pub submitted_at: Option<DateTime<Utc>>, // Submission timestamp, optional
    #[serde(skip)]
    pub student_info: Arc<StudentInfo>,
    #[serde(skip)]
    pub activity_info: Arc<ActivityInfo>,
    pub comments: Vec<Comment>, // Discussion attached to the submission
}

impl Submission {
    /// Key under which evaluations for this submission are stored. Evaluation
    /// records reference submissions by an opaque string identifier.
    pub fn evaluation_key(&self) -> String {
        self.id.to_string()
    }

    /// Checks if the submission is late by comparing `submitted_at` with the
    /// activity's due date.
    ///
    /// Returns:
    /// - `Some(Duration)` if the submission is late, indicating the time
    ///   difference between `submitted_at` and the due date.
    /// - `None` if the submission is not late or dates are missing.
    pub fn is_late(&self) -> Option<Duration> {
        if let (Some(submitted_at), Some(due_at)) = (self.submitted_at, self.activity_info.due_at) {
            if submitted_at > due_at {
                Some(submitted_at.signed_duration_since(due_at))
            } else {
                None
            }
        } else {
            None
        }
    }

    /// Formats the late-submission duration as a human-readable string in the
    /// form "Xh Ym Zs". Returns `None` when the submission is not late.
    pub fn is_late_str(&self) -> Option<String> {
        if let Some(late_duration) = self.is_late() {
            let secs = late_duration.num_seconds().abs();
            let hours = secs / 3600;
            let minutes = (secs % 3600) / 60;
            let seconds = secs % 60;

            let formatted_duration = if hours > 0 {
                format!("{}h {:02}m {:02}s", hours, minutes, seconds)
            } else if minutes > 0 {
                format!("{}m {:02}s", minutes, seconds)
            } else {
                format!("{}s", seconds)
            };

            Some(formatted_duration)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission_with_dates(
        submitted_at: Option<DateTime<Utc>>,
        due_at: Option<DateTime<Utc>>,
    ) -> Submission {
        let activity_info = ActivityInfo {
            due_at,
            ..Default::default()
        };
        Submission {
            id: 1,
            activity_id: 10,
            kind: Some(SubmissionKind::Text),
            content_url: None,
            submitted_at,
            student_info: Arc::new(StudentInfo::default()),
            activity_info: Arc::new(activity_info),
            comments: Vec::new(),
        }
    }

    #[test]
    fn late_submission_reports_the_delay() {
        let due = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let submitted = Utc.with_ymd_and_hms(2026, 3, 10, 13, 30, 5).unwrap();
        let submission = submission_with_dates(Some(submitted), Some(due));

        assert_eq!(submission.is_late(), Some(Duration::seconds(5405)));
        assert_eq!(submission.is_late_str().unwrap(), "1h 30m 05s");
    }

    #[test]
    fn on_time_submission_is_not_late() {
        let due = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let submitted = Utc.with_ymd_and_hms(2026, 3, 10, 11, 0, 0).unwrap();
        let submission = submission_with_dates(Some(submitted), Some(due));

        assert!(submission.is_late().is_none());
        assert!(submission.is_late_str().is_none());
    }

    #[test]
    fn missing_dates_mean_no_lateness() {
        let submission = submission_with_dates(None, None);
        assert!(submission.is_late().is_none());
    }

    #[test]
    fn evaluation_key_is_the_submission_id() {
        let submission = submission_with_dates(None, None);
        assert_eq!(submission.evaluation_key(), "1");
    }
}
