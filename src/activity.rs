use crate::platform::{self, SubmissionGateway};
use crate::rubric::Rubric;
use crate::student::Student;
use crate::submission::Submission;
use crate::CourseInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Thinking skill a scaffolding step targets, ordered from lower to higher.
pub enum ThinkingSkill {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl ThinkingSkill {
    /// Whether the skill belongs to the higher-order band the platform's
    /// activities are built around.
    pub fn is_higher_order(&self) -> bool {
        matches!(
            self,
            ThinkingSkill::Analyze | ThinkingSkill::Evaluate | ThinkingSkill::Create
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
/// One step of the scaffold a teacher authors to guide students through an
/// activity.
pub struct ScaffoldingStep {
    pub prompt: String,                  // Instruction shown to the student
    pub hint: Option<String>,            // Optional hint revealed on demand
    pub thinking_skill: ThinkingSkill,   // Skill the step exercises
}

/// Structure to hold detailed information about an authored activity.
///
/// An activity is the unit teachers author and assign: a prompt with a scaffold
/// of guided steps, optional attachments, free-form tags, an optional rubric
/// for evaluation and a due date. The scaffold, attachments and tags are stored
/// by the platform as JSON columns and validated when rows are read (see
/// `parse_scaffolding_column` / `parse_string_list_column`).
///
/// Fields:
/// - `id`: Unique identifier of the activity.
/// - `title`: The activity's display title.
/// - `description`: Optional longer description.
/// - `rubric_id`: Rubric used to evaluate submissions, when one is attached.
/// - `due_at`: Optional due date; drives lateness reporting.
/// - `published`: Whether students can see the activity.
/// - `course_info`: A thread-safe reference (`Arc`) to the enclosing course.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ActivityInfo {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub rubric_id: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub published: bool,
    pub scaffolding_steps: Vec<ScaffoldingStep>,
    pub attachment_urls: Vec<String>,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub course_info: Arc<CourseInfo>,
}

/// High-level representation of an activity within a course.
///
/// Wrapper around `ActivityInfo`, shared through an `Arc` so that submissions
/// and reports can reference their activity without copying it.
#[derive(Debug, Clone)]
pub struct Activity {
    pub info: Arc<ActivityInfo>,
}

impl Activity {
    /// Fetches all submissions handed in for this activity, associating each
    /// one with the matching student from the given roster.
    pub fn fetch_submissions(
        &self,
        students: &[Student],
    ) -> Result<Vec<Submission>, Box<dyn Error>> {
        platform::fetch_submissions(&self.info, students)
    }

    /// Loads the rubric attached to this activity, when one exists.
    pub fn fetch_rubric(
        &self,
        gateway: &dyn SubmissionGateway,
    ) -> Result<Option<Rubric>, Box<dyn Error>> {
        match &self.info.rubric_id {
            Some(rubric_id) => Ok(Some(gateway.fetch_rubric(rubric_id)?)),
            None => Ok(None),
        }
    }
}

#[derive(Serialize, Debug, Clone, Default)]
/// Payload for authoring a new activity in a course.
pub struct NewActivity {
    pub title: String,
    pub description: Option<String>,
    pub rubric_id: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub published: bool,
    pub scaffolding_steps: Vec<ScaffoldingStep>,
    pub attachment_urls: Vec<String>,
    pub tags: Vec<String>,
}

/// Parses the scaffolding-steps JSON column of an activity row.
///
/// The column is validated here, at the storage boundary, so malformed scaffold
/// content fails fast instead of being guarded against on every read. An empty
/// or null column means the activity has no scaffold.
pub(crate) fn parse_scaffolding_column(raw: &str) -> Result<Vec<ScaffoldingStep>, Box<dyn Error>> {
    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| format!("malformed scaffolding_steps column: {}", e).into())
}

/// Parses a JSON column holding a plain list of strings (attachment URLs or
/// tags). Same boundary-validation rules as `parse_scaffolding_column`.
pub(crate) fn parse_string_list_column(
    raw: &str,
    column: &str,
) -> Result<Vec<String>, Box<dyn Error>> {
    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| format!("malformed {} column: {}", column, e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_scaffolding_column() {
        let raw = r#"[
            { "prompt": "List the arguments in the text", "hint": null, "thinking_skill": "understand" },
            { "prompt": "Judge which argument is strongest", "hint": "Compare the evidence", "thinking_skill": "evaluate" }
        ]"#;

        let steps = parse_scaffolding_column(raw).unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].thinking_skill, ThinkingSkill::Understand);
        assert!(!steps[0].thinking_skill.is_higher_order());
        assert!(steps[1].thinking_skill.is_higher_order());
        assert_eq!(steps[1].hint.as_deref(), Some("Compare the evidence"));
    }

    #[test]
    fn empty_and_null_columns_mean_no_scaffold() {
        assert!(parse_scaffolding_column("").unwrap().is_empty());
        assert!(parse_scaffolding_column("null").unwrap().is_empty());
    }

    #[test]
    fn malformed_scaffolding_column_is_rejected() {
        let result = parse_scaffolding_column("[{\"prompt\": 3}]");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("malformed scaffolding_steps column"));
    }

    #[test]
    fn parses_string_list_columns() {
        let urls = parse_string_list_column(r#"["https://a.test/x.pdf"]"#, "attachment_urls").unwrap();
        assert_eq!(urls, vec!["https://a.test/x.pdf".to_string()]);

        let tags = parse_string_list_column("", "tags").unwrap();
        assert!(tags.is_empty());

        let bad = parse_string_list_column("{\"not\": \"a list\"}", "tags");
        assert!(bad.unwrap_err().to_string().contains("malformed tags column"));
    }
}
