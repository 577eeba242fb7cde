use crate::platform::SubmissionGateway;
use crate::rubric::Rubric;
use crate::scoring;
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone)]
/// Persisted result of scoring one submission against one rubric.
///
/// At most one evaluation exists per submission: saves are upserts keyed by
/// `submission_id`. A present `evaluation_id` means update-in-place; an absent
/// one means the store should create the record and assign an identifier.
pub struct Evaluation {
    pub evaluation_id: Option<String>,           // Assigned by the store on first save
    pub submission_id: String,                   // Submission being evaluated (upsert key)
    pub evaluator_id: String,                    // Teacher who performed the evaluation
    pub rubric_id: String,                       // Rubric the scores were computed against
    pub selections: HashMap<String, String>,     // Criterion key -> selected level key
    pub scores: HashMap<String, f64>,            // Criterion key -> contribution, plus "total"
    pub criteria_feedback: HashMap<String, String>, // Criterion key -> free-text feedback
    pub general_feedback: String,                // Free-text feedback on the whole submission
    pub evaluated_at: Option<DateTime<Utc>>,     // Timestamp of the last save
}

impl Evaluation {
    /// The aggregate total recorded at the moment of save.
    pub fn total(&self) -> Option<i64> {
        self.scores.get(scoring::TOTAL_KEY).map(|t| *t as i64)
    }
}

#[derive(Debug, Error)]
/// Why a save was rejected or failed. The pure scoring path never errors;
/// only the save step has preconditions and an external collaborator.
pub enum SaveError {
    /// Saving without an evaluator identity is rejected before any store call.
    /// Surfaced to the user as a validation message, not a crash.
    #[error("an evaluator identity is required before saving an evaluation")]
    MissingIdentity,
    /// The store reported an error. The draft is preserved so the teacher can
    /// simply retry the save; there is no automatic retry at this layer.
    #[error("failed to persist evaluation: {0}")]
    Persistence(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Lifecycle state of an open evaluation form.
pub enum FormState {
    /// The teacher is editing; the local score has not been persisted.
    DraftInProgress,
    /// The current selections and feedback match the stored record.
    Saved,
}

/// Editing session for evaluating one submission against one rubric.
///
/// Opening a form for a submission with no prior evaluation seeds every
/// criterion with the no-selection sentinel. Opening it for an already
/// evaluated submission seeds selections and feedback from the stored record.
/// Saving again overwrites the same record, never duplicates it.
///
/// Concurrent saves for the same submission by two evaluators are not
/// coordinated here: the last write wins at the store's upsert.
#[derive(Debug)]
pub struct EvaluationForm {
    state: FormState,
    rubric: Rubric,
    submission_id: String,
    evaluation_id: Option<String>,
    selections: HashMap<String, String>,
    criteria_feedback: HashMap<String, String>,
    general_feedback: String,
}

impl EvaluationForm {
    /// Opens the evaluation form for a submission, seeding from the prior
    /// evaluation when one exists.
    pub fn open(rubric: Rubric, submission_id: &str, prior: Option<&Evaluation>) -> Self {
        let selections = match prior {
            Some(evaluation) => rubric
                .criteria
                .keys()
                .map(|key| {
                    let level = evaluation
                        .selections
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| scoring::NO_SELECTION.to_string());
                    (key.clone(), level)
                })
                .collect(),
            None => rubric
                .criteria
                .keys()
                .map(|key| (key.clone(), scoring::NO_SELECTION.to_string()))
                .collect(),
        };

        EvaluationForm {
            state: FormState::DraftInProgress,
            submission_id: submission_id.to_string(),
            evaluation_id: prior.and_then(|evaluation| evaluation.evaluation_id.clone()),
            selections,
            criteria_feedback: prior
                .map(|evaluation| evaluation.criteria_feedback.clone())
                .unwrap_or_default(),
            general_feedback: prior
                .map(|evaluation| evaluation.general_feedback.clone())
                .unwrap_or_default(),
            rubric,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn selections(&self) -> &HashMap<String, String> {
        &self.selections
    }

    /// Returns to editing after a save. Selections and feedback keep the
    /// values of the stored record they were saved with.
    pub fn reopen(&mut self) {
        self.state = FormState::DraftInProgress;
    }

    /// Records the selected level for a criterion. Any edit puts the form
    /// back into the draft state.
    pub fn select_level(&mut self, criterion_key: &str, level_key: &str) {
        self.selections
            .insert(criterion_key.to_string(), level_key.to_string());
        self.state = FormState::DraftInProgress;
    }

    pub fn set_criterion_feedback(&mut self, criterion_key: &str, feedback: &str) {
        self.criteria_feedback
            .insert(criterion_key.to_string(), feedback.to_string());
        self.state = FormState::DraftInProgress;
    }

    pub fn set_general_feedback(&mut self, feedback: &str) {
        self.general_feedback = feedback.to_string();
        self.state = FormState::DraftInProgress;
    }

    /// The total the current selections would produce if saved now.
    pub fn total(&self) -> i64 {
        scoring::compute_total_score(&self.rubric, &self.selections)
    }

    /// Persists the evaluation through the gateway.
    ///
    /// The evaluator identity is checked before any store call; a missing
    /// identity is a validation failure, not a crash. On store failure the
    /// form stays in the draft state with all selections intact, so retrying
    /// is simply invoking `save` again.
    pub fn save(
        &mut self,
        evaluator_id: &str,
        gateway: &dyn SubmissionGateway,
    ) -> Result<Evaluation, SaveError> {
        if evaluator_id.trim().is_empty() {
            return Err(SaveError::MissingIdentity);
        }

        let record = Evaluation {
            evaluation_id: self.evaluation_id.clone(),
            submission_id: self.submission_id.clone(),
            evaluator_id: evaluator_id.to_string(),
            rubric_id: self.rubric.id.clone(),
            selections: self.selections.clone(),
            scores: scoring::compute_scores(&self.rubric, &self.selections),
            criteria_feedback: self.criteria_feedback.clone(),
            general_feedback: self.general_feedback.clone(),
            evaluated_at: Some(Utc::now()),
        };

        match gateway.save_evaluation(&record) {
            Ok(stored) => {
                info!(
                    "saved evaluation for submission {} (total {})",
                    stored.submission_id,
                    stored.total().unwrap_or(0)
                );
                self.evaluation_id = stored.evaluation_id.clone();
                self.state = FormState::Saved;
                Ok(stored)
            }
            Err(e) => {
                error!(
                    "failed to save evaluation for submission {}: {}",
                    self.submission_id, e
                );
                Err(SaveError::Persistence(e.to_string()))
            }
        }
    }
}
