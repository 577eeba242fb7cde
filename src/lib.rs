//! # HOTS English Core Library
//!
//! This Rust library implements the evaluation core of the HOTS English learning
//! platform: rubric-based scoring, the evaluation workflow teachers drive from the
//! grading form, course rosters, activity authoring and evaluation reporting.
//! It uses the `reqwest` crate for talking to the platform's data service and
//! incorporates concurrency control for efficient request handling.
//!
//! ## Core Features
//!
//! - **Rubric scoring:** Converts per-criterion level selections into a single
//!   bounded total, deterministically, with explicit point values taking
//!   precedence over the weight heuristic.
//! - **Evaluation workflow:** Draft/save lifecycle for evaluating a submission,
//!   with upsert persistence (one live evaluation per submission) and a guard on
//!   the evaluator identity.
//! - **Course management:** Access to courses, rosters and authored activities.
//! - **Reporting:** Aggregation of stored evaluations into per-activity reports.
//!
//! ## Usage
//!
//! To use this library, add it as a dependency in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! hots_english = "0.1"
//! ```
//!
//! The typical grading flow loads a rubric and the prior evaluation through a
//! [`SubmissionGateway`], opens an [`EvaluationForm`], records the teacher's
//! selections and saves:
//!
//! ```rust,no_run
//! use hots_english::{EvaluationForm, MemoryGateway, SubmissionGateway};
//!
//! let gateway = MemoryGateway::new();
//! let rubric = gateway.fetch_rubric("rub-1").unwrap();
//! let prior = gateway.fetch_evaluation("sub-1").unwrap();
//!
//! let mut form = EvaluationForm::open(rubric, "sub-1", prior.as_ref());
//! form.select_level("1", "3");
//! form.set_general_feedback("Clear line of argument.");
//! match form.save("teacher-7", &gateway) {
//!     Ok(stored) => println!("Saved with total {:?}", stored.total()),
//!     Err(e) => eprintln!("Save failed: {}", e),
//! }
//! ```

mod activity; // Authored activities: scaffolds, attachments, tags.
mod connection; // Manages HTTP connections and requests to the data service.
mod course; // Contains functionalities related to courses and rosters.
pub mod credentials; // Handles the storage and retrieval of platform credentials.
mod evaluation; // Evaluation records and the grading-form lifecycle.
pub mod platform;
mod report; // Aggregates stored evaluations into activity reports.
mod rubric; // Rubric, criterion and level data model.
mod scoring; // The rubric scoring engine.
mod student; // Deals with operations related to enrolled students.
mod submission; // Handles submissions students attach to activities.

// Exports key structures for external use.
pub use activity::{Activity, ActivityInfo, NewActivity, ScaffoldingStep, ThinkingSkill};
pub use course::{Course, CourseCodeDetails, CourseInfo};
pub use credentials::PlatformCredentials;
pub use evaluation::{Evaluation, EvaluationForm, FormState, SaveError};
pub use platform::{
    HttpGateway, MemoryGateway, Platform, PlatformResultCourses, PlatformResultSingleCourse,
    SubmissionGateway,
};
pub use report::{build_activity_report, ActivityReport};
pub use rubric::{Criterion, Level, Rubric};
pub use scoring::{compute_scores, compute_total_score, NO_SELECTION, TOTAL_KEY};
pub use student::{Student, StudentInfo};
pub use submission::{Comment, Submission, SubmissionKind};
