use crate::activity::{self, Activity, ActivityInfo, NewActivity};
use crate::connection::{send_http_request, HttpMethod};
use crate::course::{abbreviate_course_name, parse_course_code, Course, CourseInfo};
use crate::evaluation::Evaluation;
use crate::rubric::Rubric;
use crate::student::{Student, StudentInfo};
use crate::submission::{Comment, Submission, SubmissionKind};
use crate::PlatformCredentials;
use chrono::{DateTime, Utc};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use log::warn;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Enum to represent the result of fetching multiple courses.
///
/// Distinguishes between successful retrieval, connection errors, and
/// credential errors, so callers can message the teacher appropriately.
pub enum PlatformResultCourses {
    Ok(Vec<Course>),        // Success case with a vector of Course objects.
    ErrConnection(String),  // Connection error with a descriptive message.
    ErrCredentials(String), // Credential error with a descriptive message.
}

/// Enum to represent the result of fetching a single course.
pub enum PlatformResultSingleCourse {
    Ok(Course),             // Success case with a single Course object.
    ErrConnection(String),  // Connection error with a descriptive message.
    ErrCredentials(String), // Credential error with a descriptive message.
}

/// Store contract for rubrics and evaluations.
///
/// The evaluation workflow only ever needs three operations from its store:
/// load a rubric, load the evaluation of a submission (if any), and save an
/// evaluation. Saves are upserts keyed by submission id: a record with an
/// `evaluation_id` is updated in place, a record without one is created and
/// the returned copy carries the assigned id. There is no delete.
///
/// Nothing here coordinates concurrent evaluators; the last write wins.
pub trait SubmissionGateway {
    fn fetch_rubric(&self, rubric_id: &str) -> Result<Rubric, Box<dyn Error>>;
    fn fetch_evaluation(&self, submission_id: &str) -> Result<Option<Evaluation>, Box<dyn Error>>;
    fn save_evaluation(&self, evaluation: &Evaluation) -> Result<Evaluation, Box<dyn Error>>;
}

/// Main interface for interacting with the HOTS English data service.
///
/// `Platform` is the entry point for account-level operations: listing the
/// courses the authenticated teacher runs and picking one to work on.
pub struct Platform {}

impl Platform {
    /// Fetches the list of courses taught with the provided credentials.
    ///
    /// Handles pagination so all courses are retrieved, and converts each
    /// returned row into a `Course` bound to the shared credentials.
    ///
    /// Returns:
    /// - `PlatformResultCourses`: Enum indicating success with the course list
    ///   or an error.
    pub fn fetch_courses_with_credentials(info: &PlatformCredentials) -> PlatformResultCourses {
        let platform_info_arc = Arc::new((*info).clone());

        let url = format!("{}/courses", info.url_platform);
        let mut all_courses = Vec::new();
        let mut page = 1;

        loop {
            let params = vec![
                ("role".to_string(), "teacher".to_string()),
                ("page".to_string(), page.to_string()),
                ("per_page".to_string(), "100".to_string()),
            ];
            match send_http_request(HttpMethod::Get, &url, info, params) {
                Ok(response) => match response.json::<Vec<Value>>() {
                    Ok(courses) => {
                        if courses.is_empty() {
                            break;
                        }
                        all_courses.extend(courses.iter().filter_map(|course| {
                            Platform::convert_json_to_course(&platform_info_arc, course)
                        }));
                        page += 1;
                    }
                    Err(e) => {
                        return PlatformResultCourses::ErrCredentials(format!(
                            "Failed to parse courses JSON with error: {}",
                            e
                        ));
                    }
                },
                Err(e) => {
                    return PlatformResultCourses::ErrConnection(format!(
                        "Failed to fetch courses with error: {}",
                        e
                    ));
                }
            }
        }

        PlatformResultCourses::Ok(all_courses)
    }

    /// Fetches a specific course by its ID using the provided credentials.
    pub fn fetch_single_course_with_credentials(
        info: &PlatformCredentials,
        course_id: u64,
    ) -> PlatformResultSingleCourse {
        let platform_info_arc = Arc::new((*info).clone());
        let url = format!("{}/courses/{}", info.url_platform, course_id);

        match send_http_request(HttpMethod::Get, &url, info, Vec::new()) {
            Ok(response) => match response.json::<Value>() {
                Ok(course) => {
                    if let Some(course) =
                        Platform::convert_json_to_course(&platform_info_arc, &course)
                    {
                        PlatformResultSingleCourse::Ok(course)
                    } else {
                        PlatformResultSingleCourse::ErrConnection(
                            "Failed to parse course data".to_string(),
                        )
                    }
                }
                Err(e) => PlatformResultSingleCourse::ErrConnection(format!(
                    "Failed to parse course data: {}",
                    e
                )),
            },
            Err(e) => {
                PlatformResultSingleCourse::ErrConnection(format!("HTTP request failed: {}", e))
            }
        }
    }

    /// Presents an interactive menu of the teacher's courses and returns the
    /// chosen one, or `None` if the user exits.
    pub fn choose_course() -> Option<Course> {
        let credentials = PlatformCredentials::credentials();

        let courses = match Platform::fetch_courses_with_credentials(&credentials) {
            PlatformResultCourses::Ok(courses) => courses,
            PlatformResultCourses::ErrConnection(msg) => {
                eprintln!("Connection error: {}", msg);
                return None;
            }
            PlatformResultCourses::ErrCredentials(msg) => {
                eprintln!("Credentials error: {}", msg);
                return None;
            }
        };

        let mut menu_str: Vec<String> = courses
            .iter()
            .map(|course| {
                let code = course
                    .info
                    .code_details
                    .as_ref()
                    .map(|details| format!(" [{}.{}]", details.subject, details.level))
                    .unwrap_or_default();
                format!("{}{}", abbreviate_course_name(&course.info.name), code)
            })
            .collect();
        menu_str.push("EXIT".to_string());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Choose a course:")
            .items(&menu_str)
            .default(0)
            .interact()
            .unwrap();

        if selection == menu_str.len() - 1 {
            return None;
        }
        courses.into_iter().nth(selection)
    }

    /// Converts a JSON row into a `Course`.
    ///
    /// Rows missing the required fields are skipped with a `None`; the course
    /// code details are parsed opportunistically from the name.
    fn convert_json_to_course(
        platform_info: &Arc<PlatformCredentials>,
        course: &Value,
    ) -> Option<Course> {
        let id = course["id"].as_u64()?;
        let name = course["name"].as_str().map(String::from)?;
        let course_code = course["course_code"].as_str().map(String::from)?;
        let code_details = parse_course_code(&name, &name);
        Some(Course {
            info: Arc::new(CourseInfo {
                id,
                name,
                course_code,
                platform_info: Arc::clone(platform_info),
                code_details,
                roster_cache: Mutex::new(Vec::new()),
                activities_cache: Mutex::new(Vec::new()),
            }),
        })
    }
}

/// Fetches the roster of a course, page by page.
pub(crate) fn fetch_roster(course_info: &CourseInfo) -> Result<Vec<Student>, Box<dyn Error>> {
    let url = format!(
        "{}/courses/{}/roster",
        course_info.platform_info.url_platform, course_info.id
    );

    // The caller holds the Arc<CourseInfo>; rebuild one for the back-references.
    let course_info_arc = Arc::new(course_info.clone());

    let mut all_students = Vec::new();
    let mut page = 1;
    loop {
        let params = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), "100".to_string()),
        ];

        match send_http_request(
            HttpMethod::Get,
            &url,
            &course_info.platform_info,
            params,
        ) {
            Ok(response) => {
                let students_page: Vec<Value> = response.json()?;
                if students_page.is_empty() {
                    break;
                }
                all_students.extend(students_page.iter().filter_map(|student| {
                    convert_json_to_student(&course_info_arc, student)
                }));
                page += 1;
            }
            Err(e) => {
                return Err(format!("Failed to fetch roster with error: {}", e).into());
            }
        }
    }
    Ok(all_students)
}

pub(crate) fn convert_json_to_student(
    course_info: &Arc<CourseInfo>,
    student: &Value,
) -> Option<Student> {
    let id = student["id"].as_u64()?;
    let name = student["name"].as_str().map(String::from)?;
    let email = student["email"].as_str().map(String::from).unwrap_or_default();
    Some(Student {
        info: Arc::new(StudentInfo {
            id,
            name,
            email,
            course_info: Arc::clone(course_info),
        }),
    })
}

/// Fetches the activities of a course, page by page.
///
/// Activity rows carry three JSON columns (scaffolding steps, attachment URLs
/// and tags); a malformed column fails the whole fetch instead of being
/// silently dropped, so authoring bugs surface immediately.
pub(crate) fn fetch_activities(course: &Course) -> Result<Vec<Activity>, Box<dyn Error>> {
    let url = format!(
        "{}/courses/{}/activities",
        course.info.platform_info.url_platform, course.info.id
    );

    let mut all_activities = Vec::new();
    let mut page = 1;
    loop {
        let params = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), "100".to_string()),
        ];

        match send_http_request(HttpMethod::Get, &url, &course.info.platform_info, params) {
            Ok(response) => {
                let activities_page: Vec<Value> = response.json()?;
                if activities_page.is_empty() {
                    break;
                }
                for row in &activities_page {
                    all_activities.push(convert_json_to_activity(&course.info, row)?);
                }
                page += 1;
            }
            Err(e) => {
                return Err(format!("Failed to fetch activities with error: {}", e).into());
            }
        }
    }
    Ok(all_activities)
}

pub(crate) fn convert_json_to_activity(
    course_info: &Arc<CourseInfo>,
    row: &Value,
) -> Result<Activity, Box<dyn Error>> {
    let id = row["id"]
        .as_u64()
        .ok_or("activity row is missing its id")?;
    let title = row["title"]
        .as_str()
        .ok_or("activity row is missing its title")?
        .to_string();

    let scaffolding_steps =
        activity::parse_scaffolding_column(row["scaffolding_steps"].as_str().unwrap_or(""))?;
    let attachment_urls = activity::parse_string_list_column(
        row["attachment_urls"].as_str().unwrap_or(""),
        "attachment_urls",
    )?;
    let tags = activity::parse_string_list_column(row["tags"].as_str().unwrap_or(""), "tags")?;

    Ok(Activity {
        info: Arc::new(ActivityInfo {
            id,
            title,
            description: row["description"].as_str().map(String::from),
            rubric_id: row["rubric_id"].as_str().map(String::from),
            due_at: row["due_at"]
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            published: row["published"].as_bool().unwrap_or(false),
            scaffolding_steps,
            attachment_urls,
            tags,
            course_info: Arc::clone(course_info),
        }),
    })
}

/// Fetches every submission handed in for an activity, associating each one
/// with the matching student from the roster.
pub(crate) fn fetch_submissions(
    activity_info: &Arc<ActivityInfo>,
    students: &[Student],
) -> Result<Vec<Submission>, Box<dyn Error>> {
    let platform_info = &activity_info.course_info.platform_info;
    let url = format!(
        "{}/activities/{}/submissions",
        platform_info.url_platform, activity_info.id
    );

    let mut all_submissions = Vec::new();
    let mut page = 1;
    loop {
        let params = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), "100".to_string()),
        ];

        match send_http_request(HttpMethod::Get, &url, platform_info, params) {
            Ok(response) => {
                let submissions_page: Vec<Value> = response.json()?;
                if submissions_page.is_empty() {
                    break;
                }
                all_submissions.extend(submissions_page.iter().filter_map(|row| {
                    convert_json_to_submission(students, row, activity_info)
                }));
                page += 1;
            }
            Err(e) => {
                return Err(format!("Failed to fetch submissions with error: {}", e).into());
            }
        }
    }
    Ok(all_submissions)
}

/// Converts a submission JSON row into a `Submission`.
///
/// Rows whose student is not on the given roster are skipped with a warning;
/// rosters and submissions can drift when a student is unenrolled mid-term.
pub(crate) fn convert_json_to_submission(
    students: &[Student],
    row: &Value,
    activity_info: &Arc<ActivityInfo>,
) -> Option<Submission> {
    let student_id = row["student_id"].as_u64()?;
    let student = match students
        .iter()
        .find(|student| student.info.id == student_id)
    {
        Some(student) => student,
        None => {
            warn!(
                "submission {} references student {} who is not on the roster",
                row["id"], student_id
            );
            return None;
        }
    };

    let comments = row["comments"].as_array().map_or(Vec::new(), |comments| {
        comments
            .iter()
            .filter_map(|comment| {
                let id = comment["id"].as_u64();
                let content = comment["content"].as_str().map(String::from);
                if let (Some(id), Some(content)) = (id, content) {
                    Some(Comment { id, content })
                } else {
                    None
                }
            })
            .collect()
    });

    Some(Submission {
        id: row["id"].as_u64()?,
        activity_id: row["activity_id"].as_u64().unwrap_or(activity_info.id),
        kind: row["kind"].as_str().map(|kind| match kind {
            "text" => SubmissionKind::Text,
            "audio" => SubmissionKind::Audio,
            "video" => SubmissionKind::Video,
            "document" => SubmissionKind::Document,
            "none" => SubmissionKind::None,
            _ => SubmissionKind::Other,
        }),
        content_url: row["content_url"].as_str().map(String::from),
        submitted_at: row["submitted_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        student_info: student.info.clone(),
        activity_info: Arc::clone(activity_info),
        comments,
    })
}

/// Authors a new activity in a course.
pub(crate) fn create_activity(
    platform_info: &PlatformCredentials,
    course_id: u64,
    activity: &NewActivity,
) -> Result<(), Box<dyn Error>> {
    let url = format!(
        "{}/courses/{}/activities",
        platform_info.url_platform, course_id
    );

    let body = json!({ "activity": activity });

    match send_http_request(HttpMethod::Post(body), &url, platform_info, vec![]) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("Failed to create activity with error: {}", e).into()),
    }
}

/// Posts an announcement to a course's discussion board.
pub(crate) fn post_announcement(
    platform_info: &PlatformCredentials,
    course_id: u64,
    title: &str,
    message: &str,
) -> Result<(), Box<dyn Error>> {
    let url = format!(
        "{}/courses/{}/discussions",
        platform_info.url_platform, course_id
    );

    let body = json!({
        "title": title,
        "message": message,
        "is_announcement": true
    });

    match send_http_request(HttpMethod::Post(body), &url, platform_info, vec![]) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("Failed to create announcement with error: {}", e).into()),
    }
}

/// Store implementation backed by the platform's REST data service.
pub struct HttpGateway {
    platform_info: Arc<PlatformCredentials>,
}

impl HttpGateway {
    pub fn new(platform_info: Arc<PlatformCredentials>) -> Self {
        HttpGateway { platform_info }
    }
}

impl SubmissionGateway for HttpGateway {
    /// Loads a rubric row and validates its criteria column at the boundary.
    fn fetch_rubric(&self, rubric_id: &str) -> Result<Rubric, Box<dyn Error>> {
        let url = format!("{}/rubrics/{}", self.platform_info.url_platform, rubric_id);

        let response = send_http_request(HttpMethod::Get, &url, &self.platform_info, Vec::new())
            .map_err(|e| format!("Failed to fetch rubric {}: {}", rubric_id, e))?;

        let row: Value = response.json()?;
        let id = row["id"].as_str().ok_or("rubric row is missing its id")?;
        let title = row["title"]
            .as_str()
            .ok_or("rubric row is missing its title")?;
        let max_score = row["max_score"]
            .as_i64()
            .ok_or("rubric row is missing its max_score")?;
        let criteria_json = row["criteria"]
            .as_str()
            .ok_or("rubric row is missing its criteria column")?;

        Rubric::from_parts(id, title, max_score, criteria_json)
    }

    /// Loads the evaluation stored for a submission. The service answers with
    /// `null` when the submission has not been evaluated yet.
    fn fetch_evaluation(&self, submission_id: &str) -> Result<Option<Evaluation>, Box<dyn Error>> {
        let url = format!(
            "{}/submissions/{}/evaluation",
            self.platform_info.url_platform, submission_id
        );

        let response = send_http_request(HttpMethod::Get, &url, &self.platform_info, Vec::new())
            .map_err(|e| {
                format!(
                    "Failed to fetch evaluation for submission {}: {}",
                    submission_id, e
                )
            })?;

        let row: Value = response.json()?;
        if row.is_null() {
            return Ok(None);
        }

        let evaluation: Evaluation = serde_json::from_value(row)
            .map_err(|e| format!("malformed evaluation row: {}", e))?;
        Ok(Some(evaluation))
    }

    /// Upserts an evaluation: POST creates, PUT overwrites the identified
    /// record. The stored copy (with its assigned id) is returned.
    fn save_evaluation(&self, evaluation: &Evaluation) -> Result<Evaluation, Box<dyn Error>> {
        let body = serde_json::to_value(evaluation)?;
        let (method, url) = match &evaluation.evaluation_id {
            Some(evaluation_id) => (
                HttpMethod::Put(body),
                format!(
                    "{}/evaluations/{}",
                    self.platform_info.url_platform, evaluation_id
                ),
            ),
            None => (
                HttpMethod::Post(body),
                format!(
                    "{}/submissions/{}/evaluation",
                    self.platform_info.url_platform, evaluation.submission_id
                ),
            ),
        };

        let response = send_http_request(method, &url, &self.platform_info, Vec::new())
            .map_err(|e| {
                format!(
                    "Failed to save evaluation for submission {}: {}",
                    evaluation.submission_id, e
                )
            })?;

        let row: Value = response.json()?;
        let stored: Evaluation = serde_json::from_value(row)
            .map_err(|e| format!("malformed evaluation row: {}", e))?;
        Ok(stored)
    }
}

/// In-memory store used by tests and offline tooling.
///
/// Mirrors the upsert contract of the real data service: one evaluation per
/// submission, created with a generated id on first save and overwritten in
/// place afterwards.
#[derive(Default)]
pub struct MemoryGateway {
    rubrics: Mutex<HashMap<String, Rubric>>,
    evaluations: Mutex<HashMap<String, Evaluation>>,
    next_id: Mutex<u64>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        MemoryGateway::default()
    }

    pub fn insert_rubric(&self, rubric: Rubric) {
        self.rubrics
            .lock()
            .unwrap()
            .insert(rubric.id.clone(), rubric);
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations.lock().unwrap().len()
    }
}

impl SubmissionGateway for MemoryGateway {
    fn fetch_rubric(&self, rubric_id: &str) -> Result<Rubric, Box<dyn Error>> {
        self.rubrics
            .lock()
            .unwrap()
            .get(rubric_id)
            .cloned()
            .ok_or_else(|| format!("Rubric with id {} not found", rubric_id).into())
    }

    fn fetch_evaluation(&self, submission_id: &str) -> Result<Option<Evaluation>, Box<dyn Error>> {
        Ok(self
            .evaluations
            .lock()
            .unwrap()
            .get(submission_id)
            .cloned())
    }

    fn save_evaluation(&self, evaluation: &Evaluation) -> Result<Evaluation, Box<dyn Error>> {
        let mut evaluations = self.evaluations.lock().unwrap();

        let mut stored = evaluation.clone();
        // The submission id is the upsert key: a prior record keeps its
        // identity no matter what the incoming record carries.
        if let Some(existing) = evaluations.get(&evaluation.submission_id) {
            stored.evaluation_id = existing.evaluation_id.clone();
        } else if stored.evaluation_id.is_none() {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            stored.evaluation_id = Some(format!("ev-{}", next_id));
        }

        evaluations.insert(evaluation.submission_id.clone(), stored.clone());
        Ok(stored)
    }
}
