// Necessary imports from standard and external crates.
use crate::activity::{Activity, NewActivity};
use crate::platform::{self, Platform, PlatformResultSingleCourse};
use crate::student::Student;
use crate::PlatformCredentials;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::process::exit;
use std::sync::Arc;
use std::sync::Mutex;

/// Structure holding detailed information about a course.
///
/// Encapsulates the essentials of a course (identifier, name, code) plus the
/// shared platform credentials, so that roster and activity lookups can be
/// issued from anywhere a course is available.
///
/// Fields:
/// - `id`: Unique identifier of the course on the platform.
/// - `name`: Official name of the course.
/// - `course_code`: Short identifier or code for the course.
/// - `platform_info`: Shared reference to platform credentials and API URL.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CourseInfo {
    pub id: u64,
    pub name: String,
    pub course_code: String,
    #[serde(skip)]
    pub platform_info: Arc<PlatformCredentials>,
    #[serde(skip)]
    pub code_details: Option<CourseCodeDetails>,
    #[serde(skip)]
    pub roster_cache: Mutex<Vec<Student>>,
    #[serde(skip)]
    pub activities_cache: Mutex<Vec<Activity>>,
}

/// High-level representation of a course.
///
/// Wrapper around `CourseInfo`, providing the course-level operations: roster
/// access, activity listing and authoring, and announcement posting.
#[derive(Clone)]
pub struct Course {
    pub info: Arc<CourseInfo>,
}

impl Clone for CourseInfo {
    fn clone(&self) -> Self {
        CourseInfo {
            id: self.id,
            name: self.name.clone(),
            course_code: self.course_code.clone(),
            platform_info: Arc::clone(&self.platform_info),
            code_details: self.code_details.clone(),
            roster_cache: Mutex::new(self.roster_cache.lock().unwrap().clone()),
            activities_cache: Mutex::new(self.activities_cache.lock().unwrap().clone()),
        }
    }
}

impl CourseInfo {
    /// Retrieves the roster of students enrolled in this course.
    ///
    /// Fetches the roster from the platform on first use and serves later
    /// calls from the in-memory cache until the cache is cleared.
    pub fn fetch_roster(&self) -> Result<Vec<Student>, Box<dyn Error>> {
        {
            let roster_cache = self.roster_cache.lock().unwrap();
            if !roster_cache.is_empty() {
                return Ok(roster_cache.clone());
            }
        }
        match platform::fetch_roster(self) {
            Ok(students) => {
                let mut roster_cache = self.roster_cache.lock().unwrap();
                roster_cache.extend(students.clone());
                Ok(roster_cache.to_vec())
            }
            Err(e) => Err(e),
        }
    }

    pub fn clear_cache(&self) {
        let mut roster_cache = self.roster_cache.lock().unwrap();
        roster_cache.clear();
        let mut activities_cache = self.activities_cache.lock().unwrap();
        activities_cache.clear();
    }
}

impl Course {
    /// Retrieves the roster of students enrolled in this course.
    pub fn fetch_roster(&self) -> Result<Vec<Student>, Box<dyn Error>> {
        self.info.fetch_roster()
    }

    pub fn clear_cache(&self) {
        self.info.clear_cache();
    }

    /// Retrieves the activities authored in this course.
    ///
    /// Queries the platform for all activities of the course, caching the
    /// result. Authoring operations clear the cache so the next listing is
    /// fresh.
    pub fn fetch_activities(&self) -> Result<Vec<Activity>, Box<dyn Error>> {
        {
            let activities_cache = self.info.activities_cache.lock().unwrap();
            if !activities_cache.is_empty() {
                return Ok(activities_cache.clone());
            }
        }
        match platform::fetch_activities(self) {
            Ok(activities) => {
                let mut activities_cache = self.info.activities_cache.lock().unwrap();
                activities_cache.extend(activities.clone());
                Ok(activities_cache.to_vec())
            }
            Err(e) => Err(e),
        }
    }

    /// Presents an interactive menu of this course's activities.
    ///
    /// Returns the fetched activity list and the selected index, or `None` if
    /// the user exits the menu.
    pub fn choose_activity(
        &self,
        text: Option<&str>,
        activities: Option<Vec<Activity>>,
    ) -> Option<(Vec<Activity>, usize)> {
        let mut activities = activities;
        loop {
            let mut menu_str = Vec::new();

            let activity_list = match activities {
                Some(activity_list) => activity_list,
                None => {
                    println!("Fetching activities...");
                    match self.fetch_activities() {
                        Ok(activities) => activities,
                        Err(_) => {
                            eprintln!("Failed to download activities from the platform");
                            exit(1);
                        }
                    }
                }
            };

            for activity in activity_list.iter() {
                menu_str.push(activity.info.title.clone());
            }

            // Add REFRESH THIS LIST at the end of the list
            menu_str.push("REFRESH THIS LIST".to_string());

            // Add EXIT at the end of the list
            menu_str.push("EXIT".to_string());

            let prompt: &str = text.unwrap_or("Choose an activity:");

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .items(&menu_str)
                .default(0)
                .interact()
                .unwrap();

            if selection == menu_str.len() - 1 {
                return None;
            }

            if selection == menu_str.len() - 2 {
                activities = None;
                continue;
            }
            return Some((activity_list, selection));
        }
    }

    /// Authors a new activity in this course.
    pub fn create_activity(&self, activity: &NewActivity) -> Result<(), Box<dyn Error>> {
        let result = platform::create_activity(&self.info.platform_info, self.info.id, activity);
        if result.is_ok() {
            self.clear_cache();
        }
        result
    }

    /// Posts an announcement to this course's discussion board.
    pub fn post_announcement(&self, title: &str, message: &str) -> Result<(), Box<dyn Error>> {
        let result =
            platform::post_announcement(&self.info.platform_info, self.info.id, title, message);
        if result.is_ok() {
            self.clear_cache();
        }
        result
    }

    /// Loads a specific course from the platform by its ID.
    ///
    /// Obtains credentials, requests the course and returns it, or an error if
    /// the connection or the credentials fail.
    pub fn get_course_from_course_id(id: u64) -> Result<Course, Box<dyn Error>> {
        let credentials = PlatformCredentials::credentials();

        match Platform::fetch_single_course_with_credentials(&credentials, id) {
            PlatformResultSingleCourse::Ok(course) => Ok(course),
            PlatformResultSingleCourse::ErrConnection(msg) => {
                eprintln!("Connection error: {}", msg);
                Err(format!("Connection error: {}", msg).into())
            }
            PlatformResultSingleCourse::ErrCredentials(msg) => {
                eprintln!("Credentials error: {}", msg);
                Err(format!("Credentials error: {}", msg).into())
            }
        }
    }

    /// Retrieves a specific activity from the course by its ID.
    pub fn get_activity_from_activity_id(&self, id: u64) -> Result<Activity, Box<dyn Error>> {
        let activities = self.fetch_activities()?;

        match activities
            .into_iter()
            .find(|activity| activity.info.id == id)
        {
            Some(activity) => Ok(activity),
            None => Err(format!("Activity with id {} not found", id).into()),
        }
    }
}

/// Structure to store the parts of a structured course code.
///
/// Course codes on the platform follow the bracketed form
/// `[SUBJECT.LEVEL.GROUP.YEAR.SEMESTER]`, e.g. `[ENG.B2.7A.2026.1]`.
#[derive(Debug, Clone)]
pub struct CourseCodeDetails {
    pub subject: String,
    pub level: String,
    pub group: String,
    pub year: String,
    pub semester: String,
    pub full_name: String,
}

static COURSE_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\[([^.\[\]]+)\.([^.\[\]]+)\.([^.\[\]]+)\.([^.\[\]]+)\.([^.\[\]]+)\]").unwrap()
});

/// Parses a course name string and extracts the structured code details.
///
/// Applies regex matching to the bracketed code embedded in course names.
/// Returns `None` when the name does not carry a code in the expected shape,
/// which happens for courses created outside the standard workflow.
pub fn parse_course_code(course_name: &str, full_name: &str) -> Option<CourseCodeDetails> {
    let captures = COURSE_CODE_RE.captures(course_name)?;

    Some(CourseCodeDetails {
        subject: captures[1].to_string(),
        level: captures[2].to_string(),
        group: captures[3].to_string(),
        year: captures[4].to_string(),
        semester: captures[5].to_string(),
        full_name: full_name.to_string(),
    })
}

/// Abbreviates a course name for compact menu display.
///
/// Parts shorter than 4 characters are dropped; remaining parts are
/// capitalized and truncated, then combined depending on how many there are.
pub fn abbreviate_course_name(name: &str) -> String {
    let parts: Vec<String> = name
        .split_whitespace()
        .filter(|&p| p.len() >= 4)
        .map(|p| {
            let mut part = p.to_lowercase();
            part.replace_range(0..1, &part[0..1].to_uppercase());
            if part.len() > 6 {
                part.truncate(6);
            }
            part
        })
        .collect();

    match parts.len() {
        0 => String::new(),
        1 => parts[0].chars().take(6).collect(),
        2 => format!("{}{}", &parts[0][0..3], &parts[1][0..3]),
        _ => format!(
            "{}{}{}",
            &parts[0][0..2],
            &parts[1][0..2],
            &parts.last().unwrap()[0..2]
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_structured_course_code() {
        let details =
            parse_course_code("Upper Intermediate English [ENG.B2.7A.2026.1]", "Upper Intermediate English")
                .unwrap();

        assert_eq!(details.subject, "ENG");
        assert_eq!(details.level, "B2");
        assert_eq!(details.group, "7A");
        assert_eq!(details.year, "2026");
        assert_eq!(details.semester, "1");
        assert_eq!(details.full_name, "Upper Intermediate English");
    }

    #[test]
    fn names_without_a_code_yield_none() {
        assert!(parse_course_code("Conversation Club", "Conversation Club").is_none());
    }

    #[test]
    fn abbreviates_course_names() {
        assert_eq!(abbreviate_course_name("English"), "Englis");
        assert_eq!(abbreviate_course_name("Academic Writing"), "AcaWri");
        assert_eq!(
            abbreviate_course_name("Higher Order Thinking Skills"),
            "HiOrSk"
        );
    }
}
