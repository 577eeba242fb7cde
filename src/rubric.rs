use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, Clone)]
/// Scoring template applied to submissions. A rubric carries a nominal score
/// ceiling and a set of weighted criteria, each with its own performance levels.
pub struct Rubric {
    pub id: String,                            // Opaque identifier assigned by the platform
    pub title: String,                         // Display title of the rubric
    pub max_score: i64,                        // Nominal score ceiling (positive)
    pub criteria: HashMap<String, Criterion>,  // Criteria map, indexed by numerical string keys (e.g. "1", "2")
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// One scored dimension of a rubric (e.g. "Clarity of argument").
/// Carries a weight as a percentage and a small ordinal set of levels.
pub struct Criterion {
    pub name: String,                       // Short display name
    pub description: String,                // Longer description shown to the evaluator
    pub weight: f64,                        // Percentage weight (0-100); weights are not required to sum to 100
    pub levels: HashMap<String, Level>,     // Levels map, indexed by numerical string keys (e.g. "1".."4")
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// A discrete performance tier within a criterion. The point value is optional;
/// when absent the scoring engine derives a value from the criterion weight.
pub struct Level {
    pub description: String,    // Description of the level (e.g. "Fully developed response")
    pub score: Option<f64>,     // Explicit point value awarded when this level is selected
}

impl Rubric {
    /// Builds a `Rubric` from the raw pieces of a stored rubric row.
    ///
    /// The platform stores the criteria map as an opaque JSON column. That column
    /// is parsed and validated here, at the storage boundary, so that malformed
    /// rubric content surfaces immediately instead of being guarded against on
    /// every later read. Weights are deliberately NOT validated against a sum of
    /// 100: rubrics may allow bonus scoring above the nominal maximum.
    pub fn from_parts(
        id: &str,
        title: &str,
        max_score: i64,
        criteria_json: &str,
    ) -> Result<Rubric, Box<dyn Error>> {
        if max_score <= 0 {
            return Err(format!(
                "rubric '{}' has a non-positive max_score ({})",
                id, max_score
            )
            .into());
        }

        let criteria: HashMap<String, Criterion> = serde_json::from_str(criteria_json)
            .map_err(|e| format!("rubric '{}' has a malformed criteria column: {}", id, e))?;

        Ok(Rubric {
            id: id.to_string(),
            title: title.to_string(),
            max_score,
            criteria,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRITERIA_JSON: &str = r#"{
        "1": {
            "name": "Argument",
            "description": "Quality of the argument",
            "weight": 60.0,
            "levels": {
                "1": { "description": "Emerging", "score": 10.0 },
                "2": { "description": "Proficient", "score": null }
            }
        },
        "2": {
            "name": "Language",
            "description": "Accuracy of language",
            "weight": 70.0,
            "levels": {
                "1": { "description": "Emerging", "score": 5.0 }
            }
        }
    }"#;

    #[test]
    fn parses_criteria_column() {
        let rubric = Rubric::from_parts("rub-1", "Essay rubric", 100, CRITERIA_JSON).unwrap();

        assert_eq!(rubric.criteria.len(), 2);
        let argument = &rubric.criteria["1"];
        assert_eq!(argument.name, "Argument");
        assert_eq!(argument.levels["1"].score, Some(10.0));
        assert_eq!(argument.levels["2"].score, None);
    }

    #[test]
    fn weights_above_one_hundred_are_accepted() {
        // 60 + 70 > 100: permitted on purpose, bonus scoring is a rubric author's call.
        let rubric = Rubric::from_parts("rub-1", "Essay rubric", 100, CRITERIA_JSON).unwrap();
        let weight_sum: f64 = rubric.criteria.values().map(|c| c.weight).sum();
        assert!(weight_sum > 100.0);
    }

    #[test]
    fn malformed_criteria_column_is_rejected() {
        let result = Rubric::from_parts("rub-1", "Essay rubric", 100, "{not json");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("malformed criteria column"));
    }

    #[test]
    fn non_positive_max_score_is_rejected() {
        let result = Rubric::from_parts("rub-1", "Essay rubric", 0, "{}");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("non-positive max_score"));
    }
}
