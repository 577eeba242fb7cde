use crate::evaluation::Evaluation;
use crate::scoring;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize, Default)]
/// Aggregated view of how the evaluation of one activity is going.
///
/// Computed from the stored evaluations and the number of submissions handed
/// in; rendering is left to the presentation layer.
pub struct ActivityReport {
    pub submissions: usize,                  // Submissions handed in
    pub evaluated: usize,                    // Submissions with a stored evaluation
    pub pending: usize,                      // Submissions still waiting for one
    pub mean_total: Option<f64>,             // Mean of the stored totals
    pub max_total: Option<i64>,              // Highest stored total
    pub criterion_means: HashMap<String, f64>, // Mean contribution per criterion key
}

/// Builds the evaluation report for one activity.
///
/// Totals come from each evaluation's stored score map; evaluations saved
/// without a total (which the workflow never produces) are counted as
/// evaluated but excluded from the averages.
pub fn build_activity_report(evaluations: &[Evaluation], submission_count: usize) -> ActivityReport {
    let totals: Vec<f64> = evaluations
        .iter()
        .filter_map(|evaluation| evaluation.scores.get(scoring::TOTAL_KEY).copied())
        .collect();

    let mean_total = if totals.is_empty() {
        None
    } else {
        Some(totals.iter().sum::<f64>() / totals.len() as f64)
    };

    let max_total = totals
        .iter()
        .copied()
        .fold(None::<f64>, |max, total| match max {
            Some(current) if current >= total => Some(current),
            _ => Some(total),
        })
        .map(|total| total as i64);

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for evaluation in evaluations {
        for (key, contribution) in &evaluation.scores {
            if key == scoring::TOTAL_KEY {
                continue;
            }
            let entry = sums.entry(key.clone()).or_insert((0.0, 0));
            entry.0 += contribution;
            entry.1 += 1;
        }
    }
    let criterion_means = sums
        .into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect();

    ActivityReport {
        submissions: submission_count,
        evaluated: evaluations.len(),
        pending: submission_count.saturating_sub(evaluations.len()),
        mean_total,
        max_total,
        criterion_means,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation(submission_id: &str, scores: Vec<(&str, f64)>) -> Evaluation {
        Evaluation {
            evaluation_id: Some(format!("ev-{}", submission_id)),
            submission_id: submission_id.to_string(),
            evaluator_id: "teacher-7".to_string(),
            rubric_id: "rub-1".to_string(),
            selections: HashMap::new(),
            scores: scores
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            criteria_feedback: HashMap::new(),
            general_feedback: String::new(),
            evaluated_at: None,
        }
    }

    #[test]
    fn aggregates_totals_and_criterion_means() {
        let evaluations = vec![
            evaluation("sub-1", vec![("1", 20.0), ("2", 10.0), ("total", 30.0)]),
            evaluation("sub-2", vec![("1", 40.0), ("2", 20.0), ("total", 60.0)]),
        ];

        let report = build_activity_report(&evaluations, 5);

        assert_eq!(report.submissions, 5);
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.pending, 3);
        assert_eq!(report.mean_total, Some(45.0));
        assert_eq!(report.max_total, Some(60));
        assert_eq!(report.criterion_means["1"], 30.0);
        assert_eq!(report.criterion_means["2"], 15.0);
    }

    #[test]
    fn no_evaluations_yields_an_empty_report() {
        let report = build_activity_report(&[], 4);

        assert_eq!(report.evaluated, 0);
        assert_eq!(report.pending, 4);
        assert!(report.mean_total.is_none());
        assert!(report.max_total.is_none());
        assert!(report.criterion_means.is_empty());
    }

    #[test]
    fn more_evaluations_than_submissions_never_underflows_pending() {
        let evaluations = vec![evaluation("sub-1", vec![("total", 10.0)])];
        let report = build_activity_report(&evaluations, 0);
        assert_eq!(report.pending, 0);
    }
}
