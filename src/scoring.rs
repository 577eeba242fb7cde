use crate::rubric::{Criterion, Rubric};
use std::collections::HashMap;

/// Sentinel level key meaning "no selection yet". It never appears among a
/// criterion's levels (those are keyed "1" and up), so it contributes zero.
pub const NO_SELECTION: &str = "0";

/// Key under which the aggregate total is stored in an evaluation's score map.
pub const TOTAL_KEY: &str = "total";

/// Computes the total score for a set of per-criterion level selections.
///
/// Contributions are additive and order-independent: for each criterion the
/// selected level's explicit point value wins outright when it is positive;
/// otherwise a derived value is used (see `criterion_contribution`). The sum is
/// rounded to the nearest integer, with ties rounding half away from zero
/// (2.5 becomes 3).
///
/// The result is NOT clamped against `rubric.max_score`. A rubric whose weights
/// sum over 100, or whose explicit level scores overshoot, produces a total
/// above the nominal maximum. Rubric authors own that trade-off.
///
/// Rubric content is authored by teachers and must never crash an evaluation:
/// missing selections, unknown level keys and non-numeric level keys all
/// contribute zero rather than raising an error.
pub fn compute_total_score(rubric: &Rubric, selections: &HashMap<String, String>) -> i64 {
    rubric
        .criteria
        .iter()
        .map(|(key, criterion)| {
            criterion_contribution(
                rubric.max_score,
                criterion,
                selections.get(key).map(String::as_str),
            )
        })
        .sum::<f64>()
        .round() as i64
}

/// Computes the persisted score breakdown: one entry per criterion plus the
/// rounded aggregate under `TOTAL_KEY`. The total always equals
/// `compute_total_score` for the same inputs.
pub fn compute_scores(rubric: &Rubric, selections: &HashMap<String, String>) -> HashMap<String, f64> {
    let mut scores: HashMap<String, f64> = rubric
        .criteria
        .iter()
        .map(|(key, criterion)| {
            (
                key.clone(),
                criterion_contribution(
                    rubric.max_score,
                    criterion,
                    selections.get(key).map(String::as_str),
                ),
            )
        })
        .collect();

    let total: f64 = scores.values().sum();
    scores.insert(TOTAL_KEY.to_string(), total.round());
    scores
}

/// Contribution of a single criterion given the selected level key.
///
/// An explicit positive level score is taken as-is. When the level carries no
/// score (or a zero score), the fallback treats the level key as an ordinal
/// multiplier against an even share of the rubric maximum:
///
/// `(weight / 100) * level_key * (max_score / level_count)`
///
/// The fallback is intentionally approximate and only engaged when rubric
/// authors omit explicit per-level point values.
pub fn criterion_contribution(
    max_score: i64,
    criterion: &Criterion,
    selected: Option<&str>,
) -> f64 {
    let level_key = match selected {
        Some(key) => key,
        None => return 0.0,
    };

    let level = match criterion.levels.get(level_key) {
        Some(level) => level,
        None => return 0.0, // unknown level key: unscored, not an error
    };

    if let Some(points) = level.score {
        if points > 0.0 {
            return points;
        }
    }

    let ordinal: f64 = match level_key.parse() {
        Ok(n) => n,
        Err(_) => return 0.0,
    };

    let level_count = criterion.levels.len();
    if level_count == 0 {
        return 0.0;
    }

    (criterion.weight / 100.0) * ordinal * (max_score as f64 / level_count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::Level;

    fn level(description: &str, score: Option<f64>) -> Level {
        Level {
            description: description.to_string(),
            score,
        }
    }

    fn criterion(weight: f64, levels: Vec<(&str, Option<f64>)>) -> Criterion {
        Criterion {
            name: "criterion".to_string(),
            description: String::new(),
            weight,
            levels: levels
                .into_iter()
                .map(|(key, score)| (key.to_string(), level("level", score)))
                .collect(),
        }
    }

    fn rubric(max_score: i64, criteria: Vec<(&str, Criterion)>) -> Rubric {
        Rubric {
            id: "rub-1".to_string(),
            title: "Test rubric".to_string(),
            max_score,
            criteria: criteria
                .into_iter()
                .map(|(key, criterion)| (key.to_string(), criterion))
                .collect(),
        }
    }

    fn selections(pairs: Vec<(&str, &str)>) -> HashMap<String, String> {
        pairs
            .into_iter()
            .map(|(criterion, level)| (criterion.to_string(), level.to_string()))
            .collect()
    }

    #[test]
    fn same_inputs_always_produce_the_same_total() {
        let rubric = rubric(
            100,
            vec![
                ("1", criterion(40.0, vec![("1", None), ("2", None), ("3", Some(30.0))])),
                ("2", criterion(35.0, vec![("1", None), ("2", Some(17.0))])),
            ],
        );
        let picks = selections(vec![("1", "3"), ("2", "2")]);

        let first = compute_total_score(&rubric, &picks);
        for _ in 0..10 {
            assert_eq!(compute_total_score(&rubric, &picks), first);
        }
    }

    #[test]
    fn criterion_order_does_not_change_the_total() {
        let forward = rubric(
            100,
            vec![
                ("1", criterion(40.0, vec![("2", Some(12.5)), ("1", None)])),
                ("2", criterion(35.0, vec![("1", Some(17.25))])),
                ("3", criterion(25.0, vec![("1", None), ("2", None), ("3", None), ("4", None)])),
            ],
        );
        let backward = rubric(
            100,
            vec![
                ("3", criterion(25.0, vec![("1", None), ("2", None), ("3", None), ("4", None)])),
                ("2", criterion(35.0, vec![("1", Some(17.25))])),
                ("1", criterion(40.0, vec![("2", Some(12.5)), ("1", None)])),
            ],
        );
        let picks = selections(vec![("1", "2"), ("2", "1"), ("3", "2")]);

        assert_eq!(
            compute_total_score(&forward, &picks),
            compute_total_score(&backward, &picks)
        );
    }

    #[test]
    fn explicit_level_score_wins_over_weight_and_maximum() {
        // Weight and max_score would derive something far smaller than 40.
        let rubric = rubric(10, vec![("1", criterion(5.0, vec![("1", Some(40.0))]))]);
        let picks = selections(vec![("1", "1")]);

        assert_eq!(compute_total_score(&rubric, &picks), 40);
    }

    #[test]
    fn missing_level_score_falls_back_to_weight_heuristic() {
        // (40 / 100) * 2 * (100 / 4) = 20
        let rubric = rubric(
            100,
            vec![(
                "1",
                criterion(40.0, vec![("1", None), ("2", None), ("3", None), ("4", None)]),
            )],
        );
        let picks = selections(vec![("1", "2")]);

        assert_eq!(compute_total_score(&rubric, &picks), 20);
    }

    #[test]
    fn zero_level_score_also_falls_back_to_weight_heuristic() {
        let rubric = rubric(
            100,
            vec![(
                "1",
                criterion(40.0, vec![("1", Some(0.0)), ("2", Some(0.0)), ("3", Some(0.0)), ("4", Some(0.0))]),
            )],
        );
        let picks = selections(vec![("1", "2")]);

        assert_eq!(compute_total_score(&rubric, &picks), 20);
    }

    #[test]
    fn empty_criteria_scores_zero() {
        let rubric = rubric(100, vec![]);
        assert_eq!(compute_total_score(&rubric, &HashMap::new()), 0);
    }

    #[test]
    fn unselected_criterion_contributes_zero() {
        let rubric = rubric(
            100,
            vec![
                ("1", criterion(50.0, vec![("1", Some(30.0))])),
                ("2", criterion(50.0, vec![("1", Some(30.0))])),
            ],
        );
        let picks = selections(vec![("1", "1")]);

        assert_eq!(compute_total_score(&rubric, &picks), 30);
    }

    #[test]
    fn unknown_level_key_contributes_zero() {
        let rubric = rubric(100, vec![("1", criterion(50.0, vec![("1", Some(30.0))]))]);
        let picks = selections(vec![("1", "9")]);

        assert_eq!(compute_total_score(&rubric, &picks), 0);
    }

    #[test]
    fn no_selection_sentinel_contributes_zero() {
        let rubric = rubric(100, vec![("1", criterion(50.0, vec![("1", Some(30.0))]))]);
        let picks = selections(vec![("1", NO_SELECTION)]);

        assert_eq!(compute_total_score(&rubric, &picks), 0);
    }

    #[test]
    fn totals_above_the_maximum_are_not_clamped() {
        let rubric = rubric(
            50,
            vec![
                ("1", criterion(100.0, vec![("1", Some(40.0))])),
                ("2", criterion(100.0, vec![("1", Some(45.0))])),
            ],
        );
        let picks = selections(vec![("1", "1"), ("2", "1")]);

        let total = compute_total_score(&rubric, &picks);
        assert_eq!(total, 85);
        assert!(total > rubric.max_score);
    }

    #[test]
    fn ties_round_half_away_from_zero() {
        let rubric = rubric(
            100,
            vec![
                ("1", criterion(10.0, vec![("1", Some(1.25))])),
                ("2", criterion(10.0, vec![("1", Some(1.25))])),
            ],
        );
        let picks = selections(vec![("1", "1"), ("2", "1")]);

        // 1.25 + 1.25 = 2.5 rounds up to 3.
        assert_eq!(compute_total_score(&rubric, &picks), 3);
    }

    #[test]
    fn mixed_explicit_scores_add_up() {
        let rubric = rubric(
            100,
            vec![
                ("1", criterion(40.0, vec![("1", None), ("2", None), ("3", Some(30.0))])),
                ("2", criterion(35.0, vec![("1", None), ("2", Some(17.0))])),
            ],
        );
        let picks = selections(vec![("1", "3"), ("2", "2")]);

        assert_eq!(compute_total_score(&rubric, &picks), 47);
    }

    #[test]
    fn top_level_of_a_fully_weighted_criterion_reaches_the_maximum() {
        // (100 / 100) * 5 * (100 / 5) = 100
        let rubric = rubric(
            100,
            vec![(
                "1",
                criterion(
                    100.0,
                    vec![("1", None), ("2", None), ("3", None), ("4", None), ("5", None)],
                ),
            )],
        );
        let picks = selections(vec![("1", "5")]);

        assert_eq!(compute_total_score(&rubric, &picks), 100);
    }

    #[test]
    fn score_breakdown_carries_the_rounded_total() {
        let rubric = rubric(
            100,
            vec![
                ("1", criterion(40.0, vec![("1", None), ("2", None), ("3", None), ("4", None)])),
                ("2", criterion(35.0, vec![("1", None), ("2", Some(17.0))])),
            ],
        );
        let picks = selections(vec![("1", "2"), ("2", "2")]);

        let scores = compute_scores(&rubric, &picks);
        assert_eq!(scores["1"], 20.0);
        assert_eq!(scores["2"], 17.0);
        assert_eq!(scores[TOTAL_KEY], 37.0);
        assert_eq!(
            scores[TOTAL_KEY] as i64,
            compute_total_score(&rubric, &picks)
        );
    }
}
