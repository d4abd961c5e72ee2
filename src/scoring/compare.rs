use serde::Serialize;
use std::collections::HashSet;

use super::answer_key::{normalize, AnswerKey, Response};
use super::round_score;
use crate::config::ScoringConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringOptions {
    /// Award partial credit on multiple-choice questions
    pub partial_credit: bool,
    pub case_sensitive: bool,
}

impl From<&ScoringConfig> for ScoringOptions {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            partial_credit: config.multiple_choice_partial_credit,
            case_sensitive: config.case_sensitive_text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuestionScore {
    pub is_correct: bool,
    pub score: f64,
    pub max_score: f64,
}

impl QuestionScore {
    fn wrong(max_score: f64) -> Self {
        Self {
            is_correct: false,
            score: 0.0,
            max_score,
        }
    }

    fn fraction(fraction: f64, is_correct: bool, max_score: f64) -> Self {
        Self {
            is_correct,
            score: round_score(max_score * fraction.clamp(0.0, 1.0)),
            max_score,
        }
    }
}

/// Score one response against its key.
///
/// A response whose shape does not belong to the key's question type
/// scores zero.
pub fn score_question(key: &AnswerKey, response: &Response, points: f64, options: ScoringOptions) -> QuestionScore {
    let cs = options.case_sensitive;
    match (key, response) {
        (_, Response::Unanswered) => QuestionScore::wrong(points),

        (AnswerKey::SingleChoice(expected), Response::Choice(given)) => {
            if normalize(expected, cs) == normalize(given, cs) {
                QuestionScore::fraction(1.0, true, points)
            } else {
                QuestionScore::wrong(points)
            }
        }

        (AnswerKey::MultipleChoice(expected), Response::Choices(given)) => {
            let expected: HashSet<String> = expected.iter().map(|c| normalize(c, cs)).collect();
            let given: HashSet<String> = given.iter().map(|c| normalize(c, cs)).collect();

            if expected == given {
                return QuestionScore::fraction(1.0, true, points);
            }
            if !options.partial_credit {
                return QuestionScore::wrong(points);
            }
            let hits = given.intersection(&expected).count() as f64;
            let misses = given.difference(&expected).count() as f64;
            let fraction = (hits - misses).max(0.0) / expected.len() as f64;
            QuestionScore::fraction(fraction, false, points)
        }

        (AnswerKey::ShortAnswer(accepted), Response::Text(given)) => {
            let given = normalize(given, cs);
            if accepted.iter().any(|a| normalize(a, cs) == given) {
                QuestionScore::fraction(1.0, true, points)
            } else {
                QuestionScore::wrong(points)
            }
        }

        (AnswerKey::FillBlank(blanks), Response::Blanks(given)) => {
            let matched = blanks
                .iter()
                .enumerate()
                .filter(|(i, accepted)| {
                    given
                        .get(*i)
                        .map(|g| normalize(g, cs))
                        .filter(|g| !g.is_empty())
                        .map_or(false, |g| accepted.iter().any(|a| normalize(a, cs) == g))
                })
                .count();
            let fraction = matched as f64 / blanks.len() as f64;
            QuestionScore::fraction(fraction, matched == blanks.len(), points)
        }

        _ => QuestionScore::wrong(points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::QuestionType;
    use serde_json::{json, Value};

    fn score(kind: QuestionType, key: Value, response: Value, options: ScoringOptions) -> QuestionScore {
        let key = AnswerKey::parse(kind, &key).unwrap();
        score_question(&key, &Response::parse(kind, &response), 10.0, options)
    }

    fn strict() -> ScoringOptions {
        ScoringOptions::default()
    }

    #[test]
    fn single_choice_ignores_case_and_padding() {
        let s = score(QuestionType::SingleChoice, json!("B"), json!(" b "), strict());
        assert!(s.is_correct);
        assert_eq!(s.score, 10.0);

        let s = score(QuestionType::SingleChoice, json!("B"), json!("C"), strict());
        assert!(!s.is_correct);
        assert_eq!(s.score, 0.0);
        assert_eq!(s.max_score, 10.0);
    }

    #[test]
    fn case_sensitive_option_is_honored() {
        let options = ScoringOptions { case_sensitive: true, ..strict() };
        assert!(!score(QuestionType::ShortAnswer, json!("Paris"), json!("paris"), options).is_correct);
        assert!(score(QuestionType::ShortAnswer, json!("Paris"), json!("Paris"), options).is_correct);
    }

    #[test]
    fn multiple_choice_is_order_independent() {
        let s = score(QuestionType::MultipleChoice, json!(["A", "C"]), json!(["C", "A"]), strict());
        assert!(s.is_correct);
        assert_eq!(s.score, 10.0);

        // Duplicates collapse into the same set
        let s = score(QuestionType::MultipleChoice, json!(["A", "C"]), json!(["a", "C", "A"]), strict());
        assert!(s.is_correct);

        let s = score(QuestionType::MultipleChoice, json!(["A", "C"]), json!("C,A"), strict());
        assert!(s.is_correct);
    }

    #[test]
    fn multiple_choice_without_partial_credit_is_all_or_nothing() {
        let s = score(QuestionType::MultipleChoice, json!(["A", "C"]), json!(["A"]), strict());
        assert!(!s.is_correct);
        assert_eq!(s.score, 0.0);

        let s = score(QuestionType::MultipleChoice, json!(["A", "C"]), json!(["A", "B", "C"]), strict());
        assert!(!s.is_correct);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn multiple_choice_partial_credit_penalizes_wrong_picks() {
        let options = ScoringOptions { partial_credit: true, ..strict() };

        let s = score(QuestionType::MultipleChoice, json!(["A", "B", "C"]), json!(["A", "B"]), options);
        assert!(!s.is_correct);
        assert_eq!(s.score, 6.67);

        let s = score(QuestionType::MultipleChoice, json!(["A", "B", "C"]), json!(["A", "B", "D"]), options);
        assert_eq!(s.score, 3.33);

        // Never negative
        let s = score(QuestionType::MultipleChoice, json!(["A"]), json!(["B", "C"]), options);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn short_answer_matches_any_alternative() {
        let key = json!(["Paris", "City of Paris"]);
        assert!(score(QuestionType::ShortAnswer, key.clone(), json!("city  of   paris"), strict()).is_correct);
        assert!(!score(QuestionType::ShortAnswer, key, json!("Lyon"), strict()).is_correct);
    }

    #[test]
    fn fill_blank_gives_proportional_credit() {
        let key = json!(["4", ["four", "4"], "even"]);

        let s = score(QuestionType::FillBlank, key.clone(), json!(["4", "FOUR", "even"]), strict());
        assert!(s.is_correct);
        assert_eq!(s.score, 10.0);

        let s = score(QuestionType::FillBlank, key.clone(), json!(["4", "five", "even"]), strict());
        assert!(!s.is_correct);
        assert_eq!(s.score, 6.67);

        // Missing trailing blanks count as wrong, extra blanks are ignored
        let s = score(QuestionType::FillBlank, key.clone(), json!(["4"]), strict());
        assert_eq!(s.score, 3.33);
        let s = score(QuestionType::FillBlank, key, json!(["4", "4", "even", "extra"]), strict());
        assert!(s.is_correct);
    }

    #[test]
    fn fill_blank_is_positional() {
        let s = score(QuestionType::FillBlank, json!(["a", "b"]), json!(["b", "a"]), strict());
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn unanswered_and_mismatched_score_zero() {
        let s = score(QuestionType::ShortAnswer, json!("x"), json!(null), strict());
        assert_eq!(s, QuestionScore { is_correct: false, score: 0.0, max_score: 10.0 });

        let key = AnswerKey::parse(QuestionType::SingleChoice, &json!("A")).unwrap();
        let s = score_question(&key, &Response::Choices(vec!["A".into()]), 10.0, strict());
        assert_eq!(s.score, 0.0);
    }
}
