use serde_json::Value;

use super::{QuestionType, ScoringError};

/// A validated answer key, one shape per question type
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    SingleChoice(String),
    MultipleChoice(Vec<String>),
    /// Accepted alternatives; any one of them is correct
    ShortAnswer(Vec<String>),
    /// One entry per blank, each holding its accepted alternatives
    FillBlank(Vec<Vec<String>>),
}

/// A submitted response after lenient parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Unanswered,
    Choice(String),
    Choices(Vec<String>),
    Text(String),
    Blanks(Vec<String>),
}

impl AnswerKey {
    /// Parse and validate an answer key as stored on a question.
    ///
    /// Accepted shapes:
    /// - single choice: `"B"`
    /// - multiple choice: `["A", "C"]` (distinct, non-empty)
    /// - short answer: `"Paris"` or `["Paris", "City of Paris"]`
    /// - fill blank: `["4", ["four", "4"]]`
    pub fn parse(question_type: QuestionType, value: &Value) -> Result<Self, ScoringError> {
        match question_type {
            QuestionType::SingleChoice => {
                let choice = value_to_text(value)
                    .ok_or_else(|| ScoringError::invalid_key(question_type, "expected a single choice"))?;
                Ok(AnswerKey::SingleChoice(choice))
            }
            QuestionType::MultipleChoice => {
                let items = value
                    .as_array()
                    .ok_or_else(|| ScoringError::invalid_key(question_type, "expected an array of choices"))?;
                if items.is_empty() {
                    return Err(ScoringError::invalid_key(question_type, "at least one choice is required"));
                }
                let mut choices: Vec<String> = Vec::with_capacity(items.len());
                let mut seen: Vec<String> = Vec::with_capacity(items.len());
                for item in items {
                    let choice = value_to_text(item)
                        .ok_or_else(|| ScoringError::invalid_key(question_type, "choices must be non-empty strings"))?;
                    // Choices that only differ in case or spacing score as one
                    let folded = normalize(&choice, false);
                    if seen.contains(&folded) {
                        return Err(ScoringError::invalid_key(
                            question_type,
                            format!("duplicate choice '{}'", choice),
                        ));
                    }
                    seen.push(folded);
                    choices.push(choice);
                }
                Ok(AnswerKey::MultipleChoice(choices))
            }
            QuestionType::ShortAnswer => {
                let alternatives = alternatives(value)
                    .ok_or_else(|| ScoringError::invalid_key(question_type, "expected text or a list of accepted answers"))?;
                Ok(AnswerKey::ShortAnswer(alternatives))
            }
            QuestionType::FillBlank => {
                let blanks = value
                    .as_array()
                    .ok_or_else(|| ScoringError::invalid_key(question_type, "expected an array of blanks"))?;
                if blanks.is_empty() {
                    return Err(ScoringError::invalid_key(question_type, "at least one blank is required"));
                }
                let blanks = blanks
                    .iter()
                    .enumerate()
                    .map(|(i, blank)| {
                        alternatives(blank).ok_or_else(|| {
                            ScoringError::invalid_key(question_type, format!("blank {} has no accepted answer", i + 1))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AnswerKey::FillBlank(blanks))
            }
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerKey::SingleChoice(_) => QuestionType::SingleChoice,
            AnswerKey::MultipleChoice(_) => QuestionType::MultipleChoice,
            AnswerKey::ShortAnswer(_) => QuestionType::ShortAnswer,
            AnswerKey::FillBlank(_) => QuestionType::FillBlank,
        }
    }

    /// Every choice in a choice key must be one of the question's options
    pub fn check_options(&self, options: &[String], case_sensitive: bool) -> Result<(), ScoringError> {
        let choices: Vec<&String> = match self {
            AnswerKey::SingleChoice(choice) => vec![choice],
            AnswerKey::MultipleChoice(choices) => choices.iter().collect(),
            _ => return Ok(()),
        };
        if options.is_empty() {
            return Err(ScoringError::invalid_key(self.question_type(), "choice questions need options"));
        }
        let normalized: Vec<String> = options.iter().map(|o| normalize(o, case_sensitive)).collect();
        for choice in choices {
            if !normalized.contains(&normalize(choice, case_sensitive)) {
                return Err(ScoringError::invalid_key(
                    self.question_type(),
                    format!("'{}' is not one of the options", choice),
                ));
            }
        }
        Ok(())
    }
}

impl Response {
    /// Lenient parse of a submitted answer. Shapes that do not fit the
    /// question type are treated as unanswered.
    pub fn parse(question_type: QuestionType, value: &Value) -> Self {
        if value.is_null() {
            return Response::Unanswered;
        }
        let parsed = match question_type {
            QuestionType::SingleChoice => value_to_text(value).map(Response::Choice),
            QuestionType::MultipleChoice => match value {
                Value::Array(items) => Some(Response::Choices(items.iter().filter_map(value_to_text).collect())),
                Value::String(s) => Some(Response::Choices(
                    s.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                )),
                _ => None,
            },
            QuestionType::ShortAnswer => value_to_text(value).map(Response::Text),
            QuestionType::FillBlank => match value {
                Value::Array(items) => Some(Response::Blanks(
                    items.iter().map(|v| value_to_text(v).unwrap_or_default()).collect(),
                )),
                other => value_to_text(other).map(|s| Response::Blanks(vec![s])),
            },
        };

        match parsed {
            Some(Response::Choices(c)) if c.is_empty() => Response::Unanswered,
            Some(Response::Blanks(b)) if b.iter().all(String::is_empty) => Response::Unanswered,
            Some(response) => response,
            None => Response::Unanswered,
        }
    }
}

/// Trim, collapse internal whitespace, and fold case unless asked not to
pub fn normalize(text: &str, case_sensitive: bool) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if case_sensitive {
        collapsed
    } else {
        collapsed.to_lowercase()
    }
}

/// Strings, numbers and booleans all count as text; blank text does not
fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn alternatives(value: &Value) -> Option<Vec<String>> {
    let list: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        other => value_to_text(other).into_iter().collect(),
    };
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_each_key_shape() {
        assert_eq!(
            AnswerKey::parse(QuestionType::SingleChoice, &json!(" B ")).unwrap(),
            AnswerKey::SingleChoice("B".into())
        );
        assert_eq!(
            AnswerKey::parse(QuestionType::MultipleChoice, &json!(["A", "C"])).unwrap(),
            AnswerKey::MultipleChoice(vec!["A".into(), "C".into()])
        );
        assert_eq!(
            AnswerKey::parse(QuestionType::ShortAnswer, &json!("Paris")).unwrap(),
            AnswerKey::ShortAnswer(vec!["Paris".into()])
        );
        assert_eq!(
            AnswerKey::parse(QuestionType::FillBlank, &json!(["4", ["four", 4]])).unwrap(),
            AnswerKey::FillBlank(vec![vec!["4".into()], vec!["four".into(), "4".into()]])
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(AnswerKey::parse(QuestionType::SingleChoice, &json!("")).is_err());
        assert!(AnswerKey::parse(QuestionType::SingleChoice, &json!(["A"])).is_err());
        assert!(AnswerKey::parse(QuestionType::MultipleChoice, &json!([])).is_err());
        assert!(AnswerKey::parse(QuestionType::MultipleChoice, &json!(["A", "A"])).is_err());
        assert!(AnswerKey::parse(QuestionType::ShortAnswer, &json!([" ", ""])).is_err());
        assert!(AnswerKey::parse(QuestionType::FillBlank, &json!(["x", []])).is_err());
        assert!(AnswerKey::parse(QuestionType::FillBlank, &json!("x")).is_err());
    }

    #[test]
    fn multiple_choice_key_rejects_choices_differing_only_in_case_or_spacing() {
        assert!(AnswerKey::parse(QuestionType::MultipleChoice, &json!(["A", "a"])).is_err());
        assert!(AnswerKey::parse(QuestionType::MultipleChoice, &json!(["New York", "new  york"])).is_err());
        assert_eq!(
            AnswerKey::parse(QuestionType::MultipleChoice, &json!(["A", "B"])).unwrap(),
            AnswerKey::MultipleChoice(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn choice_keys_must_come_from_options() {
        let options = vec!["Red".to_string(), "Green".to_string(), "Blue".to_string()];
        let key = AnswerKey::parse(QuestionType::MultipleChoice, &json!(["red", "blue"])).unwrap();
        assert!(key.check_options(&options, false).is_ok());
        assert!(key.check_options(&options, true).is_err());

        let key = AnswerKey::parse(QuestionType::SingleChoice, &json!("Purple")).unwrap();
        assert!(key.check_options(&options, false).is_err());
        assert!(key.check_options(&[], false).is_err());

        let key = AnswerKey::parse(QuestionType::ShortAnswer, &json!("anything")).unwrap();
        assert!(key.check_options(&[], false).is_ok());
    }

    #[test]
    fn multiple_choice_response_accepts_comma_string() {
        assert_eq!(
            Response::parse(QuestionType::MultipleChoice, &json!("A, C,")),
            Response::Choices(vec!["A".into(), "C".into()])
        );
        assert_eq!(
            Response::parse(QuestionType::MultipleChoice, &json!([])),
            Response::Unanswered
        );
    }

    #[test]
    fn mismatched_or_empty_responses_are_unanswered() {
        assert_eq!(Response::parse(QuestionType::SingleChoice, &json!(null)), Response::Unanswered);
        assert_eq!(Response::parse(QuestionType::SingleChoice, &json!({"a": 1})), Response::Unanswered);
        assert_eq!(Response::parse(QuestionType::ShortAnswer, &json!("   ")), Response::Unanswered);
        assert_eq!(Response::parse(QuestionType::FillBlank, &json!(["", " "])), Response::Unanswered);
    }

    #[test]
    fn fill_blank_response_keeps_positions() {
        assert_eq!(
            Response::parse(QuestionType::FillBlank, &json!(["", "x"])),
            Response::Blanks(vec!["".into(), "x".into()])
        );
        assert_eq!(
            Response::parse(QuestionType::FillBlank, &json!("only")),
            Response::Blanks(vec!["only".into()])
        );
    }

    #[test]
    fn normalizes_whitespace_and_case() {
        assert_eq!(normalize("  New   York ", false), "new york");
        assert_eq!(normalize("  New   York ", true), "New York");
    }
}
