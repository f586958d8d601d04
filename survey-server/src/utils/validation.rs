//! Input validation helpers
//!
//! Centralized text length constants and field-level validation functions.
//! All validation runs before any mutation is attempted, so a rejected
//! request never leaves partial state behind.

use std::collections::HashSet;

use crate::db::models::{Question, QuestionKind};
use crate::utils::AppError;

// ========== Text length limits ==========

/// Entity names: restaurant, table, questionnaire title, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Questionnaire descriptions, free-text answers
pub const MAX_TEXT_LEN: usize = 2000;

/// Question prompts and option labels
pub const MAX_LABEL_LEN: usize = 500;

/// Short identifiers: question ids, option values, customer identifiers
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Multiple-choice option count bounds
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 5;

// ========== Validation helpers ==========

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate an assignment weight: positive integer (relative probability mass).
pub fn validate_weight(weight: i64) -> Result<(), AppError> {
    if weight < 1 {
        return Err(AppError::validation(format!(
            "weight must be a positive integer, got {weight}"
        )));
    }
    Ok(())
}

/// Validate an ordered question list for a questionnaire.
///
/// Rules:
/// - at least one question
/// - question ids non-empty and unique within the questionnaire
/// - prompts non-empty
/// - multiple-choice questions carry 2-5 options with non-empty value/label
pub fn validate_questions(questions: &[Question]) -> Result<(), AppError> {
    if questions.is_empty() {
        return Err(AppError::validation(
            "questionnaire must contain at least one question",
        ));
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (idx, question) in questions.iter().enumerate() {
        let field = format!("questions[{idx}]");
        validate_required_text(&question.id, &format!("{field}.id"), MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&question.prompt, &format!("{field}.prompt"), MAX_LABEL_LEN)?;

        if !seen_ids.insert(question.id.as_str()) {
            return Err(AppError::validation(format!(
                "{field}.id '{}' is duplicated",
                question.id
            )));
        }

        match &question.kind {
            QuestionKind::MultipleChoice { options } => {
                if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
                    return Err(AppError::validation(format!(
                        "{field} must have {MIN_OPTIONS}-{MAX_OPTIONS} options, got {}",
                        options.len()
                    )));
                }
                let mut seen_values: HashSet<&str> = HashSet::new();
                for (opt_idx, option) in options.iter().enumerate() {
                    let opt_field = format!("{field}.options[{opt_idx}]");
                    validate_required_text(
                        &option.value,
                        &format!("{opt_field}.value"),
                        MAX_SHORT_TEXT_LEN,
                    )?;
                    validate_required_text(
                        &option.label,
                        &format!("{opt_field}.label"),
                        MAX_LABEL_LEN,
                    )?;
                    if !seen_values.insert(option.value.as_str()) {
                        return Err(AppError::validation(format!(
                            "{opt_field}.value '{}' is duplicated",
                            option.value
                        )));
                    }
                }
            }
            QuestionKind::FreeText => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ChoiceOption;

    fn choice(id: &str, options: &[(&str, &str)]) -> Question {
        Question {
            id: id.to_string(),
            prompt: format!("Prompt for {id}"),
            kind: QuestionKind::MultipleChoice {
                options: options
                    .iter()
                    .map(|(v, l)| ChoiceOption {
                        value: v.to_string(),
                        label: l.to_string(),
                    })
                    .collect(),
            },
        }
    }

    fn free_text(id: &str) -> Question {
        Question {
            id: id.to_string(),
            prompt: format!("Prompt for {id}"),
            kind: QuestionKind::FreeText,
        }
    }

    #[test]
    fn accepts_valid_questions() {
        let questions = vec![
            choice("q1", &[("good", "Good"), ("bad", "Bad")]),
            free_text("q2"),
        ];
        assert!(validate_questions(&questions).is_ok());
    }

    #[test]
    fn rejects_empty_question_list() {
        assert!(validate_questions(&[]).is_err());
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let questions = vec![free_text("q1"), free_text("q1")];
        let err = validate_questions(&questions).unwrap_err();
        assert!(err.to_string().contains("duplicated"));
    }

    #[test]
    fn rejects_single_option_choice() {
        let questions = vec![choice("q1", &[("only", "Only option")])];
        assert!(validate_questions(&questions).is_err());
    }

    #[test]
    fn rejects_too_many_options() {
        let options: Vec<(&str, &str)> = vec![
            ("a", "A"),
            ("b", "B"),
            ("c", "C"),
            ("d", "D"),
            ("e", "E"),
            ("f", "F"),
        ];
        let questions = vec![choice("q1", &options)];
        assert!(validate_questions(&questions).is_err());
    }

    #[test]
    fn rejects_empty_option_label() {
        let questions = vec![choice("q1", &[("good", "Good"), ("bad", "")])];
        assert!(validate_questions(&questions).is_err());
    }

    #[test]
    fn rejects_non_positive_weight() {
        assert!(validate_weight(0).is_err());
        assert!(validate_weight(-5).is_err());
        assert!(validate_weight(1).is_ok());
        assert!(validate_weight(100).is_ok());
    }
}
