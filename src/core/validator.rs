use crate::models::{AnswerValue, Question, ValidationRule};
use regex::Regex;
use std::sync::OnceLock;

pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 99;
pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Validate an answer against its question
///
/// Returns the user-facing error message, or `None` when the answer is valid.
/// The required check runs first; the question's rule only sees answers that
/// passed it.
pub fn validate(question: &Question, value: Option<&AnswerValue>) -> Option<String> {
    if question.required && is_blank(value) {
        return Some(format!("{} is required", question.prompt));
    }

    question.rule.check(value)
}

/// Missing, empty string, empty selection or null
#[inline]
pub fn is_blank(value: Option<&AnswerValue>) -> bool {
    value.map_or(true, AnswerValue::is_empty)
}

impl ValidationRule {
    /// Apply this rule on its own, without the required check
    pub fn check(&self, value: Option<&AnswerValue>) -> Option<String> {
        match self {
            ValidationRule::None => None,
            ValidationRule::Age => check_age(&text_of(value)),
            ValidationRule::Phone => check_phone(&text_of(value)),
            ValidationRule::Description => check_description(&text_of(value)),
            ValidationRule::AtLeastOne => check_at_least_one(value),
        }
    }
}

fn text_of(value: Option<&AnswerValue>) -> String {
    value.map(|v| v.as_text().into_owned()).unwrap_or_default()
}

fn check_age(text: &str) -> Option<String> {
    if text.is_empty() {
        return Some("Age is required".to_string());
    }

    match parse_leading_int(text) {
        None => Some("Please enter a valid number".to_string()),
        Some(age) if age < MIN_AGE => Some("You must be at least 18 years old".to_string()),
        Some(age) if age > MAX_AGE => Some("Please enter a valid age (18-99)".to_string()),
        Some(_) => None,
    }
}

fn check_phone(text: &str) -> Option<String> {
    if text.is_empty() {
        return Some("Phone number is required".to_string());
    }

    if phone_pattern().is_match(&normalize_phone(text)) {
        None
    } else {
        Some("Please enter a valid phone number".to_string())
    }
}

fn check_description(text: &str) -> Option<String> {
    let length = text.trim().chars().count();

    if length == 0 {
        Some("Description is required".to_string())
    } else if length < MIN_DESCRIPTION_CHARS {
        Some("Description must be at least 10 characters".to_string())
    } else if length > MAX_DESCRIPTION_CHARS {
        Some("Description must be less than 500 characters".to_string())
    } else {
        None
    }
}

fn check_at_least_one(value: Option<&AnswerValue>) -> Option<String> {
    if is_blank(value) {
        Some("Please select at least one option".to_string())
    } else {
        None
    }
}

/// Strip spaces, dashes and parentheses from a phone number
pub fn normalize_phone(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("phone pattern is valid"))
}

/// Parse a leading integer the way form inputs are read: surrounding
/// whitespace and an optional sign, then digits up to the first non-digit.
fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut seen_digit = false;
    let mut value: i64 = 0;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(10) else { break };
        seen_digit = true;
        value = value.saturating_mul(10).saturating_add(i64::from(digit));
    }

    seen_digit.then_some(if negative { -value } else { value })
}
