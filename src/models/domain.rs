use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Input kind of a quiz question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    Text,
    Email,
    Tel,
    Number,
    Select,
    MultiSelect,
    Textarea,
}

/// Typed validation rule attached to a question
///
/// Each variant is checked by the validator after the generic required check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationRule {
    #[default]
    None,
    /// Integer age in `[18, 99]`
    Age,
    /// Permissive international dial pattern
    Phone,
    /// Free text of 10 to 500 characters after trimming
    Description,
    /// Multi-select with at least one choice
    AtLeastOne,
}

/// A single question definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub rule: ValidationRule,
}

impl Question {
    pub fn new(id: impl Into<String>, kind: QuestionKind, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            prompt: prompt.into(),
            placeholder: None,
            options: Vec::new(),
            required: false,
            rule: ValidationRule::None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rule = rule;
        self
    }

    /// Whether answering this question may trigger an automatic advance
    pub fn is_single_choice(&self) -> bool {
        self.kind == QuestionKind::Select
    }
}

/// An answer value: free text, a number, a list of choices, or any other JSON
///
/// Equality is on the JSON form, so `Other(json!("x"))` equals `Text("x")`
/// just as it does after a serialize/deserialize cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Number(i64),
    Choices(Vec<String>),
    Other(serde_json::Value),
}

impl AnswerValue {
    /// Empty string, empty selection or JSON null
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.is_empty(),
            AnswerValue::Number(_) => false,
            AnswerValue::Choices(choices) => choices.is_empty(),
            AnswerValue::Other(serde_json::Value::String(text)) => text.is_empty(),
            AnswerValue::Other(serde_json::Value::Array(items)) => items.is_empty(),
            AnswerValue::Other(value) => value.is_null(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AnswerValue::Text(text) => serde_json::Value::from(text.as_str()),
            AnswerValue::Number(n) => serde_json::Value::from(*n),
            AnswerValue::Choices(choices) => serde_json::Value::from(choices.clone()),
            AnswerValue::Other(value) => value.clone(),
        }
    }

    /// Textual form used by text-based rules; choices are joined with commas
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            AnswerValue::Text(text) => Cow::Borrowed(text.as_str()),
            AnswerValue::Number(n) => Cow::Owned(n.to_string()),
            AnswerValue::Choices(choices) => Cow::Owned(choices.join(",")),
            AnswerValue::Other(serde_json::Value::Null) => Cow::Borrowed(""),
            AnswerValue::Other(serde_json::Value::String(s)) => Cow::Borrowed(s.as_str()),
            AnswerValue::Other(value) => Cow::Owned(value.to_string()),
        }
    }
}

impl PartialEq for AnswerValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AnswerValue::Text(a), AnswerValue::Text(b)) => a == b,
            (AnswerValue::Number(a), AnswerValue::Number(b)) => a == b,
            (AnswerValue::Choices(a), AnswerValue::Choices(b)) => a == b,
            _ => self.to_json() == other.to_json(),
        }
    }
}

/// Picks the variant deserialization would pick
impl From<serde_json::Value> for AnswerValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::String(text) => AnswerValue::Text(text),
            Value::Number(n) => match n.as_i64() {
                Some(n) => AnswerValue::Number(n),
                None => AnswerValue::Other(Value::Number(n)),
            },
            Value::Array(items) if items.iter().all(Value::is_string) => AnswerValue::Choices(
                items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            other => AnswerValue::Other(other),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::Choices(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(value: Vec<&str>) -> Self {
        AnswerValue::Choices(value.into_iter().map(str::to_string).collect())
    }
}

/// Question id -> answer
pub type AnswerSet = BTreeMap<String, AnswerValue>;

/// A failed validation for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Question id -> validation error
pub type ValidationErrorSet = BTreeMap<String, ValidationError>;

/// Review status of a submitted profile
///
/// Moves forward only: `pending -> matched -> contacted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    #[default]
    Pending,
    Matched,
    Contacted,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Pending => "pending",
            ProfileStatus::Matched => "matched",
            ProfileStatus::Contacted => "contacted",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ProfileStatus::Pending => 0,
            ProfileStatus::Matched => 1,
            ProfileStatus::Contacted => 2,
        }
    }

    /// Only the immediate successor is reachable
    pub fn can_transition_to(&self, next: ProfileStatus) -> bool {
        next.rank() == self.rank() + 1
    }

    /// Message shown on the status view
    pub fn status_message(&self) -> &'static str {
        match self {
            ProfileStatus::Pending => {
                "We're reviewing your profile and finding compatible matches."
            }
            ProfileStatus::Matched => "Great news! We've found some potential matches for you.",
            ProfileStatus::Contacted => {
                "We've reached out with your matches. Check your email!"
            }
        }
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ProfileStatus::Pending),
            "matched" => Ok(ProfileStatus::Matched),
            "contacted" => Ok(ProfileStatus::Contacted),
            other => Err(format!("unknown profile status: {}", other)),
        }
    }
}

/// A user's identity, answers and review status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, alias = "pictureUrl")]
    pub picture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<AnswerSet>,
    #[serde(default)]
    pub status: ProfileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// A freshly authenticated user with nothing submitted yet
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        picture: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            picture: picture.into(),
            phone_number: None,
            answers: None,
            status: ProfileStatus::Pending,
            submitted_at: None,
        }
    }

    /// Whether a quiz has already been submitted for this user
    pub fn has_answers(&self) -> bool {
        self.answers.as_ref().is_some_and(|answers| !answers.is_empty())
    }
}

/// A stored quiz submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub user_id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub answers: AnswerSet,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Profile projection returned by `GET /api/user/{email}`
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            picture: String::new(),
            phone_number: self.phone_number.clone(),
            answers: Some(self.answers.clone()),
            status: self.status,
            submitted_at: Some(self.created_at),
        }
    }
}
