//! Validation rules: the closed rule kinds, the per-field registry, and the
//! built-in rules attached by record category

use serde::Serialize;
use std::fmt;

/// One expectation attached to a logical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Every cell must be non-null after normalization
    NotNull,
    /// Every normalized cell must be non-null and fully match `pattern`
    Regex { pattern: String },
    /// Every non-null cell must be one of `values` (exact, case-sensitive)
    AllowedSet { values: Vec<String> },
}

impl Rule {
    pub fn regex(pattern: impl Into<String>) -> Self {
        Rule::Regex {
            pattern: pattern.into(),
        }
    }

    pub fn allowed_set<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Rule::AllowedSet {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Identifier reported on failure records
    pub fn identifier(&self) -> &'static str {
        match self {
            Rule::NotNull => "not_null",
            Rule::Regex { .. } => "regex",
            Rule::AllowedSet { .. } => "allowed_set",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::NotNull => write!(f, "not_null"),
            Rule::Regex { pattern } => write!(f, "regex: {}", pattern),
            Rule::AllowedSet { values } => write!(f, "allowed_set: [{}]", values.join(", ")),
        }
    }
}

/// Rules declared for one logical field, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRules {
    pub field: String,
    pub rules: Vec<Rule>,
}

/// Ordered field → rules registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleRegistry {
    fields: Vec<FieldRules>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a rule to a field; an identical rule already present is kept once
    pub fn add_rule(&mut self, field: &str, rule: Rule) {
        match self.fields.iter_mut().find(|f| f.field == field) {
            Some(existing) => {
                if !existing.rules.contains(&rule) {
                    existing.rules.push(rule);
                }
            }
            None => self.fields.push(FieldRules {
                field: field.to_string(),
                rules: vec![rule],
            }),
        }
    }

    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    pub fn rules_for(&self, field: &str) -> &[Rule] {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.rules.as_slice())
            .unwrap_or(&[])
    }

    /// Number of (field, rule) expectations declared
    pub fn expectation_count(&self) -> usize {
        self.fields.iter().map(|f| f.rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// This registry plus the category's built-in rules
    pub fn with_category(&self, category: RecordCategory) -> RuleRegistry {
        let mut registry = self.clone();
        for (field, rule) in category.builtin_rules() {
            registry.add_rule(field, rule);
        }
        registry
    }
}

/// Record category of a DGW file, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecordCategory {
    HireStack,
    PersonalContactInfo,
    Generic,
}

pub const HIRE_DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";
pub const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$";
pub const PHONE_PATTERN: &str = r"^\+?[0-9][0-9().\-\s]{5,19}$";
pub const EMPLOYEE_TYPES: [&str; 4] = ["Regular", "Temporary", "Fixed Term", "Contractor"];

impl RecordCategory {
    pub fn detect(filename: &str) -> Self {
        let name = filename.to_lowercase();
        if name.contains("hire") {
            RecordCategory::HireStack
        } else if name.contains("contact") {
            RecordCategory::PersonalContactInfo
        } else {
            RecordCategory::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordCategory::HireStack => "HireStack",
            RecordCategory::PersonalContactInfo => "PersonalContactInfo",
            RecordCategory::Generic => "Generic",
        }
    }

    /// Checks every file of this category gets on top of the shared registry
    pub fn builtin_rules(&self) -> Vec<(&'static str, Rule)> {
        match self {
            RecordCategory::HireStack => vec![
                ("Employee ID", Rule::NotNull),
                ("Hire Date", Rule::regex(HIRE_DATE_PATTERN)),
                ("Employee Type", Rule::allowed_set(EMPLOYEE_TYPES)),
                ("Position ID", Rule::NotNull),
            ],
            RecordCategory::PersonalContactInfo => vec![
                ("Email Address", Rule::regex(EMAIL_PATTERN)),
                ("Phone Number", Rule::regex(PHONE_PATTERN)),
            ],
            RecordCategory::Generic => Vec::new(),
        }
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
