//! Client-side task form validation.
//!
//! [`TaskForm`] holds raw field text as typed by the user.
//! [`TaskForm::validate`] either produces a [`TaskDraft`] ready to send or a
//! [`ValidationFailure`] listing every offending field. Invalid input never
//! reaches the network.

use std::collections::BTreeMap;
use std::fmt;

use habit_proto::dates;
use habit_proto::task::{
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, MIN_DAILY_TARGET, MIN_TITLE_LENGTH, Priority, Task,
    TaskDraft,
};

/// A validated field, named as the API names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    /// `title`
    Title,
    /// `description`
    Description,
    /// `dailyTargetValue`
    DailyTargetValue,
    /// `startDate`
    StartDate,
    /// `endDate`
    EndDate,
}

impl FormField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::DailyTargetValue => "dailyTargetValue",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One or more form fields are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task form: {}", summary(.errors))]
pub struct ValidationFailure {
    /// Message per offending field, in field order.
    pub errors: BTreeMap<FormField, String>,
}

impl ValidationFailure {
    /// Message for one field, if it failed.
    #[must_use]
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }
}

fn summary(errors: &BTreeMap<FormField, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raw task form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    /// Title text.
    pub title: String,
    /// Description text; blank means none.
    pub description: String,
    /// Daily target as typed.
    pub daily_target_value: String,
    /// Selected priority.
    pub priority: Priority,
    /// Start date as `YYYY-MM-DD`.
    pub start_date: String,
    /// End date as `YYYY-MM-DD`.
    pub end_date: String,
}

impl Default for TaskForm {
    /// An empty create form: medium priority, starting today.
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            daily_target_value: String::new(),
            priority: Priority::Medium,
            start_date: dates::format_iso_date(dates::today()),
            end_date: String::new(),
        }
    }
}

impl TaskForm {
    /// A form pre-filled from an existing task, for editing.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        let date_text = |date: Option<chrono::NaiveDate>| {
            date.map(dates::format_iso_date).unwrap_or_default()
        };
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            daily_target_value: task
                .daily_target_value
                .map(|v| v.to_string())
                .unwrap_or_default(),
            priority: if task.priority.is_known() {
                task.priority.clone()
            } else {
                Priority::Medium
            },
            start_date: date_text(task.start_date),
            end_date: date_text(task.end_date),
        }
    }

    /// Checks every field and builds the request body.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationFailure`] with one message per invalid field.
    pub fn validate(&self) -> Result<TaskDraft, ValidationFailure> {
        let mut errors = BTreeMap::new();

        let title = self.title.trim();
        let title_len = title.chars().count();
        if title.is_empty() {
            errors.insert(FormField::Title, "Title is required".to_string());
        } else if title_len < MIN_TITLE_LENGTH {
            errors.insert(
                FormField::Title,
                format!("Title must be at least {MIN_TITLE_LENGTH} characters"),
            );
        } else if title_len > MAX_TITLE_LENGTH {
            errors.insert(
                FormField::Title,
                format!("Title cannot exceed {MAX_TITLE_LENGTH} characters"),
            );
        }

        let description = self.description.trim();
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            errors.insert(
                FormField::Description,
                format!("Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters"),
            );
        }

        let daily_target = match self.daily_target_value.trim() {
            "" => {
                errors.insert(
                    FormField::DailyTargetValue,
                    "Daily target value is required".to_string(),
                );
                None
            }
            raw => match raw.parse::<i64>() {
                Ok(value) if value >= MIN_DAILY_TARGET => Some(value),
                Ok(_) => {
                    errors.insert(
                        FormField::DailyTargetValue,
                        format!("Daily target must be at least {MIN_DAILY_TARGET}"),
                    );
                    None
                }
                Err(_) => {
                    errors.insert(
                        FormField::DailyTargetValue,
                        "Daily target must be a whole number".to_string(),
                    );
                    None
                }
            },
        };

        let start = required_date(&self.start_date, FormField::StartDate, "Start date", &mut errors);
        let end = required_date(&self.end_date, FormField::EndDate, "End date", &mut errors);
        if matches!((start, end), (Some(start), Some(end)) if dates::is_before(end, start)) {
            errors.insert(
                FormField::EndDate,
                "End date must be after start date".to_string(),
            );
        }

        match (daily_target, start, end) {
            (Some(daily_target_value), Some(start_date), Some(end_date)) if errors.is_empty() => {
                Ok(TaskDraft {
                    title: title.to_string(),
                    description: (!description.is_empty()).then(|| description.to_string()),
                    daily_target_value,
                    priority: self.priority.clone(),
                    start_date,
                    end_date,
                })
            }
            _ => Err(ValidationFailure { errors }),
        }
    }
}

fn required_date(
    raw: &str,
    field: FormField,
    label: &str,
    errors: &mut BTreeMap<FormField, String>,
) -> Option<chrono::NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.insert(field, format!("{label} is required"));
        return None;
    }
    dates::parse_iso_date(raw)
        .inspect_err(|_| {
            errors.insert(field, format!("{label} must be a valid date (YYYY-MM-DD)"));
        })
        .ok()
}
