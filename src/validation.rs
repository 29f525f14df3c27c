//! Input checks for users, goals and progress samples.
//!
//! Each `validate_*` function is pure: it takes the raw request shape and
//! either returns the normalized value or the full list of violations. Checks
//! never stop at the first failure.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Validated<T> = Result<T, Vec<Violation>>;

// ---- raw inputs ----

#[derive(Debug, Clone)]
pub struct RegistrationInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalInput {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    /// RFC 3339; parsed during validation.
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalPatch {
    pub title: Option<String>,
    /// An empty string clears the description.
    pub description: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressInput {
    pub metric: Option<f64>,
}

// ---- validated values ----

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub due_date: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalChanges {
    pub title: Option<String>,
    /// `Some(None)` clears the stored description.
    pub description: Option<Option<String>>,
    pub due_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewProgress {
    pub metric: f64,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn password_violations(password: &str, out: &mut Vec<Violation>) {
    lazy_static! {
        static ref SPECIAL_RE: Regex = Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).unwrap();
    }
    if password.is_empty() {
        out.push(Violation::new("password", "Password is required"));
        return;
    }
    if password.chars().count() < 8 {
        out.push(Violation::new(
            "password",
            "Password must be at least 8 characters long",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        out.push(Violation::new(
            "password",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        out.push(Violation::new(
            "password",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        out.push(Violation::new(
            "password",
            "Password must contain at least one number",
        ));
    }
    if !SPECIAL_RE.is_match(password) {
        out.push(Violation::new(
            "password",
            "Password must contain at least one special character",
        ));
    }
}

pub fn validate_user(input: RegistrationInput) -> Validated<NewUser> {
    let mut violations = Vec::new();

    let name = input.name.trim().to_string();
    if name.is_empty() {
        violations.push(Violation::new("name", "Name is required"));
    }

    let email = normalize_email(&input.email);
    if email.is_empty() {
        violations.push(Violation::new("email", "Email is required"));
    } else if !is_valid_email(&email) {
        violations.push(Violation::new("email", "Invalid email address"));
    }

    password_violations(&input.password, &mut violations);

    if violations.is_empty() {
        Ok(NewUser {
            name,
            email,
            password: input.password,
        })
    } else {
        Err(violations)
    }
}

/// Parses an RFC 3339 due date, truncated to the microsecond precision
/// Postgres stores, and checks that it lies in the future.
fn parse_due_date(
    raw: &str,
    now: OffsetDateTime,
    out: &mut Vec<Violation>,
) -> Option<OffsetDateTime> {
    let Ok(parsed) = OffsetDateTime::parse(raw.trim(), &Rfc3339) else {
        out.push(Violation::new("due_date", "Invalid due date"));
        return None;
    };
    let due_date = parsed - Duration::nanoseconds(i64::from(parsed.nanosecond() % 1_000));
    if due_date <= now {
        out.push(Violation::new("due_date", "Due date must be in the future"));
        return None;
    }
    Some(due_date)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_goal(input: GoalInput, now: OffsetDateTime) -> Validated<NewGoal> {
    let mut violations = Vec::new();

    let title = input.title.trim().to_string();
    if title.is_empty() {
        violations.push(Violation::new("title", "Goal title is required"));
    }

    let due_date = match input.due_date.as_deref() {
        None => {
            violations.push(Violation::new("due_date", "Due date is required"));
            None
        }
        Some(raw) => parse_due_date(raw, now, &mut violations),
    };

    match (violations.is_empty(), due_date) {
        (true, Some(due_date)) => Ok(NewGoal {
            title,
            description: non_blank(input.description),
            due_date,
        }),
        _ => Err(violations),
    }
}

pub fn validate_goal_patch(input: GoalPatch, now: OffsetDateTime) -> Validated<GoalChanges> {
    let mut violations = Vec::new();

    if input.title.is_none() && input.description.is_none() && input.due_date.is_none() {
        violations.push(Violation::new(
            "update",
            "At least one field must be provided",
        ));
    }

    let title = input.title.map(|t| t.trim().to_string());
    if title.as_deref() == Some("") {
        violations.push(Violation::new("title", "Goal title is required"));
    }

    let due_date = input
        .due_date
        .as_deref()
        .and_then(|raw| parse_due_date(raw, now, &mut violations));

    if !violations.is_empty() {
        return Err(violations);
    }
    Ok(GoalChanges {
        title,
        description: input.description.map(|d| non_blank(Some(d))),
        due_date,
    })
}

pub fn validate_progress(input: ProgressInput) -> Validated<NewProgress> {
    match input.metric {
        None => Err(vec![Violation::new(
            "metric",
            "Progress metric is required",
        )]),
        Some(m) if !m.is_finite() || m <= 0.0 => Err(vec![Violation::new(
            "metric",
            "Metric must be a positive number",
        )]),
        Some(metric) => Ok(NewProgress { metric }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn fields(v: &[Violation]) -> Vec<&str> {
        v.iter().map(|x| x.field.as_str()).collect()
    }

    fn rfc3339(d: OffsetDateTime) -> Option<String> {
        Some(d.format(&Rfc3339).unwrap())
    }

    #[test]
    fn user_is_normalized() {
        let user = validate_user(RegistrationInput {
            name: "  Ada ".into(),
            email: " Ada@Example.COM ".into(),
            password: "Str0ng!pass".into(),
        })
        .unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn user_collects_all_violations() {
        let errs = validate_user(RegistrationInput {
            name: "".into(),
            email: "not-an-email".into(),
            password: "short".into(),
        })
        .unwrap_err();
        let f = fields(&errs);
        assert!(f.contains(&"name"));
        assert!(f.contains(&"email"));
        // too short, no uppercase, no digit, no special character
        assert_eq!(f.iter().filter(|x| **x == "password").count(), 4);
    }

    #[test]
    fn missing_password_reports_once() {
        let errs = validate_user(RegistrationInput {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: String::new(),
        })
        .unwrap_err();
        assert_eq!(errs, vec![Violation::new("password", "Password is required")]);
    }

    #[test]
    fn goal_requires_title_and_future_due_date() {
        let now = OffsetDateTime::now_utc();
        let errs = validate_goal(
            GoalInput {
                title: "   ".into(),
                description: None,
                due_date: rfc3339(now - Duration::days(1)),
            },
            now,
        )
        .unwrap_err();
        assert_eq!(fields(&errs), vec!["title", "due_date"]);

        let errs = validate_goal(GoalInput::default(), now).unwrap_err();
        assert_eq!(errs[1].message, "Due date is required");
    }

    #[test]
    fn goal_blank_description_becomes_none() {
        let now = OffsetDateTime::now_utc();
        let goal = validate_goal(
            GoalInput {
                title: "Run 5k".into(),
                description: Some("  ".into()),
                due_date: rfc3339(now + Duration::days(30)),
            },
            now,
        )
        .unwrap();
        assert_eq!(goal.title, "Run 5k");
        assert_eq!(goal.description, None);
    }

    #[test]
    fn empty_patch_is_rejected() {
        let errs = validate_goal_patch(GoalPatch::default(), OffsetDateTime::now_utc()).unwrap_err();
        assert_eq!(fields(&errs), vec!["update"]);
    }

    #[test]
    fn patch_can_clear_description() {
        let changes = validate_goal_patch(
            GoalPatch {
                description: Some(String::new()),
                ..Default::default()
            },
            OffsetDateTime::now_utc(),
        )
        .unwrap();
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.title, None);
    }

    #[test]
    fn patch_checks_title_and_due_date_together() {
        let now = OffsetDateTime::now_utc();
        let errs = validate_goal_patch(
            GoalPatch {
                title: Some(" ".into()),
                description: None,
                due_date: rfc3339(now),
            },
            now,
        )
        .unwrap_err();
        assert_eq!(fields(&errs), vec!["title", "due_date"]);
    }

    #[test]
    fn malformed_due_date_is_reported_with_other_violations() {
        let now = OffsetDateTime::now_utc();
        let errs = validate_goal(
            GoalInput {
                title: "".into(),
                description: None,
                due_date: Some("2030-01-01".into()),
            },
            now,
        )
        .unwrap_err();
        assert_eq!(
            errs,
            vec![
                Violation::new("title", "Goal title is required"),
                Violation::new("due_date", "Invalid due date"),
            ]
        );

        let errs = validate_goal_patch(
            GoalPatch {
                due_date: Some("next tuesday".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap_err();
        assert_eq!(errs, vec![Violation::new("due_date", "Invalid due date")]);
    }

    #[test]
    fn due_date_keeps_microsecond_precision_only() {
        let now = OffsetDateTime::now_utc();
        let goal = validate_goal(
            GoalInput {
                title: "Run 5k".into(),
                description: None,
                due_date: Some("2099-06-01T07:30:00.123456789Z".into()),
            },
            now,
        )
        .unwrap();
        assert_eq!(goal.due_date.nanosecond(), 123_456_000);
        assert_eq!(goal.due_date.second(), 0);

        let changes = validate_goal_patch(
            GoalPatch {
                due_date: Some("2099-06-01T07:30:00.5+02:00".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(changes.due_date.unwrap().nanosecond(), 500_000_000);
    }

    #[test]
    fn metric_must_be_positive() {
        assert!(validate_progress(ProgressInput { metric: Some(50.0) }).is_ok());
        assert!(validate_progress(ProgressInput { metric: Some(0.0) }).is_err());
        assert!(validate_progress(ProgressInput { metric: Some(-3.0) }).is_err());
        assert!(validate_progress(ProgressInput { metric: Some(f64::NAN) }).is_err());
        let errs = validate_progress(ProgressInput { metric: None }).unwrap_err();
        assert_eq!(errs[0].message, "Progress metric is required");
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
    }
}
