//! Input validation and expiration arithmetic
//!
//! Everything in this module is pure: no I/O, no clock reads except where the
//! caller passes `now` in.

use chrono::{DateTime, Duration, Utc};

/// Minimum slug length in characters
pub const SLUG_MIN_LEN: usize = 3;

/// Maximum slug length in characters
pub const SLUG_MAX_LEN: usize = 50;

/// Slugs that collide with top-level routes (`/clips`, `/uploads`, `/cron`)
/// and would leave the viewer page unreachable
pub const RESERVED_SLUGS: [&str; 3] = ["clips", "uploads", "cron"];

/// A rejected user input, carrying a message suitable for display
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Validates a user-supplied slug and returns its normalized (lowercase) form
///
/// Leading and trailing whitespace is ignored. The remaining string must be
/// 3 to 50 characters drawn from `[a-zA-Z0-9_-]` and must not be one of
/// [`RESERVED_SLUGS`].
pub fn validate_slug(input: &str) -> Result<String, ValidationError> {
    let slug = input.trim();
    let len = slug.chars().count();

    if len < SLUG_MIN_LEN {
        return Err(ValidationError::new(format!(
            "Slug must be at least {SLUG_MIN_LEN} characters"
        )));
    }
    if len > SLUG_MAX_LEN {
        return Err(ValidationError::new(format!(
            "Slug must be at most {SLUG_MAX_LEN} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new(
            "Slug can only contain letters, numbers, hyphens, and underscores",
        ));
    }

    let slug = slug.to_ascii_lowercase();
    if RESERVED_SLUGS.contains(&slug.as_str()) {
        return Err(ValidationError::new(format!("Slug '{slug}' is reserved")));
    }

    Ok(slug)
}

/// Coarse time-to-live selector offered by the create form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    OneMinute,
    TenMinutes,
    OneHour,
    OneDay,
    OneWeek,
    OneMonth,
}

impl Ttl {
    /// All tokens in the order they are offered to users
    pub const ALL: [Ttl; 6] = [
        Ttl::OneMinute,
        Ttl::TenMinutes,
        Ttl::OneHour,
        Ttl::OneDay,
        Ttl::OneWeek,
        Ttl::OneMonth,
    ];

    /// Parses a wire token such as `"1hour"`
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ttl| ttl.token() == token)
    }

    pub fn token(self) -> &'static str {
        match self {
            Ttl::OneMinute => "1min",
            Ttl::TenMinutes => "10min",
            Ttl::OneHour => "1hour",
            Ttl::OneDay => "1day",
            Ttl::OneWeek => "1week",
            Ttl::OneMonth => "1month",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Ttl::OneMinute => "1 minute",
            Ttl::TenMinutes => "10 minutes",
            Ttl::OneHour => "1 hour",
            Ttl::OneDay => "1 day",
            Ttl::OneWeek => "1 week",
            Ttl::OneMonth => "1 month",
        }
    }

    /// Fixed offset added to the creation time. A month is 30 days.
    pub fn duration(self) -> Duration {
        match self {
            Ttl::OneMinute => Duration::minutes(1),
            Ttl::TenMinutes => Duration::minutes(10),
            Ttl::OneHour => Duration::hours(1),
            Ttl::OneDay => Duration::days(1),
            Ttl::OneWeek => Duration::weeks(1),
            Ttl::OneMonth => Duration::days(30),
        }
    }
}

/// Computes the expiration timestamp for a TTL token
///
/// Absent or unknown tokens mean "never expires" and yield `None`.
pub fn calculate_expiration(token: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    token
        .and_then(Ttl::from_token)
        .map(|ttl| now + ttl.duration())
}

/// Coerces a form value to a boolean
///
/// Only explicit negatives turn the flag off so that a checkbox submitting
/// `"on"` still counts as enabled.
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "off" | "no"
    )
}

/// Raw create-form fields relevant to validation
#[derive(Debug, Default, Clone)]
pub struct CreateFields {
    pub slug: Option<String>,
    pub ttl: Option<String>,
    pub destroy_on_read: Option<String>,
}

/// Create-form fields after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreate {
    pub slug: String,
    pub ttl: Option<Ttl>,
    pub destroy_on_read: bool,
}

/// Validates the slug, TTL token, and destroy-on-read flag of a create request
pub fn validate_create_request(fields: &CreateFields) -> Result<ValidatedCreate, ValidationError> {
    let slug = match fields.slug.as_deref() {
        Some(slug) if !slug.trim().is_empty() => validate_slug(slug)?,
        _ => return Err(ValidationError::new("Slug is required")),
    };

    let ttl = match fields.ttl.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(token) => Some(Ttl::from_token(token).ok_or_else(|| {
            ValidationError::new(format!(
                "Invalid TTL '{token}'. Expected one of: 1min, 10min, 1hour, 1day, 1week, 1month"
            ))
        })?),
    };

    let destroy_on_read = fields.destroy_on_read.as_deref().map_or(true, parse_flag);

    Ok(ValidatedCreate {
        slug,
        ttl,
        destroy_on_read,
    })
}
