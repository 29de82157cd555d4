//! The validated input to the generation pipeline.

use serde::{Deserialize, Serialize};

use crate::error::MkunitError;
use crate::timer::{self, TimerDecision};

pub const DEFAULT_TEMPLATE: &str = "default";
pub const DEFAULT_DESCRIPTION: &str = "Unit generated by mkunit";

const TIME_SPAN_UNITS: &[&str] = &[
    "usec", "us", "µs", "msec", "ms", "seconds", "second", "sec", "s", "minutes", "minute",
    "min", "m", "hours", "hour", "hr", "h", "days", "day", "d", "weeks", "week", "w",
    "months", "month", "M", "years", "year", "y",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    User,
    System,
}

impl Scope {
    pub fn label(self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    None,
    /// Interval between activations, a systemd time span such as `1d` or `2h 30min`.
    Frequency(String),
    /// A systemd calendar expression such as `Mon *-*-* 09:00:00`.
    Calendar(String),
}

/// Unvalidated request as it arrives from the command line.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub name: String,
    pub command: String,
    pub description: Option<String>,
    pub scope: Option<Scope>,
    pub frequency: Option<String>,
    pub calendar: Option<String>,
    pub template: Option<String>,
    pub no_timer: bool,
    pub start: bool,
    pub enable: bool,
}

#[derive(Debug, Clone)]
pub struct UnitRequest {
    pub name: String,
    pub command: String,
    pub description: String,
    pub scope: Scope,
    pub schedule: Schedule,
    pub template_name: String,
    pub suppress_timer: bool,
    pub start_after_install: bool,
    pub enable_timer_after_install: bool,
}

impl UnitRequest {
    /// Validate and normalize. Nothing on disk is touched here, so every
    /// rejection happens before any file is written.
    pub fn from_raw(raw: RawRequest) -> Result<UnitRequest, MkunitError> {
        let name = normalize_name(&raw.name)?;

        let command = raw.command.trim().to_string();
        if command.is_empty() {
            return Err(MkunitError::validation("command must not be empty"));
        }
        check_single_line("command", &command)?;
        if command.ends_with('\\') {
            return Err(MkunitError::validation(
                "command must not end with a backslash (line continuation)",
            ));
        }

        let description = raw
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        check_single_line("description", &description)?;

        let schedule = match (raw.frequency, raw.calendar) {
            (Some(_), Some(_)) => {
                return Err(MkunitError::validation(
                    "frequency and calendar schedules are mutually exclusive",
                ))
            }
            (Some(freq), None) => {
                let freq = freq.trim().to_string();
                if !is_time_span(&freq) {
                    return Err(MkunitError::validation(format!(
                        "'{}' is not a systemd time span (e.g. 15min, 1h, 1d)",
                        freq
                    )));
                }
                Schedule::Frequency(freq)
            }
            (None, Some(cal)) => {
                let cal = cal.trim().to_string();
                if cal.is_empty() {
                    return Err(MkunitError::validation("calendar expression must not be empty"));
                }
                check_single_line("calendar", &cal)?;
                Schedule::Calendar(cal)
            }
            (None, None) => Schedule::None,
        };

        if raw.no_timer && schedule != Schedule::None {
            return Err(MkunitError::validation(
                "a schedule was given together with --no-timer",
            ));
        }

        let template_name = raw
            .template
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        if template_name.contains('/') || template_name.starts_with('.') {
            return Err(MkunitError::validation(format!(
                "invalid template name '{}'",
                template_name
            )));
        }

        let request = UnitRequest {
            name,
            command,
            description,
            scope: raw.scope.unwrap_or(Scope::User),
            schedule,
            template_name,
            suppress_timer: raw.no_timer,
            start_after_install: raw.start,
            enable_timer_after_install: raw.enable,
        };

        if request.enable_timer_after_install && !request.timer_decision().create_timer {
            return Err(MkunitError::validation(
                "--enable requires a timer, but no timer would be created",
            ));
        }

        Ok(request)
    }

    pub fn timer_decision(&self) -> TimerDecision {
        timer::derive(&self.schedule, &self.template_name, self.suppress_timer)
    }

    pub fn service_filename(&self) -> String {
        format!("{}.service", self.name)
    }

    pub fn timer_filename(&self) -> String {
        format!("{}.timer", self.name)
    }
}

/// "Backup Home" → "backup_home"
pub fn normalize_name(raw: &str) -> Result<String, MkunitError> {
    let name = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();

    if name.is_empty() {
        return Err(MkunitError::validation("name must not be empty"));
    }
    if name.starts_with('.') {
        return Err(MkunitError::validation(format!(
            "name '{}' must not start with a dot",
            name
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '@')))
    {
        return Err(MkunitError::validation(format!(
            "name '{}' contains '{}', which is not allowed in a unit name",
            name, bad
        )));
    }
    Ok(name)
}

fn check_single_line(field: &str, value: &str) -> Result<(), MkunitError> {
    if value.contains('\n') || value.contains('\r') {
        return Err(MkunitError::validation(format!(
            "{} must be a single line",
            field
        )));
    }
    Ok(())
}

/// Accepts `30`, `15min`, `1h30min`, `2h 30min`, `1.5h`.
pub fn is_time_span(s: &str) -> bool {
    if s.trim().is_empty() {
        return false;
    }
    s.split_whitespace().all(is_time_span_word)
}

fn is_time_span_word(word: &str) -> bool {
    let mut rest = word;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..num_len];
        if number.is_empty() || number.parse::<f64>().is_err() {
            return false;
        }
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        // A bare trailing number means seconds.
        if !unit.is_empty() && !TIME_SPAN_UNITS.contains(&unit) {
            return false;
        }
        rest = &rest[unit_len..];
    }
    true
}
