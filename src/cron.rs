//! Translation of cron expressions into systemd `OnCalendar=` expressions,
//! for `--cron`.

use anyhow::{bail, Context, Result};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Clone, Copy)]
enum Field {
    Minute,
    Hour,
    Day,
    Month,
}

impl Field {
    fn bounds(self) -> (u32, u32) {
        match self {
            Field::Minute => (0, 59),
            Field::Hour => (0, 23),
            Field::Day => (1, 31),
            Field::Month => (1, 12),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Field::Minute => "minute",
            Field::Hour => "hour",
            Field::Day => "day of month",
            Field::Month => "month",
        }
    }
}

/// `"0 9 * * 1-5"` → `"Mon..Fri *-*-* 09:00:00"`, `"@daily"` → `"*-*-* 00:00:00"`.
pub fn to_calendar(expr: &str) -> Result<String> {
    let expr = expr.trim();

    if let Some(shorthand) = expr.strip_prefix('@') {
        return match shorthand {
            "yearly" | "annually" => Ok("*-01-01 00:00:00".to_string()),
            "monthly" => Ok("*-*-01 00:00:00".to_string()),
            "weekly" => Ok("Mon *-*-* 00:00:00".to_string()),
            "daily" | "midnight" => Ok("*-*-* 00:00:00".to_string()),
            "hourly" => Ok("*-*-* *:00:00".to_string()),
            "reboot" => bail!("@reboot has no calendar equivalent; use a boot template instead"),
            other => bail!("Unknown cron shorthand: @{}", other),
        };
    }

    let fields: Vec<&str> = expr.split_whitespace().collect();
    let &[minute, hour, day, month, dow] = fields.as_slice() else {
        bail!(
            "Invalid cron expression '{}': expected 5 fields, got {}",
            expr,
            fields.len()
        );
    };

    let minute = translate(minute, Field::Minute)?;
    let hour = translate(hour, Field::Hour)?;
    let day = translate(day, Field::Day)?;
    let month = translate(month, Field::Month)?;

    let date_time = format!("*-{}-{} {}:{}:00", month, day, hour, minute);
    match translate_weekdays(dow)? {
        Some(days) => Ok(format!("{} {}", days, date_time)),
        None => Ok(date_time),
    }
}

fn translate(field: &str, kind: Field) -> Result<String> {
    if field == "*" {
        return Ok("*".to_string());
    }
    let parts = field
        .split(',')
        .map(|part| translate_part(part, kind))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(","))
}

fn translate_part(part: &str, kind: Field) -> Result<String> {
    let (range, step) = match part.split_once('/') {
        Some((range, step)) => (range, Some(number(step, kind)?)),
        None => (part, None),
    };

    match (range, step) {
        ("*", Some(step)) => Ok(format!("{}/{}", kind.bounds().0, step)),
        (range, step) => match range.split_once('-') {
            Some((lo, hi)) => {
                let (lo, hi) = (value(lo, kind)?, value(hi, kind)?);
                if lo > hi {
                    bail!("Invalid {} range '{}': start is after end", kind.label(), range);
                }
                match step {
                    // systemd has no stepped range, so list the values.
                    Some(step) => Ok((lo..=hi)
                        .step_by(step as usize)
                        .map(|v| format!("{:02}", v))
                        .collect::<Vec<_>>()
                        .join(",")),
                    None => Ok(format!("{}..{}", lo, hi)),
                }
            }
            None if step.is_some() => {
                bail!("Unsupported {} step '{}': use */N or N-M/S", kind.label(), part)
            }
            None => Ok(format!("{:02}", value(range, kind)?)),
        },
    }
}

fn number(s: &str, kind: Field) -> Result<u32> {
    let n: u32 = s
        .parse()
        .with_context(|| format!("Invalid {} value '{}'", kind.label(), s))?;
    if n == 0 {
        bail!("{} step must be positive", kind.label());
    }
    Ok(n)
}

fn value(s: &str, kind: Field) -> Result<u32> {
    let n: u32 = s
        .parse()
        .with_context(|| format!("Invalid {} value '{}'", kind.label(), s))?;
    let (lo, hi) = kind.bounds();
    if n < lo || n > hi {
        bail!("{} value {} out of range {}-{}", kind.label(), n, lo, hi);
    }
    Ok(n)
}

fn translate_weekdays(field: &str) -> Result<Option<String>> {
    if field == "*" {
        return Ok(None);
    }
    let parts = field
        .split(',')
        .map(|part| match part.split_once('-') {
            Some((from, to)) => Ok(format!("{}..{}", weekday(from)?, weekday(to)?)),
            None => weekday(part).map(str::to_string),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(parts.join(",")))
}

fn weekday(s: &str) -> Result<&'static str> {
    if let Ok(n) = s.parse::<usize>() {
        // cron accepts both 0 and 7 for Sunday
        return match n {
            0..=6 => Ok(WEEKDAYS[n]),
            7 => Ok(WEEKDAYS[0]),
            _ => bail!("Invalid day of week number: {}", n),
        };
    }
    let lower = s.to_lowercase();
    WEEKDAYS
        .iter()
        .find(|name| !lower.is_empty() && name.to_lowercase().starts_with(&lower))
        .copied()
        .with_context(|| format!("Invalid day of week: {}", s))
}
