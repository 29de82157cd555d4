//! Decides whether a timer unit is created and how it is activated.

use crate::request::Schedule;

/// Boot delay and recurring interval injected into synthesized boot timers.
pub const BOOT_DELAY: &str = "5min";
pub const BOOT_INTERVAL: &str = "1d";
/// First activation after boot for frequency timers, so `OnUnitActiveSec`
/// has something to count from.
pub const FREQUENCY_BOOT_DELAY: &str = "1min";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    None,
    Frequency(String),
    Calendar(String),
    /// Whatever the timer template itself says.
    TemplateDefault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerDecision {
    pub create_timer: bool,
    pub activation: Activation,
}

impl TimerDecision {
    fn none() -> Self {
        TimerDecision {
            create_timer: false,
            activation: Activation::None,
        }
    }
}

/// First match wins: explicit schedule, then boot template, then no timer.
/// `suppressed` (`--no-timer`) short-circuits to no timer.
pub fn derive(schedule: &Schedule, template_name: &str, suppressed: bool) -> TimerDecision {
    if suppressed {
        return TimerDecision::none();
    }
    match schedule {
        Schedule::Frequency(v) => TimerDecision {
            create_timer: true,
            activation: Activation::Frequency(v.clone()),
        },
        Schedule::Calendar(v) => TimerDecision {
            create_timer: true,
            activation: Activation::Calendar(v.clone()),
        },
        Schedule::None if template_name.contains("boot") => TimerDecision {
            create_timer: true,
            activation: Activation::TemplateDefault,
        },
        Schedule::None => TimerDecision::none(),
    }
}

impl Activation {
    /// Full `[Timer]` directive lines for this activation, without trailing newline.
    /// `TemplateDefault` yields the fixed boot schedule used by synthesized timers.
    pub fn directives(&self) -> String {
        match self {
            Activation::None => String::new(),
            Activation::Frequency(v) => {
                format!("OnBootSec={}\nOnUnitActiveSec={}", FREQUENCY_BOOT_DELAY, v)
            }
            Activation::Calendar(v) => format!("OnCalendar={}\nPersistent=true", v),
            Activation::TemplateDefault => {
                format!("OnBootSec={}\nOnUnitActiveSec={}", BOOT_DELAY, BOOT_INTERVAL)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_creates_timer() {
        let d = derive(&Schedule::Frequency("1d".into()), "default", false);
        assert!(d.create_timer);
        assert_eq!(d.activation, Activation::Frequency("1d".into()));
    }

    #[test]
    fn calendar_creates_timer() {
        let d = derive(&Schedule::Calendar("daily".into()), "default", false);
        assert!(d.create_timer);
        assert_eq!(d.activation, Activation::Calendar("daily".into()));
    }

    #[test]
    fn explicit_schedule_wins_over_boot_template() {
        let d = derive(&Schedule::Frequency("2h".into()), "boot", false);
        assert_eq!(d.activation, Activation::Frequency("2h".into()));
    }

    #[test]
    fn boot_template_defaults_to_timer() {
        for name in ["boot", "on-boot", "reboot-check"] {
            let d = derive(&Schedule::None, name, false);
            assert!(d.create_timer, "{name}");
            assert_eq!(d.activation, Activation::TemplateDefault);
        }
    }

    #[test]
    fn plain_template_without_schedule_has_no_timer() {
        let d = derive(&Schedule::None, "default", false);
        assert!(!d.create_timer);
        assert_eq!(d.activation, Activation::None);
    }

    #[test]
    fn suppression_overrides_boot_template() {
        assert!(!derive(&Schedule::None, "boot", true).create_timer);
    }

    #[test]
    fn directive_lines() {
        assert_eq!(
            Activation::Frequency("1d".into()).directives(),
            "OnBootSec=1min\nOnUnitActiveSec=1d"
        );
        assert_eq!(
            Activation::Calendar("Mon *-*-* 09:00:00".into()).directives(),
            "OnCalendar=Mon *-*-* 09:00:00\nPersistent=true"
        );
        assert_eq!(
            Activation::TemplateDefault.directives(),
            "OnBootSec=5min\nOnUnitActiveSec=1d"
        );
    }
}
