//! Template lookup: on-disk template directories first, then the bundled set.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MkunitError;

const DEFAULT_SERVICE: &str = "\
[Unit]
Description=[[DESCRIPTION]]

[Service]
Type=oneshot
ExecStart=[[COMMAND]]
";

const DEFAULT_TIMER: &str = "\
[Unit]
Description=Timer for [[UNIT_NAME]]

[Timer]
[[TIMER_SPEC]]
Unit=[[UNIT_NAME]].service

[Install]
WantedBy=timers.target
";

const SIMPLE_SERVICE: &str = "\
[Unit]
Description=[[DESCRIPTION]]
After=network-online.target

[Service]
Type=simple
ExecStart=[[COMMAND]]
Restart=on-failure
RestartSec=5

[Install]
WantedBy=default.target
";

const BOOT_TIMER: &str = "\
[Unit]
Description=Run [[UNIT_NAME]] after boot

[Timer]
OnBootSec=5min
OnUnitActiveSec=1d
Unit=[[UNIT_NAME]].service

[Install]
WantedBy=timers.target
";

const CALENDAR_TIMER: &str = "\
[Unit]
Description=Timer for [[UNIT_NAME]]

[Timer]
OnActiveSec=[[FREQUENCY]]
OnUnitActiveSec=[[FREQUENCY]]
OnCalendar=[[CALENDAR]]
Persistent=true

[Install]
WantedBy=timers.target
";

struct Bundled {
    name: &'static str,
    service: &'static str,
    timer: Option<&'static str>,
    summary: &'static str,
}

const BUNDLED: &[Bundled] = &[
    Bundled {
        name: "default",
        service: DEFAULT_SERVICE,
        timer: Some(DEFAULT_TIMER),
        summary: "oneshot service, timer when a schedule is given",
    },
    Bundled {
        name: "simple",
        service: SIMPLE_SERVICE,
        timer: None,
        summary: "long-running service restarted on failure",
    },
    Bundled {
        name: "boot",
        service: DEFAULT_SERVICE,
        timer: Some(BOOT_TIMER),
        summary: "oneshot service run 5min after boot, then daily",
    },
    Bundled {
        name: "calendar",
        service: DEFAULT_SERVICE,
        timer: Some(CALENDAR_TIMER),
        summary: "oneshot service, timer with separate FREQUENCY/CALENDAR lines",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Bundled,
    Dir(PathBuf),
}

#[derive(Debug, Clone)]
pub struct TemplatePair {
    pub name: String,
    pub service: String,
    pub timer: Option<String>,
    pub source: TemplateSource,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub has_timer: bool,
    pub source: String,
    pub summary: Option<String>,
}

pub struct TemplateStore {
    dirs: Vec<PathBuf>,
}

impl TemplateStore {
    /// `dirs` are searched in order before the bundled templates.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        TemplateStore { dirs }
    }

    pub fn resolve(&self, name: &str) -> Result<TemplatePair, MkunitError> {
        for dir in &self.dirs {
            if let Some(pair) = load_from_dir(dir, name)? {
                tracing::debug!(template = name, dir = %dir.display(), "using on-disk template");
                return Ok(pair);
            }
        }

        if let Some(b) = BUNDLED.iter().find(|b| b.name == name) {
            tracing::debug!(template = name, "using bundled template");
            return Ok(TemplatePair {
                name: name.to_string(),
                service: b.service.to_string(),
                timer: b.timer.map(str::to_string),
                source: TemplateSource::Bundled,
            });
        }

        let mut searched: Vec<String> =
            self.dirs.iter().map(|d| d.display().to_string()).collect();
        searched.push("bundled".to_string());
        Err(MkunitError::TemplateNotFound {
            name: name.to_string(),
            searched: searched.join(", "),
        })
    }

    /// Every resolvable template name, on-disk entries shadowing bundled ones.
    pub fn list(&self) -> Vec<TemplateInfo> {
        let mut infos: Vec<TemplateInfo> = Vec::new();

        for dir in &self.dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .filter_map(|e| {
                    let filename = e.file_name().to_string_lossy().to_string();
                    filename.strip_suffix(".service").map(str::to_string)
                })
                .collect();
            names.sort();
            for name in names {
                if infos.iter().any(|i| i.name == name) {
                    continue;
                }
                infos.push(TemplateInfo {
                    has_timer: dir.join(format!("{}.timer", name)).exists(),
                    name,
                    source: dir.display().to_string(),
                    summary: None,
                });
            }
        }

        for b in BUNDLED {
            if infos.iter().any(|i| i.name == b.name) {
                continue;
            }
            infos.push(TemplateInfo {
                name: b.name.to_string(),
                has_timer: b.timer.is_some(),
                source: "bundled".to_string(),
                summary: Some(b.summary.to_string()),
            });
        }

        infos
    }
}

fn load_from_dir(dir: &Path, name: &str) -> Result<Option<TemplatePair>, MkunitError> {
    let service_path = dir.join(format!("{}.service", name));
    if !service_path.is_file() {
        return Ok(None);
    }
    let service = read_template(&service_path)?;

    let timer_path = dir.join(format!("{}.timer", name));
    let timer = if timer_path.is_file() {
        Some(read_template(&timer_path)?)
    } else {
        None
    };

    Ok(Some(TemplatePair {
        name: name.to_string(),
        service,
        timer,
        source: TemplateSource::Dir(dir.to_path_buf()),
    }))
}

fn read_template(path: &Path) -> Result<String, MkunitError> {
    fs::read_to_string(path).map_err(|e| {
        MkunitError::render(
            path.display().to_string(),
            format!("failed to read template: {}", e),
        )
    })
}
