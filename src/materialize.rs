//! Turns a validated request into final unit file contents.

use std::path::{Path, PathBuf};

use crate::error::MkunitError;
use crate::placeholder::{
    self, Bindings, CALENDAR, COMMAND, DESCRIPTION, FREQUENCY, TIMER_SPEC, UNIT_NAME,
};
use crate::request::UnitRequest;
use crate::templates::TemplateStore;
use crate::timer::Activation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedUnit {
    pub filename: String,
    /// Install destination.
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct Materialized {
    pub service: MaterializedUnit,
    pub timer: Option<MaterializedUnit>,
}

impl Materialized {
    pub fn units(&self) -> impl Iterator<Item = &MaterializedUnit> {
        std::iter::once(&self.service).chain(self.timer.as_ref())
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut MaterializedUnit> {
        std::iter::once(&mut self.service).chain(self.timer.as_mut())
    }
}

pub fn materialize(
    request: &UnitRequest,
    store: &TemplateStore,
    install_dir: &Path,
) -> Result<Materialized, MkunitError> {
    let pair = store.resolve(&request.template_name)?;

    let mut bindings = Bindings::new();
    bindings.insert(DESCRIPTION, request.description.clone());
    bindings.insert(COMMAND, request.command.clone());
    bindings.insert(UNIT_NAME, request.name.clone());

    let service_filename = request.service_filename();
    let service = render(&service_filename, &pair.service, &bindings)?;

    let decision = request.timer_decision();
    tracing::debug!(?decision, template = %pair.name, source = ?pair.source, "timer decision");

    let timer = if decision.create_timer {
        let timer_filename = request.timer_filename();
        let content = match &pair.timer {
            Some(template) => {
                render_timer(&timer_filename, template, bindings, &decision.activation)?
            }
            None => {
                tracing::info!(
                    template = %pair.name,
                    "template has no timer half, synthesizing one"
                );
                synthesize_timer(request, &decision.activation)
            }
        };
        Some(MaterializedUnit {
            path: install_dir.join(&timer_filename),
            filename: timer_filename,
            content,
        })
    } else {
        None
    };

    Ok(Materialized {
        service: MaterializedUnit {
            path: install_dir.join(&service_filename),
            filename: service_filename,
            content: service,
        },
        timer,
    })
}

fn render_timer(
    unit: &str,
    template: &str,
    mut bindings: Bindings,
    activation: &Activation,
) -> Result<String, MkunitError> {
    let (own, other, value) = match activation {
        Activation::None | Activation::TemplateDefault => {
            return render(unit, template, &bindings);
        }
        Activation::Frequency(v) => (FREQUENCY, CALENDAR, v),
        Activation::Calendar(v) => (CALENDAR, FREQUENCY, v),
    };

    if placeholder::contains(template, TIMER_SPEC) {
        bindings.insert(TIMER_SPEC, activation.directives());
        return render(unit, template, &bindings);
    }

    if !placeholder::contains(template, own) {
        return Err(MkunitError::render(
            unit,
            format!(
                "timer template has neither {} nor {} to receive the schedule",
                placeholder::token(TIMER_SPEC),
                placeholder::token(own)
            ),
        ));
    }

    let template = drop_lines_with(template, other);
    bindings.insert(own, value.clone());
    render(unit, &template, &bindings)
}

/// Substitute and verify: every recognized placeholder in `template` must be
/// bound, and the result must not be empty.
fn render(unit: &str, template: &str, bindings: &Bindings) -> Result<String, MkunitError> {
    let mut unresolved: Vec<String> = Vec::new();
    for name in placeholder::remaining(template) {
        if bindings.contains_key(name.as_str()) {
            continue;
        }
        if placeholder::RECOGNIZED.contains(&name.as_str()) {
            unresolved.push(placeholder::token(&name));
        } else {
            tracing::warn!(
                unit,
                token = %placeholder::token(&name),
                "unknown placeholder left in output"
            );
        }
    }
    if !unresolved.is_empty() {
        return Err(MkunitError::render(
            unit,
            format!("unresolved placeholder(s): {}", unresolved.join(", ")),
        ));
    }

    let text = placeholder::substitute(template, bindings);
    if text.trim().is_empty() {
        return Err(MkunitError::render(unit, "result is empty"));
    }
    Ok(text)
}

fn drop_lines_with(text: &str, name: &str) -> String {
    let tok = placeholder::token(name);
    text.split_inclusive('\n')
        .filter(|line| !line.contains(&tok))
        .collect()
}

/// Timer body for templates that ship only a service half.
fn synthesize_timer(request: &UnitRequest, activation: &Activation) -> String {
    let service = request.service_filename();
    let mut activation_lines = activation.directives();
    if !activation_lines.is_empty() {
        activation_lines.push('\n');
    }
    format!(
        "[Unit]\n\
         Description=Timer for {name}\n\
         Requires={service}\n\
         \n\
         [Timer]\n\
         Unit={service}\n\
         {activation_lines}\
         # Available activation directives (see systemd.timer(5)):\n\
         #   OnActiveSec=, OnBootSec=, OnStartupSec=\n\
         #   OnUnitActiveSec=, OnUnitInactiveSec=\n\
         #   OnCalendar=, Persistent=, RandomizedDelaySec=, AccuracySec=\n\
         \n\
         [Install]\n\
         WantedBy=timers.target\n",
        name = request.name,
        service = service,
        activation_lines = activation_lines,
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use proptest::prelude::*;

    use super::*;
    use crate::request::RawRequest;

    fn request(name: &str, command: &str) -> RawRequest {
        RawRequest {
            name: name.to_string(),
            command: command.to_string(),
            ..RawRequest::default()
        }
    }

    fn build(raw: RawRequest) -> Result<Materialized, MkunitError> {
        let req = UnitRequest::from_raw(raw).unwrap();
        materialize(&req, &TemplateStore::new(Vec::new()), Path::new("/units"))
    }

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let store = TemplateStore::new(vec![dir.path().to_path_buf()]);
        (dir, store)
    }

    #[test]
    fn backup_home_daily() {
        let mut raw = request("Backup Home", "tar -czf /tmp/b.tar.gz /home/user");
        raw.frequency = Some("1d".to_string());
        let m = build(raw).unwrap();

        assert_eq!(m.service.filename, "backup_home.service");
        assert_eq!(m.service.path, PathBuf::from("/units/backup_home.service"));
        assert!(m.service.content.contains("ExecStart=tar -czf /tmp/b.tar.gz /home/user\n"));
        assert!(m.service.content.contains("Description=Unit generated by mkunit\n"));

        let timer = m.timer.unwrap();
        assert_eq!(timer.filename, "backup_home.timer");
        assert!(timer.content.contains("OnUnitActiveSec=1d\n"));
        assert!(timer.content.contains("Unit=backup_home.service\n"));
        assert!(placeholder::remaining(&timer.content).is_empty());
    }

    #[test]
    fn no_schedule_no_timer() {
        let m = build(request("job", "true")).unwrap();
        assert!(m.timer.is_none());
        assert!(placeholder::remaining(&m.service.content).is_empty());
    }

    #[test]
    fn calendar_into_timer_spec() {
        let mut raw = request("job", "true");
        raw.calendar = Some("Mon *-*-* 09:00:00".to_string());
        let timer = build(raw).unwrap().timer.unwrap();
        assert!(timer.content.contains("OnCalendar=Mon *-*-* 09:00:00\nPersistent=true\n"));
        assert!(!timer.content.contains("OnUnitActiveSec"));
    }

    #[test]
    fn ampersands_survive_verbatim() {
        let command = r"sh -c 'make && ./run & wait' \& echo '\1'";
        let m = build(request("amp", command)).unwrap();
        let line = m
            .service
            .content
            .lines()
            .find(|l| l.starts_with("ExecStart="))
            .unwrap();
        assert_eq!(&line["ExecStart=".len()..], command);
    }

    proptest! {
        #[test]
        fn any_single_line_command_reaches_exec_start(command in "[^\r\n]{1,80}") {
            let expected = command.trim().to_string();
            prop_assume!(!expected.is_empty() && !expected.ends_with('\\'));

            let m = build(request("job", &command)).unwrap();
            let line = m
                .service
                .content
                .lines()
                .find(|l| l.starts_with("ExecStart="))
                .unwrap();
            prop_assert_eq!(&line["ExecStart=".len()..], expected.as_str());
        }
    }

    #[test]
    fn boot_template_keeps_its_own_activation() {
        let mut raw = request("warmup", "true");
        raw.template = Some("boot".to_string());
        let timer = build(raw).unwrap().timer.unwrap();
        assert!(timer.content.contains("OnBootSec=5min\nOnUnitActiveSec=1d\n"));
        assert!(timer.content.contains("Unit=warmup.service"));
    }

    #[test]
    fn explicit_schedule_into_static_timer_is_render_error() {
        let mut raw = request("warmup", "true");
        raw.template = Some("boot".to_string());
        raw.frequency = Some("1h".to_string());
        assert!(matches!(build(raw), Err(MkunitError::Render { .. })));
    }

    #[test]
    fn split_tokens_keep_matching_line_only() {
        let mut raw = request("job", "true");
        raw.template = Some("calendar".to_string());
        raw.frequency = Some("6h".to_string());
        let timer = build(raw).unwrap().timer.unwrap();
        // OnActiveSec= gives the first trigger; OnUnitActiveSec= alone would never fire.
        assert!(timer.content.contains("OnActiveSec=6h\nOnUnitActiveSec=6h\n"));
        assert!(!timer.content.contains("OnCalendar"));

        let mut raw = request("job", "true");
        raw.template = Some("calendar".to_string());
        raw.calendar = Some("weekly".to_string());
        let timer = build(raw).unwrap().timer.unwrap();
        assert!(timer.content.contains("OnCalendar=weekly\n"));
        assert!(!timer.content.contains("OnActiveSec"));
        assert!(!timer.content.contains("OnUnitActiveSec"));
    }

    #[test]
    fn synthesized_timer_for_service_only_template() {
        let mut raw = request("web", "node index.js");
        raw.template = Some("simple".to_string());
        raw.calendar = Some("daily".to_string());
        let timer = build(raw).unwrap().timer.unwrap();
        assert!(timer.content.contains("Requires=web.service\n"));
        assert!(timer.content.contains("Unit=web.service\n"));
        assert!(timer.content.contains("OnCalendar=daily\n"));
        assert!(timer.content.contains("# Available activation directives"));
        assert!(timer.content.ends_with("WantedBy=timers.target\n"));
    }

    #[test]
    fn synthesized_boot_timer_gets_fixed_schedule() {
        let (_dir, store) = store_with(&[("myboot.service", "[Service]\nExecStart=[[COMMAND]]\n")]);
        let mut raw = request("job", "true");
        raw.template = Some("myboot".to_string());
        let req = UnitRequest::from_raw(raw).unwrap();
        let m = materialize(&req, &store, Path::new("/units")).unwrap();
        let timer = m.timer.unwrap();
        assert!(timer.content.contains("OnBootSec=5min\nOnUnitActiveSec=1d\n"));
    }

    #[test]
    fn unresolved_recognized_token_is_render_error() {
        let (_dir, store) = store_with(&[
            ("myboot.service", "[Service]\nExecStart=[[COMMAND]]\n"),
            ("myboot.timer", "[Timer]\n[[TIMER_SPEC]]\n"),
        ]);
        let mut raw = request("job", "true");
        raw.template = Some("myboot".to_string());
        let req = UnitRequest::from_raw(raw).unwrap();
        let err = materialize(&req, &store, Path::new("/units")).unwrap_err();
        assert!(err.to_string().contains("[[TIMER_SPEC]]"));
    }

    #[test]
    fn unknown_tokens_pass_through() {
        let (_dir, store) = store_with(&[(
            "custom.service",
            "[Service]\nExecStart=[[COMMAND]]\nUser=[[RUN_AS]]\n",
        )]);
        let mut raw = request("job", "true");
        raw.template = Some("custom".to_string());
        let req = UnitRequest::from_raw(raw).unwrap();
        let m = materialize(&req, &store, Path::new("/units")).unwrap();
        assert!(m.service.content.contains("User=[[RUN_AS]]\n"));
    }

    #[test]
    fn command_that_looks_like_a_token_is_fine() {
        let m = build(request("job", "echo [[UNIT_NAME]]")).unwrap();
        assert!(m.service.content.contains("ExecStart=echo [[UNIT_NAME]]\n"));
    }

    #[test]
    fn empty_template_is_render_error() {
        let (_dir, store) = store_with(&[("blank.service", "")]);
        let mut raw = request("job", "true");
        raw.template = Some("blank".to_string());
        let req = UnitRequest::from_raw(raw).unwrap();
        assert!(matches!(
            materialize(&req, &store, Path::new("/units")),
            Err(MkunitError::Render { .. })
        ));
    }

    #[test]
    fn missing_template() {
        let mut raw = request("job", "true");
        raw.template = Some("ghost".to_string());
        assert!(matches!(build(raw), Err(MkunitError::TemplateNotFound { .. })));
    }

    #[test]
    fn units_iterates_service_then_timer() {
        let mut raw = request("job", "true");
        raw.frequency = Some("1h".to_string());
        let m = build(raw).unwrap();
        let names: Vec<&str> = m.units().map(|u| u.filename.as_str()).collect();
        assert_eq!(names, vec!["job.service", "job.timer"]);
    }
}
