//! Application export: desktop entries that launch inside the container.

use std::fs;
use std::path::{Path, PathBuf};

use hostbox_common::error::{HostboxError, Result};
use walkdir::WalkDir;

use crate::atomic;
use crate::context::ExportContext;
use crate::entry::EntryFile;
use crate::icons;
use crate::reentry::ReentryCommand;

/// Directories searched for application desktop entries.
pub const APPLICATION_DIRS: [&str; 3] = [
    "/usr/share/applications",
    "/usr/local/share/applications",
    "/var/lib/flatpak/exports/share/applications",
];

const DESKTOP_HEADER: &str = "[Desktop Entry]";

/// Label appended to exported application names.
///
/// `None` yields ` (on <container>)`; the literal `none` disables the label.
#[must_use]
pub fn label_suffix(container: &str, custom: Option<&str>) -> String {
    match custom.map(str::trim) {
        None | Some("") => format!(" (on {container})"),
        Some("none") => String::new(),
        Some(label) => format!(" ({label})"),
    }
}

/// Rules applied to one desktop entry.
#[derive(Debug, Clone)]
pub struct DesktopRules<'a> {
    /// Re-entry command prefixed to every `Exec=` line.
    pub reentry: &'a ReentryCommand,
    /// Default `StartupWMClass` when the entry has none.
    pub wm_class: &'a str,
    /// Suffix appended to `Name=` values.
    pub label: &'a str,
    /// Replacement `Icon=` value, if the icon moved.
    pub icon: Option<String>,
}

/// Rewrites a desktop entry so it launches through the re-entry command.
///
/// Field codes such as `%U` stay outside the quoted segment so the desktop
/// environment still expands them. Lines no rule touches are preserved.
#[must_use]
pub fn rewrite_desktop(text: &str, rules: &DesktopRules<'_>) -> String {
    let mut file = EntryFile::parse(text);

    file.rewrite("Exec", |value| {
        (!rules.reentry.is_wrapped(value)).then(|| wrap_exec(rules.reentry, value))
    });
    file.remove(|line| match line.key() {
        Some("TryExec") => true,
        Some("DBusActivatable") => line
            .value()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
        _ => false,
    });
    if !rules.label.is_empty() {
        file.rewrite_in_section(DESKTOP_HEADER, "Name", |value| {
            (!value.ends_with(rules.label)).then(|| format!("{value}{}", rules.label))
        });
    }
    if let Some(icon) = &rules.icon {
        file.rewrite("Icon", |_| Some(icon.clone()));
    }
    if !file.has_key("StartupWMClass") {
        file.insert_after_header(DESKTOP_HEADER, format!("StartupWMClass={}", rules.wm_class));
    }

    file.render()
}

fn wrap_exec(reentry: &ReentryCommand, value: &str) -> String {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let split = tokens
        .iter()
        .position(|t| t.starts_with('%'))
        .unwrap_or(tokens.len());
    let (command, codes) = tokens.split_at(split);
    let mut line = reentry.wrap(&command.join(" "));
    if !codes.is_empty() {
        line.push(' ');
        line.push_str(&codes.join(" "));
    }
    line
}

/// Finds desktop entries for `token` inside the container.
///
/// An entry matches when an unwrapped `Exec=` line mentions the token or
/// its filename contains it, ignoring case.
///
/// # Errors
///
/// Returns [`HostboxError::NotFound`] when no entry matches.
pub fn find_descriptors(ctx: &ExportContext, token: &str) -> Result<Vec<PathBuf>> {
    let needle = token.to_lowercase();
    let mut found = Vec::new();
    for dir in APPLICATION_DIRS {
        let walker = WalkDir::new(ctx.container_path(Path::new(dir)))
            .sort_by(|a, b| a.path().cmp(b.path()))
            .into_iter()
            .filter_map(std::result::Result::ok);
        for entry in walker {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "desktop") {
                continue;
            }
            let name_match = entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .contains(&needle);
            let exec_match = fs::read_to_string(path).is_ok_and(|text| {
                EntryFile::parse(&text).lines().any(|line| {
                    line.base_key() == Some("Exec")
                        && line.value().is_some_and(|v| {
                            v.contains(token) && !ctx.reentry.mentions_enter(v)
                        })
                })
            });
            if name_match || exec_match {
                found.push(path.to_path_buf());
            }
        }
    }
    if found.is_empty() {
        return Err(HostboxError::NotFound {
            kind: "application",
            id: token.to_owned(),
        });
    }
    Ok(found)
}

fn exported_name(ctx: &ExportContext, source: &Path) -> String {
    let file_name = source
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    format!("{}-{file_name}", ctx.reentry.container())
}

/// Exports every desktop entry for `token` to the host.
///
/// # Errors
///
/// Returns an error if no entry matches or an artifact cannot be written.
pub fn export(ctx: &ExportContext, token: &str, label: &str) -> Result<Vec<PathBuf>> {
    let sources = find_descriptors(ctx, token)?;
    let dest_dir = ctx.applications_dir();
    let mut written = Vec::with_capacity(sources.len());

    for source in sources {
        let text = fs::read_to_string(&source).map_err(|e| HostboxError::io(&source, e))?;
        let icon = EntryFile::parse(&text)
            .first_value("Icon")
            .and_then(|value| icons::export(ctx, value));
        let rules = DesktopRules {
            reentry: &ctx.reentry,
            wm_class: token,
            label,
            icon,
        };
        let dest = dest_dir.join(exported_name(ctx, &source));
        atomic::write_atomic(&dest, &rewrite_desktop(&text, &rules), 0o644)?;
        tracing::info!(source = %ctx.container_abs(&source).display(), dest = %dest.display(), "application exported");
        written.push(dest);
    }
    Ok(written)
}

/// Removes the exported desktop entries for `token`.
///
/// Both the container-prefixed entry and a leftover entry carrying the
/// bare upstream name are removed, but only when they re-enter this
/// container.
///
/// # Errors
///
/// Returns [`HostboxError::NotFound`] when no source entry matches and
/// [`HostboxError::NotExported`] when nothing exported was found.
pub fn unexport(ctx: &ExportContext, token: &str) -> Result<Vec<PathBuf>> {
    let sources = find_descriptors(ctx, token)?;
    let dest_dir = ctx.applications_dir();
    let mut removed = Vec::new();
    let mut first_candidate = None;

    for source in sources {
        let prefixed = dest_dir.join(exported_name(ctx, &source));
        let bare = source.file_name().map(|n| dest_dir.join(n));
        for candidate in std::iter::once(prefixed).chain(bare) {
            if first_candidate.is_none() {
                first_candidate = Some(candidate.clone());
            }
            let owned = fs::read_to_string(&candidate).is_ok_and(|t| ctx.reentry.is_wrapped(&t));
            if owned {
                atomic::remove(&candidate)?;
                removed.push(candidate);
            }
        }
    }

    if removed.is_empty() {
        return Err(HostboxError::NotExported {
            path: first_candidate.unwrap_or(dest_dir),
        });
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use hostbox_common::types::ContainerName;

    use super::*;

    const MPV: &str = "[Desktop Entry]\n\
Type=Application\n\
Name=mpv Media Player\n\
Name[de]=mpv Medienabspieler\n\
TryExec=mpv\n\
Exec=mpv --player-operation-mode=pseudo-gui -- %U\n\
Icon=mpv\n\
DBusActivatable=true\n\
\n\
[Desktop Action new]\n\
Name=New Window\n\
Exec=mpv --new\n";

    fn reentry() -> ReentryCommand {
        ReentryCommand::new("hostbox-enter", ContainerName::new("devbox").unwrap())
    }

    fn rules<'a>(reentry: &'a ReentryCommand, label: &'a str) -> DesktopRules<'a> {
        DesktopRules {
            reentry,
            wm_class: "mpv",
            label,
            icon: None,
        }
    }

    #[test]
    fn exec_keeps_field_codes_outside_quote() {
        let r = reentry();
        let out = rewrite_desktop(MPV, &rules(&r, ""));
        assert!(out.contains(
            "Exec=hostbox-enter -n devbox -- 'mpv --player-operation-mode=pseudo-gui --' %U\n"
        ));
        assert!(out.contains("Exec=hostbox-enter -n devbox -- 'mpv --new'\n"));
    }

    #[test]
    fn extra_flags_sit_before_field_codes() {
        let r = reentry().extra_flags(Some("--fs".into()));
        let out = rewrite_desktop("Exec=mpv %f\n", &rules(&r, ""));
        assert_eq!(
            out,
            "StartupWMClass=mpv\nExec=hostbox-enter -n devbox -- 'mpv --fs' %f\n"
        );
    }

    #[test]
    fn probes_and_dbus_activation_are_dropped() {
        let r = reentry();
        let out = rewrite_desktop(MPV, &rules(&r, ""));
        assert!(!out.contains("TryExec"));
        assert!(!out.contains("DBusActivatable"));
        let kept = rewrite_desktop("DBusActivatable=false\n", &rules(&r, ""));
        assert!(kept.contains("DBusActivatable=false"));
    }

    #[test]
    fn names_are_labelled_and_wm_class_added_once() {
        let r = reentry();
        let label = label_suffix("devbox", None);
        let once = rewrite_desktop(MPV, &rules(&r, &label));
        assert!(once.contains("Name=mpv Media Player (on devbox)\n"));
        assert!(once.contains("Name[de]=mpv Medienabspieler (on devbox)\n"));
        assert!(once.starts_with("[Desktop Entry]\nStartupWMClass=mpv\n"));

        let twice = rewrite_desktop(&once, &rules(&r, &label));
        assert_eq!(once, twice);
    }

    #[test]
    fn action_names_stay_unlabelled() {
        let r = reentry();
        let label = label_suffix("devbox", None);
        let out = rewrite_desktop(MPV, &rules(&r, &label));
        assert!(out.contains("[Desktop Action new]\nName=New Window\nExec="));
        assert!(!out.contains("New Window (on devbox)"));
    }

    #[test]
    fn crlf_entry_keeps_its_line_endings() {
        let r = reentry();
        let out = rewrite_desktop("[Desktop Entry]\r\nName=mpv\r\nExec=mpv %U\r\n", &rules(&r, " (on devbox)"));
        assert_eq!(
            out,
            "[Desktop Entry]\r\nStartupWMClass=mpv\r\nName=mpv (on devbox)\r\nExec=hostbox-enter -n devbox -- 'mpv' %U\r\n"
        );
    }

    #[test]
    fn icon_is_replaced_when_moved() {
        let r = reentry();
        let rules = DesktopRules {
            icon: Some("/home/alice/.local/share/icons/mpv.png".into()),
            ..rules(&r, "")
        };
        let out = rewrite_desktop(MPV, &rules);
        assert!(out.contains("Icon=/home/alice/.local/share/icons/mpv.png\n"));
    }

    #[test]
    fn label_suffix_variants() {
        assert_eq!(label_suffix("devbox", None), " (on devbox)");
        assert_eq!(label_suffix("devbox", Some("none")), "");
        assert_eq!(label_suffix("devbox", Some("work")), " (work)");
    }
}
