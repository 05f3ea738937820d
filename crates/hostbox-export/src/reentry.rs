//! The re-entry command shared by every exported artifact.
//!
//! A re-entry command has the shape
//! `<enter> [--root] -n <container> -- '[sudo ]<target>[ <extra flags>]'`.
//! [`ReentryCommand::prefix`] stops right after the opening quote so each
//! artifact writer can decide what follows the closing quote.

use hostbox_common::types::ContainerName;

/// Builds and recognizes re-entry commands for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReentryCommand {
    enter_program: String,
    container: ContainerName,
    rootful: bool,
    sudo: bool,
    extra_flags: Option<String>,
}

impl ReentryCommand {
    /// Creates a re-entry command for `container`.
    pub fn new(enter_program: impl Into<String>, container: ContainerName) -> Self {
        Self {
            enter_program: enter_program.into(),
            container,
            rootful: false,
            sudo: false,
            extra_flags: None,
        }
    }

    /// Enters through a rootful manager.
    #[must_use]
    pub const fn rootful(mut self, rootful: bool) -> Self {
        self.rootful = rootful;
        self
    }

    /// Runs the target through `sudo` inside the container.
    #[must_use]
    pub const fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Appends flags to the target command.
    #[must_use]
    pub fn extra_flags(mut self, flags: Option<String>) -> Self {
        self.extra_flags = flags.filter(|f| !f.trim().is_empty());
        self
    }

    /// The container this command enters.
    #[must_use]
    pub const fn container(&self) -> &ContainerName {
        &self.container
    }

    /// Program that enters the container.
    #[must_use]
    pub fn enter_program(&self) -> &str {
        &self.enter_program
    }

    /// Shared prefix ending in the still-open quote.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!(
            "{}{} -n {} -- '{}",
            self.enter_program,
            if self.rootful { " --root" } else { "" },
            self.container,
            if self.sudo { "sudo " } else { "" },
        )
    }

    /// Extra flags rendered with their leading separator.
    #[must_use]
    pub fn extra_suffix(&self) -> String {
        self.extra_flags
            .as_deref()
            .map_or_else(String::new, |f| format!(" {}", f.trim()))
    }

    /// Wraps a target command: prefix, target, extra flags, closing quote.
    #[must_use]
    pub fn wrap(&self, target: &str) -> String {
        format!(
            "{}{}{}'",
            self.prefix(),
            escape_single_quotes(target.trim()),
            self.extra_suffix()
        )
    }

    /// Whether `text` already re-enters this container.
    #[must_use]
    pub fn is_wrapped(&self, text: &str) -> bool {
        text.contains(&self.enter_program) && text.contains(&format!("-n {} -- '", self.container))
    }

    /// Whether `text` re-enters any container.
    #[must_use]
    pub fn mentions_enter(&self, text: &str) -> bool {
        text.contains(&self.enter_program)
    }
}

/// Escapes `'` for use inside a single-quoted shell word.
fn escape_single_quotes(s: &str) -> String {
    s.replace('\'', r"'\''")
}
