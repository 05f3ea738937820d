//! Line-oriented editing of `key=value` files.
//!
//! Desktop entries and systemd units are parsed into an ordered list of
//! lines. Untouched lines are re-serialized byte for byte, CRLF endings
//! included; only lines a rule explicitly rewrites change.

/// One line of an entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLine {
    raw: String,
    crlf: bool,
}

impl EntryLine {
    fn from_raw(line: &str) -> Self {
        match line.strip_suffix('\r') {
            Some(body) => Self {
                raw: body.to_owned(),
                crlf: true,
            },
            None => Self {
                raw: line.to_owned(),
                crlf: false,
            },
        }
    }

    /// Section header name, e.g. `[Desktop Entry]`, if this line is one.
    #[must_use]
    pub fn header(&self) -> Option<&str> {
        let trimmed = self.raw.trim();
        (trimmed.starts_with('[') && trimmed.ends_with(']')).then_some(trimmed)
    }

    /// Key of a `key=value` line; `None` for comments, headers and blanks.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        let trimmed = self.raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(['#', ';', '[']) {
            return None;
        }
        let (key, _) = trimmed.split_once('=')?;
        let key = key.trim_end();
        (!key.is_empty()).then_some(key)
    }

    /// Key with any locale suffix removed, e.g. `Name[de]` becomes `Name`.
    #[must_use]
    pub fn base_key(&self) -> Option<&str> {
        self.key().map(|k| k.split_once('[').map_or(k, |(base, _)| base))
    }

    /// Value of a `key=value` line.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.key()?;
        self.raw.split_once('=').map(|(_, v)| v.trim_start())
    }

    /// The line as read, without its line ending.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// An ordered, editable `key=value` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFile {
    lines: Vec<EntryLine>,
    trailing_newline: bool,
}

impl EntryFile {
    /// Parses text into lines, preserving everything.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(EntryLine::from_raw).collect()
        };
        Self {
            lines,
            trailing_newline: text.ends_with('\n'),
        }
    }

    /// Iterates the lines in order.
    pub fn lines(&self) -> impl Iterator<Item = &EntryLine> {
        self.lines.iter()
    }

    /// Returns whether any line has the given base key.
    #[must_use]
    pub fn has_key(&self, base_key: &str) -> bool {
        self.lines.iter().any(|l| l.base_key() == Some(base_key))
    }

    /// Returns the value of the first line with the given key.
    #[must_use]
    pub fn first_value(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.key() == Some(key))
            .and_then(EntryLine::value)
    }

    /// Rewrites the value of every line whose base key is `base_key`.
    ///
    /// The closure returns `None` to leave a line untouched.
    pub fn rewrite(&mut self, base_key: &str, f: impl FnMut(&str) -> Option<String>) {
        self.rewrite_where(None, base_key, f);
    }

    /// Like [`EntryFile::rewrite`], limited to lines under the `section` header.
    pub fn rewrite_in_section(
        &mut self,
        section: &str,
        base_key: &str,
        f: impl FnMut(&str) -> Option<String>,
    ) {
        self.rewrite_where(Some(section), base_key, f);
    }

    fn rewrite_where(
        &mut self,
        section: Option<&str>,
        base_key: &str,
        mut f: impl FnMut(&str) -> Option<String>,
    ) {
        let mut current: Option<String> = None;
        for line in &mut self.lines {
            if let Some(header) = line.header() {
                current = Some(header.to_owned());
                continue;
            }
            if line.base_key() != Some(base_key)
                || section.is_some_and(|s| current.as_deref() != Some(s))
            {
                continue;
            }
            let (Some(key), Some(value)) = (line.key(), line.value()) else {
                continue;
            };
            if let Some(new_value) = f(value) {
                line.raw = format!("{key}={new_value}");
            }
        }
    }

    /// Drops every line for which the predicate holds.
    pub fn remove(&mut self, mut pred: impl FnMut(&EntryLine) -> bool) {
        self.lines.retain(|l| !pred(l));
    }

    /// Inserts a line right after the given section header, or first if the
    /// header is absent.
    pub fn insert_after_header(&mut self, header: &str, raw: String) {
        let found = self.lines.iter().position(|l| l.header() == Some(header));
        let crlf = found.is_some_and(|i| self.lines[i].crlf);
        self.lines
            .insert(found.map_or(0, |i| i + 1), EntryLine { raw, crlf });
    }

    /// Serializes the lines back to text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(|l| if l.crlf { format!("{}\r", l.raw) } else { l.raw.clone() })
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }
}
