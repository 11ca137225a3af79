use std::collections::BTreeMap;

use super::text::TextContent;
use super::Content;

/// A typed git-config value.
///
/// <https://git-scm.com/docs/git-config#_values>
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GitValue {
    /// Rendered as lowercase `true`/`false`.
    Bool(bool),
    /// Rendered as a bare integer.
    Int(i64),
    /// Rendered double-quoted with `"`, `\`, newline, tab and backspace
    /// escaped.
    Str(String),
}

impl From<bool> for GitValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for GitValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for GitValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for GitValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

type Section = (String, Option<String>);

/// A `.gitconfig`-syntax file.
///
/// <https://git-scm.com/docs/git-config#_configuration_file>
#[derive(Debug, Clone, Default)]
pub struct GitConfigContent {
    sections: BTreeMap<Section, BTreeMap<String, GitValue>>,
}

impl GitConfigContent {
    /// Empty git config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable in `[section]`.
    ///
    /// Section names are lowercased; only ASCII alphanumerics and `-` are
    /// allowed (the deprecated `[section.subsection]` form is not
    /// supported). Variable names must start with a letter and contain only
    /// ASCII alphanumerics and `-`.
    pub fn set(&mut self, section: &str, name: &str, value: impl Into<GitValue>) {
        self.set_entry((section.to_string(), None), name, value.into());
    }

    /// Set a variable in `[section "subsection"]`.
    ///
    /// Subsection names are case-sensitive and may contain anything except
    /// newline and the null byte.
    pub fn set_sub(
        &mut self,
        section: &str,
        subsection: &str,
        name: &str,
        value: impl Into<GitValue>,
    ) {
        self.set_entry(
            (section.to_string(), Some(subsection.to_string())),
            name,
            value.into(),
        );
    }

    fn set_entry(&mut self, section: Section, name: &str, value: GitValue) {
        debug_assert!(
            !section.0.is_empty()
                && section
                    .0
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-'),
            "invalid git config section name: {:?}",
            section.0
        );
        debug_assert!(
            section
                .1
                .as_deref()
                .is_none_or(|s| !s.is_empty() && !s.contains(['\n', '\0'])),
            "invalid git config subsection name"
        );
        debug_assert!(
            name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-'),
            "invalid git config variable name: {name:?}"
        );
        self.sections
            .entry(section)
            .or_default()
            .insert(name.to_string(), value);
    }
}

fn format_header((title, subsection): &Section) -> String {
    let title = title.to_ascii_lowercase();
    match subsection {
        None => format!("[{title}]"),
        Some(sub) => {
            let escaped: String = sub
                .chars()
                .map(|c| match c {
                    '"' => "\\\"".to_string(),
                    '\\' => "\\\\".to_string(),
                    other => other.to_string(),
                })
                .collect();
            format!("[{title} \"{escaped}\"]")
        }
    }
}

fn format_value(value: &GitValue) -> String {
    match value {
        GitValue::Bool(b) => b.to_string(),
        GitValue::Int(i) => i.to_string(),
        GitValue::Str(s) => {
            let escaped: String = s
                .chars()
                .map(|c| match c {
                    '"' => "\\\"".to_string(),
                    '\\' => "\\\\".to_string(),
                    '\n' => "\\n".to_string(),
                    '\t' => "\\t".to_string(),
                    '\u{8}' => "\\b".to_string(),
                    other => other.to_string(),
                })
                .collect();
            format!("\"{escaped}\"")
        }
    }
}

impl Content for GitConfigContent {
    fn to_bytes(&self) -> Vec<u8> {
        let mut file = TextContent::new();
        for (section, values) in &self.sections {
            // Separate sections with an empty line
            if !file.as_str().is_empty() {
                file.append("");
            }
            file.append(&format_header(section));
            for (name, value) in values {
                file.append(&format!("    {name} = {}", format_value(value)));
            }
        }
        file.tag("#");
        file.to_bytes()
    }
}
