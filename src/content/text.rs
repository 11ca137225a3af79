use super::{Content, MANAGED_TAG};

/// Line-oriented text content.
#[derive(Debug, Clone, Default)]
pub struct TextContent {
    data: String,
}

impl TextContent {
    /// Empty text content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text content starting from an existing string.
    pub fn from_string(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Append a line (a trailing newline is added).
    pub fn append(&mut self, line: &str) {
        self.data.push_str(line);
        self.data.push('\n');
    }

    /// Prepend a line (a trailing newline is added).
    pub fn prepend(&mut self, line: &str) {
        self.data = format!("{line}\n{}", self.data);
    }

    /// Prepend the managed-file tag as a comment with the given leader
    /// (e.g. `"#"`).
    pub fn tag(&mut self, comment: &str) {
        self.prepend(&format!("{comment} {MANAGED_TAG}"));
    }

    /// The accumulated text.
    pub fn as_str(&self) -> &str {
        &self.data
    }
}

impl Content for TextContent {
    fn to_bytes(&self) -> Vec<u8> {
        self.data.clone().into_bytes()
    }
}
