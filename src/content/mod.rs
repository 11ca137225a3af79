//! Desired-file content builders.
//!
//! Modules assemble file contents through these types and hand them to the
//! files module as opaque bytes. Each encoder can embed the managed-file
//! tag so a human opening the file can tell the tool owns it.

mod binary;
mod git;
mod json;
mod text;
mod toml;

pub use binary::BinaryContent;
pub use git::{GitConfigContent, GitValue};
pub use json::JsonContent;
pub use text::TextContent;
pub use self::toml::TomlContent;

/// Marker line embedded in generated files.
pub const MANAGED_TAG: &str = "Managed by converge. Manual edits will be overwritten.";

/// Anything that can render itself into desired-file bytes.
pub trait Content {
    /// Render the final byte content of the file.
    fn to_bytes(&self) -> Vec<u8>;
}
