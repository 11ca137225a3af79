use toml::{Table, Value};

use super::text::TextContent;
use super::Content;

/// TOML table content with path-addressed mutation.
///
/// Renders with the managed-file tag as a leading comment line.
#[derive(Debug, Clone, Default)]
pub struct TomlContent {
    data: Table,
}

impl TomlContent {
    /// Empty TOML table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value at a key path, creating intermediate tables as needed.
    /// Setting through a non-table value replaces it with a table.
    pub fn set(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut table = &mut self.data;
        for part in parents {
            let entry = table
                .entry((*part).to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            let Value::Table(next) = entry else { return };
            table = next;
        }
        table.insert((*last).to_string(), value);
    }

    /// The current root table.
    pub fn table(&self) -> &Table {
        &self.data
    }
}

impl Content for TomlContent {
    fn to_bytes(&self) -> Vec<u8> {
        let mut file = TextContent::new();
        file.tag("#");
        let rendered = toml::to_string(&self.data).unwrap_or_default();
        let mut out = file.to_bytes();
        out.extend_from_slice(rendered.as_bytes());
        out
    }
}
