use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::constants::DEFAULT_DATA_FILE;

/// The `environment` block: top-level settings such as tabular output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Environment {
    /// Tabular data file Dakota writes one row per evaluation to.
    /// `None` disables tabular output.
    pub data_file: Option<String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            data_file: Some(DEFAULT_DATA_FILE.to_string()),
        }
    }
}

impl Environment {
    pub fn render(&self) -> String {
        let mut b = Block::new("environment");
        if let Some(file) = &self.data_file {
            b.keyword(1, "tabular_data")
                .string(2, "tabular_data_file", file);
        }
        b.finish()
    }
}
