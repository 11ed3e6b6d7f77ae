use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::constants::{
    DEFAULT_INTERFACE_ID, DEFAULT_PARAMETERS_FILE, DEFAULT_RESULTS_FILE, DEFAULT_WORK_DIRECTORY,
    PLUGIN_DRIVER,
};
use crate::error::{Error, Result};

/// The `interface` block: how Dakota maps parameters to responses.
///
/// In a configuration table the mode's `kind` and its settings sit beside
/// the interface fields; settings the mode does not know are rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interface {
    pub id_interface: Option<String>,
    /// Command (fork) or built-in function name (direct).
    pub analysis_driver: String,
    #[serde(flatten)]
    pub mode: InterfaceMode,
    pub asynchronous: bool,
    pub evaluation_concurrency: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum InterfaceMode {
    /// Linked-in simulation such as Dakota's `rosenbrock` test function.
    Direct {},
    /// External process exchanging parameters and results files.
    Fork(Fork),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fork {
    pub parameters_file: String,
    pub results_file: String,
    pub work_directory: Option<WorkDirectory>,
    pub file_save: bool,
}

impl Default for Fork {
    fn default() -> Self {
        Self {
            parameters_file: DEFAULT_PARAMETERS_FILE.to_string(),
            results_file: DEFAULT_RESULTS_FILE.to_string(),
            work_directory: Some(WorkDirectory::default()),
            file_save: true,
        }
    }
}

/// Per-evaluation working directories (`run.1`, `run.2`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkDirectory {
    pub named: String,
    pub directory_tag: bool,
    pub directory_save: bool,
}

impl Default for WorkDirectory {
    fn default() -> Self {
        Self {
            named: DEFAULT_WORK_DIRECTORY.to_string(),
            directory_tag: true,
            directory_save: true,
        }
    }
}

impl Default for Interface {
    fn default() -> Self {
        Self::fork()
    }
}

impl FromStr for Interface {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fork" => Ok(Self::fork()),
            "direct" => Ok(Self::direct("rosenbrock")),
            _ => Err(Error::UnknownKind {
                section: "interface",
                name: s.to_string(),
            }),
        }
    }
}

impl Interface {
    /// Fork interface running the model plugin driver.
    pub fn fork() -> Self {
        Self {
            id_interface: Some(DEFAULT_INTERFACE_ID.to_string()),
            analysis_driver: PLUGIN_DRIVER.to_string(),
            mode: InterfaceMode::Fork(Fork::default()),
            asynchronous: false,
            evaluation_concurrency: None,
        }
    }

    pub fn direct(driver: &str) -> Self {
        Self {
            id_interface: None,
            analysis_driver: driver.to_string(),
            mode: InterfaceMode::Direct {},
            asynchronous: false,
            evaluation_concurrency: None,
        }
    }

    /// True when evaluations go through the `run-plugin` analysis driver.
    pub fn drives_plugin(&self) -> bool {
        matches!(self.mode, InterfaceMode::Fork(_))
            && self
                .analysis_driver
                .split_whitespace()
                .any(|token| token == "run-plugin")
    }

    pub fn render(&self) -> String {
        let mut b = Block::new("interface");
        if let Some(id) = &self.id_interface {
            b.string(1, "id_interface", id);
        }
        b.string(1, "analysis_drivers", &self.analysis_driver);

        match &self.mode {
            InterfaceMode::Direct {} => {
                b.keyword(2, "direct");
            }
            InterfaceMode::Fork(fork) => {
                b.keyword(2, "fork")
                    .string(2, "parameters_file", &fork.parameters_file)
                    .string(2, "results_file", &fork.results_file);
                if let Some(wd) = &fork.work_directory {
                    b.keyword(2, "work_directory")
                        .keyword(3, &format!("named {}", crate::block::quote(&wd.named)));
                    if wd.directory_tag {
                        b.keyword(3, "directory_tag");
                    }
                    if wd.directory_save {
                        b.keyword(3, "directory_save");
                    }
                }
                if fork.file_save {
                    b.keyword(2, "file_save");
                }
            }
        }

        if self.asynchronous {
            b.keyword(1, "asynchronous");
            if let Some(n) = self.evaluation_concurrency {
                b.value(2, "evaluation_concurrency", n);
            }
        }

        b.finish()
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis_driver.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "interface analysis_driver must not be empty".to_string(),
            ));
        }
        if self.evaluation_concurrency == Some(0) {
            return Err(Error::InvalidConfig(
                "evaluation_concurrency must be > 0".to_string(),
            ));
        }
        if let InterfaceMode::Fork(fork) = &self.mode
            && (fork.parameters_file.is_empty() || fork.results_file.is_empty())
        {
            return Err(Error::InvalidConfig(
                "fork interface needs parameters_file and results_file".to_string(),
            ));
        }
        Ok(())
    }
}
