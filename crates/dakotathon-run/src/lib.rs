//! Filesystem and process side of dakotathon: run directories, the
//! `dakota` executable, configuration files and the model plugins Dakota
//! drives through `dakotathon run-plugin`.

pub mod component;
pub mod config_file;
pub mod dakota;
pub mod driver;
pub mod error;
pub mod files;
pub mod plugin;

pub use component::{Component, DakotaComponent};
pub use dakota::{Dakota, DakotaResults, check_status, is_dakota_installed, which};
pub use driver::run_plugin;
pub use error::{Result, RunError};
pub use plugin::{ModelPlugin, Plugin, load_plugin};
