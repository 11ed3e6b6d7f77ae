//! HydroTrend, a climate-driven hydrological water balance and transport
//! model, as a preset of the generic model plugin.

use super::ModelPlugin;
use crate::dakota::which;

pub const HYDROTREND_INPUT_DIR: &str = "HYDRO_IN";
pub const HYDROTREND_OUTPUT_DIR: &str = "HYDRO_OUTPUT";
pub const HYDROTREND_INPUT_FILE: &str = "HYDRO.IN";
/// Name HydroTrend expects for its hypsometry input. The first auxiliary
/// file is copied under this name.
const HYPSOMETRY_FILE: &str = "HYDRO0.HYPS";
/// HydroTrend's ASCII output files start with two header lines.
const HEADER_LINES: usize = 2;

pub fn hydrotrend() -> ModelPlugin {
    ModelPlugin::new("hydrotrend", "hydrotrend")
        .with_args(["--in-dir", "{input_dir}", "--out-dir", "{output_dir}"])
        .with_directories(HYDROTREND_INPUT_DIR, HYDROTREND_OUTPUT_DIR)
        .with_input_file(HYDROTREND_INPUT_FILE)
        .with_header_lines(HEADER_LINES)
        .with_auxiliary_names([HYPSOMETRY_FILE])
}

pub fn is_hydrotrend_installed() -> bool {
    which("hydrotrend").is_some()
}
