use crate::constants::FAIL_TOKEN;
use crate::error::{Error, Result};

/// Format a Dakota results file: one `<value>\t<label>` line per response,
/// in the order the parameters file requested them.
pub fn format_results(values: &[f64], labels: &[&str]) -> Result<String> {
    if values.len() != labels.len() {
        return Err(Error::mismatch(
            "response values (one per requested response)",
            labels.len(),
            values.len(),
        ));
    }
    let mut out = String::new();
    for (value, label) in values.iter().zip(labels) {
        out.push_str(&format!("{value:?}\t{label}\n"));
    }
    Ok(out)
}

/// Results file content that makes Dakota's failure capture treat the
/// evaluation as failed.
pub fn failure() -> String {
    format!("{FAIL_TOKEN}\n")
}
