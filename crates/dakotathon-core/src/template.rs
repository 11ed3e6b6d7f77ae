//! `{name}` placeholder substitution for model input templates.
//!
//! A model template is the model's own input file with parameter values
//! replaced by `{name}` markers. Three files derive from it:
//! - the defaults file, every marker filled from a parameter table;
//! - the Dakota template (`.dtmpl`), markers kept only for the parameters
//!   Dakota varies and everything else taken from the defaults file;
//! - the per-evaluation model input, the `.dtmpl` filled from a
//!   parameters file.
//!
//! `{{` and `}}` stand for literal braces. Braces around anything that is
//! not an identifier are copied through unchanged.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Error, Result};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}").unwrap()
});

/// Placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TOKEN
        .captures_iter(template)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Replace every placeholder with its value. An unknown name is an error.
pub fn substitute(template: &str, values: &HashMap<String, String>) -> Result<String> {
    let mut missing = None;
    let out = TOKEN.replace_all(template, |c: &Captures<'_>| match c.get(1) {
        Some(name) => match values.get(name.as_str()) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| name.as_str().to_string());
                String::new()
            }
        },
        None => c[0][..1].to_string(),
    });
    match missing {
        Some(name) => Err(Error::MissingParameter(name)),
        None => Ok(out.into_owned()),
    }
}

/// Read a parameter table into default values.
///
/// Accepts either the component metadata layout
/// (`name: {value: {default: 12.0, units: ...}}`), a flat
/// `name: {default: x}`, or plain `name: x`.
pub fn parameter_defaults(yaml: &str) -> Result<HashMap<String, String>> {
    let table: serde_yaml::Mapping = serde_yaml::from_str(yaml)
        .map_err(|e| Error::InvalidConfig(format!("parameter table: {e}")))?;

    let mut defaults = HashMap::new();
    for (key, entry) in &table {
        let name = key
            .as_str()
            .ok_or_else(|| Error::InvalidConfig(format!("parameter name {key:?} is not a string")))?;
        let default = entry
            .get("value")
            .and_then(|v| v.get("default"))
            .or_else(|| entry.get("default"))
            .unwrap_or(entry);
        let text = scalar_text(default).ok_or_else(|| {
            Error::InvalidConfig(format!("parameter '{name}' has no scalar default"))
        })?;
        defaults.insert(name.to_string(), text);
    }
    Ok(defaults)
}

/// Fill every marker of a model template from a parameter table's defaults.
pub fn render_defaults(template: &str, parameters_yaml: &str) -> Result<String> {
    substitute(template, &parameter_defaults(parameters_yaml)?)
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Build a Dakota template from a model template and its defaults file.
///
/// Line by line: a template line that mentions one of `names` is kept with
/// those markers, every other line comes from the defaults file. Markers on
/// a kept line that are not in `names` are filled with the value found at
/// the same position in the defaults line.
pub fn merge_dakota_template(template: &str, defaults: &str, names: &[&str]) -> Result<String> {
    let tmpl_lines: Vec<&str> = template.lines().collect();
    let dflt_lines: Vec<&str> = defaults.lines().collect();
    if tmpl_lines.len() != dflt_lines.len() {
        return Err(Error::mismatch(
            "defaults file lines (one per template line)",
            tmpl_lines.len(),
            dflt_lines.len(),
        ));
    }

    let selected: HashSet<&str> = names.iter().copied().collect();
    let mut out = String::with_capacity(template.len());

    for (idx, (tmpl, dflt)) in tmpl_lines.iter().zip(&dflt_lines).enumerate() {
        let line_names = placeholders(tmpl);
        if !line_names.iter().any(|n| selected.contains(n.as_str())) {
            out.push_str(dflt);
        } else if line_names.iter().all(|n| selected.contains(n.as_str())) {
            out.push_str(tmpl);
        } else {
            let mut values = recover_values(tmpl, dflt)
                .ok_or_else(|| Error::parse(idx + 1, "template and defaults lines do not align"))?;
            for name in &selected {
                values.insert(name.to_string(), format!("{{{name}}}"));
            }
            out.push_str(&substitute(tmpl, &values)?);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Match a filled line against its template line to read back the value
/// each marker was given.
fn recover_values(template_line: &str, filled_line: &str) -> Option<HashMap<String, String>> {
    let mut pattern = String::from("^");
    let mut names = Vec::new();
    let mut last = 0;
    for c in TOKEN.captures_iter(template_line) {
        let Some(whole) = c.get(0) else { continue };
        pattern.push_str(&regex::escape(&template_line[last..whole.start()]));
        match c.get(1) {
            Some(name) => {
                pattern.push_str("(.+?)");
                names.push(name.as_str().to_string());
            }
            None => pattern.push_str(&regex::escape(&whole.as_str()[..1])),
        }
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&template_line[last..]));
    pattern.push('$');

    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(filled_line)?;
    Some(
        names
            .into_iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(name, m)| m.map(|m| (name, m.as_str().to_string())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_placeholders_in_order() {
        let t = "{b} {a}\n{ b } {{literal}}";
        assert_eq!(placeholders(t), vec!["b", "a"]);
    }

    #[test]
    fn test_substitute() {
        let t = "T = {T}\nP = { P }\n";
        let s = substitute(t, &values(&[("T", "15.0"), ("P", "1.6")])).unwrap();
        assert_eq!(s, "T = 15.0\nP = 1.6\n");
    }

    #[test]
    fn test_escaped_braces() {
        let s = substitute("{{T}} {T}", &values(&[("T", "1")])).unwrap();
        assert_eq!(s, "{T} 1");
    }

    #[test]
    fn test_non_identifier_braces_untouched() {
        let s = substitute("{1 2} {T}", &values(&[("T", "x")])).unwrap();
        assert_eq!(s, "{1 2} x");
    }

    #[test]
    fn test_missing_parameter() {
        let err = substitute("{T} {P}", &values(&[("T", "1")])).unwrap_err();
        assert_eq!(err, Error::MissingParameter("P".to_string()));
    }

    #[test]
    fn test_parameter_defaults_layouts() {
        let yaml = "\
starting_mean_annual_temperature:
  description: Mean annual temperature at the start
  value:
    type: float
    default: 14.26
    units: deg C
total_annual_precipitation:
  default: 1.59
run_duration: 100
";
        let d = parameter_defaults(yaml).unwrap();
        assert_eq!(d["starting_mean_annual_temperature"], "14.26");
        assert_eq!(d["total_annual_precipitation"], "1.59");
        assert_eq!(d["run_duration"], "100");
    }

    #[test]
    fn test_render_defaults() {
        let yaml = "T:\n  value: {default: 14.26}\nyears: 100\n";
        let text = render_defaults("{T} )Temp\n{years} )Years\n", yaml).unwrap();
        assert_eq!(text, "14.26 )Temp\n100 )Years\n");

        let err = render_defaults("{T} {P}\n", yaml).unwrap_err();
        assert_eq!(err, Error::MissingParameter("P".to_string()));
    }

    #[test]
    fn test_parameter_defaults_rejects_nested_without_default() {
        let yaml = "T:\n  value:\n    units: K\n";
        assert!(parameter_defaults(yaml).is_err());
    }

    #[test]
    fn test_merge_dakota_template() {
        let template = "title\n{T} {dT} )Temp\n{P} {dP} )Precip\n{years} )Years\n";
        let defaults = "title\n14.26 0.0 )Temp\n1.59 0.0 )Precip\n100 )Years\n";
        let merged = merge_dakota_template(template, defaults, &["T", "P"]).unwrap();
        assert_eq!(
            merged,
            "title\n{T} 0.0 )Temp\n{P} 0.0 )Precip\n100 )Years\n"
        );
    }

    #[test]
    fn test_merge_whole_line_selected() {
        let template = "{T} )Temp\n{P} )Precip\n";
        let defaults = "14.26 )Temp\n1.59 )Precip\n";
        let merged = merge_dakota_template(template, defaults, &["P"]).unwrap();
        assert_eq!(merged, "14.26 )Temp\n{P} )Precip\n");
    }

    #[test]
    fn test_merge_line_count_mismatch() {
        let err = merge_dakota_template("{T}\n{P}\n", "1\n", &["T"]).unwrap_err();
        assert!(matches!(err, Error::Mismatch { .. }));
    }

    #[test]
    fn test_merge_misaligned_line() {
        let err = merge_dakota_template("{T} {dT} )Temp\n", "14.26 )Precip\n", &["T"]).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    proptest! {
        #[test]
        fn prop_text_without_braces_is_unchanged(text in "[^{}]*") {
            let out = substitute(&text, &HashMap::new()).unwrap();
            prop_assert_eq!(out, text);
        }

        #[test]
        fn prop_defaults_then_recover(a in -1e6f64..1e6, b in 0u32..10_000) {
            let template = "{a} {b} )line";
            let filled = substitute(template, &values(&[
                ("a", &a.to_string()),
                ("b", &b.to_string()),
            ])).unwrap();
            let recovered = recover_values(template, &filled).unwrap();
            prop_assert_eq!(&recovered["a"], &a.to_string());
            prop_assert_eq!(&recovered["b"], &b.to_string());
        }
    }
}
