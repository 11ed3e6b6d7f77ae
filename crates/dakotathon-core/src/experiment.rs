use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::HEADER;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::interface::Interface;
use crate::method::{Method, MethodKind};
use crate::responses::Responses;
use crate::variables::{UniformUncertain, Variables};

/// A complete Dakota study: the five blocks of one input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub environment: Environment,
    pub method: Method,
    pub variables: Variables,
    pub interface: Interface,
    pub responses: Responses,
}

impl Experiment {
    /// A runnable default study for `kind`, evaluating Dakota's built-in
    /// Rosenbrock function.
    pub fn default_for(kind: MethodKind) -> Self {
        Self {
            environment: Environment::default(),
            method: Method::from(kind),
            variables: default_variables(kind),
            interface: Interface::direct("rosenbrock"),
            responses: Responses::default(),
        }
    }

    /// Render the full input file.
    pub fn render(&self) -> String {
        let mut s = String::from(HEADER);
        for block in self.blocks() {
            s.push_str(&block);
        }
        s
    }

    /// Blocks in input-file order.
    pub fn blocks(&self) -> [String; 5] {
        [
            self.environment.render(),
            self.method.render(),
            self.variables.render(),
            self.interface.render(),
            self.responses.render(),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        self.variables.validate()?;
        self.method.validate(self.variables.len())?;
        self.interface.validate()?;
        self.responses.validate()?;

        let kind = self.method.kind();
        if kind.is_uncertainty() && !self.variables.is_uncertain() {
            return Err(Error::InvalidConfig(format!(
                "{kind} needs uncertain variables, got {}",
                self.variables.kind_str()
            )));
        }
        if !kind.is_uncertainty() && self.variables.is_uncertain() && !self.variables.is_bounded()
        {
            return Err(Error::InvalidConfig(format!(
                "{kind} over {} variables needs lower and upper bounds",
                self.variables.kind_str()
            )));
        }
        if self.interface.drives_plugin() && self.responses.response_files.is_empty() {
            return Err(Error::InvalidConfig(
                "plugin-driven experiments need response_files and response_statistics"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn default_variables(kind: MethodKind) -> Variables {
    if kind.is_uncertainty() {
        Variables::UniformUncertain(UniformUncertain::default())
    } else {
        Variables::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for_every_method_validates() {
        for kind in MethodKind::ALL {
            let exp = Experiment::default_for(kind);
            exp.validate()
                .unwrap_or_else(|e| panic!("default {kind} experiment invalid: {e}"));
        }
    }

    #[test]
    fn test_render_order() {
        let s = Experiment::default_for(MethodKind::Sampling).render();
        assert!(s.starts_with("# Dakota input file\nenvironment\n"));
        let order: Vec<usize> = ["environment\n", "method\n", "variables\n", "interface\n", "responses\n"]
            .iter()
            .map(|name| s.find(name).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "blocks out of order: {order:?}");
    }

    #[test]
    fn test_display_matches_render() {
        let exp = Experiment::default_for(MethodKind::PolynomialChaos);
        assert_eq!(exp.to_string(), exp.render());
    }

    #[test]
    fn test_uncertainty_method_rejects_design_variables() {
        let mut exp = Experiment::default_for(MethodKind::Sampling);
        exp.variables = Variables::default();
        let err = exp.validate().unwrap_err();
        assert!(err.to_string().contains("needs uncertain variables"));
    }

    #[test]
    fn test_plugin_interface_needs_response_files() {
        let mut exp = Experiment::default_for(MethodKind::Sampling);
        exp.interface = Interface::fork();
        assert!(exp.validate().is_err());

        exp.responses.response_files = vec!["HYDROASCII.QS".to_string()];
        exp.responses.response_statistics = vec!["median".to_string()];
        assert!(exp.validate().is_ok());
    }
}
