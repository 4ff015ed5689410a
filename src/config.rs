//! Analysis configuration, stored as YAML.

use crate::analysis::GroupTest;
use crate::data::{LoadOptions, VariableType};
use crate::error::{BetaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

fn default_permutations() -> usize {
    999
}

/// Which analysis the inputs are prepared for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Numeric metadata against distances.
    Bioenv,
    /// Group separation or dispersion for one categorical column.
    GroupSignificance {
        column: String,
        method: GroupTest,
        #[serde(default = "default_permutations")]
        permutations: usize,
        #[serde(default)]
        pairwise: bool,
    },
}

/// Analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Name of the analysis.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Column type overrides applied after loading metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_types: BTreeMap<String, VariableType>,
    /// Cell contents treated as missing values.
    #[serde(default = "default_missing_tokens")]
    pub missing_tokens: Vec<String>,
    pub analysis: AnalysisKind,
}

fn default_missing_tokens() -> Vec<String> {
    LoadOptions::default().missing_tokens
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(BetaError::from)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if let AnalysisKind::GroupSignificance {
            column,
            permutations,
            ..
        } = &self.analysis
        {
            if column.trim().is_empty() {
                return Err(BetaError::InvalidParameter(
                    "group significance requires a column".to_string(),
                ));
            }
            if *permutations == 0 {
                return Err(BetaError::InvalidParameter(
                    "permutations must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parsing options for metadata files.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            missing_tokens: self.missing_tokens.clone(),
        }
    }

    /// Column type overrides in the form `Metadata::with_column_types` takes.
    pub fn column_type_overrides(&self) -> HashMap<String, VariableType> {
        self.column_types
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// A commented example.
    pub fn example() -> Self {
        let mut column_types = BTreeMap::new();
        column_types.insert("subject".to_string(), VariableType::Categorical);
        Self {
            name: "example-body-site".to_string(),
            description: Some(
                "PERMANOVA across body sites with pairwise comparisons".to_string(),
            ),
            column_types,
            missing_tokens: default_missing_tokens(),
            analysis: AnalysisKind::GroupSignificance {
                column: "body_site".to_string(),
                method: GroupTest::Permanova,
                permutations: 999,
                pairwise: true,
            },
        }
    }
}
