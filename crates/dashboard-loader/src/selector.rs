//! Equality-based label selectors (`app=grafana,tier!=cache,debug,!legacy`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;

static RE_LABEL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*/)?[A-Za-z0-9]([-A-Za-z0-9_.]{0,61}[A-Za-z0-9])?$",
    )
    .unwrap()
});
static RE_LABEL_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9]([-A-Za-z0-9_.]{0,61}[A-Za-z0-9])?)?$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Equals { key: String, value: String },
    NotEquals { key: String, value: String },
    Exists(String),
    DoesNotExist(String),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Requirement::Equals { key, value } => labels.get(key) == Some(value),
            Requirement::NotEquals { key, value } => labels.get(key) != Some(value),
            Requirement::Exists(key) => labels.contains_key(key),
            Requirement::DoesNotExist(key) => !labels.contains_key(key),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Equals { key, value } => write!(f, "{}={}", key, value),
            Requirement::NotEquals { key, value } => write!(f, "{}!={}", key, value),
            Requirement::Exists(key) => write!(f, "{}", key),
            Requirement::DoesNotExist(key) => write!(f, "!{}", key),
        }
    }
}

/// A conjunction of label requirements. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Selector that matches every resource.
    pub fn everything() -> Self {
        Self::default()
    }

    /// Selector with a single `key=value` requirement.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            requirements: vec![Requirement::Equals {
                key: key.into(),
                value: value.into(),
            }],
        }
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }

    pub fn parse(selector: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            reason,
        };

        let mut requirements = Vec::new();
        for raw in selector.split(',') {
            let term = raw.trim();
            if term.is_empty() {
                if selector.trim().is_empty() {
                    continue;
                }
                return Err(invalid("empty requirement".to_string()));
            }
            if term.contains(" in ") || term.contains(" notin ") || term.contains('(') {
                return Err(invalid(format!(
                    "set-based requirement '{}' is not supported",
                    term
                )));
            }

            let requirement = if let Some(key) = term.strip_prefix('!') {
                Requirement::DoesNotExist(key.trim().to_string())
            } else if let Some((key, value)) = term.split_once("!=") {
                Requirement::NotEquals {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                }
            } else if let Some((key, value)) = term
                .split_once("==")
                .or_else(|| term.split_once('='))
            {
                Requirement::Equals {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                }
            } else {
                Requirement::Exists(term.to_string())
            };

            validate_requirement(&requirement).map_err(invalid)?;
            requirements.push(requirement);
        }

        Ok(Self { requirements })
    }
}

impl FromStr for LabelSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.requirements.iter().map(|r| r.to_string()).collect();
        f.write_str(&terms.join(","))
    }
}

fn validate_requirement(requirement: &Requirement) -> Result<(), String> {
    let (key, value) = match requirement {
        Requirement::Equals { key, value } | Requirement::NotEquals { key, value } => {
            (key, Some(value))
        }
        Requirement::Exists(key) | Requirement::DoesNotExist(key) => (key, None),
    };

    if !RE_LABEL_KEY.is_match(key) {
        return Err(format!("invalid label key '{}'", key));
    }
    if let Some(value) = value {
        if !RE_LABEL_VALUE.is_match(value) {
            return Err(format!("invalid label value '{}' for key '{}'", value, key));
        }
    }
    Ok(())
}
