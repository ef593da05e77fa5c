//! Parsing of `models:/<name>/<selector>` registry pointers.

use std::fmt;
use std::str::FromStr;

use crate::RegistryError;

const SCHEME: &str = "models:/";

/// Which version of a registered model to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// Highest registered version.
    Latest,
    /// An exact version number.
    Version(u64),
    /// Highest version currently in the named stage, e.g. `Production`.
    Stage(String),
}

/// A parsed registry pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReference {
    pub name: String,
    pub selector: VersionSelector,
}

impl FromStr for ModelReference {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidReference(s.to_string());

        let rest = s.trim().strip_prefix(SCHEME).ok_or_else(invalid)?;
        let (name, selector) = rest.split_once('/').ok_or_else(invalid)?;
        if name.is_empty() || selector.is_empty() || selector.contains('/') {
            return Err(invalid());
        }

        let selector = match selector {
            s if s.eq_ignore_ascii_case("latest") => VersionSelector::Latest,
            s => match s.parse::<u64>() {
                Ok(version) => VersionSelector::Version(version),
                Err(_) => VersionSelector::Stage(s.to_string()),
            },
        };

        Ok(Self {
            name: name.to_string(),
            selector,
        })
    }
}

impl fmt::Display for ModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            VersionSelector::Latest => write!(f, "{}{}/latest", SCHEME, self.name),
            VersionSelector::Version(v) => write!(f, "{}{}/{}", SCHEME, self.name, v),
            VersionSelector::Stage(stage) => write!(f, "{}{}/{}", SCHEME, self.name, stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selectors() {
        let latest: ModelReference = "models:/mnist-model/latest".parse().unwrap();
        assert_eq!(latest.name, "mnist-model");
        assert_eq!(latest.selector, VersionSelector::Latest);

        let pinned: ModelReference = "models:/mnist-model/4".parse().unwrap();
        assert_eq!(pinned.selector, VersionSelector::Version(4));

        let staged: ModelReference = "models:/mnist-model/Production".parse().unwrap();
        assert_eq!(staged.selector, VersionSelector::Stage("Production".into()));
    }

    #[test]
    fn test_display_matches_input() {
        for uri in ["models:/mnist-model/latest", "models:/m/12", "models:/m/Staging"] {
            let reference: ModelReference = uri.parse().unwrap();
            assert_eq!(reference.to_string(), uri);
        }
    }

    #[test]
    fn test_reject_malformed() {
        for uri in [
            "",
            "runs:/abc/model",
            "models:/",
            "models:/mnist-model",
            "models:/mnist-model/",
            "models://latest",
            "models:/a/b/c",
        ] {
            assert!(
                matches!(uri.parse::<ModelReference>(), Err(RegistryError::InvalidReference(_))),
                "accepted {uri:?}"
            );
        }
    }
}
