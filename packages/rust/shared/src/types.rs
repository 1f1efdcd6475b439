//! Domain types shared between the extractor, the fetcher, and the CLI.

use serde::{Deserialize, Serialize};

/// Which rule set the extraction pipeline applies.
///
/// `Standard` uses heuristic root detection and a lenient cleanup;
/// `Strict` uses an explicit selector allow-list, a wider noise class set,
/// flattens internal links to plain text, and never keeps double blank lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractProfile {
    #[default]
    Standard,
    Strict,
}

impl ExtractProfile {
    pub fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl std::fmt::Display for ExtractProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl std::str::FromStr for ExtractProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown extraction profile: {other}")),
        }
    }
}
