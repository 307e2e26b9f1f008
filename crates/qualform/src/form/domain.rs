use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three qualification categories a record can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "gcse")]
    Gcse,
    #[serde(rename = "l3")]
    LevelThree,
    #[serde(rename = "higher")]
    Higher,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Gcse, Tier::LevelThree, Tier::Higher];

    /// Stable slug used in storage blobs and API paths.
    pub const fn slug(self) -> &'static str {
        match self {
            Tier::Gcse => "gcse",
            Tier::LevelThree => "l3",
            Tier::Higher => "higher",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Gcse => "GCSE or equivalent",
            Tier::LevelThree => "Level 3",
            Tier::Higher => "Higher level",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "gcse" => Ok(Tier::Gcse),
            "l3" => Ok(Tier::LevelThree),
            "higher" => Ok(Tier::Higher),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

/// Raised when an API path names a tier outside the closed set.
#[derive(Debug, thiserror::Error)]
#[error("unknown qualification tier '{0}'")]
pub struct UnknownTier(pub String);

/// One qualification entry. Immutable once stored; identity is positional
/// within its tier's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationRecord {
    pub subject: String,
    pub level: String,
    pub grade: String,
    #[serde(default)]
    pub year: String,
}

/// Raw, untrimmed field values as supplied by the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordDraft {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub year: String,
}

/// The whole form: one ordered record sequence per tier plus the
/// free-text extenuating-circumstances note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub gcse: Vec<QualificationRecord>,
    #[serde(default)]
    pub l3: Vec<QualificationRecord>,
    #[serde(default)]
    pub higher: Vec<QualificationRecord>,
    #[serde(default)]
    pub extenuating: String,
}

impl FormState {
    pub fn records(&self, tier: Tier) -> &[QualificationRecord] {
        match tier {
            Tier::Gcse => &self.gcse,
            Tier::LevelThree => &self.l3,
            Tier::Higher => &self.higher,
        }
    }

    pub(crate) fn records_mut(&mut self, tier: Tier) -> &mut Vec<QualificationRecord> {
        match tier {
            Tier::Gcse => &mut self.gcse,
            Tier::LevelThree => &mut self.l3,
            Tier::Higher => &mut self.higher,
        }
    }
}

/// Enumerated permitted `level` values per tier. This is configuration,
/// not data validated against any external source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCatalog {
    gcse: Vec<String>,
    l3: Vec<String>,
    higher: Vec<String>,
}

impl LevelCatalog {
    pub fn new(gcse: Vec<String>, l3: Vec<String>, higher: Vec<String>) -> Self {
        Self { gcse, l3, higher }
    }

    /// The option sets offered by the standard form.
    pub fn standard() -> Self {
        fn owned(options: &[&str]) -> Vec<String> {
            options.iter().map(|option| option.to_string()).collect()
        }

        Self {
            gcse: owned(&["GCSE", "Functional Skills Level 2", "O Level"]),
            l3: owned(&[
                "A Level",
                "T Level",
                "BTEC Level 3",
                "Level 3 Apprenticeship",
                "Applied General",
            ]),
            higher: owned(&[
                "Level 4 Certificate",
                "Level 5 Diploma",
                "Level 6 Degree",
                "Foundation Degree",
                "Bachelor's Degree",
                "Master's Degree",
            ]),
        }
    }

    pub fn options(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Gcse => &self.gcse,
            Tier::LevelThree => &self.l3,
            Tier::Higher => &self.higher,
        }
    }

    pub fn permits(&self, tier: Tier, level: &str) -> bool {
        self.options(tier).iter().any(|option| option == level)
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
