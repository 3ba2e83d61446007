use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::result::TriageError;

/// The closed set of labels the skin classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    Acne,
    Carcinoma,
    Eczema,
    Keratosis,
    Milia,
    Rosacea,
    OilySkin,
    DrySkin,
    Normal,
    NonWrinkledSkin,
}

impl Condition {
    pub const ALL: [Condition; 10] = [
        Condition::Acne,
        Condition::Carcinoma,
        Condition::Eczema,
        Condition::Keratosis,
        Condition::Milia,
        Condition::Rosacea,
        Condition::OilySkin,
        Condition::DrySkin,
        Condition::Normal,
        Condition::NonWrinkledSkin,
    ];

    /// Conditions with high clinical risk; escalated at lower confidence.
    pub const CRITICAL: [Condition; 3] = [Condition::Carcinoma, Condition::Eczema, Condition::Rosacea];

    pub fn is_critical(self) -> bool {
        Self::CRITICAL.contains(&self)
    }

    /// Name as emitted by the classifier service.
    pub fn display_name(self) -> &'static str {
        match self {
            Condition::Acne => "Acne",
            Condition::Carcinoma => "Carcinoma",
            Condition::Eczema => "Eczema",
            Condition::Keratosis => "Keratosis",
            Condition::Milia => "Milia",
            Condition::Rosacea => "Rosacea",
            Condition::OilySkin => "Oily Skin",
            Condition::DrySkin => "Dry Skin",
            Condition::Normal => "Normal",
            Condition::NonWrinkledSkin => "Non-Wrinkled Skin",
        }
    }

    /// Lenient lookup: `"Oily Skin"`, `"OilySkin"` and `"oily_skin"` all resolve.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = label_key(raw);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|c| label_key(c.display_name()) == wanted)
    }
}

fn label_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl core::fmt::Display for Condition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl core::str::FromStr for Condition {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::parse(s).ok_or_else(|| TriageError::InvalidInput(format!("unknown condition label: {s:?}")))
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
