//! Condition → product target tags lookup.

use std::collections::HashMap;
use std::sync::LazyLock;

use aurora_catalog::TagSet;

use crate::condition::Condition;

/// Tags used for conditions without a dedicated row.
pub const DEFAULT_TARGETS: &[&str] = &["DullSkin", "UnevenSkinTone"];

const CONDITION_TARGETS: &[(Condition, &[&str])] = &[
    (
        Condition::Acne,
        &["BreakoutsAndBlemishes", "EnlargedPores", "ExcessOil", "BlackHeads"],
    ),
    (Condition::Eczema, &["Redness", "Irritation", "DrySkin", "SensitiveSkin"]),
    (Condition::Rosacea, &["Redness", "Irritation", "SensitiveSkin"]),
    (Condition::OilySkin, &["SebumControl", "EnlargedPores", "ExcessOil"]),
    // "Hyderating" is a spelling found in existing catalog data.
    (
        Condition::DrySkin,
        &["DrySkin", "Moisturising", "Hydrating", "Hyderating"],
    ),
    (Condition::Normal, &["DullSkin", "UnevenSkinTone"]),
    (Condition::NonWrinkledSkin, &["AntiAging", "FineLines", "Wrinkles"]),
];

static TABLE: LazyLock<HashMap<Condition, TagSet>> = LazyLock::new(|| {
    CONDITION_TARGETS
        .iter()
        .map(|(condition, labels)| (*condition, TagSet::from_labels(labels.iter().copied())))
        .collect()
});

static DEFAULT: LazyLock<TagSet> = LazyLock::new(|| TagSet::from_labels(DEFAULT_TARGETS.iter().copied()));

/// Product target tags relevant to `condition`.
pub fn relevant_tags(condition: Condition) -> &'static TagSet {
    TABLE.get(&condition).unwrap_or(&*DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_catalog::Tag;

    #[test]
    fn acne_maps_to_breakout_tags() {
        let tags = relevant_tags(Condition::Acne);
        assert_eq!(tags.len(), 4);
        assert!(tags.contains(&Tag::parse("Breakouts & blemishes").unwrap()));
        assert!(tags.contains(&Tag::parse("Black Heads").unwrap()));
    }

    #[test]
    fn dry_skin_accepts_both_hydrating_spellings() {
        let tags = relevant_tags(Condition::DrySkin);
        assert!(tags.intersects(&TagSet::parse_list("Hydrating")));
        assert!(tags.intersects(&TagSet::parse_list("Hyderating")));
        assert!(!tags.intersects(&TagSet::parse_list("Sun protection")));
    }

    #[test]
    fn unmapped_conditions_fall_back_to_default() {
        let default = TagSet::from_labels(DEFAULT_TARGETS.iter().copied());
        for c in [Condition::Carcinoma, Condition::Keratosis, Condition::Milia] {
            assert_eq!(relevant_tags(c), &default, "{c}");
        }
    }

    #[test]
    fn every_condition_has_tags() {
        for c in Condition::ALL {
            assert!(!relevant_tags(c).is_empty(), "{c}");
        }
    }
}
