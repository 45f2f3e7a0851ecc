use rh_core::{MultichoiceOption, Variant, YesNo};
use serde::{Deserialize, Serialize};

/// One recorded multichoice pick, as stored for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedPick {
    /// Row text.
    pub option: String,
    /// What the learner picked.
    pub selection: YesNo,
}

/// Variant chosen for a dynamic line, with the items behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantChoice {
    /// Selected variant.
    pub variant: Variant,
    /// Rows expected "yes" but picked "no".
    pub missing: Vec<String>,
    /// Rows expected "no" but picked "yes".
    pub unnecessary: Vec<String>,
}

/// Compare recorded picks with the options they were made against.
///
/// Picks are matched to options by text. Without recorded picks the
/// learner is assumed to have succeeded.
pub fn select_variant(options: &[MultichoiceOption], picks: Option<&[RecordedPick]>) -> VariantChoice {
    let mut missing = Vec::new();
    let mut unnecessary = Vec::new();

    for pick in picks.unwrap_or_default() {
        let Some(option) = options.iter().find(|o| o.text == pick.option) else {
            continue;
        };
        match (option.expected_response, pick.selection) {
            (YesNo::Yes, YesNo::No) => missing.push(pick.option.clone()),
            (YesNo::No, YesNo::Yes) => unnecessary.push(pick.option.clone()),
            _ => {}
        }
    }

    let variant = match (missing.is_empty(), unnecessary.is_empty()) {
        (true, true) => Variant::Success,
        (false, true) => Variant::MissingItems,
        (true, false) => Variant::UnnecessaryItems,
        (false, false) => Variant::BothErrors,
    };
    VariantChoice {
        variant,
        missing,
        unnecessary,
    }
}
