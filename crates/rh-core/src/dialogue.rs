use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, InteractionId};

/// Outcome of comparing recorded multichoice picks against expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Every pick matched.
    Success,
    /// Expected items were left out.
    MissingItems,
    /// Items that were not needed were picked.
    UnnecessaryItems,
    /// Both kinds of mistake.
    BothErrors,
}

impl Variant {
    /// The authored key for this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::MissingItems => "missing_items",
            Self::UnnecessaryItems => "unnecessary_items",
            Self::BothErrors => "both_errors",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spoken line: text plus who says it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Line text, possibly containing `{characterName}`, `{missing_items}`
    /// or `{unnecessary_items}`.
    #[serde(default)]
    pub text: String,
    /// Speaker id.
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    /// Speaker display name.
    #[serde(default)]
    pub character_name: Option<String>,
    /// Delivery tone passed to speech synthesis.
    #[serde(default)]
    pub tone: Option<String>,
}

/// One entry of a dialogue interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialogueLine {
    /// Text and speaker chosen at playback time.
    Dynamic {
        /// Multichoice interaction whose recorded picks pick the variant.
        source_interaction: InteractionId,
        /// Content per variant.
        dynamic_variants: BTreeMap<Variant, Utterance>,
    },
    /// Fixed text.
    Fixed(Utterance),
}

/// Which of the source interaction's picks a constructed line lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    /// Rows picked "yes".
    Yes,
    /// Rows picked "no".
    No,
    /// Use the dynamic variant text of the target line instead of a list.
    DynamicLineSelection,
}

/// Selection predicate for a constructed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionLogic {
    /// Which picks to include.
    pub selection_type: SelectionType,
}

/// Text pieces a constructed line is assembled from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackTemplate {
    /// Leading text.
    pub prefix: String,
    /// Joins exactly two items.
    pub separator: String,
    /// Joins items in a longer list.
    pub list_separator: String,
    /// Precedes the last item of a longer list.
    pub list_final_separator: String,
    /// Trailing text after the items.
    pub suffix: String,
    /// Used in place of the items when none were selected.
    pub no_items_message: String,
}

/// Rule synthesizing a dialogue line from another interaction's recorded picks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConstruction {
    /// Dialogue line the text is placed into.
    #[serde(rename = "transplant_into_line")]
    pub line: u32,
    /// Multichoice interaction whose picks are listed.
    pub source_interaction: InteractionId,
    /// Assembly template.
    #[serde(default)]
    pub template: FeedbackTemplate,
    /// Selection predicate.
    pub logic: SelectionLogic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_and_dynamic_lines() {
        let lines: Vec<DialogueLine> = serde_json::from_str(
            r#"[
                {"text":"Hello {characterName}.","character_id":"2","character_name":"Ana"},
                {"source_interaction":3,"dynamic_variants":{
                    "success":{"text":"All good.","character_id":2},
                    "missing_items":{"text":"You forgot {missing_items}."}
                }}
            ]"#,
        )
        .unwrap();
        assert!(matches!(&lines[0], DialogueLine::Fixed(u) if u.text.starts_with("Hello")));
        match &lines[1] {
            DialogueLine::Dynamic { source_interaction, dynamic_variants } => {
                assert_eq!(*source_interaction, InteractionId(3));
                assert_eq!(dynamic_variants.len(), 2);
                assert!(dynamic_variants.contains_key(&Variant::MissingItems));
            }
            other => panic!("expected dynamic line, got {other:?}"),
        }
    }

    #[test]
    fn parses_construction() {
        let c: FeedbackConstruction = serde_json::from_str(
            r#"{"transplant_into_line":2,"source_interaction":3,
                "template":{"prefix":"You packed ","suffix":"."},
                "logic":{"selection_type":"yes"}}"#,
        )
        .unwrap();
        assert_eq!(c.line, 2);
        assert_eq!(c.logic.selection_type, SelectionType::Yes);
        assert_eq!(c.template.separator, "");
    }
}
