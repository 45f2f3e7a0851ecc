pub mod check;
pub mod list;
pub mod play;
pub mod show;

use std::fs;
use std::path::Path;

use rh_core::{Catalog, CatalogDocument, Interaction, InteractionKind, RuleSet};
use rh_engine::EngineConfig;
use serde::Deserialize;

/// A catalog, its navigation rules and engine settings, loaded from one file.
pub struct Bundle {
    pub config: EngineConfig,
    pub catalog: Catalog,
    pub rules: RuleSet,
}

#[derive(Deserialize)]
struct BundleDocument {
    #[serde(default)]
    engine: EngineConfig,
    catalog: CatalogDocument,
    #[serde(default)]
    navigation: RuleSet,
}

/// Read and parse a bundle file.
fn load_bundle(path: &Path) -> Result<Bundle, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let doc: BundleDocument =
        serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))?;
    let catalog =
        Catalog::from_document(doc.catalog).map_err(|e| format!("{}: {e}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        interactions = catalog.len(),
        rules = doc.navigation.len(),
        "bundle loaded"
    );
    Ok(Bundle {
        config: doc.engine,
        catalog,
        rules: doc.navigation,
    })
}

/// Number of options an interaction presents.
fn option_count(interaction: &Interaction) -> usize {
    match interaction.kind {
        InteractionKind::OneStep | InteractionKind::EndPoint => interaction.detailed_responses.len(),
        InteractionKind::TwoStep => {
            interaction.understanding_check.len() + interaction.detailed_responses.len()
        }
        InteractionKind::Reorder => interaction.reord_segments.len(),
        InteractionKind::Multichoice => interaction.multi_choice_option.len(),
        InteractionKind::Dialogue => interaction.lines.len(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
