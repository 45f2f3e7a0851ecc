use std::path::Path;

use comfy_table::{ContentArrangement, Table};

pub fn run(path: &Path, kind: Option<&str>) -> Result<(), String> {
    let bundle = super::load_bundle(path)?;

    let interactions: Vec<_> = bundle
        .catalog
        .interactions()
        .iter()
        .filter(|i| kind.is_none_or(|k| i.kind.as_str() == k))
        .collect();

    if interactions.is_empty() {
        println!("  No interactions found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Kind", "Character", "Options", "Rules"]);

    for interaction in &interactions {
        let character = if interaction.npc.character_name.is_empty() {
            "-".to_string()
        } else {
            interaction.npc.character_name.clone()
        };
        let rules = bundle
            .rules
            .iter()
            .filter(|(_, rule)| rule.interaction_id == interaction.id)
            .count();

        table.add_row(vec![
            interaction.id.to_string(),
            interaction.kind.to_string(),
            character,
            super::option_count(interaction).to_string(),
            rules.to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} interaction{}",
        interactions.len(),
        super::plural(interactions.len())
    );

    Ok(())
}
