use std::path::Path;

use colored::Colorize;
use rh_core::{DialogueLine, InteractionId, ResponseCandidate};

pub fn run(path: &Path, id: u32) -> Result<(), String> {
    let bundle = super::load_bundle(path)?;
    let interaction = bundle
        .catalog
        .get(InteractionId(id))
        .map_err(|e| e.to_string())?;

    println!(
        "  {} [{}]",
        format!("#{}", interaction.id).bold(),
        interaction.kind.to_string().dimmed()
    );
    if !interaction.npc.character_name.is_empty() {
        println!("  {}: {}", interaction.npc.character_name.cyan(), interaction.npc.text);
    }

    print_candidates("Understanding check", &interaction.understanding_check);
    print_candidates("Responses", &interaction.detailed_responses);

    if !interaction.reord_segments.is_empty() {
        println!();
        println!("  {}", "Segments".bold().underline());
        for segment in &interaction.reord_segments {
            println!("    [{}]", segment.text);
        }
    }

    if !interaction.multi_choice_option.is_empty() {
        println!();
        println!("  {}", "Rows".bold().underline());
        for row in &interaction.multi_choice_option {
            println!("    {} {}", row.text, format!("({:?})", row.expected_response).dimmed());
        }
    }

    if !interaction.lines.is_empty() {
        println!();
        println!("  {}", "Lines".bold().underline());
        for (n, line) in interaction.lines.iter().enumerate() {
            match line {
                DialogueLine::Fixed(u) => println!("    {n}. {}", u.text),
                DialogueLine::Dynamic {
                    source_interaction,
                    dynamic_variants,
                } => println!(
                    "    {n}. {}",
                    format!(
                        "(varies with #{source_interaction}: {} variants)",
                        dynamic_variants.len()
                    )
                    .dimmed()
                ),
            }
        }
    }

    if !interaction.content_sets.is_empty() {
        let keys: Vec<&str> = interaction.content_sets.keys().map(String::as_str).collect();
        println!();
        println!("  Content sets: {}", keys.join(", "));
    }

    let rules: Vec<_> = bundle
        .rules
        .iter()
        .filter(|(_, rule)| rule.interaction_id == interaction.id)
        .collect();
    if !rules.is_empty() {
        println!();
        println!("  {}", "Navigation".bold().underline());
        for (kind, rule) in rules {
            let endpoint = if rule.endpoint == Some(true) { "end" } else { "continue" };
            let slot = match (rule.slot.and_then(|s| bundle.rules.slot_name(s)), rule.value) {
                (Some(name), Some(value)) => format!(", {name} = {value}"),
                _ => String::new(),
            };
            println!("    {kind:<12} {:<14} -> {endpoint}{slot}", rule.when.to_string());
        }
    }

    Ok(())
}

fn print_candidates(title: &str, candidates: &[ResponseCandidate]) {
    if candidates.is_empty() {
        return;
    }
    println!();
    println!("  {}", title.bold().underline());
    for candidate in candidates {
        let id = candidate.id.map(|i| i.to_string()).unwrap_or_else(|| "-".into());
        let labels: Vec<&str> = [
            candidate.topic.as_deref(),
            candidate.function.as_deref(),
            candidate.tone.as_deref(),
            candidate.formality.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        println!(
            "    {id:>3}  {}  {}",
            candidate.text,
            labels.join(" / ").dimmed()
        );
    }
}
