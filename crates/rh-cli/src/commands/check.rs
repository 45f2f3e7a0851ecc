use std::path::Path;

use colored::Colorize;

pub fn run(path: &Path) -> Result<(), String> {
    let bundle = super::load_bundle(path)?;
    let issues = bundle.catalog.validate(&bundle.rules);

    if issues.is_empty() {
        println!("  All checks passed.");
        println!(
            "  {} interactions, {} navigation rules, {} characters",
            bundle.catalog.len(),
            bundle.rules.len(),
            bundle.catalog.characters().len()
        );
        return Ok(());
    }

    for issue in &issues {
        eprintln!("  {} {issue}", "error:".red().bold());
    }
    Err(format!(
        "{} issue{} found",
        issues.len(),
        super::plural(issues.len())
    ))
}
