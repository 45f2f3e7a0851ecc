//! Run a scripted learner session against a bundle.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rh_core::{InteractionId, MemoryStore, ResponseCandidate};
use rh_engine::{
    Completion, EngineError, InteractionEngine, Options, Presentation, ResolvedLine, SpeechError,
    SpeechRequest, SpeechSynthesizer, Submitted,
};
use serde::Deserialize;
use tracing::{debug, info};

type Engine = InteractionEngine<MemoryStore, Transcript>;

/// One scripted learner action.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Enter(u32),
    Choose(usize),
    Respond(ResponseCandidate),
    Payload(String),
    Reorder(String),
    Segments(Vec<usize>),
    Multichoice(Vec<bool>),
    Dialogue,
    Hint,
    Prompt,
}

/// Prints what would be spoken instead of synthesizing it.
struct Transcript;

#[async_trait]
impl SpeechSynthesizer for Transcript {
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError> {
        println!(
            "    {} {}",
            format!("(voice {})", request.voice_id).dimmed(),
            request.text.italic()
        );
        Ok(())
    }

    async fn play_recording(&self, url: &str) -> Result<(), SpeechError> {
        println!("    {} {url}", "(recording)".dimmed());
        Ok(())
    }

    fn stop(&self) {}
}

pub fn run(
    path: &Path,
    script: &Path,
    seed: Option<u64>,
    mute: bool,
    dump: bool,
) -> Result<(), String> {
    let bundle = super::load_bundle(path)?;
    let text = fs::read_to_string(script)
        .map_err(|e| format!("cannot read {}: {e}", script.display()))?;
    let steps: Vec<Step> =
        serde_json::from_str(&text).map_err(|e| format!("{}: {e}", script.display()))?;
    info!(script = %script.display(), steps = steps.len(), "script loaded");

    let mut config = bundle.config;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if mute {
        config = config.with_audio(false);
    }

    let store = Arc::new(MemoryStore::new());
    let engine: Engine = InteractionEngine::new(
        Arc::new(bundle.catalog),
        bundle.rules,
        Arc::clone(&store),
        Arc::new(Transcript),
        config,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("cannot start runtime: {e}"))?;

    runtime.block_on(async {
        engine.start();
        for (n, step) in steps.into_iter().enumerate() {
            debug!(step = n + 1, ?step, "running step");
            run_step(&engine, step)
                .await
                .map_err(|e| format!("step {}: {e}", n + 1))?;
        }
        Ok::<(), String>(())
    })?;

    let standing = engine.standing();
    println!();
    println!("  {} {:.2}", "Overall success".bold(), standing.overall);
    if let Some((character, average)) = &standing.character {
        println!("  {} {:.2}", format!("With {}", character.as_str()).bold(), average);
    }

    if dump {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Key", "Value"]);
        for (key, value) in store.snapshot() {
            table.add_row(vec![key, value.to_string()]);
        }
        println!();
        println!("{table}");
    }

    Ok(())
}

async fn run_step(engine: &Engine, step: Step) -> Result<(), EngineError> {
    match step {
        Step::Enter(id) => print_presentation(&engine.enter(InteractionId(id))?),
        Step::Choose(index) => report(engine, engine.choose(index).await?),
        Step::Respond(candidate) => report(engine, engine.submit_response(candidate).await?),
        Step::Payload(payload) => report(engine, engine.submit_payload(&payload).await?),
        Step::Reorder(sentence) => report(engine, engine.submit_reorder(&sentence).await?),
        Step::Segments(order) => report(engine, engine.submit_reorder_segments(&order).await?),
        Step::Multichoice(picks) => report(engine, engine.submit_multichoice(&picks).await?),
        Step::Dialogue => {
            let run = engine.run_dialogue().await?;
            for line in &run.lines {
                print_line(line);
            }
            if run.finished {
                print_navigation(engine, run.fired);
            } else {
                println!("  {}", "(dialogue interrupted)".dimmed());
            }
        }
        Step::Hint => match engine.hint()? {
            Some(hint) => {
                for line in hint.lines() {
                    println!("  {} {line}", "?".yellow());
                }
            }
            None => println!("  {}", "(no hint)".dimmed()),
        },
        Step::Prompt => {
            engine.play_prompt().await?;
        }
    }
    Ok(())
}

fn print_presentation(p: &Presentation) {
    println!();
    println!(
        "  {} [{}] {}",
        format!("#{}", p.interaction).bold(),
        p.kind.to_string().dimmed(),
        p.stage.to_string().dimmed()
    );
    for line in p.npc_text.lines() {
        println!("  {}: {line}", p.npc_name.cyan());
    }
    match &p.options {
        Options::Candidates(items) => {
            for (i, c) in items.iter().enumerate() {
                println!("    {i}) {}", c.text);
            }
        }
        Options::Segments(items) => {
            let shown: Vec<String> = items.iter().map(|s| format!("[{s}]")).collect();
            println!("    {}", shown.join(" "));
        }
        Options::Grid { headers, rows } => {
            if let Some(h) = headers {
                println!("    {}", format!("{} / {}", h.text_1, h.text_2).dimmed());
            }
            for (i, row) in rows.iter().enumerate() {
                println!("    {i}) {}", row.text);
            }
        }
        Options::Lines(n) => println!("    {}", format!("({n} lines)").dimmed()),
    }
}

fn print_line(line: &ResolvedLine) {
    let speaker = if line.speaker_name.is_empty() {
        "-".to_string()
    } else {
        line.speaker_name.clone()
    };
    let speaker = if line.learner { speaker.green() } else { speaker.cyan() };
    for text in line.text.lines() {
        println!("  {speaker}: {text}");
    }
}

fn report(engine: &Engine, submitted: Submitted) {
    match submitted {
        Submitted::Repeated => println!("  {}", "(repeat requested)".dimmed()),
        Submitted::Advanced {
            stage,
            score,
            presentation,
        } => {
            println!("  scored {score:.2}, now at {stage}");
            if let Some(p) = presentation {
                print_presentation(&p);
            }
        }
        Submitted::Completed(done) => print_completion(engine, &done),
    }
}

fn print_completion(engine: &Engine, done: &Completion) {
    let mut summary = format!("scored {:.2}", done.score);
    if let Some(tier) = done.tier {
        summary.push_str(&format!(" ({tier})"));
    }
    if let Some(correct) = done.correct {
        summary.push_str(&format!(", {correct} correct"));
    }
    println!("  {}", summary.green());
    if done.retry {
        println!("  {}", "(one more try allowed)".yellow());
    }
    print_navigation(engine, done.fired);
}

fn print_navigation(engine: &Engine, fired: bool) {
    let endpoint = match engine.endpoint() {
        Some(true) => "end",
        Some(false) => "continue",
        None => "unset",
    };
    let rule = if fired { "rule fired" } else { "no rule" };
    println!("  {} {endpoint} ({rule})", "endpoint:".bold());
}
