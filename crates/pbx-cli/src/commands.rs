use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use tracing::debug;

use pbx_sdk::{
    diff_text, CodecConfig, Decoder, Line, ObjectChange, ProjectFile,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let ctx = Ctx {
        decoder: Decoder::new(config.decode.clone()),
        config,
        format: cli.format,
    };
    match cli.command {
        Command::Check(args) => cmd_check(&ctx, args),
        Command::Dump(args) => cmd_dump(&ctx, args),
        Command::Regen(args) => cmd_regen(&ctx, args),
        Command::Diff(args) => cmd_diff(&ctx, args),
        Command::Stats(args) => cmd_stats(&ctx, args),
    }
}

struct Ctx {
    decoder: Decoder,
    config: CodecConfig,
    format: OutputFormat,
}

impl Ctx {
    fn open(&self, path: &Path) -> anyhow::Result<ProjectFile> {
        ProjectFile::open_with(path, &self.decoder)
            .with_context(|| format!("failed to read {}", path.display()))
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CodecConfig> {
    let Some(path) = path else {
        return Ok(CodecConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: CodecConfig = toml::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(?config, "config loaded");
    Ok(config)
}

fn cmd_check(ctx: &Ctx, args: PathArgs) -> anyhow::Result<()> {
    let mut project = ctx.open(&args.path)?;
    let first = project.encode(&ctx.config.output)?;
    let mut reread = ProjectFile::from_bytes_with(first.as_bytes(), &ctx.decoder)?;
    if let Some(name) = project.name() {
        reread.set_name(name)?;
    }
    let equal = reread == project;
    let second = reread.encode(&ctx.config.output)?;
    let stable = second == first;

    let objects = project.document().objects().len();
    println!("{} {} objects", "Decoded".bold(), objects);
    report("round trip preserves the graph", equal);
    report("encoding is byte-stable", stable);
    let dangling = project.document().objects().dangling_references();
    if !dangling.is_empty() {
        println!("{} {} dangling references", "!".yellow().bold(), dangling.len());
        for (owner, attribute, target) in dangling.iter().take(10) {
            println!("  {} {} -> {}", owner.to_string().dimmed(), attribute, target.to_string().yellow());
        }
    }
    if !(equal && stable) {
        bail!("{} did not survive a round trip", args.path.display());
    }
    Ok(())
}

fn report(what: &str, ok: bool) {
    if ok {
        println!("{} {}", "✓".green().bold(), what);
    } else {
        println!("{} {}", "✗".red().bold(), what);
    }
}

fn cmd_dump(ctx: &Ctx, args: PathArgs) -> anyhow::Result<()> {
    let mut project = ctx.open(&args.path)?;
    match ctx.format {
        OutputFormat::Text => print!("{}", project.encode(&ctx.config.output)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&project.to_json()?)?),
    }
    Ok(())
}

fn cmd_regen(ctx: &Ctx, args: RegenArgs) -> anyhow::Result<()> {
    let mut project = ctx.open(&args.path)?;
    project.document_mut().invalidate_all_identifiers();
    let destination = args.output.unwrap_or(args.path);
    let written = project.write(&destination, args.force, &ctx.config.output)?;
    println!(
        "{} Regenerated {} identifiers into {}",
        "✓".green().bold(),
        project.document().objects().len(),
        written.display().to_string().bold()
    );
    Ok(())
}

fn cmd_diff(ctx: &Ctx, args: DiffArgs) -> anyhow::Result<()> {
    let mut old = ctx.open(&args.old)?;
    let mut new = ctx.open(&args.new)?;
    if args.text {
        let before = old.encode(&ctx.config.output)?;
        let after = new.encode(&ctx.config.output)?;
        let changes = diff_text(&before, &after, 3);
        if changes.is_empty() {
            println!("No changes.");
        }
        for hunk in &changes.hunks {
            println!("{}", format!("@@ -{} +{} @@", hunk.old_start, hunk.new_start).cyan());
            for line in &hunk.lines {
                match line {
                    Line::Context(text) => println!(" {text}"),
                    Line::Added(text) => println!("{}", format!("+{text}").green()),
                    Line::Removed(text) => println!("{}", format!("-{text}").red()),
                }
            }
        }
        return Ok(());
    }

    let diff = old.diff(&new);
    if diff.is_empty() {
        println!("No changes.");
        return Ok(());
    }
    for key in &diff.header {
        println!("{} {}", "~".yellow(), key.bold());
    }
    for change in &diff.changes {
        match change {
            ObjectChange::Added { id, isa } => {
                println!("{} {} {}", "+".green(), id.to_string().green(), isa)
            }
            ObjectChange::Removed { id, isa } => {
                println!("{} {} {}", "-".red(), id.to_string().red(), isa)
            }
            ObjectChange::Modified { id, isa, attributes } => println!(
                "{} {} {} ({})",
                "~".yellow(),
                id.to_string().yellow(),
                isa,
                attributes.join(", ")
            ),
        }
    }
    println!(
        "{} added, {} removed, {} modified",
        diff.additions(),
        diff.removals(),
        diff.modifications()
    );
    Ok(())
}

fn cmd_stats(ctx: &Ctx, args: PathArgs) -> anyhow::Result<()> {
    let project = ctx.open(&args.path)?;
    let stats = project.stats();
    match ctx.format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = stats
                .iter()
                .map(|(kind, count)| (kind.as_str().to_string(), (*count).into()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Text => {
            if let Some(name) = project.name() {
                println!("Project {}", name.bold());
            }
            for (kind, count) in &stats {
                println!("  {:<24} {}", kind.as_str(), count.to_string().cyan());
            }
            println!("  {:<24} {}", "total", project.document().objects().len().to_string().bold());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbx_sdk::{OutputStyle, UnknownObjectPolicy};

    #[test]
    fn config_defaults_without_file() {
        assert_eq!(load_config(None).unwrap(), CodecConfig::default());
    }

    #[test]
    fn config_reads_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pbx.toml");
        fs::write(
            &path,
            "[decode]\nworkers = 2\nunknown_objects = \"reject\"\n\n[output]\nstyle = \"expanded\"\n",
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.decode.workers, 2);
        assert_eq!(config.decode.unknown_objects, UnknownObjectPolicy::Reject);
        assert_eq!(config.output.style, OutputStyle::Expanded);
        assert!(config.output.comments);
    }
}
