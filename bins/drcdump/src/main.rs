use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use drctech::{DrcConfig, DrcSection, DrcTech, RecordedSection, TechDesc};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    drcdump(args)
}

/// Arguments to [`drcdump`].
#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "Compile the DRC section of a technology and print the resulting rules table"
)]
pub struct Args {
    /// A TOML description of the planes, layers and contacts of the technology.
    tech: PathBuf,
    /// The DRC section, one rule per line.
    drc: PathBuf,
    /// A TOML file of DRC compiler options.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// The style to compile instead of the first declared style.
    #[arg(short, long)]
    style: Option<String>,
    /// Rescale the compiled rules by a lambda ratio, written `n/d`.
    #[arg(short, long, value_parser = parse_lambda)]
    lambda: Option<(i32, i32)>,
    /// Keep redundant rules in the table.
    #[arg(long)]
    no_optimize: bool,
    /// Print rule statistics instead of the rules table.
    #[arg(long)]
    stats: bool,
    /// Print the declared styles.
    #[arg(long)]
    styles: bool,
}

fn parse_lambda(s: &str) -> anyhow::Result<(i32, i32)> {
    let (n, d) = s.split_once('/').unwrap_or((s, "1"));
    let n: i32 = n.trim().parse().with_context(|| format!("bad numerator in `{s}`"))?;
    let d: i32 = d.trim().parse().with_context(|| format!("bad denominator in `{s}`"))?;
    if n <= 0 || d <= 0 {
        return Err(anyhow!("lambda must be positive, found `{s}`"));
    }
    Ok((n, d))
}

/// Compile the DRC section described by `args` and print the result to stdout.
pub fn drcdump(args: Args) -> anyhow::Result<()> {
    let tech = TechDesc::from_file(&args.tech)
        .with_context(|| format!("Failed to read technology from {:?}.", args.tech))?
        .build()
        .with_context(|| "Failed to build technology.")?;
    let mut config = match &args.config {
        Some(path) => DrcConfig::from_file(path)
            .with_context(|| format!("Failed to read DRC options from {:?}.", path))?,
        None => DrcConfig::default(),
    };
    if args.no_optimize {
        config.rule_optimization = false;
    }

    let text = std::fs::read_to_string(&args.drc)
        .with_context(|| format!("Failed to read DRC section from {:?}.", args.drc))?;
    let mut section = RecordedSection::new();
    section.push_text(&text);
    if let Some((n, d)) = args.lambda {
        section = section.with_lambda(n, d);
    }

    let mut drc = DrcTech::new(tech, config);
    drc.begin_section();
    for line in section.lines() {
        if !drc.tech_line(line.as_slice()) {
            break;
        }
    }
    drc.finish();
    tracing::info!(
        lines = section.lines().len(),
        styles = drc.style_names().count(),
        "compiled DRC section"
    );
    if let Some((n, d)) = args.lambda {
        drc.rescale(n, d);
    }
    if let Some(style) = &args.style {
        drc.set_style(style, &section);
    }

    let issues = drc.take_issues();
    for issue in issues.iter() {
        eprintln!("{}: {}", issue.severity(), issue);
        if let Some(help) = issue.help() {
            eprintln!("  help: {}", help);
        }
    }

    let mut stdout = io::stdout().lock();
    if args.styles {
        drc.print_styles(&mut stdout, false, true, true)?;
    }
    if args.stats {
        if let Some(stats) = drc.rule_stats() {
            write!(stdout, "{}", stats)?;
        }
    } else {
        drc.write_rules_table(&mut stdout)
            .with_context(|| "Failed to write rules table.")?;
    }

    if issues.has_error() {
        return Err(anyhow!(
            "DRC section has {} error(s)",
            issues.num_errors()
        ));
    }
    Ok(())
}
