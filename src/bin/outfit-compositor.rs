use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "outfit-compositor", version)]
struct Cli {
    /// Log per-stage details.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite item photos into one outfit silhouette and store it in the cache.
    Compose(ComposeArgs),
    /// Delete cached composites older than a given age.
    Evict(EvictArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Item as `<category>=<path>`; repeat once per category.
    #[arg(long = "item", value_parser = parse_item, required = true)]
    items: Vec<(outfit_compositor::Category, PathBuf)>,

    /// Cache root; composites land in its `outfit_composites` subdirectory.
    #[arg(long)]
    cache_dir: PathBuf,

    /// Optional JSON configuration overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also copy the composite to this path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the composite report as JSON on stdout.
    #[arg(long)]
    report: bool,
}

#[derive(Parser, Debug)]
struct EvictArgs {
    /// Cache root passed to `compose`.
    #[arg(long)]
    cache_dir: PathBuf,

    /// Files at least this old are deleted.
    #[arg(long)]
    max_age_secs: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Evict(args) => cmd_evict(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn parse_item(s: &str) -> Result<(outfit_compositor::Category, PathBuf), String> {
    let (category, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <category>=<path>, got '{s}'"))?;
    if path.is_empty() {
        return Err(format!("missing path for '{category}'"));
    }
    let category = category
        .parse::<outfit_compositor::Category>()
        .map_err(|e| e.to_string())?;
    Ok((category, PathBuf::from(path)))
}

fn read_config(path: Option<&Path>) -> anyhow::Result<outfit_compositor::CompositorConfig> {
    let cfg = match path {
        Some(p) => outfit_compositor::CompositorConfig::from_json_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => outfit_compositor::CompositorConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;

    let mut items = BTreeMap::new();
    for (category, path) in args.items {
        if let Some(prev) = items.insert(category, path) {
            eprintln!(
                "warning: {category} given more than once; ignoring '{}'",
                prev.display()
            );
        }
    }

    let compositor = outfit_compositor::Compositor::new(cfg);
    let cache = outfit_compositor::CompositeCache::new(&args.cache_dir);
    let output = match compositor.compose_to_cache(&items, &cache) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    for skip in &output.report.skipped {
        eprintln!(
            "skipped {} '{}': {}",
            skip.category,
            skip.path.display(),
            skip.reason
        );
    }

    if let Some(out) = &args.out {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::copy(&output.path, out).with_context(|| {
            format!(
                "copy '{}' to '{}'",
                output.path.display(),
                out.display()
            )
        })?;
        eprintln!("wrote {}", out.display());
    }

    println!("{}", output.path.display());
    if args.report {
        let json =
            serde_json::to_string_pretty(&output.report).context("serialize composite report")?;
        println!("{json}");
    }
    Ok(())
}

fn cmd_evict(args: EvictArgs) -> anyhow::Result<()> {
    let cache = outfit_compositor::CompositeCache::new(&args.cache_dir);
    let stats = cache.evict_older_than(Duration::from_secs(args.max_age_secs));
    println!(
        "scanned {} deleted {} freed {} bytes failed {}",
        stats.scanned, stats.deleted, stats.bytes_freed, stats.failed
    );
    Ok(())
}
