use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sectorgen_common::Tile;
use sectorgen_layout::{GeneratorConfig, WorldGenerator};
use sectorgen_tools::LayoutInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sectorgen-cli", about = "CLI tool for sector layout generation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective generator config as JSON
    Config {
        #[command(flatten)]
        settings: Settings,
    },
    /// Generate a layout and print it as ASCII
    Generate {
        #[command(flatten)]
        settings: Settings,
        /// RNG seed; the same seed reproduces the same layout
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Print only the summary line
        #[arg(short, long)]
        quiet: bool,
    },
    /// Generate and verify layouts over a range of seeds
    Survey {
        #[command(flatten)]
        settings: Settings,
        /// First seed of the range
        #[arg(long, default_value = "0")]
        from: u64,
        /// Number of seeds to generate
        #[arg(short = 'n', long, default_value = "100")]
        count: u64,
    },
}

/// Generator settings: an optional JSON file, then per-field overrides.
#[derive(Args)]
struct Settings {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Grid width in tiles
    #[arg(long)]
    width: Option<u32>,
    /// Grid height in tiles
    #[arg(long)]
    height: Option<u32>,
    /// Minimum sector width
    #[arg(long)]
    min_width: Option<u32>,
    /// Minimum sector height
    #[arg(long)]
    min_height: Option<u32>,
    /// Number of split attempts
    #[arg(long)]
    attempts: Option<u32>,
}

impl Settings {
    fn resolve(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("opening config {}", path.display()))?;
                serde_json::from_reader(file)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => GeneratorConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(min_width) = self.min_width {
            config.min_sector_width = min_width;
        }
        if let Some(min_height) = self.min_height {
            config.min_sector_height = min_height;
        }
        if let Some(attempts) = self.attempts {
            config.split_attempts = attempts;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("sectorgen-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("layout: {}", sectorgen_layout::crate_info());
            println!("tools: {}", sectorgen_tools::crate_info());
            let defaults = GeneratorConfig::default();
            println!(
                "defaults: {}x{} min={}x{} attempts={}",
                defaults.width,
                defaults.height,
                defaults.min_sector_width,
                defaults.min_sector_height,
                defaults.split_attempts
            );
        }
        Commands::Config { settings } => {
            let config = settings.resolve()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Generate {
            settings,
            seed,
            quiet,
        } => {
            let config = settings.resolve()?;
            let generator = WorldGenerator::new(config);
            let mut rng = StdRng::seed_from_u64(seed);
            let layout = generator.generate(&mut rng)?;

            if !quiet {
                print!("{}", LayoutInspector::render_ascii(layout.grid()));
                println!(
                    "legend: '{}' wall, '{}' open, '{}' gate",
                    Tile::Wall,
                    Tile::Open,
                    Tile::Gate
                );
            }
            println!("seed={seed} {}", LayoutInspector::summary(&layout));
            LayoutInspector::verify(&layout).context("generated layout failed verification")?;
        }
        Commands::Survey {
            settings,
            from,
            count,
        } => {
            let config = settings.resolve()?;
            tracing::info!(from, count, ?config, "starting survey");
            let generator = WorldGenerator::new(config);
            let mut sector_counts = Vec::new();

            for seed in from..from.saturating_add(count) {
                let mut rng = StdRng::seed_from_u64(seed);
                let layout = generator
                    .generate(&mut rng)
                    .with_context(|| format!("seed {seed}"))?;
                LayoutInspector::verify(&layout).with_context(|| format!("seed {seed}"))?;
                if !LayoutInspector::is_fully_connected(layout.grid()) {
                    anyhow::bail!("seed {seed}: layout is not fully connected");
                }
                tracing::debug!(
                    seed,
                    sectors = layout.sector_count(),
                    connections = layout.connections().len(),
                    "seed verified"
                );
                sector_counts.push(layout.sector_count());
            }

            let Some(min) = sector_counts.iter().min() else {
                println!("Survey: no seeds generated");
                return Ok(());
            };
            let max = sector_counts.iter().max().unwrap_or(min);
            let avg = sector_counts.iter().sum::<usize>() as f64 / sector_counts.len() as f64;
            println!(
                "Survey: seeds={}..{} sectors min={min} avg={avg:.1} max={max} all verified",
                from,
                from.saturating_add(count)
            );
        }
    }

    Ok(())
}
