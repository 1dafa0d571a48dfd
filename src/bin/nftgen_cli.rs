//! NftGen CLI - Interactive Generator
//!
//! Commands: shell (default), generate
//! Logs go to stderr; artifact listings go to stdout

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use nftgen_core::{
    command::HELP, AttributeDocument, Command, DirectoryStore, GenerationPipeline, GlobalConfig,
    ENGINE_VERSION,
};

#[derive(Parser)]
#[command(name = "nftgen-cli")]
#[command(about = "NftGen CLI - Layered collectible image generator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global configuration file (.toml or .json)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Attribute configuration file (.toml or .json)
    #[arg(short, long, default_value = "attributes.toml")]
    attributes: PathBuf,

    /// Override the configured output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin until `quit`
    Shell,

    /// Generate artifacts and exit
    Generate {
        /// Number of artifacts
        #[arg(default_value = "1", allow_hyphen_values = true)]
        count: String,
    },
}

type Pipeline = GenerationPipeline<DirectoryStore>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut config = match GlobalConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let document = match AttributeDocument::load(&cli.attributes) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cli.attributes.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let store = DirectoryStore::new(config.assets_dir.clone());
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let pipeline = match GenerationPipeline::new(config, document, store) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell(&pipeline, &mut rng),
        Commands::Generate { count } => {
            match Command::parse(&format!("generate {count}")) {
                Ok(Some(Command::Generate(n))) => generate(&pipeline, n, &mut rng),
                Ok(_) => ExitCode::FAILURE,
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn shell(pipeline: &Pipeline, rng: &mut StdRng) -> ExitCode {
    println!("NftGen {ENGINE_VERSION}. Type ? for the list of commands.");
    println!("Artifacts are written to {}", pipeline.config().output_dir.display());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!(">");
        // A broken stdout only loses the prompt
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Failed to read input: {e}");
                return ExitCode::FAILURE;
            }
            None => return ExitCode::SUCCESS,
        };

        match Command::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => return ExitCode::SUCCESS,
            Ok(Some(Command::Help)) => println!("{HELP}"),
            Ok(Some(Command::Generate(n))) => {
                generate(pipeline, n, rng);
            }
            Err(e) => println!("{e}"),
        }
    }
}

fn generate(pipeline: &Pipeline, count: usize, rng: &mut StdRng) -> ExitCode {
    let result = pipeline.generate_batch(count, rng, |manifest| {
        println!("{}: {}", manifest.name, manifest.property_list());
    });

    match result {
        Ok(report) if report.failed.is_empty() => ExitCode::SUCCESS,
        Ok(report) => {
            for (name, error) in &report.failed {
                eprintln!("Could not save \"{name}\": {error}");
            }
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Generation failed: {e}");
            ExitCode::FAILURE
        }
    }
}
