//! brmstan CLI: Stan code, Stan data and fits from brms formulas.

mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use commands::ModelArgs;
use config::BrmstanConfig;

#[derive(Parser)]
#[command(name = "brmstan", version, about = "Stan programs and fits from brms formulas")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); BRMSTAN_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Stan program brms generates for a model
    Code {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Print the Stan data for a model, coerced to the declared types
    Data {
        #[command(flatten)]
        model: ModelArgs,
        /// Write the JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build and sample a model
    Fit {
        #[command(flatten)]
        model: ModelArgs,
        /// Sampling backend (cmdstanpy, pystan)
        #[arg(long)]
        backend: Option<String>,
        /// Build the model but do not sample
        #[arg(long)]
        no_sample: bool,
        /// Backend argument as key=value (repeatable), e.g. --arg chains=2
        #[arg(long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,
        /// Write all draws as JSON here instead of printing a summary
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fetch a dataset shipped with brms as JSON records
    Dataset {
        /// Dataset name, e.g. epilepsy
        name: String,
        /// Write the JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Report R, brms and backend availability
    Doctor,
    /// Write a default brmstan.toml in the current directory
    Init {
        /// Overwrite an existing brmstan.toml
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_env(env_logger::Env::new().filter("BRMSTAN_LOG"));
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())
    });
    let _ = builder.try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { force } => commands::init::run(&cwd, force),

        Commands::Doctor => commands::doctor::run(&cwd),

        Commands::Code { model } => {
            let (config, config_dir) = load_config(&cwd)?;
            commands::code::run(&config, &config_dir, &model)
        }

        Commands::Data { model, output } => {
            let (config, config_dir) = load_config(&cwd)?;
            commands::data::run(&config, &config_dir, &model, output.as_deref())
        }

        Commands::Fit {
            model,
            backend,
            no_sample,
            args,
            output,
        } => {
            let (config, config_dir) = load_config(&cwd)?;
            commands::fit::run(
                &config,
                &config_dir,
                &model,
                backend.as_deref(),
                !no_sample,
                &args,
                output.as_deref(),
            )
        }

        Commands::Dataset { name, output } => {
            let (config, config_dir) = load_config(&cwd)?;
            commands::dataset::run(&config, &config_dir, &name, output.as_deref())
        }
    }
}

/// The nearest `brmstan.toml`, or defaults rooted at `cwd`.
fn load_config(cwd: &Path) -> anyhow::Result<(BrmstanConfig, PathBuf)> {
    match BrmstanConfig::find_and_load(cwd)? {
        Some((config, dir)) => Ok((config, dir)),
        None => Ok((BrmstanConfig::default(), cwd.to_path_buf())),
    }
}
