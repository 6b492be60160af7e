//! Shroud CLI - command-line driver for the shroud Lua obfuscator
//!
//! Reads a JSON-serialized tree, runs a preset or configuration file through
//! the pipeline and writes the obfuscated source.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use shroud_core::{Ast, Pipeline, PipelineConfig, Preset, STEPS};
use tracing::{info, warn};

/// Options collected from the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub input: Option<PathBuf>,
    pub preset: Option<String>,
    pub config: Option<PathBuf>,
    pub seed: Option<i64>,
    pub out: Option<PathBuf>,
    pub pretty: bool,
    pub list_steps: bool,
}

pub fn build_command() -> Command {
    Command::new("shroud")
        .version(shroud_core::VERSION)
        .about("Obfuscates Lua 5.1 and Luau programs")
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .help("JSON-serialized syntax tree to obfuscate")
                .index(1)
                .required_unless_present("list-steps"),
        )
        .arg(
            Arg::new("preset")
                .long("preset")
                .value_name("NAME")
                .help("Built-in preset: Minify, Weak, Medium or Strong")
                .conflicts_with("config"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON pipeline configuration"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .help("Random seed; 0 or less seeds from the clock")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .short('o')
                .value_name("FILE")
                .help("Write the result here instead of stdout"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .help("Indent the generated source")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-steps")
                .long("list-steps")
                .help("List every step with its settings and exit")
                .action(ArgAction::SetTrue),
        )
}

impl CliOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            input: matches.get_one::<String>("input").map(PathBuf::from),
            preset: matches.get_one::<String>("preset").cloned(),
            config: matches.get_one::<String>("config").map(PathBuf::from),
            seed: matches.get_one::<i64>("seed").copied(),
            out: matches.get_one::<String>("out").map(PathBuf::from),
            pretty: matches.get_flag("pretty"),
            list_steps: matches.get_flag("list-steps"),
        }
    }
}

/// Resolve the pipeline configuration: a config file, a preset, or `Minify`.
pub fn load_config(options: &CliOptions) -> Result<PipelineConfig> {
    let mut config = match (&options.config, &options.preset) {
        (Some(path), _) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        (None, Some(name)) => name.parse::<Preset>()?.config(),
        (None, None) => {
            warn!("No preset or configuration given, using Minify");
            Preset::Minify.config()
        }
    };
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    if options.pretty {
        config.pretty_print = true;
    }
    Ok(config)
}

/// Obfuscate the input tree and return the generated source.
pub fn obfuscate(options: &CliOptions) -> Result<String> {
    let input = options
        .input
        .as_ref()
        .context("No input file given")?;
    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut ast: Ast = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a serialized syntax tree", input.display()))?;

    let pipeline = Pipeline::new(load_config(options)?)?;
    let output = pipeline.apply_with_stats(&mut ast)?;
    for step in &output.steps {
        info!("{}: {:?}", step.name, step.elapsed);
    }
    Ok(output.source)
}

/// Human-readable listing of every registered step.
pub fn describe_steps() -> String {
    let mut listing = String::new();
    for step in STEPS {
        let _ = writeln!(listing, "{}", step.name);
        let _ = writeln!(listing, "    {}", step.description);
        for setting in step.settings {
            let default = serde_json::to_string(&setting.default).unwrap_or_default();
            let _ = writeln!(
                listing,
                "    {}: {} (default {}) {}",
                setting.name, setting.kind, default, setting.description
            );
        }
    }
    listing
}

/// Execute one command-line invocation.
pub fn run(options: &CliOptions) -> Result<()> {
    if options.list_steps {
        print!("{}", describe_steps());
        return Ok(());
    }

    let source = obfuscate(options)?;
    match &options.out {
        Some(path) => {
            fs::write(path, &source)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} bytes to {}", source.len(), path.display());
        }
        None => println!("{source}"),
    }
    Ok(())
}
