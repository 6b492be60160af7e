/*!
# Pipeline

Runs the configured steps over one tree, assigns names and generates the
obfuscated source.

Every step's settings are validated in [`Pipeline::new`], so a bad
configuration fails before any tree is touched. Each run seeds a fresh
[`Random`] from the configured seed and hands it to every step in turn.

## Example Usage

```rust
use shroud_core::{Ast, Pipeline, Preset};

let mut config = Preset::Medium.config();
config.seed = 7;
let pipeline = Pipeline::new(config).unwrap();

let mut ast = Ast::new();
let source = pipeline.apply(&mut ast).unwrap();
assert_eq!(source, "");
```
*/

pub mod config;

pub use config::{PipelineConfig, Preset, StepConfig};

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::ast::{Ast, SourceGenerator};
use crate::errors::ConfigError;
use crate::names::assign_names;
use crate::random::{clock_seed, Random};
use crate::step::{require_step, Settings, StepDescriptor};

/// Timing of one step run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepStats {
    pub name: String,
    pub elapsed: Duration,
}

/// Result of [`Pipeline::apply_with_stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub source: String,
    pub seed: u64,
    pub steps: Vec<StepStats>,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    steps: Vec<(&'static StepDescriptor, Settings)>,
}

impl Pipeline {
    /// Look up and validate every configured step.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let steps = config
            .steps
            .iter()
            .map(|step| {
                let descriptor = require_step(&step.name)?;
                let settings = descriptor.validate(&step.settings)?;
                Ok((descriptor, settings))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { config, steps })
    }

    pub fn from_preset(preset: Preset) -> Result<Self, ConfigError> {
        Self::new(preset.config())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Override the configured seed; `<= 0` seeds from the clock.
    pub fn set_seed(&mut self, seed: i64) {
        self.config.seed = seed;
    }

    pub fn set_pretty_print(&mut self, pretty_print: bool) {
        self.config.pretty_print = pretty_print;
    }

    /// Validated steps in run order.
    pub fn steps(&self) -> impl Iterator<Item = (&'static str, &Settings)> {
        self.steps
            .iter()
            .map(|(descriptor, settings)| (descriptor.name, settings))
    }

    /// Obfuscate `ast` in place and return the generated source.
    pub fn apply(&self, ast: &mut Ast) -> crate::Result<String> {
        Ok(self.apply_with_stats(ast)?.source)
    }

    /// Like [`Pipeline::apply`], with per-step timings. The tree is
    /// validated before the first step runs.
    pub fn apply_with_stats(&self, ast: &mut Ast) -> crate::Result<PipelineOutput> {
        let start = Instant::now();
        ast.validate()?;
        let seed = match self.config.seed {
            seed if seed > 0 => seed as u64,
            _ => clock_seed(),
        };
        let mut random = Random::seeded(seed);
        info!(
            "Applying pipeline: {} step(s), seed {}, {:?}",
            self.steps.len(),
            seed,
            self.config.language_dialect
        );

        let mut stats = Vec::with_capacity(self.steps.len());
        for (descriptor, settings) in &self.steps {
            let step_start = Instant::now();
            let mut step = descriptor.instantiate(settings)?;
            step.init()?;
            step.apply(ast, &mut random)?;
            let elapsed = step_start.elapsed();
            info!("Applied step {} in {:?}", descriptor.name, elapsed);
            stats.push(StepStats {
                name: descriptor.name.to_string(),
                elapsed,
            });
        }

        assign_names(ast, self.config.name_generator, &mut random);
        let source = SourceGenerator::generate(
            ast,
            self.config.language_dialect,
            self.config.pretty_print,
        )?;

        let elapsed = start.elapsed();
        info!("Obfuscation done in {:?}, {} bytes of source", elapsed, source.len());
        Ok(PipelineOutput {
            source,
            seed,
            steps: stats,
            elapsed,
        })
    }
}
