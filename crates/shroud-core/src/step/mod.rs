/*!
# Obfuscation Steps

Every pass implements [`Step`] and is registered in [`STEPS`] through a
[`StepDescriptor`], which carries its static metadata, its settings schema
and a constructor taking validated [`Settings`].

Lifecycle of one run: `build(settings)` → `init()` once → `apply(ast)` once.
`apply` consumes the step, so nothing carries over to the next tree.

## Example Usage

```rust
use shroud_core::ast::Ast;
use shroud_core::random::Random;
use shroud_core::step::find_step;

let descriptor = find_step("NumbersToExpressions").unwrap();
let settings = descriptor.validate(&serde_json::Map::new()).unwrap();
let mut step = descriptor.instantiate(&settings).unwrap();
step.init().unwrap();

let mut ast = Ast::new();
step.apply(&mut ast, &mut Random::seeded(1)).unwrap();
```
*/

pub mod numbers_to_expressions;
pub mod settings;

pub use numbers_to_expressions::NumbersToExpressions;
pub use settings::{SettingDescriptor, SettingType, SettingValue, Settings};

use std::fmt;

use serde_json::{Map, Value};

use crate::ast::Ast;
use crate::errors::ConfigError;
use crate::random::Random;

/// A named, independently configurable obfuscation pass.
///
/// Steps must not assume that any other step ran before them, and must leave
/// already-folded constants in a form they would accept again.
pub trait Step {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// One-time setup that does not depend on any particular tree.
    fn init(&mut self) -> crate::Result<()> {
        Ok(())
    }

    /// Rewrite `ast` in place through the traversal engine.
    fn apply(self: Box<Self>, ast: &mut Ast, random: &mut Random) -> crate::Result<()>;
}

/// Static registration record of a step.
#[derive(Clone, Copy)]
pub struct StepDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub settings: &'static [SettingDescriptor],
    pub build: fn(&Settings) -> Result<Box<dyn Step>, ConfigError>,
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl StepDescriptor {
    /// Merge `overrides` over the defaults and check every option.
    pub fn validate(&self, overrides: &Map<String, Value>) -> Result<Settings, ConfigError> {
        settings::validate(self.name, self.settings, overrides)
    }

    pub fn instantiate(&self, settings: &Settings) -> Result<Box<dyn Step>, ConfigError> {
        (self.build)(settings)
    }
}

/// Every step the pipeline can run.
pub static STEPS: &[StepDescriptor] = &[numbers_to_expressions::DESCRIPTOR];

pub fn find_step(name: &str) -> Option<&'static StepDescriptor> {
    STEPS.iter().find(|descriptor| descriptor.name == name)
}

/// Like [`find_step`], with an error naming the missing step.
pub fn require_step(name: &str) -> Result<&'static StepDescriptor, ConfigError> {
    find_step(name).ok_or_else(|| ConfigError::UnknownStep {
        step: name.to_string(),
    })
}
