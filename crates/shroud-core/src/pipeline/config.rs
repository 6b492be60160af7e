/*!
# Pipeline Configuration

Preset format and the built-in presets. Keys are PascalCase:

```json
{
  "LanguageDialect": "LuaU",
  "NameGenerator": "MangledShuffled",
  "PrettyPrint": false,
  "Seed": 0,
  "Steps": [
    { "Name": "NumbersToExpressions", "Settings": { "Treshold": 0.5 } }
  ]
}
```
*/

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::ast::LanguageDialect;
use crate::errors::ConfigError;
use crate::names::NameGeneratorKind;

/// One entry of the step list. A step name may appear more than once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StepConfig {
    pub name: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl StepConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: Map::new(),
        }
    }

    /// Set one option override.
    pub fn with(mut self, option: &str, value: impl Into<Value>) -> Self {
        self.settings.insert(option.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineConfig {
    #[serde(default)]
    pub language_dialect: LanguageDialect,
    #[serde(default)]
    pub name_generator: NameGeneratorKind,
    #[serde(default)]
    pub pretty_print: bool,
    /// `<= 0` seeds from the clock.
    #[serde(default)]
    pub seed: i64,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Built-in presets, from no obfuscation at all to the heaviest setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Minify,
    Weak,
    Medium,
    Strong,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Minify, Preset::Weak, Preset::Medium, Preset::Strong];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Minify => "Minify",
            Preset::Weak => "Weak",
            Preset::Medium => "Medium",
            Preset::Strong => "Strong",
        }
    }

    pub fn config(self) -> PipelineConfig {
        let numbers = |treshold: f64, internal: f64| {
            StepConfig::new("NumbersToExpressions")
                .with("Treshold", json!(treshold))
                .with("InternalTreshold", json!(internal))
        };
        let steps = match self {
            Preset::Minify => Vec::new(),
            Preset::Weak => vec![numbers(0.5, 0.1)],
            Preset::Medium => vec![numbers(1.0, 0.2)],
            Preset::Strong => vec![numbers(1.0, 0.4), numbers(0.5, 0.2)],
        };
        PipelineConfig {
            language_dialect: LanguageDialect::Lua51,
            name_generator: match self {
                Preset::Minify => NameGeneratorKind::Mangled,
                _ => NameGeneratorKind::MangledShuffled,
            },
            pretty_print: false,
            seed: 0,
            steps,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownPreset {
                preset: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_config() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "LanguageDialect": "LuaU",
                "NameGenerator": "Mangled",
                "PrettyPrint": true,
                "Seed": 42,
                "Steps": [
                    { "Name": "NumbersToExpressions", "Settings": { "Treshold": 0.5 } },
                    { "Name": "NumbersToExpressions" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.language_dialect, LanguageDialect::LuaU);
        assert_eq!(config.name_generator, NameGeneratorKind::Mangled);
        assert!(config.pretty_print);
        assert_eq!(config.seed, 42);
        assert_eq!(
            config.steps,
            vec![
                StepConfig::new("NumbersToExpressions").with("Treshold", 0.5),
                StepConfig::new("NumbersToExpressions"),
            ]
        );
    }

    #[test]
    fn test_missing_keys_default() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.language_dialect, LanguageDialect::Lua51);
        assert_eq!(config.name_generator, NameGeneratorKind::Identity);
    }

    #[test]
    fn test_malformed_config_is_json_error() {
        let err = PipelineConfig::from_json_str(r#"{"Steps": 3}"#).unwrap_err();
        assert!(matches!(err, crate::ShroudError::Json(_)));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = Preset::Strong.config();
        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"InternalTreshold\""));
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_preset_names() {
        assert_eq!("strong".parse::<Preset>().unwrap(), Preset::Strong);
        assert_eq!("Minify".parse::<Preset>().unwrap(), Preset::Minify);
        assert_eq!(
            "Extreme".parse::<Preset>().unwrap_err(),
            ConfigError::UnknownPreset {
                preset: "Extreme".to_string()
            }
        );
        for preset in Preset::ALL {
            assert_eq!(preset.to_string().parse::<Preset>().unwrap(), preset);
        }
    }

    #[test]
    fn test_strong_runs_expansion_twice() {
        let names: Vec<String> = Preset::Strong
            .config()
            .steps
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["NumbersToExpressions".to_string(); 2]);
        assert!(Preset::Minify.config().steps.is_empty());
    }
}
