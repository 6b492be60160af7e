/*!
# NumbersToExpressions

Replaces number literals, and multiplication or division of constants, with
deeper trees of `*` and `/` that evaluate to exactly the same value.

```text
local x = 12        -->    local x = 3 * (32 / 8)
```

Recursion stops with probability `1 - InternalTreshold` at every level below
the top one, and unconditionally below depth 15.
*/

use tracing::{debug, trace};

use super::settings::{SettingDescriptor, SettingType, SettingValue, Settings};
use super::{Step, StepDescriptor};
use crate::ast::{Ast, Expression};
use crate::errors::ConfigError;
use crate::random::Random;
use crate::visit::{visit_ast, VisitData, Visitor};

const NAME: &str = "NumbersToExpressions";
const DESCRIPTION: &str =
    "Converts number literals to arithmetic expressions that evaluate to the same value";

/// Deepest level at which a generator may still run.
pub const MAX_DEPTH: usize = 15;
/// Candidate factors and divisors tried per generator.
const ATTEMPTS: usize = 10;
const MAX_OPERAND: i64 = 128;

pub const SETTINGS: &[SettingDescriptor] = &[
    SettingDescriptor {
        name: "Treshold",
        description: "Probability that an eligible number or constant expression is rewritten",
        kind: SettingType::Number {
            min: Some(0.0),
            max: Some(1.0),
        },
        default: SettingValue::Number(1.0),
    },
    SettingDescriptor {
        name: "InternalTreshold",
        description: "Probability of expanding one level deeper",
        kind: SettingType::Number {
            min: Some(0.0),
            max: Some(0.8),
        },
        default: SettingValue::Number(0.2),
    },
];

pub const DESCRIPTOR: StepDescriptor = StepDescriptor {
    name: NAME,
    description: DESCRIPTION,
    settings: SETTINGS,
    build,
};

fn build(settings: &Settings) -> Result<Box<dyn Step>, ConfigError> {
    Ok(Box::new(NumbersToExpressions::new(
        settings.number("Treshold")?,
        settings.number("InternalTreshold")?,
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Generator {
    /// `f * (value / f)`
    Multiplicative,
    /// `(value * d) / d`
    Divisive,
}

#[derive(Debug, Clone)]
pub struct NumbersToExpressions {
    treshold: f64,
    internal_treshold: f64,
    generators: Vec<Generator>,
}

impl NumbersToExpressions {
    pub fn new(treshold: f64, internal_treshold: f64) -> Self {
        Self {
            treshold,
            internal_treshold,
            generators: Vec::new(),
        }
    }

    /// Build a tree that evaluates to exactly `value`.
    ///
    /// Always returns a tree at most `MAX_DEPTH + 1` operator levels deep.
    /// When no generator finds an exact split the literal comes back as is.
    pub fn create_number_expression(
        &self,
        value: f64,
        depth: usize,
        random: &mut Random,
    ) -> Expression {
        if depth > MAX_DEPTH || (depth > 0 && random.next_f64() >= self.internal_treshold) {
            return Expression::number(value);
        }
        if value == 0.0 || !value.is_finite() {
            return Expression::number(value);
        }

        let mut order = self.generators.clone();
        random.shuffle(&mut order);
        order
            .into_iter()
            .find_map(|generator| self.generate(generator, value, depth, random))
            .unwrap_or_else(|| Expression::number(value))
    }

    fn generate(
        &self,
        generator: Generator,
        value: f64,
        depth: usize,
        random: &mut Random,
    ) -> Option<Expression> {
        match generator {
            Generator::Multiplicative => {
                for _ in 0..ATTEMPTS {
                    let factor = random.range_inclusive(1, MAX_OPERAND) as f64;
                    let quotient = value / factor;
                    if value % factor == 0.0 && factor * quotient == value {
                        return Some(Expression::mul(
                            self.create_number_expression(factor, depth + 1, random),
                            self.create_number_expression(quotient, depth + 1, random),
                            false,
                        ));
                    }
                }
                None
            }
            Generator::Divisive => {
                for _ in 0..ATTEMPTS {
                    let divisor = random.range_inclusive(1, MAX_OPERAND) as f64;
                    let numerator = value * divisor;
                    if numerator.is_finite() && numerator / divisor == value {
                        return Some(Expression::div(
                            self.create_number_expression(numerator, depth + 1, random),
                            self.create_number_expression(divisor, depth + 1, random),
                            false,
                        ));
                    }
                }
                None
            }
        }
    }
}

/// Value of a tree built only from number literals, `*` and `/`.
///
/// `None` as soon as any other node appears, and for division by a divisor
/// that evaluates to zero.
pub fn evaluate_if_constant(expression: &Expression) -> Option<f64> {
    match expression {
        Expression::Number(n) => Some(*n),
        Expression::Mul { lhs, rhs } => {
            Some(evaluate_if_constant(lhs)? * evaluate_if_constant(rhs)?)
        }
        Expression::Div { lhs, rhs } => {
            let numerator = evaluate_if_constant(lhs)?;
            let divisor = evaluate_if_constant(rhs)?;
            (divisor != 0.0).then(|| numerator / divisor)
        }
        _ => None,
    }
}

impl Step for NumbersToExpressions {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn init(&mut self) -> crate::Result<()> {
        self.generators = vec![Generator::Multiplicative, Generator::Divisive];
        Ok(())
    }

    fn apply(self: Box<Self>, ast: &mut Ast, random: &mut Random) -> crate::Result<()> {
        let mut expander = Expander {
            step: &self,
            random,
            rewrites: 0,
        };
        visit_ast(ast, &mut expander);
        debug!(step = NAME, rewrites = expander.rewrites, "Expanded numbers");
        Ok(())
    }
}

struct Expander<'a> {
    step: &'a NumbersToExpressions,
    random: &'a mut Random,
    rewrites: usize,
}

impl Expander<'_> {
    fn expand(&mut self, value: f64) -> Expression {
        self.rewrites += 1;
        trace!(value, "Expanding number");
        self.step.create_number_expression(value, 0, self.random)
    }
}

impl Visitor for Expander<'_> {
    fn visit_expression(
        &mut self,
        expression: &Expression,
        _data: &VisitData,
    ) -> Option<Expression> {
        match expression {
            Expression::Number(value) => {
                let value = *value;
                self.random
                    .chance(self.step.treshold)
                    .then(|| self.expand(value))
            }
            Expression::Mul { .. } | Expression::Div { .. } => {
                let value = evaluate_if_constant(expression).filter(|v| v.is_finite())?;
                self.random
                    .chance(self.step.treshold)
                    .then(|| self.expand(value))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Statement};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map, Value};

    fn step(treshold: f64, internal_treshold: f64) -> NumbersToExpressions {
        let mut step = NumbersToExpressions::new(treshold, internal_treshold);
        step.init().unwrap();
        step
    }

    fn height(expression: &Expression) -> usize {
        match expression {
            Expression::Mul { lhs, rhs } | Expression::Div { lhs, rhs } => {
                1 + height(lhs).max(height(rhs))
            }
            _ => 0,
        }
    }

    fn program(values: &[Expression]) -> Ast {
        let mut ast = Ast::new();
        let scope = ast.body.scope;
        ast.body = Block::with_statements(
            scope,
            vec![Statement::Return {
                args: values.to_vec(),
            }],
        );
        ast
    }

    fn returned(ast: &Ast) -> &[Expression] {
        match ast.body.statements.as_slice() {
            [Statement::Return { args }] => args,
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_single_level_expansion_of_twelve() {
        let step = step(1.0, 0.0);
        for seed in 0..200 {
            let mut random = Random::seeded(seed);
            let expression = step.create_number_expression(12.0, 0, &mut random);
            match &expression {
                Expression::Mul { lhs, rhs } => {
                    let (Expression::Number(f), Expression::Number(q)) = (&**lhs, &**rhs) else {
                        panic!("operands not literal: {expression:?}");
                    };
                    assert!((1.0..=128.0).contains(f) && f.fract() == 0.0);
                    assert_eq!(f * q, 12.0);
                    assert_eq!(*q, 12.0 / f);
                }
                Expression::Div { lhs, rhs } => {
                    let (Expression::Number(n), Expression::Number(d)) = (&**lhs, &**rhs) else {
                        panic!("operands not literal: {expression:?}");
                    };
                    assert!((1.0..=128.0).contains(d) && d.fract() == 0.0);
                    assert_eq!(*n, 12.0 * d);
                }
                other => panic!("12 was not expanded: {other:?}"),
            }
            assert_eq!(evaluate_if_constant(&expression), Some(12.0));
        }
    }

    #[test]
    fn test_zero_is_never_expanded() {
        let step = step(1.0, 0.8);
        let mut random = Random::seeded(5);
        assert_eq!(
            step.create_number_expression(0.0, 0, &mut random),
            Expression::Number(0.0)
        );
    }

    #[test]
    fn test_non_finite_values_stay_literal() {
        let step = step(1.0, 0.8);
        let mut random = Random::seeded(5);
        assert_eq!(
            step.create_number_expression(f64::INFINITY, 0, &mut random),
            Expression::Number(f64::INFINITY)
        );
        assert!(matches!(
            step.create_number_expression(f64::NAN, 0, &mut random),
            Expression::Number(n) if n.is_nan()
        ));
    }

    #[test]
    fn test_depth_is_bounded() {
        let step = step(1.0, 0.8);
        for seed in 0..50 {
            let mut random = Random::seeded(seed);
            let expression = step.create_number_expression(123456.0, 0, &mut random);
            assert!(height(&expression) <= MAX_DEPTH + 1);
            assert_eq!(evaluate_if_constant(&expression), Some(123456.0));
        }
    }

    #[test]
    fn test_past_the_cap_returns_literal() {
        let step = step(1.0, 0.8);
        let mut random = Random::seeded(1);
        assert_eq!(
            step.create_number_expression(42.0, MAX_DEPTH + 1, &mut random),
            Expression::Number(42.0)
        );
    }

    #[test]
    fn test_without_init_no_generator_runs() {
        let step = NumbersToExpressions::new(1.0, 0.8);
        let mut random = Random::seeded(1);
        assert_eq!(
            step.create_number_expression(42.0, 0, &mut random),
            Expression::Number(42.0)
        );
    }

    #[test]
    fn test_evaluate_if_constant() {
        let nested = Expression::div(
            Expression::mul(Expression::number(6.0), Expression::number(4.0), false),
            Expression::number(3.0),
            false,
        );
        assert_eq!(evaluate_if_constant(&nested), Some(8.0));

        let by_zero = Expression::div(Expression::number(1.0), Expression::number(0.0), false);
        assert_eq!(evaluate_if_constant(&by_zero), None);

        let additive = Expression::add(Expression::number(1.0), Expression::number(2.0), false);
        assert_eq!(evaluate_if_constant(&additive), None);

        let with_string = Expression::mul(Expression::number(2.0), Expression::string("3"), false);
        assert_eq!(evaluate_if_constant(&with_string), None);

        let mut ast = Ast::new();
        let scope = ast.body.scope;
        let x = ast.scopes.declare(scope, "x");
        let with_variable = Expression::mul(
            Expression::number(2.0),
            Expression::variable(scope, x),
            false,
        );
        assert_eq!(evaluate_if_constant(&with_variable), None);
    }

    #[test]
    fn test_zero_treshold_leaves_tree_unchanged() {
        let values = vec![
            Expression::number(7.0),
            Expression::mul(Expression::number(2.0), Expression::number(3.0), false),
            Expression::div(Expression::number(9.0), Expression::number(4.0), false),
        ];
        let mut ast = program(&values);
        let before = ast.clone();
        Box::new(step(0.0, 0.8))
            .apply(&mut ast, &mut Random::seeded(99))
            .unwrap();
        assert_eq!(ast, before);
    }

    #[test]
    fn test_full_treshold_rewrites_every_site() {
        let values: Vec<Expression> = [1.0, 2.5, 17.0, 1024.0, -36.0, 0.125]
            .iter()
            .map(|v| Expression::number(*v))
            .chain([Expression::mul(
                Expression::number(6.0),
                Expression::number(7.0),
                false,
            )])
            .collect();
        let mut ast = program(&values);
        Box::new(step(1.0, 0.0))
            .apply(&mut ast, &mut Random::seeded(3))
            .unwrap();

        let expected = [1.0, 2.5, 17.0, 1024.0, -36.0, 0.125, 42.0];
        for (expression, value) in returned(&ast).iter().zip(expected) {
            assert!(!expression.is_constant(), "{value} stayed literal");
            assert_eq!(evaluate_if_constant(expression), Some(value));
        }
    }

    #[test]
    fn test_other_expressions_are_untouched() {
        let values = vec![
            Expression::string("12"),
            Expression::Boolean(true),
            Expression::Nil,
        ];
        let mut ast = program(&values);
        Box::new(step(1.0, 0.8))
            .apply(&mut ast, &mut Random::seeded(4))
            .unwrap();
        assert_eq!(returned(&ast), values.as_slice());
    }

    #[test]
    fn test_same_seed_same_tree() {
        let values = vec![Expression::number(365.0), Expression::number(0.75)];
        let mut a = program(&values);
        let mut b = program(&values);
        Box::new(step(1.0, 0.5))
            .apply(&mut a, &mut Random::seeded(2024))
            .unwrap();
        Box::new(step(1.0, 0.5))
            .apply(&mut b, &mut Random::seeded(2024))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_descriptor_validates_ranges() {
        let mut overrides = Map::new();
        overrides.insert("InternalTreshold".to_string(), json!(0.9));
        let err = DESCRIPTOR.validate(&overrides).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange { ref option, .. } if option == "InternalTreshold"
        ));

        overrides.insert("InternalTreshold".to_string(), Value::from(0.8));
        overrides.insert("Treshold".to_string(), Value::from(0));
        let settings = DESCRIPTOR.validate(&overrides).unwrap();
        assert_eq!(settings.number("Treshold").unwrap(), 0.0);
        assert_eq!(settings.number("InternalTreshold").unwrap(), 0.8);
    }

    #[test]
    fn test_defaults() {
        let settings = DESCRIPTOR.validate(&Map::new()).unwrap();
        assert_eq!(settings.number("Treshold").unwrap(), 1.0);
        assert_eq!(settings.number("InternalTreshold").unwrap(), 0.2);
        assert_eq!(settings.get("Treshold"), Some(&SettingValue::Number(1.0)));
    }
}
