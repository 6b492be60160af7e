use proptest::prelude::*;
use shroud_core::ast::precedence::{precedence, UNRANKED};
use shroud_core::ast::{AstKind, Expression};
use shroud_core::random::Random;
use shroud_core::step::numbers_to_expressions::{evaluate_if_constant, MAX_DEPTH};
use shroud_core::step::{NumbersToExpressions, Step};

fn num(n: f64) -> Expression {
    Expression::Number(n)
}

fn expander(internal_treshold: f64) -> NumbersToExpressions {
    let mut step = NumbersToExpressions::new(1.0, internal_treshold);
    step.init().unwrap();
    step
}

/// Operator levels between the root and the deepest literal.
fn height(expression: &Expression) -> usize {
    match expression {
        Expression::Mul { lhs, rhs } | Expression::Div { lhs, rhs } => {
            1 + height(lhs).max(height(rhs))
        }
        _ => 0,
    }
}

proptest! {
    /// Arithmetic factories with `simplify` fold to the directly computed value.
    #[test]
    fn arithmetic_folds_match_direct_evaluation(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        prop_assert_eq!(Expression::add(num(a), num(b), true), num(a + b));
        prop_assert_eq!(Expression::sub(num(a), num(b), true), num(a - b));
        prop_assert_eq!(Expression::mul(num(a), num(b), true), num(a * b));
        if b != 0.0 {
            prop_assert_eq!(Expression::div(num(a), num(b), true), num(a / b));
        }
    }

    #[test]
    fn division_by_zero_never_folds(a in -1e6f64..1e6) {
        let divided = Expression::div(num(a), num(0.0), true);
        prop_assert_eq!(divided.kind(), AstKind::DivExpression);
        prop_assert!(!divided.is_constant());
    }

    #[test]
    fn comparison_folds_match_direct_evaluation(a in -1e3f64..1e3, b in -1e3f64..1e3) {
        prop_assert_eq!(Expression::less_than(num(a), num(b), true), Expression::Boolean(a < b));
        prop_assert_eq!(Expression::greater_than(num(a), num(b), true), Expression::Boolean(a > b));
        prop_assert_eq!(
            Expression::less_than_or_equals(num(a), num(b), true),
            Expression::Boolean(a <= b)
        );
        prop_assert_eq!(
            Expression::greater_than_or_equals(num(a), num(b), true),
            Expression::Boolean(a >= b)
        );
        prop_assert_eq!(Expression::equals(num(a), num(b), true), Expression::Boolean(a == b));
        prop_assert_eq!(Expression::not_equals(num(a), num(b), true), Expression::Boolean(a != b));
    }

    /// Concatenating a boolean never folds and never panics.
    #[test]
    fn unfoldable_concat_falls_back(text in "\\PC{0,16}", flag in any::<bool>()) {
        let joined = Expression::str_cat(Expression::string(text), Expression::Boolean(flag), true);
        prop_assert_eq!(joined.kind(), AstKind::StrCatExpression);
        prop_assert!(!joined.is_constant());
    }

    /// Every random path through the expansion reproduces the value exactly.
    #[test]
    fn expansion_preserves_integers(
        value in -1_000_000_000i64..1_000_000_000,
        seed in any::<u64>(),
        internal in 0.0f64..=0.8,
    ) {
        let value = value as f64;
        let mut random = Random::seeded(seed);
        let expression = expander(internal).create_number_expression(value, 0, &mut random);
        prop_assert_eq!(evaluate_if_constant(&expression), Some(value));
    }

    #[test]
    fn expansion_preserves_fractions(
        value in -1e6f64..1e6,
        seed in any::<u64>(),
        internal in 0.0f64..=0.8,
    ) {
        let mut random = Random::seeded(seed);
        let expression = expander(internal).create_number_expression(value, 0, &mut random);
        prop_assert_eq!(evaluate_if_constant(&expression), Some(value));
    }

    #[test]
    fn expansion_depth_is_bounded(value in 1i64..1_000_000, seed in any::<u64>()) {
        let mut random = Random::seeded(seed);
        let expression = expander(0.8).create_number_expression(value as f64, 0, &mut random);
        prop_assert!(height(&expression) <= MAX_DEPTH + 1);
    }

    /// The top-level call always attempts a split, so small integers never
    /// come back as a bare literal.
    #[test]
    fn top_level_always_expands(value in 1i64..100_000, seed in any::<u64>()) {
        let mut random = Random::seeded(seed);
        let expression = expander(0.0).create_number_expression(value as f64, 0, &mut random);
        prop_assert!(!expression.is_constant());
        prop_assert_eq!(height(&expression), 1);
    }
}

#[test]
fn precedence_is_total() {
    let ranked = [
        (AstKind::NumberExpression, 0),
        (AstKind::VariableExpression, 0),
        (AstKind::IndexExpression, 1),
        (AstKind::FunctionCallExpression, 2),
        (AstKind::PowExpression, 4),
        (AstKind::NotExpression, 5),
        (AstKind::MulExpression, 7),
        (AstKind::ModExpression, 7),
        (AstKind::SubExpression, 8),
        (AstKind::StrCatExpression, 9),
        (AstKind::LessThanExpression, 10),
        (AstKind::AndExpression, 11),
        (AstKind::OrExpression, 12),
    ];
    for (kind, rank) in ranked {
        assert_eq!(precedence(kind), rank, "{kind:?}");
    }
    assert_eq!(precedence(AstKind::WhileStatement), UNRANKED);
    assert_eq!(precedence(AstKind::TableEntry), UNRANKED);
}
