// Operator precedence used by the source generator for parenthesization.
// 0 binds tightest; larger values bind looser.

use super::AstKind;

/// Rank returned for every kind without an entry: always parenthesize.
pub const UNRANKED: u8 = 100;

/// Precedence rank of an expression kind.
///
/// Total over `AstKind`: statements, blocks and table entries get `UNRANKED`.
pub fn precedence(kind: AstKind) -> u8 {
    match kind {
        AstKind::BooleanExpression
        | AstKind::NumberExpression
        | AstKind::StringExpression
        | AstKind::NilExpression
        | AstKind::VarargExpression
        | AstKind::VariableExpression
        | AstKind::AssignmentVariable => 0,
        AstKind::IndexExpression | AstKind::AssignmentIndexing => 1,
        AstKind::FunctionCallExpression | AstKind::PassSelfFunctionCallExpression => 2,
        AstKind::FunctionLiteralExpression | AstKind::TableConstructorExpression => 3,
        AstKind::PowExpression => 4,
        AstKind::NotExpression | AstKind::LenExpression | AstKind::NegateExpression => 5,
        AstKind::MulExpression | AstKind::DivExpression | AstKind::ModExpression => 7,
        AstKind::AddExpression | AstKind::SubExpression => 8,
        AstKind::StrCatExpression => 9,
        AstKind::LessThanExpression
        | AstKind::GreaterThanExpression
        | AstKind::LessThanOrEqualsExpression
        | AstKind::GreaterThanOrEqualsExpression
        | AstKind::NotEqualsExpression
        | AstKind::EqualsExpression => 10,
        AstKind::AndExpression => 11,
        AstKind::OrExpression => 12,
        _ => UNRANKED,
    }
}

/// `..` and `^` associate to the right; every other binary operator to the left.
pub fn is_right_associative(kind: AstKind) -> bool {
    matches!(kind, AstKind::StrCatExpression | AstKind::PowExpression)
}

/// Which operand slot a child expression occupies in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSide {
    Left,
    Right,
}

/// Whether `child` needs parentheses when emitted as the `side` operand of
/// a binary `parent`.
pub fn needs_parentheses(parent: AstKind, child: AstKind, side: OperandSide) -> bool {
    let parent_rank = precedence(parent);
    let child_rank = precedence(child);
    if child_rank != parent_rank {
        return child_rank > parent_rank;
    }
    match side {
        OperandSide::Right => !is_right_associative(parent),
        OperandSide::Left => is_right_associative(parent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_ranks() {
        assert_eq!(precedence(AstKind::NumberExpression), 0);
        assert_eq!(precedence(AstKind::OrExpression), 12);
        assert_eq!(precedence(AstKind::AndExpression), 11);
        assert_eq!(precedence(AstKind::EqualsExpression), 10);
        assert_eq!(precedence(AstKind::StrCatExpression), 9);
        assert_eq!(precedence(AstKind::AddExpression), 8);
        assert_eq!(precedence(AstKind::DivExpression), 7);
        assert_eq!(precedence(AstKind::NegateExpression), 5);
        assert_eq!(precedence(AstKind::PowExpression), 4);
        assert_eq!(precedence(AstKind::IndexExpression), 1);
        assert_eq!(precedence(AstKind::FunctionCallExpression), 2);
    }

    #[test]
    fn test_unlisted_kinds_are_unranked() {
        for kind in [
            AstKind::TopNode,
            AstKind::Block,
            AstKind::IfStatement,
            AstKind::AssignmentStatement,
            AstKind::KeyedTableEntry,
            AstKind::NopStatement,
        ] {
            assert_eq!(precedence(kind), UNRANKED, "{kind:?}");
        }
    }

    #[test]
    fn test_left_associative_right_operand() {
        // a - (b - c)
        assert!(needs_parentheses(
            AstKind::SubExpression,
            AstKind::SubExpression,
            OperandSide::Right
        ));
        // (a - b) - c
        assert!(!needs_parentheses(
            AstKind::SubExpression,
            AstKind::SubExpression,
            OperandSide::Left
        ));
        // a * b + c
        assert!(!needs_parentheses(
            AstKind::AddExpression,
            AstKind::MulExpression,
            OperandSide::Left
        ));
        // (a + b) * c
        assert!(needs_parentheses(
            AstKind::MulExpression,
            AstKind::AddExpression,
            OperandSide::Left
        ));
    }

    #[test]
    fn test_right_associative_operators() {
        // a ^ b ^ c
        assert!(!needs_parentheses(
            AstKind::PowExpression,
            AstKind::PowExpression,
            OperandSide::Right
        ));
        // (a ^ b) ^ c
        assert!(needs_parentheses(
            AstKind::PowExpression,
            AstKind::PowExpression,
            OperandSide::Left
        ));
        assert!(needs_parentheses(
            AstKind::StrCatExpression,
            AstKind::StrCatExpression,
            OperandSide::Left
        ));
    }
}
