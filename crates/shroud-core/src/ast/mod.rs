// Unified AST for Lua 5.1 and Luau
// Every obfuscation step reads and rewrites this tree; the source generator
// turns it back into text.

pub mod fold;
pub mod precedence;
pub mod scope;
pub mod source_gen;

pub use fold::Constant;
pub use precedence::precedence;
pub use scope::{ScopeId, Scopes, VarId};
pub use source_gen::{LanguageDialect, SourceGenerator};


use serde::{Deserialize, Serialize};

use crate::errors::AstError;
use crate::visit::{visit_ast, VisitData, Visitor};

/// Every node kind the tree can hold.
///
/// `kind()` is defined on each node type and never changes for the lifetime
/// of a node; passes replace nodes wholesale instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AstKind {
    // Structural
    TopNode,
    Block,

    // Statements
    DoStatement,
    WhileStatement,
    RepeatStatement,
    NumericForStatement,
    GenericForStatement,
    IfStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    FunctionDeclaration,
    LocalFunctionDeclaration,
    LocalVariableDeclaration,
    FunctionCallStatement,
    PassSelfFunctionCallStatement,
    AssignmentStatement,
    CompoundAddStatement,
    CompoundSubStatement,
    CompoundMulStatement,
    CompoundDivStatement,
    CompoundModStatement,
    CompoundPowStatement,
    CompoundConcatStatement,
    NopStatement,

    // Assignment targets
    AssignmentVariable,
    AssignmentIndexing,

    // Expressions
    NilExpression,
    BooleanExpression,
    NumberExpression,
    StringExpression,
    VarargExpression,
    OrExpression,
    AndExpression,
    LessThanExpression,
    GreaterThanExpression,
    LessThanOrEqualsExpression,
    GreaterThanOrEqualsExpression,
    NotEqualsExpression,
    EqualsExpression,
    StrCatExpression,
    AddExpression,
    SubExpression,
    MulExpression,
    DivExpression,
    ModExpression,
    PowExpression,
    NotExpression,
    LenExpression,
    NegateExpression,
    IndexExpression,
    FunctionCallExpression,
    PassSelfFunctionCallExpression,
    VariableExpression,
    FunctionLiteralExpression,
    TableConstructorExpression,

    // Table entries
    TableEntry,
    KeyedTableEntry,
}

/// The root of a program: the top-level block plus the arena that owns every
/// scope in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ast {
    pub body: Block,
    pub global_scope: ScopeId,
    pub scopes: Scopes,
}

impl Ast {
    /// Create an empty program: a global scope and a top-level block whose
    /// scope is nested inside it.
    pub fn new() -> Self {
        let mut scopes = Scopes::new();
        let global_scope = scopes.create_global();
        let top_scope = scopes.create(global_scope);
        Self {
            body: Block::new(top_scope),
            global_scope,
            scopes,
        }
    }

    pub fn kind(&self) -> AstKind {
        AstKind::TopNode
    }

    /// Re-check the list invariants the statement factories enforce. A tree
    /// built from JSON never went through them. Reports the first violation
    /// in traversal order and leaves the tree unchanged.
    pub fn validate(&mut self) -> Result<(), AstError> {
        let mut validator = Validator::default();
        visit_ast(self, &mut validator);
        match validator.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct Validator {
    error: Option<AstError>,
}

impl Visitor for Validator {
    fn visit_statement(&mut self, statement: &Statement, _data: &VisitData) -> Option<Statement> {
        if self.error.is_none() {
            self.error = statement.check().err();
        }
        None
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

/// A statement list together with the lexical scope it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub scope: ScopeId,
}

impl Block {
    pub fn new(scope: ScopeId) -> Self {
        Self {
            statements: Vec::new(),
            scope,
        }
    }

    pub fn with_statements(scope: ScopeId, statements: Vec<Statement>) -> Self {
        Self { statements, scope }
    }

    pub fn kind(&self) -> AstKind {
        AstKind::Block
    }
}

/// Function parameter, declared in the scope of the function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    Variable(VarId),
    Vararg,
}

/// Parameter list and body shared by function literals and declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub parameters: Vec<Parameter>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIf {
    pub condition: Expression,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
}

impl CompoundOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            CompoundOperator::Add => "+=",
            CompoundOperator::Sub => "-=",
            CompoundOperator::Mul => "*=",
            CompoundOperator::Div => "/=",
            CompoundOperator::Mod => "%=",
            CompoundOperator::Pow => "^=",
            CompoundOperator::Concat => "..=",
        }
    }

    /// Build the plain binary expression `lhs op rhs` this operator stands for.
    pub fn expand(self, lhs: Expression, rhs: Expression) -> Expression {
        match self {
            CompoundOperator::Add => Expression::add(lhs, rhs, false),
            CompoundOperator::Sub => Expression::sub(lhs, rhs, false),
            CompoundOperator::Mul => Expression::mul(lhs, rhs, false),
            CompoundOperator::Div => Expression::div(lhs, rhs, false),
            CompoundOperator::Mod => Expression::modulo(lhs, rhs, false),
            CompoundOperator::Pow => Expression::pow(lhs, rhs, false),
            CompoundOperator::Concat => Expression::str_cat(lhs, rhs, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignmentTarget {
    Variable { scope: ScopeId, id: VarId },
    Indexing { base: Expression, index: Expression },
}

impl AssignmentTarget {
    pub fn kind(&self) -> AstKind {
        match self {
            AssignmentTarget::Variable { .. } => AstKind::AssignmentVariable,
            AssignmentTarget::Indexing { .. } => AstKind::AssignmentIndexing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableEntry {
    Positional(Expression),
    Keyed { key: Expression, value: Expression },
}

impl TableEntry {
    pub fn kind(&self) -> AstKind {
        match self {
            TableEntry::Positional(_) => AstKind::TableEntry,
            TableEntry::Keyed { .. } => AstKind::KeyedTableEntry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Do {
        body: Block,
    },
    While {
        condition: Expression,
        body: Block,
    },
    /// The condition is resolved inside the body scope.
    Repeat {
        body: Block,
        condition: Expression,
    },
    NumericFor {
        scope: ScopeId,
        id: VarId,
        initial: Expression,
        limit: Expression,
        step: Expression,
        body: Block,
    },
    GenericFor {
        scope: ScopeId,
        ids: Vec<VarId>,
        expressions: Vec<Expression>,
        body: Block,
    },
    If {
        condition: Expression,
        body: Block,
        elseifs: Vec<ElseIf>,
        else_body: Option<Block>,
    },
    Return {
        args: Vec<Expression>,
    },
    Break,
    Continue,
    /// `function a.b.c(...)`; a method declaration is lowered by the parser to
    /// an explicit `self` parameter.
    FunctionDeclaration {
        scope: ScopeId,
        id: VarId,
        indices: Vec<String>,
        function: FunctionBody,
    },
    LocalFunctionDeclaration {
        scope: ScopeId,
        id: VarId,
        function: FunctionBody,
    },
    LocalVariableDeclaration {
        scope: ScopeId,
        ids: Vec<VarId>,
        expressions: Vec<Expression>,
    },
    FunctionCall {
        base: Expression,
        args: Vec<Expression>,
    },
    PassSelfFunctionCall {
        base: Expression,
        pass_self_function_name: String,
        args: Vec<Expression>,
    },
    Assignment {
        lhs: Vec<AssignmentTarget>,
        rhs: Vec<Expression>,
    },
    Compound {
        operator: CompoundOperator,
        lhs: AssignmentTarget,
        rhs: Expression,
    },
    Nop,
}

impl Statement {
    pub fn kind(&self) -> AstKind {
        match self {
            Statement::Do { .. } => AstKind::DoStatement,
            Statement::While { .. } => AstKind::WhileStatement,
            Statement::Repeat { .. } => AstKind::RepeatStatement,
            Statement::NumericFor { .. } => AstKind::NumericForStatement,
            Statement::GenericFor { .. } => AstKind::GenericForStatement,
            Statement::If { .. } => AstKind::IfStatement,
            Statement::Return { .. } => AstKind::ReturnStatement,
            Statement::Break => AstKind::BreakStatement,
            Statement::Continue => AstKind::ContinueStatement,
            Statement::FunctionDeclaration { .. } => AstKind::FunctionDeclaration,
            Statement::LocalFunctionDeclaration { .. } => AstKind::LocalFunctionDeclaration,
            Statement::LocalVariableDeclaration { .. } => AstKind::LocalVariableDeclaration,
            Statement::FunctionCall { .. } => AstKind::FunctionCallStatement,
            Statement::PassSelfFunctionCall { .. } => AstKind::PassSelfFunctionCallStatement,
            Statement::Assignment { .. } => AstKind::AssignmentStatement,
            Statement::Compound { operator, .. } => match operator {
                CompoundOperator::Add => AstKind::CompoundAddStatement,
                CompoundOperator::Sub => AstKind::CompoundSubStatement,
                CompoundOperator::Mul => AstKind::CompoundMulStatement,
                CompoundOperator::Div => AstKind::CompoundDivStatement,
                CompoundOperator::Mod => AstKind::CompoundModStatement,
                CompoundOperator::Pow => AstKind::CompoundPowStatement,
                CompoundOperator::Concat => AstKind::CompoundConcatStatement,
            },
            Statement::Nop => AstKind::NopStatement,
        }
    }

    /// Check the list invariants of this node alone.
    pub fn check(&self) -> Result<(), AstError> {
        let (targets_empty, values_empty) = match self {
            Statement::Assignment { lhs, rhs } => (lhs.is_empty(), rhs.is_empty()),
            Statement::LocalVariableDeclaration { ids, .. } => (ids.is_empty(), false),
            Statement::GenericFor {
                ids, expressions, ..
            } => (ids.is_empty(), expressions.is_empty()),
            _ => (false, false),
        };
        if targets_empty {
            return Err(AstError::EmptyTargets { kind: self.kind() });
        }
        if values_empty {
            return Err(AstError::EmptyValues { kind: self.kind() });
        }
        Ok(())
    }

    /// `lhs1, lhs2 = rhs1, rhs2`. Both sides must be non-empty.
    pub fn assignment(
        lhs: Vec<AssignmentTarget>,
        rhs: Vec<Expression>,
    ) -> Result<Statement, AstError> {
        let statement = Statement::Assignment { lhs, rhs };
        statement.check()?;
        Ok(statement)
    }

    /// `local a, b = ...`. The value list may be empty, the name list may not.
    pub fn local_variable_declaration(
        scope: ScopeId,
        ids: Vec<VarId>,
        expressions: Vec<Expression>,
    ) -> Result<Statement, AstError> {
        let statement = Statement::LocalVariableDeclaration {
            scope,
            ids,
            expressions,
        };
        statement.check()?;
        Ok(statement)
    }

    /// `for a, b in ...`. Both lists must be non-empty.
    pub fn generic_for(
        scope: ScopeId,
        ids: Vec<VarId>,
        expressions: Vec<Expression>,
        body: Block,
    ) -> Result<Statement, AstError> {
        let statement = Statement::GenericFor {
            scope,
            ids,
            expressions,
            body,
        };
        statement.check()?;
        Ok(statement)
    }

    pub fn compound(
        operator: CompoundOperator,
        lhs: AssignmentTarget,
        rhs: Expression,
    ) -> Statement {
        Statement::Compound { operator, lhs, rhs }
    }

    pub fn function_call(base: Expression, args: Vec<Expression>) -> Statement {
        Statement::FunctionCall { base, args }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    // Literals
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Vararg,

    // Logical operations
    Or {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    And {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    // Comparison operations
    LessThan {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    GreaterThan {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    LessThanOrEquals {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    GreaterThanOrEquals {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    NotEquals {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Equals {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    // Concatenation and arithmetic
    StrCat {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Add {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Sub {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Mul {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Div {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Mod {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Pow {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    // Unary operations
    Not {
        rhs: Box<Expression>,
    },
    Len {
        rhs: Box<Expression>,
    },
    Negate {
        rhs: Box<Expression>,
    },

    // Access and calls
    Index {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    FunctionCall {
        base: Box<Expression>,
        args: Vec<Expression>,
    },
    PassSelfFunctionCall {
        base: Box<Expression>,
        pass_self_function_name: String,
        args: Vec<Expression>,
    },
    Variable {
        scope: ScopeId,
        id: VarId,
    },

    // Constructors
    FunctionLiteral(FunctionBody),
    TableConstructor {
        entries: Vec<TableEntry>,
    },
}

macro_rules! folding_binary_factory {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $eval:path) => {
        $(#[$doc])*
        pub fn $name(lhs: Expression, rhs: Expression, simplify: bool) -> Expression {
            if simplify {
                if let (Some(a), Some(b)) = (lhs.value(), rhs.value()) {
                    if let Some(folded) = $eval(&a, &b) {
                        return Expression::constant(folded);
                    }
                }
            }
            Expression::$variant {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }
        }
    };
}

macro_rules! folding_unary_factory {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $eval:path) => {
        $(#[$doc])*
        pub fn $name(rhs: Expression, simplify: bool) -> Expression {
            if simplify {
                if let Some(folded) = rhs.value().as_ref().and_then($eval) {
                    return Expression::constant(folded);
                }
            }
            Expression::$variant { rhs: Box::new(rhs) }
        }
    };
}

impl Expression {
    pub fn kind(&self) -> AstKind {
        match self {
            Expression::Nil => AstKind::NilExpression,
            Expression::Boolean(_) => AstKind::BooleanExpression,
            Expression::Number(_) => AstKind::NumberExpression,
            Expression::String(_) => AstKind::StringExpression,
            Expression::Vararg => AstKind::VarargExpression,
            Expression::Or { .. } => AstKind::OrExpression,
            Expression::And { .. } => AstKind::AndExpression,
            Expression::LessThan { .. } => AstKind::LessThanExpression,
            Expression::GreaterThan { .. } => AstKind::GreaterThanExpression,
            Expression::LessThanOrEquals { .. } => AstKind::LessThanOrEqualsExpression,
            Expression::GreaterThanOrEquals { .. } => AstKind::GreaterThanOrEqualsExpression,
            Expression::NotEquals { .. } => AstKind::NotEqualsExpression,
            Expression::Equals { .. } => AstKind::EqualsExpression,
            Expression::StrCat { .. } => AstKind::StrCatExpression,
            Expression::Add { .. } => AstKind::AddExpression,
            Expression::Sub { .. } => AstKind::SubExpression,
            Expression::Mul { .. } => AstKind::MulExpression,
            Expression::Div { .. } => AstKind::DivExpression,
            Expression::Mod { .. } => AstKind::ModExpression,
            Expression::Pow { .. } => AstKind::PowExpression,
            Expression::Not { .. } => AstKind::NotExpression,
            Expression::Len { .. } => AstKind::LenExpression,
            Expression::Negate { .. } => AstKind::NegateExpression,
            Expression::Index { .. } => AstKind::IndexExpression,
            Expression::FunctionCall { .. } => AstKind::FunctionCallExpression,
            Expression::PassSelfFunctionCall { .. } => AstKind::PassSelfFunctionCallExpression,
            Expression::Variable { .. } => AstKind::VariableExpression,
            Expression::FunctionLiteral(_) => AstKind::FunctionLiteralExpression,
            Expression::TableConstructor { .. } => AstKind::TableConstructorExpression,
        }
    }

    /// True for literal nodes, including the literals folding produces.
    ///
    /// Derived from the variant on every call, so a replacement node always
    /// reports its own constness.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Expression::Nil | Expression::Boolean(_) | Expression::Number(_) | Expression::String(_)
        )
    }

    /// The value of a constant node, `None` for everything else.
    pub fn value(&self) -> Option<Constant> {
        match self {
            Expression::Nil => Some(Constant::Nil),
            Expression::Boolean(b) => Some(Constant::Boolean(*b)),
            Expression::Number(n) => Some(Constant::Number(*n)),
            Expression::String(s) => Some(Constant::String(s.clone())),
            _ => None,
        }
    }

    /// Literal node for a folded value, tagged by the value's dynamic type.
    pub fn constant(value: Constant) -> Expression {
        match value {
            Constant::Nil => Expression::Nil,
            Constant::Boolean(b) => Expression::Boolean(b),
            Constant::Number(n) => Expression::Number(n),
            Constant::String(s) => Expression::String(s),
        }
    }

    pub fn number(value: f64) -> Expression {
        Expression::Number(value)
    }

    pub fn string(value: impl Into<String>) -> Expression {
        Expression::String(value.into())
    }

    pub fn variable(scope: ScopeId, id: VarId) -> Expression {
        Expression::Variable { scope, id }
    }

    pub fn index(base: Expression, index: Expression) -> Expression {
        Expression::Index {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    pub fn function_call(base: Expression, args: Vec<Expression>) -> Expression {
        Expression::FunctionCall {
            base: Box::new(base),
            args,
        }
    }

    pub fn pass_self_function_call(
        base: Expression,
        name: impl Into<String>,
        args: Vec<Expression>,
    ) -> Expression {
        Expression::PassSelfFunctionCall {
            base: Box::new(base),
            pass_self_function_name: name.into(),
            args,
        }
    }

    folding_binary_factory!(or, Or, fold::or);
    folding_binary_factory!(and, And, fold::and);
    folding_binary_factory!(less_than, LessThan, fold::less_than);
    folding_binary_factory!(greater_than, GreaterThan, fold::greater_than);
    folding_binary_factory!(less_than_or_equals, LessThanOrEquals, fold::less_than_or_equals);
    folding_binary_factory!(
        greater_than_or_equals,
        GreaterThanOrEquals,
        fold::greater_than_or_equals
    );
    folding_binary_factory!(not_equals, NotEquals, fold::not_equals);
    folding_binary_factory!(equals, Equals, fold::equals);
    folding_binary_factory!(
        /// `lhs .. rhs`; booleans and nil never fold.
        str_cat,
        StrCat,
        fold::concat
    );
    folding_binary_factory!(add, Add, fold::add);
    folding_binary_factory!(sub, Sub, fold::sub);
    folding_binary_factory!(mul, Mul, fold::mul);
    folding_binary_factory!(
        /// `lhs / rhs`; never folds when the divisor is exactly zero.
        div,
        Div,
        fold::div
    );
    folding_binary_factory!(modulo, Mod, fold::modulo);
    folding_binary_factory!(pow, Pow, fold::pow);

    folding_unary_factory!(not, Not, fold::not);
    folding_unary_factory!(len, Len, fold::len);
    folding_unary_factory!(negate, Negate, fold::negate);

    /// Both operands of a binary operator node.
    pub fn binary_operands(&self) -> Option<(&Expression, &Expression)> {
        match self {
            Expression::Or { lhs, rhs }
            | Expression::And { lhs, rhs }
            | Expression::LessThan { lhs, rhs }
            | Expression::GreaterThan { lhs, rhs }
            | Expression::LessThanOrEquals { lhs, rhs }
            | Expression::GreaterThanOrEquals { lhs, rhs }
            | Expression::NotEquals { lhs, rhs }
            | Expression::Equals { lhs, rhs }
            | Expression::StrCat { lhs, rhs }
            | Expression::Add { lhs, rhs }
            | Expression::Sub { lhs, rhs }
            | Expression::Mul { lhs, rhs }
            | Expression::Div { lhs, rhs }
            | Expression::Mod { lhs, rhs }
            | Expression::Pow { lhs, rhs } => Some((lhs, rhs)),
            _ => None,
        }
    }
}
