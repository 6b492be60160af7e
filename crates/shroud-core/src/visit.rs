/*!
# Tree Traversal

Synchronous depth-first walk over every node of an [`Ast`], in source order.

Hooks run post-order: all children of a node have been visited (and possibly
replaced) before the node itself. A hook returning `Some(node)` substitutes
the node in its parent slot; the walker does not descend into the
substitute.
*/

use crate::ast::{
    AssignmentTarget, Ast, Block, Expression, FunctionBody, ScopeId, Statement, TableEntry,
};

/// Position information handed to every hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitData {
    /// Number of blocks between the node and the top of the program.
    pub depth: usize,
    /// Scope of the innermost enclosing block.
    pub scope: ScopeId,
}

pub trait Visitor {
    fn visit_statement(
        &mut self,
        _statement: &Statement,
        _data: &VisitData,
    ) -> Option<Statement> {
        None
    }

    fn visit_expression(
        &mut self,
        _expression: &Expression,
        _data: &VisitData,
    ) -> Option<Expression> {
        None
    }
}

/// Walk the whole program with `visitor`.
pub fn visit_ast<V: Visitor + ?Sized>(ast: &mut Ast, visitor: &mut V) {
    let mut walker = Walker { visitor, depth: 0 };
    walker.block(&mut ast.body);
}

struct Walker<'v, V: ?Sized> {
    visitor: &'v mut V,
    depth: usize,
}

impl<V: Visitor + ?Sized> Walker<'_, V> {
    fn block(&mut self, block: &mut Block) {
        self.depth += 1;
        for statement in &mut block.statements {
            self.statement(statement, block.scope);
        }
        self.depth -= 1;
    }

    fn function(&mut self, function: &mut FunctionBody) {
        self.block(&mut function.body);
    }

    fn statement(&mut self, statement: &mut Statement, scope: ScopeId) {
        match statement {
            Statement::Do { body } => self.block(body),
            Statement::While { condition, body } => {
                self.expression(condition, scope);
                self.block(body);
            }
            Statement::Repeat { body, condition } => {
                self.block(body);
                let inner = body.scope;
                self.depth += 1;
                self.expression(condition, inner);
                self.depth -= 1;
            }
            Statement::NumericFor {
                initial,
                limit,
                step,
                body,
                ..
            } => {
                self.expression(initial, scope);
                self.expression(limit, scope);
                self.expression(step, scope);
                self.block(body);
            }
            Statement::GenericFor {
                expressions, body, ..
            } => {
                self.expressions(expressions, scope);
                self.block(body);
            }
            Statement::If {
                condition,
                body,
                elseifs,
                else_body,
            } => {
                self.expression(condition, scope);
                self.block(body);
                for branch in elseifs {
                    self.expression(&mut branch.condition, scope);
                    self.block(&mut branch.body);
                }
                if let Some(else_body) = else_body {
                    self.block(else_body);
                }
            }
            Statement::Return { args } => self.expressions(args, scope),
            Statement::FunctionDeclaration { function, .. }
            | Statement::LocalFunctionDeclaration { function, .. } => self.function(function),
            Statement::LocalVariableDeclaration { expressions, .. } => {
                self.expressions(expressions, scope)
            }
            Statement::FunctionCall { base, args }
            | Statement::PassSelfFunctionCall { base, args, .. } => {
                self.expression(base, scope);
                self.expressions(args, scope);
            }
            Statement::Assignment { lhs, rhs } => {
                for target in lhs {
                    self.target(target, scope);
                }
                self.expressions(rhs, scope);
            }
            Statement::Compound { lhs, rhs, .. } => {
                self.target(lhs, scope);
                self.expression(rhs, scope);
            }
            Statement::Break | Statement::Continue | Statement::Nop => {}
        }

        let data = self.data(scope);
        if let Some(replacement) = self.visitor.visit_statement(statement, &data) {
            *statement = replacement;
        }
    }

    fn target(&mut self, target: &mut AssignmentTarget, scope: ScopeId) {
        match target {
            AssignmentTarget::Variable { .. } => {}
            AssignmentTarget::Indexing { base, index } => {
                self.expression(base, scope);
                self.expression(index, scope);
            }
        }
    }

    fn expressions(&mut self, expressions: &mut [Expression], scope: ScopeId) {
        for expression in expressions {
            self.expression(expression, scope);
        }
    }

    fn expression(&mut self, expression: &mut Expression, scope: ScopeId) {
        match expression {
            Expression::Nil
            | Expression::Boolean(_)
            | Expression::Number(_)
            | Expression::String(_)
            | Expression::Vararg
            | Expression::Variable { .. } => {}
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
            | Expression::Pow { lhs, rhs } => {
                self.expression(lhs, scope);
                self.expression(rhs, scope);
            }
            Expression::Not { rhs } | Expression::Len { rhs } | Expression::Negate { rhs } => {
                self.expression(rhs, scope)
            }
            Expression::Index { base, index } => {
                self.expression(base, scope);
                self.expression(index, scope);
            }
            Expression::FunctionCall { base, args }
            | Expression::PassSelfFunctionCall { base, args, .. } => {
                self.expression(base, scope);
                self.expressions(args, scope);
            }
            Expression::FunctionLiteral(function) => self.function(function),
            Expression::TableConstructor { entries } => {
                for entry in entries {
                    match entry {
                        TableEntry::Positional(value) => self.expression(value, scope),
                        TableEntry::Keyed { key, value } => {
                            self.expression(key, scope);
                            self.expression(value, scope);
                        }
                    }
                }
            }
        }

        let data = self.data(scope);
        if let Some(replacement) = self.visitor.visit_expression(expression, &data) {
            *expression = replacement;
        }
    }

    fn data(&self, scope: ScopeId) -> VisitData {
        VisitData {
            depth: self.depth,
            scope,
        }
    }
}
