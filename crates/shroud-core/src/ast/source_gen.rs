// Source code generation from AST
// Turns an obfuscated tree back into Lua text. Parenthesization is driven by
// the precedence table, so the tree never stores parentheses.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use super::precedence::{needs_parentheses, precedence, OperandSide};
use super::*;
use crate::errors::CodeGenError;

/// Reserved words of Lua 5.1; none of them may be used as a name.
pub const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageDialect {
    #[default]
    Lua51,
    LuaU,
}

type GenResult<T> = std::result::Result<T, CodeGenError>;

/// Renders a tree as source text for one dialect.
pub struct SourceGenerator<'a> {
    scopes: &'a Scopes,
    dialect: LanguageDialect,
    pretty_print: bool,
    indent: Cell<usize>,
}

impl<'a> SourceGenerator<'a> {
    pub fn new(scopes: &'a Scopes, dialect: LanguageDialect, pretty_print: bool) -> Self {
        Self {
            scopes,
            dialect,
            pretty_print,
            indent: Cell::new(0),
        }
    }

    /// Generate the source of a whole program.
    pub fn generate(ast: &Ast, dialect: LanguageDialect, pretty_print: bool) -> GenResult<String> {
        let generator = SourceGenerator::new(&ast.scopes, dialect, pretty_print);
        let lines = generator.statements(&ast.body)?;
        Ok(generator.join_statements(lines))
    }

    pub fn expression(&self, expression: &Expression) -> GenResult<String> {
        Ok(match expression {
            // Literals
            Expression::Nil => "nil".to_string(),
            Expression::Boolean(b) => b.to_string(),
            Expression::Number(n) => format_number(*n),
            Expression::String(s) => format!("\"{}\"", escape_string(s)),
            Expression::Vararg => "...".to_string(),

            // Binary operations
            Expression::Or { lhs, rhs } => self.binary(expression, "or", lhs, rhs)?,
            Expression::And { lhs, rhs } => self.binary(expression, "and", lhs, rhs)?,
            Expression::LessThan { lhs, rhs } => self.binary(expression, "<", lhs, rhs)?,
            Expression::GreaterThan { lhs, rhs } => self.binary(expression, ">", lhs, rhs)?,
            Expression::LessThanOrEquals { lhs, rhs } => {
                self.binary(expression, "<=", lhs, rhs)?
            }
            Expression::GreaterThanOrEquals { lhs, rhs } => {
                self.binary(expression, ">=", lhs, rhs)?
            }
            Expression::NotEquals { lhs, rhs } => self.binary(expression, "~=", lhs, rhs)?,
            Expression::Equals { lhs, rhs } => self.binary(expression, "==", lhs, rhs)?,
            Expression::StrCat { lhs, rhs } => self.binary(expression, "..", lhs, rhs)?,
            Expression::Add { lhs, rhs } => self.binary(expression, "+", lhs, rhs)?,
            Expression::Sub { lhs, rhs } => self.binary(expression, "-", lhs, rhs)?,
            Expression::Mul { lhs, rhs } => self.binary(expression, "*", lhs, rhs)?,
            Expression::Div { lhs, rhs } => self.binary(expression, "/", lhs, rhs)?,
            Expression::Mod { lhs, rhs } => self.binary(expression, "%", lhs, rhs)?,
            Expression::Pow { lhs, rhs } => self.binary(expression, "^", lhs, rhs)?,

            // Unary operations
            Expression::Not { rhs } => self.unary(expression, "not", rhs)?,
            Expression::Len { rhs } => self.unary(expression, "#", rhs)?,
            Expression::Negate { rhs } => self.unary(expression, "-", rhs)?,

            // Access and calls
            Expression::Index { base, index } => self.index(base, index)?,
            Expression::FunctionCall { base, args } => {
                format!("{}({})", self.prefix(base)?, self.list(args)?)
            }
            Expression::PassSelfFunctionCall {
                base,
                pass_self_function_name,
                args,
            } => format!(
                "{}:{}({})",
                self.prefix(base)?,
                pass_self_function_name,
                self.list(args)?
            ),
            Expression::Variable { scope, id } => self.name(*scope, *id)?,

            // Constructors
            Expression::FunctionLiteral(function) => self.function("function", function)?,
            Expression::TableConstructor { entries } => {
                let entries = entries
                    .iter()
                    .map(|entry| self.table_entry(entry))
                    .collect::<GenResult<Vec<_>>>()?;
                format!("{{{}}}", entries.join(self.separator()))
            }
        })
    }

    fn statement(&self, statement: &Statement) -> GenResult<String> {
        Ok(match statement {
            Statement::Do { body } => self.wrap("do".to_string(), body, "end")?,
            Statement::While { condition, body } => {
                let head = self.spaced(&["while", &self.expression(condition)?, "do"]);
                self.wrap(head, body, "end")?
            }
            Statement::Repeat { body, condition } => {
                let tail = self.spaced(&["until", &self.expression(condition)?]);
                self.wrap("repeat".to_string(), body, &tail)?
            }
            Statement::NumericFor {
                scope,
                id,
                initial,
                limit,
                step,
                body,
            } => {
                let range = [
                    self.expression(initial)?,
                    self.expression(limit)?,
                    self.expression(step)?,
                ]
                .join(self.separator());
                let head = self.spaced(&["for", &self.name(*scope, *id)?, "=", &range, "do"]);
                self.wrap(head, body, "end")?
            }
            Statement::GenericFor {
                scope,
                ids,
                expressions,
                body,
            } => {
                let names = self.names(*scope, ids)?;
                let head = self.spaced(&["for", &names, "in", &self.list(expressions)?, "do"]);
                self.wrap(head, body, "end")?
            }
            Statement::If {
                condition,
                body,
                elseifs,
                else_body,
            } => {
                let head = self.spaced(&["if", &self.expression(condition)?, "then"]);
                let mut result = self.wrap_open(head, body)?;
                for branch in elseifs {
                    let condition = self.expression(&branch.condition)?;
                    let head = self.spaced(&["elseif", &condition, "then"]);
                    let segment = self.wrap_open(head, &branch.body)?;
                    result = self.continue_with(result, segment);
                }
                if let Some(else_body) = else_body {
                    let segment = self.wrap_open("else".to_string(), else_body)?;
                    result = self.continue_with(result, segment);
                }
                let end = "end".to_string();
                self.continue_with(result, end)
            }
            Statement::Return { args } => self.spaced(&["return", &self.list(args)?]),
            Statement::Break => "break".to_string(),
            Statement::Continue => {
                if self.dialect != LanguageDialect::LuaU {
                    return Err(CodeGenError::Unsupported {
                        kind: statement.kind(),
                        dialect: self.dialect,
                    });
                }
                "continue".to_string()
            }
            Statement::FunctionDeclaration {
                scope,
                id,
                indices,
                function,
            } => {
                let mut path = self.name(*scope, *id)?;
                for index in indices {
                    path.push('.');
                    path.push_str(index);
                }
                let head = self.spaced(&["function", &path]);
                self.function(&head, function)?
            }
            Statement::LocalFunctionDeclaration {
                scope,
                id,
                function,
            } => {
                let head = self.spaced(&["local", "function", &self.name(*scope, *id)?]);
                self.function(&head, function)?
            }
            Statement::LocalVariableDeclaration {
                scope,
                ids,
                expressions,
            } => {
                let names = self.names(*scope, ids)?;
                if expressions.is_empty() {
                    self.spaced(&["local", &names])
                } else {
                    self.spaced(&["local", &names, "=", &self.list(expressions)?])
                }
            }
            Statement::FunctionCall { base, args } => {
                format!("{}({})", self.prefix(base)?, self.list(args)?)
            }
            Statement::PassSelfFunctionCall {
                base,
                pass_self_function_name,
                args,
            } => format!(
                "{}:{}({})",
                self.prefix(base)?,
                pass_self_function_name,
                self.list(args)?
            ),
            Statement::Assignment { lhs, rhs } => {
                let targets = lhs
                    .iter()
                    .map(|target| self.target(target))
                    .collect::<GenResult<Vec<_>>>()?
                    .join(self.separator());
                self.spaced(&[&targets, "=", &self.list(rhs)?])
            }
            Statement::Compound { operator, lhs, rhs } => match (self.dialect, lhs) {
                (LanguageDialect::LuaU, _) => {
                    self.spaced(&[&self.target(lhs)?, operator.symbol(), &self.expression(rhs)?])
                }
                (LanguageDialect::Lua51, AssignmentTarget::Variable { scope, id }) => {
                    let value = operator.expand(Expression::variable(*scope, *id), rhs.clone());
                    self.spaced(&[&self.name(*scope, *id)?, "=", &self.expression(&value)?])
                }
                (LanguageDialect::Lua51, AssignmentTarget::Indexing { .. }) => {
                    return Err(CodeGenError::Unsupported {
                        kind: statement.kind(),
                        dialect: self.dialect,
                    });
                }
            },
            Statement::Nop => String::new(),
        })
    }

    /// Render the statements of a block at the current indentation level.
    fn statements(&self, block: &Block) -> GenResult<Vec<String>> {
        let mut lines = Vec::new();
        for statement in &block.statements {
            if matches!(statement, Statement::Nop) {
                continue;
            }
            lines.push(self.statement(statement)?);
        }
        Ok(lines)
    }

    fn join_statements(&self, lines: Vec<String>) -> String {
        if !self.pretty_print {
            return lines.join(";");
        }
        let indent = "\t".repeat(self.indent.get());
        let mut result = String::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                result.push('\n');
                result.push_str(&indent);
                // `f()\n(g)()` would parse as a call of f's result.
                if line.starts_with('(') {
                    result.push(';');
                }
            }
            result.push_str(line);
        }
        result
    }

    /// A nested block one level deeper, without the surrounding keywords.
    fn nested(&self, block: &Block) -> GenResult<String> {
        self.indent.set(self.indent.get() + 1);
        let lines = self.statements(block);
        let joined = lines.map(|lines| self.join_statements(lines));
        self.indent.set(self.indent.get() - 1);
        joined
    }

    /// `head <block>` without a terminator, for `if`/`elseif`/`else` chains.
    fn wrap_open(&self, head: String, block: &Block) -> GenResult<String> {
        let body = self.nested(block)?;
        if body.is_empty() {
            return Ok(head);
        }
        if self.pretty_print {
            let indent = "\t".repeat(self.indent.get() + 1);
            Ok(format!("{head}\n{indent}{body}"))
        } else {
            Ok(self.spaced(&[&head, &body]))
        }
    }

    fn wrap(&self, head: String, block: &Block, tail: &str) -> GenResult<String> {
        let open = self.wrap_open(head, block)?;
        Ok(self.continue_with(open, tail.to_string()))
    }

    /// Append the next segment of a compound statement at the current level.
    fn continue_with(&self, current: String, next: String) -> String {
        if self.pretty_print {
            format!("{current}\n{}{next}", "\t".repeat(self.indent.get()))
        } else {
            self.spaced(&[&current, &next])
        }
    }

    fn function(&self, head: &str, function: &FunctionBody) -> GenResult<String> {
        let parameters = function
            .parameters
            .iter()
            .map(|parameter| match parameter {
                Parameter::Variable(id) => self.name(function.body.scope, *id),
                Parameter::Vararg => Ok("...".to_string()),
            })
            .collect::<GenResult<Vec<_>>>()?
            .join(self.separator());
        self.wrap(format!("{head}({parameters})"), &function.body, "end")
    }

    fn binary(
        &self,
        parent: &Expression,
        operator: &str,
        lhs: &Expression,
        rhs: &Expression,
    ) -> GenResult<String> {
        let left = self.operand(parent, lhs, OperandSide::Left)?;
        let right = self.operand(parent, rhs, OperandSide::Right)?;
        Ok(self.spaced(&[&left, operator, &right]))
    }

    fn operand(
        &self,
        parent: &Expression,
        child: &Expression,
        side: OperandSide,
    ) -> GenResult<String> {
        let source = self.expression(child)?;
        if needs_parentheses(parent.kind(), child.kind(), side) {
            Ok(format!("({source})"))
        } else {
            Ok(source)
        }
    }

    fn unary(
        &self,
        parent: &Expression,
        operator: &str,
        rhs: &Expression,
    ) -> GenResult<String> {
        let mut operand = self.expression(rhs)?;
        if precedence(rhs.kind()) > precedence(parent.kind()) {
            operand = format!("({operand})");
        }
        Ok(glue(&[operator, &operand]))
    }

    /// The callee or indexed expression; only names, indexing and calls may
    /// stand there unparenthesized.
    fn prefix(&self, base: &Expression) -> GenResult<String> {
        let source = self.expression(base)?;
        match base {
            Expression::Variable { .. }
            | Expression::Index { .. }
            | Expression::FunctionCall { .. }
            | Expression::PassSelfFunctionCall { .. } => Ok(source),
            _ => Ok(format!("({source})")),
        }
    }

    fn index(&self, base: &Expression, index: &Expression) -> GenResult<String> {
        let base = self.prefix(base)?;
        match index {
            Expression::String(key) if is_identifier(key) => Ok(format!("{base}.{key}")),
            _ => Ok(format!("{base}[{}]", self.expression(index)?)),
        }
    }

    fn target(&self, target: &AssignmentTarget) -> GenResult<String> {
        match target {
            AssignmentTarget::Variable { scope, id } => self.name(*scope, *id),
            AssignmentTarget::Indexing { base, index } => self.index(base, index),
        }
    }

    fn table_entry(&self, entry: &TableEntry) -> GenResult<String> {
        match entry {
            TableEntry::Positional(value) => self.expression(value),
            TableEntry::Keyed { key, value } => {
                let key = match key {
                    Expression::String(name) if is_identifier(name) => name.clone(),
                    _ => format!("[{}]", self.expression(key)?),
                };
                Ok(self.spaced(&[&key, "=", &self.expression(value)?]))
            }
        }
    }

    fn list(&self, expressions: &[Expression]) -> GenResult<String> {
        Ok(expressions
            .iter()
            .map(|expression| self.expression(expression))
            .collect::<GenResult<Vec<_>>>()?
            .join(self.separator()))
    }

    fn name(&self, scope: ScopeId, id: VarId) -> GenResult<String> {
        self.scopes
            .variable_name(scope, id)
            .map(str::to_string)
            .ok_or(CodeGenError::UnknownVariable { scope: scope.0, id })
    }

    fn names(&self, scope: ScopeId, ids: &[VarId]) -> GenResult<String> {
        Ok(ids
            .iter()
            .map(|id| self.name(scope, *id))
            .collect::<GenResult<Vec<_>>>()?
            .join(self.separator()))
    }

    fn separator(&self) -> &'static str {
        if self.pretty_print {
            ", "
        } else {
            ","
        }
    }

    /// Join tokens with spaces when pretty printing, minimally otherwise.
    fn spaced(&self, parts: &[&str]) -> String {
        if self.pretty_print {
            parts
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            glue(parts)
        }
    }
}

/// Concatenate tokens, inserting a space only where the lexer would
/// otherwise merge them.
fn glue(parts: &[&str]) -> String {
    let mut result = String::new();
    for part in parts.iter().filter(|part| !part.is_empty()) {
        if needs_space(&result, part) {
            result.push(' ');
        }
        result.push_str(part);
    }
    result
}

fn needs_space(left: &str, right: &str) -> bool {
    let (Some(l), Some(r)) = (left.chars().last(), right.chars().next()) else {
        return false;
    };
    let word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    (word(l) && word(r))
        // `--` starts a comment
        || (l == '-' && r == '-')
        // `1..x` lexes as a malformed number
        || ((l.is_ascii_digit() || l == '.') && r == '.')
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !LUA_KEYWORDS.contains(&s)
}

/// Number literal text that reads back as exactly `n`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "(0/0)".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "(1/0)".to_string()
        } else {
            "(-1/0)".to_string()
        }
    } else if n.is_sign_negative() {
        format!("(-{})", format_number(-n))
    } else if n.fract() == 0.0 && n < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n:?}")
    }
}

// Helper function to escape string characters
fn escape_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '"' => r#"\""#.to_string(),
            '\\' => r"\\".to_string(),
            '\n' => r"\n".to_string(),
            '\r' => r"\r".to_string(),
            '\t' => r"\t".to_string(),
            c if c.is_ascii_control() => format!("\\{:03}", c as u32),
            c => c.to_string(),
        })
        .collect()
}
