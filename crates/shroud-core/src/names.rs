// Name generators
// Run after all steps, right before source generation. Locals get names
// that are unique across the whole program; globals keep theirs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::source_gen::LUA_KEYWORDS;
use crate::ast::{Ast, ScopeId, VarId};
use crate::random::Random;

const START_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";
const REST_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_0123456789";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameGeneratorKind {
    /// Keep the declared names.
    #[default]
    Identity,
    /// `a`, `b`, ..., `_`, `aa`, `ba`, ...
    Mangled,
    /// Like `Mangled` over a seeded permutation of the alphabet.
    MangledShuffled,
}

/// The `index`-th name over the given alphabets.
///
/// Bijective: every index maps to a distinct non-empty name, shortest first.
pub fn mangled_name(index: usize, start: &[char], rest: &[char]) -> String {
    let mut name = String::new();
    name.push(start[index % start.len()]);
    let mut n = index / start.len();
    while n > 0 {
        n -= 1;
        name.push(rest[n % rest.len()]);
        n /= rest.len();
    }
    name
}

/// Rename every local variable of `ast` according to `kind`.
pub fn assign_names(ast: &mut Ast, kind: NameGeneratorKind, random: &mut Random) {
    let mut start: Vec<char> = START_CHARS.chars().collect();
    let mut rest: Vec<char> = REST_CHARS.chars().collect();
    match kind {
        NameGeneratorKind::Identity => return,
        NameGeneratorKind::Mangled => {}
        NameGeneratorKind::MangledShuffled => {
            random.shuffle(&mut start);
            random.shuffle(&mut rest);
        }
    }

    let reserved: HashSet<String> = ast
        .scopes
        .global_names()
        .into_iter()
        .map(str::to_string)
        .chain(LUA_KEYWORDS.iter().map(|k| k.to_string()))
        // Luau soft keyword
        .chain(["continue".to_string()])
        .collect();

    let locals: Vec<(ScopeId, VarId)> = ast
        .scopes
        .iter()
        .filter(|(_, scope)| !scope.is_global)
        .flat_map(|(id, scope)| (0..scope.variables.len()).map(move |var| (id, var)))
        .collect();

    let mut next = 0;
    for (scope, var) in &locals {
        let name = loop {
            let candidate = mangled_name(next, &start, &rest);
            next += 1;
            if !reserved.contains(&candidate) {
                break candidate;
            }
        };
        ast.scopes.rename(*scope, *var, name);
    }
    debug!(?kind, renamed = locals.len(), "Assigned names");
}
