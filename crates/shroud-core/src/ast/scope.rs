// Scope arena
// Blocks and functions own their scope through a `ScopeId`; declaration and
// reference nodes hold the same id and never own the scope.

use serde::{Deserialize, Serialize};

/// Index of a variable inside its scope.
pub type VarId = usize;

/// Index of a scope inside `Scopes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub references: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub is_global: bool,
    pub variables: Vec<Variable>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, is_global: bool) -> Self {
        Self {
            parent,
            is_global,
            variables: Vec::new(),
        }
    }
}

/// Owner of every scope in a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_global(&mut self) -> ScopeId {
        self.push(Scope::new(None, true))
    }

    pub fn create(&mut self, parent: ScopeId) -> ScopeId {
        self.push(Scope::new(Some(parent), false))
    }

    fn push(&mut self, scope: Scope) -> ScopeId {
        self.scopes.push(scope);
        ScopeId(self.scopes.len() - 1)
    }

    pub fn get(&self, scope: ScopeId) -> Option<&Scope> {
        self.scopes.get(scope.0)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(index, scope)| (ScopeId(index), scope))
    }

    pub fn is_global(&self, scope: ScopeId) -> bool {
        self.get(scope).is_some_and(|s| s.is_global)
    }

    /// Declare a new variable; redeclaring a name shadows the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `scope` was not created by this arena. Lookups return `None`
    /// for a foreign id instead.
    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>) -> VarId {
        let variables = &mut self.scopes[scope.0].variables;
        variables.push(Variable {
            name: name.into(),
            references: 0,
        });
        variables.len() - 1
    }

    /// Global variables are declared once per name.
    ///
    /// # Panics
    ///
    /// Panics if `scope` was not created by this arena.
    pub fn declare_global(&mut self, scope: ScopeId, name: &str) -> VarId {
        if let Some(id) = self.scopes[scope.0]
            .variables
            .iter()
            .position(|v| v.name == name)
        {
            return id;
        }
        self.declare(scope, name)
    }

    /// Find the innermost visible declaration of `name`, walking parents.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, VarId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.get(id)?;
            if let Some(var) = s.variables.iter().rposition(|v| v.name == name) {
                return Some((id, var));
            }
            current = s.parent;
        }
        None
    }

    /// Record a read or write site of `id`.
    pub fn add_reference(&mut self, scope: ScopeId, id: VarId) {
        if let Some(var) = self.variable_mut(scope, id) {
            var.references += 1;
        }
    }

    pub fn remove_reference(&mut self, scope: ScopeId, id: VarId) {
        if let Some(var) = self.variable_mut(scope, id) {
            var.references = var.references.saturating_sub(1);
        }
    }

    pub fn references(&self, scope: ScopeId, id: VarId) -> usize {
        self.variable(scope, id).map_or(0, |v| v.references)
    }

    /// Name emitted for a variable. Only the source generator should need this.
    pub fn variable_name(&self, scope: ScopeId, id: VarId) -> Option<&str> {
        self.variable(scope, id).map(|v| v.name.as_str())
    }

    pub fn rename(&mut self, scope: ScopeId, id: VarId, name: impl Into<String>) {
        if let Some(var) = self.variable_mut(scope, id) {
            var.name = name.into();
        }
    }

    /// Names of every variable declared in global scopes.
    pub fn global_names(&self) -> Vec<&str> {
        self.scopes
            .iter()
            .filter(|s| s.is_global)
            .flat_map(|s| s.variables.iter().map(|v| v.name.as_str()))
            .collect()
    }

    fn variable(&self, scope: ScopeId, id: VarId) -> Option<&Variable> {
        self.get(scope)?.variables.get(id)
    }

    fn variable_mut(&mut self, scope: ScopeId, id: VarId) -> Option<&mut Variable> {
        self.scopes.get_mut(scope.0)?.variables.get_mut(id)
    }
}
