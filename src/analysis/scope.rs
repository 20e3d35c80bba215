//! Symbol table shared by the parser and the analyzer
//!
//! Three dictionaries: a scoped variable stack, a flat named-type map,
//! and a flat routine map. The maps silently overwrite on duplicate
//! insertion; callers that care must pre-check with
//! `is_declared_in_current_scope`.

use std::collections::HashMap;

use crate::ast::{RoutineHeader, Type};

/// Information about a declared variable
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub name: String,
    pub ty: Option<Type>,
}

/// Signature of a declared routine: ordered parameter types plus the
/// optional return type
#[derive(Debug, Clone)]
pub struct RoutineInfo {
    pub name: String,
    pub param_types: Vec<Type>,
    pub return_type: Option<Type>,
}

/// The symbol table
#[derive(Debug)]
pub struct SymbolTable {
    /// Stack of variable scopes (innermost is last)
    variable_scopes: Vec<HashMap<String, VariableInfo>>,
    /// Named types (flat)
    types: HashMap<String, Type>,
    /// Routines (flat)
    routines: HashMap<String, RoutineInfo>,
}

impl SymbolTable {
    /// Create a table with an empty global scope
    pub fn new() -> Self {
        Self {
            variable_scopes: vec![HashMap::new()],
            types: HashMap::new(),
            routines: HashMap::new(),
        }
    }

    /// Push a new variable scope
    pub fn enter_scope(&mut self) {
        self.variable_scopes.push(HashMap::new());
    }

    /// Pop the innermost variable scope; the global scope is never popped
    pub fn exit_scope(&mut self) {
        if self.variable_scopes.len() > 1 {
            self.variable_scopes.pop();
        }
    }

    /// Declare a variable in the innermost scope, overwriting any
    /// previous entry with the same name
    pub fn declare_variable(&mut self, name: impl Into<String>, ty: Option<Type>) {
        let name = name.into();
        let info = VariableInfo {
            name: name.clone(),
            ty,
        };
        self.variable_scopes
            .last_mut()
            .expect("scope stack should never be empty")
            .insert(name, info);
    }

    /// Check if a name is already declared in the innermost scope
    pub fn is_declared_in_current_scope(&self, name: &str) -> bool {
        self.variable_scopes
            .last()
            .expect("scope stack should never be empty")
            .contains_key(name)
    }

    /// Look up a variable, searching from innermost to outermost scope
    pub fn lookup_variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variable_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }

    /// Declare a named type
    pub fn declare_type(&mut self, name: impl Into<String>, ty: Type) {
        self.types.insert(name.into(), ty);
    }

    /// Look up a named type
    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// Register a routine from its header, extracting the ordered
    /// parameter types
    pub fn register_routine(&mut self, header: &RoutineHeader) {
        let info = RoutineInfo {
            name: header.name.clone(),
            param_types: header.parameters.iter().map(|p| p.ty.clone()).collect(),
            return_type: header.return_type.clone(),
        };
        self.routines.insert(header.name.clone(), info);
    }

    /// Look up a routine by name
    pub fn lookup_routine(&self, name: &str) -> Option<&RoutineInfo> {
        self.routines.get(name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
