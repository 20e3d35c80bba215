//! Post-optimization reference validator
//!
//! Branch elimination can delete a declaration that a surviving
//! top-level statement still references. This pass re-checks
//! program-scope assignments and prints against the program's
//! declarations. It deliberately stays out of loop, branch, and routine
//! bodies, where block-local declarations remain valid in their own
//! scope.

use std::collections::HashSet;

use crate::ast::{DeclarationKind, Expr, ExprKind, Program, StatementKind};
use crate::errors::{Located, SemanticError};

/// Checks reference integrity at program scope after the rewrites ran
pub struct Validator {
    errors: Vec<Located<SemanticError>>,
}

impl Validator {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Validate top-level references and return the collected errors
    pub fn validate(mut self, program: &Program) -> Vec<Located<SemanticError>> {
        let globals: HashSet<&str> = program
            .declarations
            .iter()
            .filter_map(|decl| match &decl.kind {
                DeclarationKind::Variable(var) => Some(var.name.as_str()),
                _ => None,
            })
            .collect();

        for stmt in &program.statements {
            match &stmt.kind {
                StatementKind::Assignment { target, value } => {
                    if let ExprKind::Variable(name) = &target.kind {
                        if !globals.contains(name.as_str()) {
                            self.errors.push(Located::new(
                                SemanticError::UndefinedVariable(name.clone()),
                                target.span,
                            ));
                        }
                    }
                    self.check_expression(value, &globals);
                }
                StatementKind::Print { expressions } => {
                    for expr in expressions {
                        self.check_expression(expr, &globals);
                    }
                }
                _ => {}
            }
        }
        self.errors
    }

    fn check_expression(&mut self, expr: &Expr, globals: &HashSet<&str>) {
        match &expr.kind {
            ExprKind::Variable(name) => {
                if !globals.contains(name.as_str()) {
                    self.errors.push(Located::new(
                        SemanticError::UndefinedVariable(name.clone()),
                        expr.span,
                    ));
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.check_expression(left, globals);
                self.check_expression(right, globals);
            }
            ExprKind::Unary { operand, .. } => {
                self.check_expression(operand, globals);
            }
            ExprKind::Index { array, index } => {
                self.check_expression(array, globals);
                self.check_expression(index, globals);
            }
            ExprKind::Field { record, .. } => {
                self.check_expression(record, globals);
            }
            ExprKind::Call { arguments, .. } => {
                for arg in arguments {
                    self.check_expression(arg, globals);
                }
            }
            _ => {}
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
