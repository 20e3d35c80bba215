//! Pre-optimization well-formedness pass
//!
//! A single read-only traversal over declarations, then statements.
//! Diagnostics accumulate; nothing aborts the walk. The resulting error
//! set gates the optimizer.

use std::collections::HashSet;

use crate::ast::{
    Block, Declaration, DeclarationKind, Expr, ExprKind, Program, RoutineBody, Statement,
    StatementKind, TypeKind,
};
use crate::errors::{Located, SemanticError, SemanticWarning, SourceSpan};

use super::scope::SymbolTable;
use super::types;

/// Checks a program tree against the type discipline without mutating it
pub struct Checker<'a> {
    symbols: &'a SymbolTable,
    errors: Vec<Located<SemanticError>>,
    warnings: Vec<Located<SemanticWarning>>,
}

impl<'a> Checker<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Check the whole program and return the collected diagnostics
    pub fn check(
        mut self,
        program: &Program,
    ) -> (Vec<Located<SemanticError>>, Vec<Located<SemanticWarning>>) {
        for decl in &program.declarations {
            self.check_declaration(decl);
        }
        for stmt in &program.statements {
            self.check_statement(stmt);
        }
        (self.errors, self.warnings)
    }

    fn error(&mut self, error: SemanticError, span: SourceSpan) {
        self.errors.push(Located::new(error, span));
    }

    fn warning(&mut self, warning: SemanticWarning, span: SourceSpan) {
        self.warnings.push(Located::new(warning, span));
    }

    fn check_declaration(&mut self, decl: &Declaration) {
        match &decl.kind {
            DeclarationKind::Variable(var) => {
                if let Some(init) = &var.initializer {
                    self.check_expression(init);
                    if let Some(declared) = &var.ty {
                        if !types::compatible(&types::infer(init), declared) {
                            self.error(
                                SemanticError::InitializerTypeMismatch(var.name.clone()),
                                decl.span,
                            );
                        }
                    }
                }
            }
            DeclarationKind::Type(type_decl) => {
                if let TypeKind::Record { fields } = &type_decl.ty.kind {
                    let mut seen = HashSet::new();
                    for field in fields {
                        if !seen.insert(field.name.as_str()) {
                            self.error(
                                SemanticError::DuplicateField {
                                    field: field.name.clone(),
                                    type_name: type_decl.name.clone(),
                                },
                                decl.span,
                            );
                        }
                    }
                }
            }
            DeclarationKind::Routine(routine) => match &routine.body {
                RoutineBody::Expression(expr) => {
                    if let Some(return_type) = &routine.header.return_type {
                        if !types::compatible(&types::infer(expr), return_type) {
                            self.error(
                                SemanticError::ReturnTypeMismatch(routine.header.name.clone()),
                                decl.span,
                            );
                        }
                    }
                }
                RoutineBody::Block(block) => self.check_block(block),
            },
        }
    }

    fn check_block(&mut self, block: &Block) {
        for decl in &block.declarations {
            self.check_declaration(decl);
        }
        for stmt in &block.statements {
            self.check_statement(stmt);
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::Assignment { target, value } => {
                self.check_expression(target);
                self.check_expression(value);
                if !assignment_compatible(target, value) {
                    self.error(SemanticError::AssignmentTypeMismatch, stmt.span);
                }
            }
            StatementKind::While { condition, body } => {
                self.check_expression(condition);
                if !types::infer(condition).is_boolean() {
                    self.error(SemanticError::WhileConditionNotBoolean, condition.span);
                }
                self.check_block(body);
            }
            StatementKind::For { range, body, .. } => {
                match &range.end {
                    Some(end) => {
                        if !types::infer(&range.start).is_integer()
                            || !types::infer(end).is_integer()
                        {
                            self.error(SemanticError::ForRangeBoundsNotInteger, stmt.span);
                        }
                    }
                    None => {
                        if !types::infer(&range.start).is_array() {
                            self.error(SemanticError::ForInExpectsArray, stmt.span);
                        }
                    }
                }
                self.check_block(body);
            }
            StatementKind::If {
                condition,
                then_body,
                else_body,
            } => {
                self.check_expression(condition);
                if !types::infer(condition).is_boolean() {
                    self.error(SemanticError::IfConditionNotBoolean, condition.span);
                }
                self.check_block(then_body);
                if let Some(else_body) = else_body {
                    self.check_block(else_body);
                }
            }
            StatementKind::Print { expressions } => {
                for expr in expressions {
                    self.check_expression(expr);
                }
            }
            StatementKind::Call { name, arguments } => {
                self.check_call(name, arguments, stmt.span);
            }
        }
    }

    fn check_expression(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Binary { left, right, .. } => {
                self.check_expression(left);
                self.check_expression(right);
            }
            ExprKind::Unary { operand, .. } => {
                self.check_expression(operand);
            }
            ExprKind::Index { array, index } => {
                self.check_expression(array);
                self.check_expression(index);
                self.check_array_index(array, index, expr.span);
            }
            ExprKind::Field { record, field } => {
                self.check_expression(record);
                self.check_field_access(record, field, expr.span);
            }
            ExprKind::Call { name, arguments } => {
                self.check_call(name, arguments, expr.span);
            }
            _ => {}
        }
    }

    fn check_field_access(&mut self, record: &Expr, field: &str, span: SourceSpan) {
        let record_type = types::infer(record);
        if !record_type.is_record() {
            self.error(SemanticError::FieldAccessOnNonRecord, span);
            return;
        }
        if record_type.field(field).is_none() {
            self.error(SemanticError::UnknownField(field.to_string()), span);
        }
    }

    fn check_array_index(&mut self, array: &Expr, index: &Expr, span: SourceSpan) {
        if !types::infer(index).is_integer() {
            self.error(SemanticError::ArrayIndexNotInteger, span);
        }
        // Static bounds check when both the index and the declared size
        // are integer literals; indices are 1-based
        let array_type = types::infer(array);
        if let TypeKind::Array {
            size: Some(size), ..
        } = &array_type.kind
        {
            if let (Some(index), Some(size)) =
                (index.as_integer_literal(), size.as_integer_literal())
            {
                if !(1 <= index && index <= size) {
                    self.warning(SemanticWarning::ArrayIndexOutOfBounds { index, size }, span);
                }
            }
        }
    }

    fn check_call(&mut self, name: &str, arguments: &[Expr], span: SourceSpan) {
        let Some(routine) = self.symbols.lookup_routine(name) else {
            self.error(SemanticError::UndefinedRoutine(name.to_string()), span);
            return;
        };
        if arguments.len() != routine.param_types.len() {
            self.error(SemanticError::ArgumentCountMismatch(name.to_string()), span);
            return;
        }
        for (position, (arg, param)) in arguments.iter().zip(&routine.param_types).enumerate() {
            if !types::compatible(&types::infer(arg), param) {
                self.error(
                    SemanticError::ArgumentTypeMismatch {
                        name: name.to_string(),
                        position: position + 1,
                    },
                    arg.span,
                );
            }
        }
    }
}

/// Assignment compatibility between a target and a value expression.
/// Field-access targets are accepted as-is; record layouts are resolved
/// downstream.
fn assignment_compatible(target: &Expr, value: &Expr) -> bool {
    if matches!(target.kind, ExprKind::Field { .. }) {
        return true;
    }
    types::compatible(&types::infer(target), &types::infer(value))
}
