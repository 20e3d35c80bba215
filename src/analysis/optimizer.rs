//! AST rewrites applied after a clean check
//!
//! Four cooperating transformations: constant folding, dead-branch
//! elimination with declaration hoisting, removal of `while false`
//! loops, and unused-declaration pruning. The tree is rewritten in
//! place; replacing a subtree drops the old one.
//!
//! The counter tracks rewrite sites whose top-level node changed:
//! initializer and routine-body folds, branch eliminations, dead-loop
//! removals, and each pruned declaration. Folding that only rewrites
//! children of a kept node (assignment right-hand sides, conditions)
//! does not count on its own.

use std::collections::HashSet;
use std::mem;

use crate::ast::{
    BinaryOp, Block, Declaration, DeclarationKind, Expr, ExprKind, Program, RoutineBody,
    Statement, StatementKind, UnaryOp,
};
use crate::errors::{Located, SemanticError, SourceSpan};

/// Rewrites a program tree in place, counting applied optimizations
pub struct Optimizer {
    applied: usize,
    errors: Vec<Located<SemanticError>>,
}

impl Optimizer {
    pub fn new() -> Self {
        Self {
            applied: 0,
            errors: Vec::new(),
        }
    }

    /// Run all rewrites. Returns the optimization count and any errors
    /// produced while rewriting (hoist collisions, division by zero).
    ///
    /// Routine bodies are rewritten first; top-level variable
    /// initializers are folded by the program-block simplification.
    pub fn run(mut self, program: &mut Program) -> (usize, Vec<Located<SemanticError>>) {
        for decl in &mut program.declarations {
            if let DeclarationKind::Routine(routine) = &mut decl.kind {
                match &mut routine.body {
                    RoutineBody::Expression(expr) => self.fold_and_count(expr),
                    RoutineBody::Block(block) => self.simplify_block(block),
                }
            }
        }
        self.simplify_block_parts(&mut program.declarations, &mut program.statements);
        self.remove_unused(program);
        (self.applied, self.errors)
    }

    fn error(&mut self, error: SemanticError, span: SourceSpan) {
        self.errors.push(Located::new(error, span));
    }

    fn fold_and_count(&mut self, expr: &mut Expr) {
        if self.fold(expr) {
            self.applied += 1;
        }
    }

    /// Fold children in place, then try to fold the node itself.
    /// Returns true when this node was replaced by a literal.
    fn fold(&mut self, expr: &mut Expr) -> bool {
        let replacement = match &mut expr.kind {
            ExprKind::Binary { op, left, right } => {
                self.fold(left);
                self.fold(right);
                self.fold_binary(*op, left, right, expr.span)
            }
            ExprKind::Unary { op, operand } => {
                self.fold(operand);
                fold_unary(*op, operand, expr.span)
            }
            ExprKind::Index { array, index } => {
                self.fold(array);
                self.fold(index);
                None
            }
            ExprKind::Field { record, .. } => {
                self.fold(record);
                None
            }
            ExprKind::Call { arguments, .. } => {
                for arg in arguments {
                    self.fold(arg);
                }
                None
            }
            _ => None,
        };
        match replacement {
            Some(folded) => {
                *expr = folded;
                true
            }
            None => false,
        }
    }

    fn fold_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        span: SourceSpan,
    ) -> Option<Expr> {
        // Two integer literals: stay in the integer domain (wrapping on
        // overflow), except division which is always real
        if let (Some(l), Some(r)) = (left.as_integer_literal(), right.as_integer_literal()) {
            return match op {
                BinaryOp::Add => Some(Expr::integer(l.wrapping_add(r), span)),
                BinaryOp::Sub => Some(Expr::integer(l.wrapping_sub(r), span)),
                BinaryOp::Mul => Some(Expr::integer(l.wrapping_mul(r), span)),
                BinaryOp::Div => {
                    if r == 0 {
                        self.error(SemanticError::DivisionByZero, span);
                        return None;
                    }
                    Some(Expr::real(l as f64 / r as f64, span))
                }
                BinaryOp::Mod => {
                    if r == 0 {
                        self.error(SemanticError::DivisionByZero, span);
                        return None;
                    }
                    Some(Expr::integer(l.wrapping_rem(r), span))
                }
                BinaryOp::Lt => Some(Expr::boolean(l < r, span)),
                BinaryOp::Le => Some(Expr::boolean(l <= r, span)),
                BinaryOp::Gt => Some(Expr::boolean(l > r, span)),
                BinaryOp::Ge => Some(Expr::boolean(l >= r, span)),
                BinaryOp::Eq => Some(Expr::boolean(l == r, span)),
                BinaryOp::Ne => Some(Expr::boolean(l != r, span)),
                _ => None,
            };
        }

        // Mixed numeric literals: at least one side is real
        if let (Some(l), Some(r)) = (numeric_literal(left), numeric_literal(right)) {
            return match op {
                BinaryOp::Add => Some(Expr::real(l + r, span)),
                BinaryOp::Sub => Some(Expr::real(l - r, span)),
                BinaryOp::Mul => Some(Expr::real(l * r, span)),
                BinaryOp::Div => {
                    if r == 0.0 {
                        self.error(SemanticError::DivisionByZero, span);
                        return None;
                    }
                    Some(Expr::real(l / r, span))
                }
                // Remainder stays integer-only
                BinaryOp::Mod => None,
                BinaryOp::Lt => Some(Expr::boolean(l < r, span)),
                BinaryOp::Le => Some(Expr::boolean(l <= r, span)),
                BinaryOp::Gt => Some(Expr::boolean(l > r, span)),
                BinaryOp::Ge => Some(Expr::boolean(l >= r, span)),
                BinaryOp::Eq => Some(Expr::boolean(l == r, span)),
                BinaryOp::Ne => Some(Expr::boolean(l != r, span)),
                _ => None,
            };
        }

        if let (Some(l), Some(r)) = (left.as_boolean_literal(), right.as_boolean_literal()) {
            return match op {
                BinaryOp::And => Some(Expr::boolean(l && r, span)),
                BinaryOp::Or => Some(Expr::boolean(l || r, span)),
                BinaryOp::Xor => Some(Expr::boolean(l != r, span)),
                _ => None,
            };
        }

        None
    }

    fn simplify_block(&mut self, block: &mut Block) {
        self.simplify_block_parts(&mut block.declarations, &mut block.statements);
    }

    /// Simplify one scope: fold declaration initializers, then rewrite
    /// the statement sequence. Branch elimination may append hoisted
    /// declarations to `declarations` and splice branch statements into
    /// the output sequence.
    fn simplify_block_parts(
        &mut self,
        declarations: &mut Vec<Declaration>,
        statements: &mut Vec<Statement>,
    ) {
        for decl in declarations.iter_mut() {
            if let DeclarationKind::Variable(var) = &mut decl.kind {
                if let Some(init) = &mut var.initializer {
                    self.fold_and_count(init);
                }
            }
        }

        let old = mem::take(statements);
        let mut simplified = Vec::with_capacity(old.len());
        for stmt in old {
            let span = stmt.span;
            match stmt.kind {
                StatementKind::Assignment { target, mut value } => {
                    self.fold(&mut value);
                    simplified.push(Statement::assignment(target, value, span));
                }
                StatementKind::If {
                    mut condition,
                    mut then_body,
                    mut else_body,
                } => {
                    self.fold(&mut condition);
                    match condition.as_boolean_literal() {
                        Some(value) => {
                            let chosen = if value { Some(then_body) } else { else_body };
                            if let Some(mut chosen) = chosen {
                                // Surface nested constant branches before
                                // hoisting, so their declarations move up
                                // through this splice as well
                                self.simplify_block(&mut chosen);
                                self.hoist_declarations(declarations, chosen.declarations);
                                simplified.extend(chosen.statements);
                            }
                            self.applied += 1;
                        }
                        None => {
                            self.simplify_block(&mut then_body);
                            if let Some(else_body) = &mut else_body {
                                self.simplify_block(else_body);
                            }
                            simplified.push(Statement::new(
                                StatementKind::If {
                                    condition,
                                    then_body,
                                    else_body,
                                },
                                span,
                            ));
                        }
                    }
                }
                StatementKind::While {
                    mut condition,
                    mut body,
                } => {
                    self.fold(&mut condition);
                    if condition.as_boolean_literal() == Some(false) {
                        // The loop can never run; drop it
                        self.applied += 1;
                    } else {
                        self.simplify_block(&mut body);
                        simplified.push(Statement::new(
                            StatementKind::While { condition, body },
                            span,
                        ));
                    }
                }
                StatementKind::For {
                    variable,
                    range,
                    reverse,
                    mut body,
                } => {
                    self.simplify_block(&mut body);
                    simplified.push(Statement::new(
                        StatementKind::For {
                            variable,
                            range,
                            reverse,
                            body,
                        },
                        span,
                    ));
                }
                other => simplified.push(Statement::new(other, span)),
            }
        }
        *statements = simplified;
    }

    /// Append declarations from an eliminated branch to the enclosing
    /// scope. A variable whose name collides with one already present is
    /// reported and dropped; the collision set grows as hoisting
    /// proceeds.
    fn hoist_declarations(&mut self, declarations: &mut Vec<Declaration>, hoisted: Vec<Declaration>) {
        let mut existing: HashSet<String> = declarations
            .iter()
            .filter_map(|decl| match &decl.kind {
                DeclarationKind::Variable(var) => Some(var.name.clone()),
                _ => None,
            })
            .collect();
        for mut decl in hoisted {
            if let DeclarationKind::Variable(var) = &mut decl.kind {
                if existing.contains(&var.name) {
                    self.error(SemanticError::DuplicateDeclaration(var.name.clone()), decl.span);
                    continue;
                }
                if let Some(init) = &mut var.initializer {
                    self.fold_and_count(init);
                }
                existing.insert(var.name.clone());
            }
            declarations.push(decl);
        }
    }

    /// Remove program-scope variable declarations that are never
    /// referenced and have no initializer (an initializer is treated as
    /// a potential side effect), then prune routine-body scopes against
    /// the same used set.
    fn remove_unused(&mut self, program: &mut Program) {
        let mut used = HashSet::new();
        for stmt in &program.statements {
            collect_used_statement(stmt, &mut used);
        }
        for decl in &program.declarations {
            collect_used_declaration(decl, &mut used);
        }

        let declarations = mem::take(&mut program.declarations);
        program.declarations = self.prune_declarations(declarations, &used);

        for decl in &mut program.declarations {
            if let DeclarationKind::Routine(routine) = &mut decl.kind {
                if let RoutineBody::Block(block) = &mut routine.body {
                    let block_decls = mem::take(&mut block.declarations);
                    block.declarations = self.prune_declarations(block_decls, &used);
                }
            }
        }
    }

    fn prune_declarations(
        &mut self,
        declarations: Vec<Declaration>,
        used: &HashSet<String>,
    ) -> Vec<Declaration> {
        let mut kept = Vec::with_capacity(declarations.len());
        for decl in declarations {
            if let DeclarationKind::Variable(var) = &decl.kind {
                if !used.contains(&var.name) && var.initializer.is_none() {
                    self.applied += 1;
                    continue;
                }
            }
            kept.push(decl);
        }
        kept
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

fn numeric_literal(expr: &Expr) -> Option<f64> {
    match expr.kind {
        ExprKind::Integer(value) => Some(value as f64),
        ExprKind::Real(value) => Some(value),
        _ => None,
    }
}

fn fold_unary(op: UnaryOp, operand: &Expr, span: SourceSpan) -> Option<Expr> {
    match (&operand.kind, op) {
        (ExprKind::Integer(value), UnaryOp::Minus) => Some(Expr::integer(value.wrapping_neg(), span)),
        (ExprKind::Integer(value), UnaryOp::Plus) => Some(Expr::integer(*value, span)),
        (ExprKind::Real(value), UnaryOp::Minus) => Some(Expr::real(-value, span)),
        (ExprKind::Real(value), UnaryOp::Plus) => Some(Expr::real(*value, span)),
        (ExprKind::Boolean(value), UnaryOp::Not) => Some(Expr::boolean(!value, span)),
        _ => None,
    }
}

/// Record every variable name a statement references, including
/// assignment targets
fn collect_used_statement(stmt: &Statement, used: &mut HashSet<String>) {
    match &stmt.kind {
        StatementKind::Assignment { target, value } => {
            collect_used_expr(target, used);
            collect_used_expr(value, used);
        }
        StatementKind::While { condition, body } => {
            collect_used_expr(condition, used);
            collect_used_block(body, used);
        }
        StatementKind::For { range, body, .. } => {
            collect_used_expr(&range.start, used);
            if let Some(end) = &range.end {
                collect_used_expr(end, used);
            }
            collect_used_block(body, used);
        }
        StatementKind::If {
            condition,
            then_body,
            else_body,
        } => {
            collect_used_expr(condition, used);
            collect_used_block(then_body, used);
            if let Some(else_body) = else_body {
                collect_used_block(else_body, used);
            }
        }
        StatementKind::Print { expressions } => {
            for expr in expressions {
                collect_used_expr(expr, used);
            }
        }
        StatementKind::Call { arguments, .. } => {
            for arg in arguments {
                collect_used_expr(arg, used);
            }
        }
    }
}

fn collect_used_block(block: &Block, used: &mut HashSet<String>) {
    for decl in &block.declarations {
        collect_used_declaration(decl, used);
    }
    for stmt in &block.statements {
        collect_used_statement(stmt, used);
    }
}

fn collect_used_declaration(decl: &Declaration, used: &mut HashSet<String>) {
    match &decl.kind {
        DeclarationKind::Variable(var) => {
            if let Some(init) = &var.initializer {
                collect_used_expr(init, used);
            }
        }
        DeclarationKind::Routine(routine) => match &routine.body {
            RoutineBody::Expression(expr) => collect_used_expr(expr, used),
            RoutineBody::Block(block) => collect_used_block(block, used),
        },
        DeclarationKind::Type(_) => {}
    }
}

fn collect_used_expr(expr: &Expr, used: &mut HashSet<String>) {
    match &expr.kind {
        ExprKind::Variable(name) => {
            used.insert(name.clone());
        }
        ExprKind::Binary { left, right, .. } => {
            collect_used_expr(left, used);
            collect_used_expr(right, used);
        }
        ExprKind::Unary { operand, .. } => {
            collect_used_expr(operand, used);
        }
        ExprKind::Index { array, index } => {
            collect_used_expr(array, used);
            collect_used_expr(index, used);
        }
        ExprKind::Field { record, .. } => {
            collect_used_expr(record, used);
        }
        ExprKind::Call { arguments, .. } => {
            for arg in arguments {
                collect_used_expr(arg, used);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Range, RoutineDecl, RoutineHeader, Type};

    fn sp() -> SourceSpan {
        SourceSpan::new(0, 0)
    }

    fn fold_expr(expr: &mut Expr) -> (bool, Vec<Located<SemanticError>>) {
        let mut optimizer = Optimizer::new();
        let replaced = optimizer.fold(expr);
        (replaced, optimizer.errors)
    }

    fn int(value: i64) -> Expr {
        Expr::integer(value, sp())
    }

    fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::binary(op, left, right, sp())
    }

    #[test]
    fn test_fold_nested_arithmetic() {
        // 2 + 3 * 4
        let mut expr = bin(BinaryOp::Add, int(2), bin(BinaryOp::Mul, int(3), int(4)));
        let (replaced, errors) = fold_expr(&mut expr);
        assert!(replaced);
        assert!(errors.is_empty());
        assert_eq!(expr.as_integer_literal(), Some(14));
    }

    #[test]
    fn test_fold_division_yields_real() {
        let mut expr = bin(BinaryOp::Div, int(7), int(2));
        fold_expr(&mut expr);
        assert_eq!(expr.as_real_literal(), Some(3.5));
    }

    #[test]
    fn test_fold_mod_stays_integer() {
        let mut expr = bin(BinaryOp::Mod, int(7), int(3));
        fold_expr(&mut expr);
        assert_eq!(expr.as_integer_literal(), Some(1));

        // A real operand blocks remainder folding
        let mut expr = bin(BinaryOp::Mod, Expr::real(7.0, sp()), int(3));
        let (replaced, _) = fold_expr(&mut expr);
        assert!(!replaced);
    }

    #[test]
    fn test_division_by_zero_is_reported_not_folded() {
        let mut expr = bin(BinaryOp::Div, int(1), int(0));
        let (replaced, errors) = fold_expr(&mut expr);
        assert!(!replaced);
        assert_eq!(errors[0].value, SemanticError::DivisionByZero);
        assert!(matches!(expr.kind, ExprKind::Binary { .. }));

        let mut expr = bin(BinaryOp::Mod, int(1), int(0));
        let (_, errors) = fold_expr(&mut expr);
        assert_eq!(errors[0].value, SemanticError::DivisionByZero);
    }

    #[test]
    fn test_fold_mixed_arithmetic_in_real() {
        let mut expr = bin(BinaryOp::Add, int(1), Expr::real(0.5, sp()));
        fold_expr(&mut expr);
        assert_eq!(expr.as_real_literal(), Some(1.5));
    }

    #[test]
    fn test_fold_relational_on_literals() {
        let mut expr = bin(BinaryOp::Lt, int(1), int(2));
        fold_expr(&mut expr);
        assert_eq!(expr.as_boolean_literal(), Some(true));

        let mut expr = bin(BinaryOp::Eq, Expr::real(1.0, sp()), int(1));
        fold_expr(&mut expr);
        assert_eq!(expr.as_boolean_literal(), Some(true));
    }

    #[test]
    fn test_fold_logical_on_literals() {
        let mut expr = bin(
            BinaryOp::Xor,
            Expr::boolean(true, sp()),
            Expr::boolean(false, sp()),
        );
        fold_expr(&mut expr);
        assert_eq!(expr.as_boolean_literal(), Some(true));

        let mut expr = bin(
            BinaryOp::And,
            Expr::boolean(true, sp()),
            Expr::boolean(false, sp()),
        );
        fold_expr(&mut expr);
        assert_eq!(expr.as_boolean_literal(), Some(false));
    }

    #[test]
    fn test_fold_unary_operators() {
        let mut expr = Expr::unary(UnaryOp::Minus, int(5), sp());
        fold_expr(&mut expr);
        assert_eq!(expr.as_integer_literal(), Some(-5));

        let mut expr = Expr::unary(UnaryOp::Not, Expr::boolean(false, sp()), sp());
        fold_expr(&mut expr);
        assert_eq!(expr.as_boolean_literal(), Some(true));

        let mut expr = Expr::unary(UnaryOp::Plus, Expr::real(2.5, sp()), sp());
        fold_expr(&mut expr);
        assert_eq!(expr.as_real_literal(), Some(2.5));
    }

    #[test]
    fn test_fold_never_evaluates_variables() {
        // x + 0 must stay as written
        let mut expr = bin(BinaryOp::Add, Expr::variable("x", sp()), int(0));
        let (replaced, _) = fold_expr(&mut expr);
        assert!(!replaced);
        assert!(matches!(expr.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn test_fold_reaches_into_compound_expressions() {
        let mut expr = Expr::new(
            ExprKind::Index {
                array: Box::new(Expr::variable("a", sp())),
                index: Box::new(bin(BinaryOp::Add, int(1), int(1))),
            },
            sp(),
        );
        let (replaced, _) = fold_expr(&mut expr);
        // The index folds, the access itself is not a fold site
        assert!(!replaced);
        if let ExprKind::Index { index, .. } = &expr.kind {
            assert_eq!(index.as_integer_literal(), Some(2));
        } else {
            panic!("expected index expression");
        }
    }

    #[test]
    fn test_fold_is_idempotent() {
        let mut once = bin(
            BinaryOp::Add,
            int(2),
            bin(BinaryOp::Mul, int(3), Expr::real(4.0, sp())),
        );
        fold_expr(&mut once);
        let mut twice = once.clone();
        let (replaced, _) = fold_expr(&mut twice);
        assert!(!replaced);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_integer_overflow_wraps() {
        let mut expr = bin(BinaryOp::Add, int(i64::MAX), int(1));
        fold_expr(&mut expr);
        assert_eq!(expr.as_integer_literal(), Some(i64::MIN));
    }

    fn run(program: &mut Program) -> (usize, Vec<Located<SemanticError>>) {
        Optimizer::new().run(program)
    }

    #[test]
    fn test_initializer_fold_counts_once() {
        let mut program = Program::new(
            vec![Declaration::variable(
                "x",
                Some(Type::integer()),
                Some(bin(BinaryOp::Add, int(2), bin(BinaryOp::Mul, int(3), int(4)))),
                sp(),
            )],
            vec![],
        );
        let (applied, errors) = run(&mut program);
        assert!(errors.is_empty());
        assert_eq!(applied, 1);
        let DeclarationKind::Variable(var) = &program.declarations[0].kind else {
            panic!("expected variable declaration");
        };
        assert_eq!(var.initializer.as_ref().unwrap().as_integer_literal(), Some(14));
    }

    #[test]
    fn test_true_branch_splices_with_hoisting() {
        // if true then var z is 1; y := z end
        let then_body = Block::new(
            vec![Declaration::variable(
                "z",
                Some(Type::integer()),
                Some(int(1)),
                sp(),
            )],
            vec![Statement::assignment(
                Expr::variable("y", sp()),
                Expr::variable("z", sp()),
                sp(),
            )],
            sp(),
        );
        let mut program = Program::new(
            vec![Declaration::variable("y", Some(Type::integer()), Some(int(0)), sp())],
            vec![Statement::new(
                StatementKind::If {
                    condition: Expr::boolean(true, sp()),
                    then_body,
                    else_body: None,
                },
                sp(),
            )],
        );
        let (applied, errors) = run(&mut program);
        assert!(errors.is_empty());
        assert_eq!(applied, 1);
        // z hoisted after the pre-existing y
        assert_eq!(program.declarations.len(), 2);
        let DeclarationKind::Variable(var) = &program.declarations[1].kind else {
            panic!("expected variable declaration");
        };
        assert_eq!(var.name, "z");
        // the branch body replaced the if
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(
            program.statements[0].kind,
            StatementKind::Assignment { .. }
        ));
    }

    #[test]
    fn test_false_branch_selects_else() {
        let then_body = Block::new(
            vec![],
            vec![Statement::assignment(Expr::variable("y", sp()), int(1), sp())],
            sp(),
        );
        let else_body = Block::new(
            vec![],
            vec![Statement::assignment(Expr::variable("y", sp()), int(7), sp())],
            sp(),
        );
        let mut program = Program::new(
            vec![Declaration::variable("y", Some(Type::integer()), Some(int(0)), sp())],
            vec![Statement::new(
                StatementKind::If {
                    condition: Expr::boolean(false, sp()),
                    then_body,
                    else_body: Some(else_body),
                },
                sp(),
            )],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 1);
        assert_eq!(program.statements.len(), 1);
        let StatementKind::Assignment { value, .. } = &program.statements[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(value.as_integer_literal(), Some(7));
    }

    #[test]
    fn test_false_branch_without_else_removes_if() {
        let then_body = Block::new(
            vec![],
            vec![Statement::assignment(Expr::variable("y", sp()), int(1), sp())],
            sp(),
        );
        let mut program = Program::new(
            vec![Declaration::variable("y", Some(Type::integer()), Some(int(0)), sp())],
            vec![Statement::new(
                StatementKind::If {
                    condition: Expr::boolean(false, sp()),
                    then_body,
                    else_body: None,
                },
                sp(),
            )],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 1);
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_hoist_collision_is_reported_and_skipped() {
        let then_body = Block::new(
            vec![Declaration::variable("y", Some(Type::integer()), Some(int(1)), sp())],
            vec![],
            sp(),
        );
        let mut program = Program::new(
            vec![Declaration::variable("y", Some(Type::integer()), Some(int(0)), sp())],
            vec![Statement::new(
                StatementKind::If {
                    condition: Expr::boolean(true, sp()),
                    then_body,
                    else_body: None,
                },
                sp(),
            )],
        );
        let (applied, errors) = run(&mut program);
        assert_eq!(errors[0].value, SemanticError::DuplicateDeclaration("y".into()));
        assert_eq!(applied, 1);
        // the colliding declaration is dropped, the original kept
        assert_eq!(program.declarations.len(), 1);
    }

    #[test]
    fn test_nested_constant_branches_surface_first() {
        // if true then if true then var z is 5 end end
        let inner = Statement::new(
            StatementKind::If {
                condition: Expr::boolean(true, sp()),
                then_body: Block::new(
                    vec![Declaration::variable("z", Some(Type::integer()), Some(int(5)), sp())],
                    vec![],
                    sp(),
                ),
                else_body: None,
            },
            sp(),
        );
        let outer = Statement::new(
            StatementKind::If {
                condition: Expr::boolean(true, sp()),
                then_body: Block::new(vec![], vec![inner], sp()),
                else_body: None,
            },
            sp(),
        );
        let mut program = Program::new(
            vec![],
            vec![
                outer,
                Statement::assignment(Expr::variable("w", sp()), Expr::variable("z", sp()), sp()),
            ],
        );
        let (applied, errors) = run(&mut program);
        assert!(errors.is_empty());
        // both branch eliminations counted
        assert_eq!(applied, 2);
        assert_eq!(program.declarations.len(), 1);
        let DeclarationKind::Variable(var) = &program.declarations[0].kind else {
            panic!("expected variable declaration");
        };
        assert_eq!(var.name, "z");
    }

    #[test]
    fn test_while_false_is_removed() {
        let body = Block::new(
            vec![],
            vec![Statement::assignment(Expr::variable("x", sp()), int(1), sp())],
            sp(),
        );
        let mut program = Program::new(
            vec![],
            vec![Statement::new(
                StatementKind::While {
                    condition: Expr::boolean(false, sp()),
                    body,
                },
                sp(),
            )],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 1);
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_while_condition_folding_to_false_removes_loop() {
        // while 1 > 2 loop ... end
        let body = Block::new(
            vec![],
            vec![Statement::assignment(Expr::variable("x", sp()), int(1), sp())],
            sp(),
        );
        let mut program = Program::new(
            vec![],
            vec![Statement::new(
                StatementKind::While {
                    condition: bin(BinaryOp::Gt, int(1), int(2)),
                    body,
                },
                sp(),
            )],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 1);
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_while_true_is_kept_and_simplified() {
        let body = Block::new(
            vec![],
            vec![Statement::assignment(
                Expr::variable("x", sp()),
                bin(BinaryOp::Add, int(1), int(1)),
                sp(),
            )],
            sp(),
        );
        let mut program = Program::new(
            vec![],
            vec![Statement::new(
                StatementKind::While {
                    condition: Expr::boolean(true, sp()),
                    body,
                },
                sp(),
            )],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 0);
        let StatementKind::While { body, .. } = &program.statements[0].kind else {
            panic!("expected while");
        };
        let StatementKind::Assignment { value, .. } = &body.statements[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(value.as_integer_literal(), Some(2));
    }

    #[test]
    fn test_for_body_is_simplified_and_kept() {
        let body = Block::new(
            vec![],
            vec![Statement::new(
                StatementKind::While {
                    condition: Expr::boolean(false, sp()),
                    body: Block::new(vec![], vec![], sp()),
                },
                sp(),
            )],
            sp(),
        );
        let mut program = Program::new(
            vec![],
            vec![Statement::new(
                StatementKind::For {
                    variable: "i".into(),
                    range: Range {
                        start: int(1),
                        end: Some(int(10)),
                    },
                    reverse: false,
                    body,
                },
                sp(),
            )],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 1);
        let StatementKind::For { body, .. } = &program.statements[0].kind else {
            panic!("expected for");
        };
        assert!(body.statements.is_empty());
    }

    #[test]
    fn test_unused_declaration_without_initializer_is_removed() {
        let mut program = Program::new(
            vec![
                Declaration::variable("unused", Some(Type::integer()), None, sp()),
                Declaration::variable("kept", Some(Type::integer()), Some(int(1)), sp()),
                Declaration::variable("read", Some(Type::integer()), None, sp()),
            ],
            vec![Statement::new(
                StatementKind::Print {
                    expressions: vec![Expr::variable("read", sp())],
                },
                sp(),
            )],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 1);
        assert_eq!(program.declarations.len(), 2);
        let names: Vec<_> = program
            .declarations
            .iter()
            .map(|decl| match &decl.kind {
                DeclarationKind::Variable(var) => var.name.as_str(),
                _ => panic!("expected variable declaration"),
            })
            .collect();
        assert_eq!(names, ["kept", "read"]);
    }

    #[test]
    fn test_assignment_target_counts_as_use() {
        let mut program = Program::new(
            vec![Declaration::variable("x", Some(Type::integer()), None, sp())],
            vec![Statement::assignment(Expr::variable("x", sp()), int(1), sp())],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 0);
        assert_eq!(program.declarations.len(), 1);
    }

    #[test]
    fn test_routine_body_block_is_pruned() {
        let body = Block::new(
            vec![Declaration::variable("tmp", Some(Type::integer()), None, sp())],
            vec![],
            sp(),
        );
        let routine = RoutineDecl {
            header: RoutineHeader {
                name: "r".into(),
                parameters: vec![],
                return_type: None,
                span: sp(),
            },
            body: RoutineBody::Block(body),
        };
        let mut program = Program::new(
            vec![Declaration::new(DeclarationKind::Routine(routine), sp())],
            vec![],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 1);
        let DeclarationKind::Routine(routine) = &program.declarations[0].kind else {
            panic!("expected routine");
        };
        let RoutineBody::Block(block) = &routine.body else {
            panic!("expected block body");
        };
        assert!(block.declarations.is_empty());
    }

    #[test]
    fn test_expression_bodied_routine_is_folded() {
        let routine = RoutineDecl {
            header: RoutineHeader {
                name: "six".into(),
                parameters: vec![],
                return_type: Some(Type::integer()),
                span: sp(),
            },
            body: RoutineBody::Expression(bin(BinaryOp::Mul, int(2), int(3))),
        };
        let mut program = Program::new(
            vec![Declaration::new(DeclarationKind::Routine(routine), sp())],
            vec![],
        );
        let (applied, _) = run(&mut program);
        assert_eq!(applied, 1);
        let DeclarationKind::Routine(routine) = &program.declarations[0].kind else {
            panic!("expected routine");
        };
        let RoutineBody::Expression(expr) = &routine.body else {
            panic!("expected expression body");
        };
        assert_eq!(expr.as_integer_literal(), Some(6));
    }

    #[test]
    fn test_already_folded_tree_is_a_fixed_point() {
        let mut program = Program::new(
            vec![Declaration::variable("x", Some(Type::integer()), Some(int(14)), sp())],
            vec![Statement::assignment(Expr::variable("x", sp()), int(1), sp())],
        );
        let before = program.clone();
        let (applied, errors) = run(&mut program);
        assert_eq!(applied, 0);
        assert!(errors.is_empty());
        assert_eq!(program, before);
    }
}
