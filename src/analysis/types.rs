//! Type inference and compatibility
//!
//! The engine is side-effect free: `infer` computes a fresh type from the
//! expression alone, consulting the cached type only where structure
//! cannot decide (variables, member accesses, calls).

use crate::ast::{BinaryOp, Expr, ExprKind, Primitive, Type, TypeKind, UnaryOp};

/// Infer the type of an expression.
///
/// Literals map to their primitive type. Arithmetic widens to real when
/// either operand is real, except `/` which always yields real.
/// Relational and logical operators yield boolean. Accesses and calls
/// fall back to their cached type; when none was attached the engine
/// defaults to integer and leaves the checker to report the real
/// problem.
pub fn infer(expr: &Expr) -> Type {
    match &expr.kind {
        ExprKind::Integer(_) => Type::integer(),
        ExprKind::Real(_) => Type::real(),
        ExprKind::Boolean(_) => Type::boolean(),
        ExprKind::Binary { op, left, right } => match op {
            BinaryOp::Div => Type::real(),
            op if op.is_arithmetic() => {
                if infer(left).is_real() || infer(right).is_real() {
                    Type::real()
                } else {
                    Type::integer()
                }
            }
            // Relational and logical operators
            _ => Type::boolean(),
        },
        ExprKind::Unary { op: UnaryOp::Not, .. } => Type::boolean(),
        ExprKind::Unary { operand, .. } => infer(operand),
        _ => expr.ty.clone().unwrap_or_else(Type::integer),
    }
}

/// Whether a value of type `a` may appear where `b` is expected.
///
/// Primitive kinds must match, except that an integer widens to real.
/// Arrays and records have no nominal equality at this layer and are
/// always treated as compatible.
pub fn compatible(a: &Type, b: &Type) -> bool {
    match (&a.kind, &b.kind) {
        (TypeKind::Primitive(a), TypeKind::Primitive(b)) => {
            a == b || (*a == Primitive::Integer && *b == Primitive::Real)
        }
        _ => true,
    }
}
