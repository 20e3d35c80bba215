//! Semantic analysis and optimization for ilang
//!
//! The analyzer receives a parsed program tree plus a symbol table whose
//! routine map the parser populated, verifies well-formedness under the
//! type discipline, rewrites the tree when the check was clean, and
//! returns a diagnostics bundle alongside the mutated tree.

mod checker;
mod optimizer;
mod scope;
mod types;
mod validator;

pub use checker::Checker;
pub use optimizer::Optimizer;
pub use scope::{RoutineInfo, SymbolTable, VariableInfo};
pub use types::{compatible, infer};
pub use validator::Validator;

use crate::ast::Program;
use crate::errors::{Located, SemanticError, SemanticWarning, SourceSpan};

/// Analysis configuration
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Run the AST rewrites after a clean check (default true)
    pub enable_optimizations: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            enable_optimizations: true,
        }
    }
}

/// Everything the analyzer reports back to the driver
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// Well-formedness violations, in traversal order
    pub errors: Vec<Located<SemanticError>>,
    /// Non-fatal anomalies, in traversal order
    pub warnings: Vec<Located<SemanticWarning>>,
    /// Number of rewrites the optimizer applied
    pub optimizations_applied: usize,
}

impl Diagnostics {
    /// Analysis succeeded when no errors were recorded
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages as plain strings
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.value.to_string()).collect()
    }

    /// Warning messages as plain strings
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.value.to_string()).collect()
    }
}

/// Drives the checker, the optimizer, and the post-optimization
/// validator over one program
pub struct Analyzer<'a> {
    symbols: &'a SymbolTable,
    options: AnalyzerOptions,
}

impl<'a> Analyzer<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self::with_options(symbols, AnalyzerOptions::default())
    }

    pub fn with_options(symbols: &'a SymbolTable, options: AnalyzerOptions) -> Self {
        Self { symbols, options }
    }

    /// Analyze a program in place. `None` stands for a tree the parser
    /// failed to produce and yields a single error.
    ///
    /// Checker errors suppress optimization; the optimizer and the
    /// post-optimization validator may still add errors of their own.
    pub fn analyze(&self, program: Option<&mut Program>) -> Diagnostics {
        let mut diagnostics = Diagnostics::default();
        let Some(program) = program else {
            diagnostics
                .errors
                .push(Located::new(SemanticError::NullProgramRoot, SourceSpan::new(0, 0)));
            return diagnostics;
        };

        let (errors, warnings) = Checker::new(self.symbols).check(program);
        diagnostics.errors = errors;
        diagnostics.warnings = warnings;

        if self.options.enable_optimizations && diagnostics.errors.is_empty() {
            let (applied, errors) = Optimizer::new().run(program);
            diagnostics.optimizations_applied = applied;
            diagnostics.errors.extend(errors);
            diagnostics.errors.extend(Validator::new().validate(program));
        }

        diagnostics
    }
}

/// Analyze with default options
pub fn analyze(program: &mut Program, symbols: &SymbolTable) -> Diagnostics {
    Analyzer::new(symbols).analyze(Some(program))
}
