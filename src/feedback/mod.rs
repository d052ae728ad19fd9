//! Structured Feedback Module
//!
//! Machine-readable check results for `rlc --json`, and the symbol dump
//! printed by `--emit-symbols`.

use serde::{Deserialize, Serialize};

use crate::frontend::ast::Crate;
use crate::semantic::Checker;
use crate::utils::Error;

// ==================== Structured Error Report ====================

/// One reported error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code per error class (e.g. "E0004")
    pub code: String,
    /// Taxonomy name, see [`crate::utils::ErrorKind::as_str`]
    pub kind: String,
    pub message: String,
    /// 1-based, absent when the error carries no span
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn from_error(error: &Error, source: &str) -> Self {
        let kind = error.kind();
        let (line, column) = match error.span() {
            Some(span) => {
                let (line, column) = span.line_col(source);
                (Some(line), Some(column))
            }
            None => (None, None),
        };
        Self {
            code: error_code(error).to_string(),
            kind: kind.as_str().to_string(),
            message: error.to_string(),
            line,
            column,
        }
    }

    /// `error[kind]: message` with `line:column` when known
    pub fn render(&self, file_name: &str) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => format!(
                "error[{}]: {}\n  --> {}:{}:{}",
                self.kind, self.message, file_name, line, column
            ),
            _ => format!("error[{}]: {}", self.kind, self.message),
        }
    }
}

fn error_code(error: &Error) -> &'static str {
    use crate::utils::ErrorKind::*;
    match error.kind() {
        Syntax => "E0001",
        DuplicateDeclaration => "E0002",
        UndefinedReference => "E0003",
        TypeMismatch => "E0004",
        IllegalConstant => "E0005",
        StructuralViolation => "E0006",
        Io => "E0007",
    }
}

// ==================== Check Report ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Top-level items after hoisting
    pub items: usize,
    pub structs: usize,
    /// Including built-ins
    pub functions: usize,
    pub consts: usize,
}

impl Stats {
    pub fn collect(krate: &Crate, checker: &Checker) -> Self {
        Self {
            items: krate.items.len(),
            structs: checker.symbols.structs.len(),
            functions: checker.symbols.functions.len(),
            consts: checker.symbols.consts.len(),
        }
    }
}

/// Complete result of one `rlc check` run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub success: bool,
    pub source_file: String,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: Stats,
}

impl CheckReport {
    pub fn success(source_file: String, stats: Stats) -> Self {
        Self {
            success: true,
            source_file,
            diagnostics: vec![],
            stats,
        }
    }

    pub fn failure(source_file: String, diagnostic: Diagnostic, stats: Stats) -> Self {
        Self {
            success: false,
            source_file,
            diagnostics: vec![diagnostic],
            stats,
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ==================== Symbol Dump ====================

/// Human-readable listing of the closed symbol tables, sorted by name.
pub fn dump_symbols(checker: &Checker) -> String {
    let types = &checker.types;
    let symbols = &checker.symbols;
    let mut out = String::new();

    for (name, id) in symbols.structs.iter() {
        out.push_str(&format!("struct {}\n", name));
        if let Some(s) = types.struct_type(id) {
            for (field, ty) in s.fields() {
                out.push_str(&format!("    {}: {}\n", field, types.display(*ty)));
            }
            for (method, sig) in s.methods() {
                out.push_str(&format!("    fn {}: {}\n", method, types.display(*sig)));
            }
        }
    }
    for (name, id) in symbols.enums.iter() {
        let variants = types
            .enum_type(id)
            .map(|e| e.variants().join(", "))
            .unwrap_or_default();
        out.push_str(&format!("enum {} {{ {} }}\n", name, variants));
    }
    for (name, sig) in symbols.functions.iter() {
        out.push_str(&format!("fn {}: {}\n", name, types.display(sig)));
    }
    for (name, entry) in symbols.consts.iter() {
        out.push_str(&format!(
            "const {}: {} = {}\n",
            name,
            types.display(entry.ty),
            entry.value
        ));
    }
    out
}
