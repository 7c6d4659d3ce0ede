//! Raw Java-side AST types produced by the parser.
//!
//! These are the only shapes the extractor ever inspects. Anything in the
//! source the parser cannot fit into them collapses to [`RawExpr::Opaque`]
//! or is skipped entirely, which in turn makes the enclosing declaration
//! fail its shape match without aborting extraction.

#[derive(Debug, Clone)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
}

/// A parsed initializer / right-hand-side expression.
#[derive(Debug, Clone, PartialEq)]
pub enum RawExpr {
    /// Integer literal, unary minus already folded in
    Int(i64),
    /// Floating-point literal, unary minus already folded in
    Float(f64),
    /// Bare identifier reference
    Ident(String),
    /// `new Class(args)` -- for dotted class names, the last segment
    New { class: String, args: Vec<RawExpr> },
    /// `recv.method(args)`
    Invoke {
        recv: Box<RawExpr>,
        method: String,
        args: Vec<RawExpr>,
    },
    /// Any expression form outside the recognized grammar
    Opaque,
}

/// A single-declarator field declaration.
#[derive(Debug, Clone)]
pub struct RawField {
    pub modifiers: Vec<String>,
    pub type_name: String,
    pub name: String,
    pub init: Option<RawExpr>,
    pub prov: Provenance,
}

impl RawField {
    /// Exactly `public static`, nothing else (`final` disqualifies, as in
    /// the source convention these files follow).
    pub fn is_public_static(&self) -> bool {
        self.modifiers.len() == 2
            && self.modifiers.iter().any(|m| m == "public")
            && self.modifiers.iter().any(|m| m == "static")
    }

    pub fn is_public_instance(&self) -> bool {
        self.modifiers.iter().any(|m| m == "public")
            && !self.modifiers.iter().any(|m| m == "static")
    }
}

/// A `name = expr;` statement from a constructor body.
#[derive(Debug, Clone)]
pub struct RawAssign {
    pub name: String,
    pub expr: RawExpr,
    pub prov: Provenance,
}

/// One top-level class: its recognizable fields and constructor assignments,
/// in source order.
#[derive(Debug, Clone)]
pub struct RawClass {
    pub name: String,
    pub fields: Vec<RawField>,
    pub assigns: Vec<RawAssign>,
}
