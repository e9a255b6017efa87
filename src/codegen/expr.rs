//! C++ expression model for generated source: lambda expressions, shared
//! function references, identifier sanitization, and type spelling.

use std::fmt;

use crate::span::Span;

/// One `(type, name)` parameter of a generated lambda. Order is part of
/// the lambda's signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub ty: String,
    pub name: String,
}

impl Param {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self { ty: ty.into(), name: name.into() }
    }
}

/// A generated C++ lambda expression.
///
/// `parts` are immutable once constructed; `capture` is the literal
/// capture descriptor (empty = captures nothing); `return_type` of `None`
/// means the return type is left to inference; `source` is provenance for
/// diagnostics only and never participates in equivalence.
#[derive(Debug, Clone)]
pub struct Lambda {
    parts: Vec<String>,
    pub parameters: Vec<Param>,
    pub capture: String,
    pub return_type: Option<String>,
    pub source: Option<Span>,
}

impl Lambda {
    pub fn new(
        parts: Vec<String>,
        parameters: Vec<Param>,
        capture: impl Into<String>,
        return_type: Option<String>,
        source: Option<Span>,
    ) -> Self {
        Self { parts, parameters, capture: capture.into(), return_type, source }
    }

    /// The body text: concatenated parts, outer whitespace trimmed.
    pub fn format_body(&self) -> String {
        self.parts.concat().trim().to_string()
    }

    /// `type name, type name, ...`
    pub fn format_parameters(&self) -> String {
        self.parameters
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]({})", self.capture, self.format_parameters())?;
        if let Some(ret) = &self.return_type {
            write!(f, " -> {ret}")?;
        }
        write!(f, " {{ {} }}", self.format_body())
    }
}

/// A lambda that was deduplicated into a standalone top-level function.
/// Renders as a bare reference to the function name; the definition
/// itself lives in the dedup registry's pending declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedLambda {
    pub func_name: String,
    pub parameters: Vec<Param>,
    pub return_type: Option<String>,
}

impl SharedLambda {
    /// Shared lambdas are stateless by construction.
    pub fn capture(&self) -> &str {
        ""
    }

    /// A reference carries no inline body content.
    pub fn content(&self) -> &str {
        ""
    }
}

impl fmt::Display for SharedLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.func_name)
    }
}

/// What a call site gets back from lambda construction: either a full
/// inline literal or a reference to a shared function.
#[derive(Debug, Clone)]
pub enum LambdaExpr {
    Inline(Lambda),
    Shared(SharedLambda),
}

impl LambdaExpr {
    pub fn is_shared(&self) -> bool {
        matches!(self, LambdaExpr::Shared(_))
    }
}

impl fmt::Display for LambdaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LambdaExpr::Inline(lambda) => lambda.fmt(f),
            LambdaExpr::Shared(shared) => shared.fmt(f),
        }
    }
}

// ---- Identifier sanitization ----

/// C++ keywords that a sanitized config id must not collide with.
const CPP_RESERVED: &[&str] = &[
    "alignas", "alignof", "auto", "bool", "break", "case", "catch", "char",
    "class", "const", "continue", "default", "delete", "do", "double",
    "else", "enum", "explicit", "extern", "false", "float", "for", "friend",
    "goto", "if", "inline", "int", "long", "namespace", "new", "operator",
    "private", "protected", "public", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "template", "this",
    "throw", "true", "try", "typedef", "typename", "union", "unsigned",
    "using", "virtual", "void", "volatile", "while",
];

/// Turn a config id into a valid C++ identifier: invalid characters become
/// `_`, a leading digit gets a `v_` prefix, reserved words get a trailing
/// `_`.
pub fn sanitize_ident(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if out.is_empty() {
        out.push('_');
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert_str(0, "v_");
    }
    if CPP_RESERVED.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// Spell a config-level value type as C++.
pub fn cpp_type(ty: &str) -> &str {
    match ty {
        "int" => "int32_t",
        "float" => "float",
        "bool" => "bool",
        "string" => "std::string",
        other => other,
    }
}
