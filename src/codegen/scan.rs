//! Token scanning over generated C++ lambda bodies. This is a flat token
//! scan with a small rule set, not a parser: it answers exactly two
//! questions. Does the body declare a static-storage local, and which
//! `id(...)` references does it contain.

use logos::Logos;

use crate::span::{Span, Spanned};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum BodyToken {
    #[token("static")]
    Static,

    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,
    #[regex(r"'([^'\\\n]|\\.)'")]
    CharLit,

    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Any other single character (operators, braces, semicolons, ...).
    #[regex(r"[^ \t\r\nA-Za-z0-9_()]")]
    Punct,
}

/// Identifiers that never head a variable declaration after `static`.
/// The suffixed forms (`static_cast`, `static_assert`,
/// `static_pointer_cast`) are already excluded by the token boundary;
/// the bare words stay off the match list too, so `static cast obj;`
/// is not flagged.
const NON_DECL_HEADS: [&str; 3] = ["cast", "assert", "pointer_cast"];

/// Does `body` declare a variable with static storage duration?
///
/// A match is the keyword `static` (whole token, so `static_cast` and
/// friends never match) followed, across any whitespace, newlines, or
/// comments, by an identifier that can head a declaration. Occurrences
/// inside line comments, block comments, and string/char literals are
/// ignored. Unscannable input is treated as a match: a lambda we cannot
/// fully scan is never safe to share.
pub fn has_static_locals(body: &str) -> bool {
    let mut lex = BodyToken::lexer(body);
    let mut after_static = false;

    while let Some(result) = lex.next() {
        let tok = match result {
            Ok(tok) => tok,
            Err(()) => return true,
        };
        match tok {
            BodyToken::LineComment | BodyToken::BlockComment => continue,
            BodyToken::Static => after_static = true,
            BodyToken::Ident => {
                if after_static && !NON_DECL_HEADS.contains(&lex.slice()) {
                    return true;
                }
                after_static = false;
            }
            _ => after_static = false,
        }
    }

    false
}

/// Extract `id(<ident>)` component references from a lambda body.
///
/// Returns each referenced identifier with the span of the whole
/// `id(...)` expression, relative to the start of `body`. Comments and
/// string literals are skipped; malformed fragments are ignored (the
/// reference pass validates, it does not reject bodies).
pub fn id_references(body: &str) -> Vec<Spanned<String>> {
    let mut refs = Vec::new();
    let mut lex = BodyToken::lexer(body);

    // Tiny state machine: Ident("id") → LParen → Ident(name) → RParen.
    let mut pending: Option<(usize, Option<String>, bool)> = None;

    while let Some(result) = lex.next() {
        let tok = match result {
            Ok(tok) => tok,
            Err(()) => {
                pending = None;
                continue;
            }
        };
        if matches!(tok, BodyToken::LineComment | BodyToken::BlockComment) {
            continue;
        }

        pending = match (pending, &tok) {
            (None, BodyToken::Ident) if lex.slice() == "id" => {
                Some((lex.span().start, None, false))
            }
            (Some((start, None, false)), BodyToken::LParen) => Some((start, None, true)),
            (Some((start, None, true)), BodyToken::Ident) => {
                Some((start, Some(lex.slice().to_string()), true))
            }
            (Some((start, Some(name), true)), BodyToken::RParen) => {
                refs.push(Spanned::new(name, Span::new(start, lex.span().end)));
                None
            }
            // Restart if this token itself opens a new reference.
            (_, BodyToken::Ident) if lex.slice() == "id" => {
                Some((lex.span().start, None, false))
            }
            _ => None,
        };
    }

    refs
}

/// Rewrite every `id(<ident>)` reference in `body` using `replace`.
/// The callback maps the referenced config id to its generated C++ name.
pub fn rewrite_id_references(body: &str, mut replace: impl FnMut(&str) -> String) -> String {
    let refs = id_references(body);
    if refs.is_empty() {
        return body.to_string();
    }

    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for r in &refs {
        out.push_str(&body[cursor..r.span.start]);
        out.push_str(&replace(&r.node));
        cursor = r.span.end;
    }
    out.push_str(&body[cursor..]);
    out
}
