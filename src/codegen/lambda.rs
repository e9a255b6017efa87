//! Lambda deduplication. Textually-identical stateless lambdas are merged
//! into a single shared top-level function; everything else is emitted
//! inline at its use site.
//!
//! A lambda is shareable only if it captures nothing and its body declares
//! no static-storage locals: sharing a static would alias per-call-site
//! state across unrelated call sites.

use std::collections::HashMap;

use serde::Serialize;

use super::expr::{Lambda, LambdaExpr, SharedLambda};
use super::scan::has_static_locals;

/// Sentinel standing in for an absent (inferred) return type in the
/// canonical key. An explicit return type never collides with it.
const INFERRED: &str = "inferred";

/// Canonical signature: exact-match tuple of body text, parameter
/// sequence, and rendered return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    body: String,
    params: Vec<(String, String)>,
    ret: String,
}

impl DedupKey {
    fn of(lambda: &Lambda) -> Self {
        Self {
            body: lambda.format_body(),
            params: lambda
                .parameters
                .iter()
                .map(|p| (p.ty.clone(), p.name.clone()))
                .collect(),
            ret: lambda.return_type.clone().unwrap_or_else(|| INFERRED.to_string()),
        }
    }
}

/// Counters for the generation report.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DedupStats {
    /// Total lambda construction calls.
    pub constructed: usize,
    /// Calls that reused an already-registered shared function.
    pub reused: usize,
    /// Distinct shared functions allocated.
    pub shared: usize,
    /// Lambdas emitted inline (stateful or static-carrying).
    pub inlined: usize,
}

/// Per-run deduplication registry. Lives on the generation context for
/// exactly one run; a fresh context starts a fresh registry.
#[derive(Default)]
pub struct LambdaDedup {
    by_key: HashMap<DedupKey, SharedLambda>,
    pending: Vec<String>,
    next_id: usize,
    pub stats: DedupStats,
}

impl LambdaDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is this lambda eligible for deduplication at all?
    pub fn is_shareable(lambda: &Lambda) -> bool {
        lambda.capture.is_empty() && !has_static_locals(&lambda.format_body())
    }

    /// Look up or allocate the shared function for an eligible lambda.
    ///
    /// On a miss this allocates the next `shared_lambda_<n>` name, renders
    /// the full definition into the pending-declarations list, and
    /// registers the signature. Insert-only: existing entries are never
    /// replaced, so equal signatures always resolve to one name.
    pub fn intern(&mut self, lambda: &Lambda) -> SharedLambda {
        let key = DedupKey::of(lambda);
        if let Some(existing) = self.by_key.get(&key) {
            self.stats.reused += 1;
            return existing.clone();
        }

        let func_name = format!("shared_lambda_{}", self.next_id);
        self.next_id += 1;

        let shared = SharedLambda {
            func_name,
            parameters: lambda.parameters.clone(),
            return_type: lambda.return_type.clone(),
        };
        self.pending.push(render_declaration(&shared, &key.body));
        self.stats.shared += 1;
        self.by_key.insert(key, shared.clone());
        shared
    }

    /// Number of declarations waiting for the final flush.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Consume the pending declarations, in allocation order. Called
    /// exactly once per run by the final-priority flush job.
    pub fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}

/// Construct a lambda value: a shared reference when the lambda is
/// eligible for deduplication, otherwise the inline literal.
pub fn process_lambda(dedup: &mut LambdaDedup, lambda: Lambda) -> LambdaExpr {
    dedup.stats.constructed += 1;
    if !LambdaDedup::is_shareable(&lambda) {
        dedup.stats.inlined += 1;
        return LambdaExpr::Inline(lambda);
    }
    LambdaExpr::Shared(dedup.intern(&lambda))
}

/// Render the standalone definition for a shared lambda. Inferred return
/// types are spelled `auto`; the name only ever appears at top level.
fn render_declaration(shared: &SharedLambda, body: &str) -> String {
    let ret = shared.return_type.as_deref().unwrap_or("auto");
    let params = shared
        .parameters
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{ret} {}({params}) {{\n  {body}\n}}", shared.func_name)
}
