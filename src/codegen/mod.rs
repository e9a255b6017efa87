//! Code generation driver: the per-run generation context, the deferred
//! job queue wiring, and final `main.cpp` assembly.

pub mod expr;
pub mod jobs;
pub mod lambda;
pub mod scan;

use std::collections::HashSet;
use std::fmt::Write;

use crate::config::DeviceConfig;
use crate::diagnostics::GenError;
use crate::registry;
use self::jobs::{JobQueue, Priority};
use self::lambda::{DedupStats, LambdaDedup};

/// Everything produced for one generation run.
pub struct GenOutput {
    pub main_cpp: String,
    pub stats: DedupStats,
}

/// Per-run generation state, threaded explicitly through all codegen.
/// Create a fresh context per run; nothing survives between runs.
pub struct GenContext {
    includes: Vec<String>,
    include_seen: HashSet<String>,
    globals: Vec<String>,
    setup_blocks: Vec<(String, Vec<String>)>,
    loop_lines: Vec<String>,
    min_update_interval: Option<u64>,
    pub lambdas: LambdaDedup,
    pub jobs: JobQueue,
}

impl GenContext {
    pub fn new() -> Self {
        let mut ctx = Self {
            includes: Vec::new(),
            include_seen: HashSet::new(),
            globals: Vec::new(),
            setup_blocks: Vec::new(),
            loop_lines: Vec::new(),
            min_update_interval: None,
            lambdas: LambdaDedup::new(),
            jobs: JobQueue::new(),
        };
        // Shared lambda definitions are emitted after all component
        // codegen, once the registry has reached its final state.
        ctx.jobs.push(Priority::Final, |ctx: &mut GenContext| {
            for declaration in ctx.lambdas.take_pending() {
                ctx.globals.push(declaration);
            }
        });
        ctx
    }

    /// Add an include once; repeats are ignored.
    pub fn add_include(&mut self, path: &str) {
        if self.include_seen.insert(path.to_string()) {
            self.includes.push(path.to_string());
        }
    }

    pub fn add_global(&mut self, line: impl Into<String>) {
        self.globals.push(line.into());
    }

    pub fn add_setup_block(&mut self, label: &str, lines: Vec<String>) {
        self.setup_blocks.push((label.to_string(), lines));
    }

    pub fn add_loop(&mut self, line: impl Into<String>) {
        self.loop_lines.push(line.into());
    }

    /// Track the smallest sensor update interval seen so far; the driver
    /// turns it into the application loop interval in a deferred job.
    pub fn note_update_interval(&mut self, ms: u64) {
        self.min_update_interval = Some(match self.min_update_interval {
            Some(current) => current.min(ms),
            None => ms,
        });
    }

    pub fn min_update_interval(&self) -> Option<u64> {
        self.min_update_interval
    }

    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    /// Run all queued deferred jobs, ordered by priority then enqueue
    /// order. The queue is drained; each job runs exactly once.
    pub fn run_deferred(&mut self) {
        let jobs = self.jobs.drain_sorted();
        for job in jobs {
            job(self);
        }
    }
}

impl Default for GenContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate `main.cpp` for a validated device description.
pub fn generate(config: &DeviceConfig) -> Result<GenOutput, GenError> {
    let order = registry::resolve(config)?;

    let mut ctx = GenContext::new();
    ctx.add_include("ember/application.h");

    for &index in &order {
        let component = &config.components[index];
        let def = registry::lookup(&component.kind).ok_or_else(|| {
            GenError::codegen(format!("no codegen for kind '{}'", component.kind))
        })?;
        (def.codegen)(&mut ctx, component)?;
    }

    // The loop interval depends on every registered sensor, so it is
    // decided after all component codegen has run.
    ctx.jobs.push(Priority::Late, |ctx: &mut GenContext| {
        if let Some(ms) = ctx.min_update_interval() {
            ctx.add_setup_block("scheduler", vec![format!("App.set_loop_interval({ms});")]);
        }
    });

    ctx.run_deferred();

    Ok(GenOutput {
        main_cpp: render_main_cpp(&ctx, config),
        stats: ctx.lambdas.stats,
    })
}

fn render_main_cpp(ctx: &GenContext, config: &DeviceConfig) -> String {
    let mut out = String::new();

    let w = &mut out;
    writeln!(w, "// Generated by emberc for device '{}'. Do not edit.", config.name).unwrap();
    writeln!(w, "#define {}", config.board.define()).unwrap();
    for include in &ctx.includes {
        writeln!(w, "#include \"{include}\"").unwrap();
    }
    writeln!(w).unwrap();
    writeln!(w, "using namespace ember;").unwrap();
    writeln!(w).unwrap();
    writeln!(w, "Application App(\"{}\");", config.name).unwrap();

    if !ctx.globals.is_empty() {
        writeln!(w).unwrap();
        for line in &ctx.globals {
            writeln!(w, "{line}").unwrap();
        }
    }

    writeln!(w).unwrap();
    writeln!(w, "void setup() {{").unwrap();
    for (label, lines) in &ctx.setup_blocks {
        writeln!(w, "  // {label}").unwrap();
        for line in lines {
            writeln!(w, "  {line}").unwrap();
        }
    }
    writeln!(w, "  App.setup();").unwrap();
    writeln!(w, "}}").unwrap();

    writeln!(w).unwrap();
    writeln!(w, "void loop() {{").unwrap();
    for line in &ctx.loop_lines {
        writeln!(w, "  {line}").unwrap();
    }
    writeln!(w, "  App.loop();").unwrap();
    writeln!(w, "}}").unwrap();

    out
}
