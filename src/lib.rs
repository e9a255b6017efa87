pub mod span;
pub mod diagnostics;
pub mod config;
pub mod registry;
pub mod codegen;
pub mod output;
pub mod watch;

use std::path::Path;

use codegen::lambda::DedupStats;
use diagnostics::GenError;

/// What a successful generation run produced.
pub struct GenSummary {
    pub device: String,
    pub components: usize,
    pub main_cpp: output::FileOutcome,
    pub stats: DedupStats,
}

/// Parse + resolve only (the `validate` command). No file output.
pub fn validate_source(source: &str, origin: &Path) -> Result<config::DeviceConfig, GenError> {
    let config = config::parse(source, origin)?;
    registry::resolve(&config)?;
    Ok(config)
}

/// Generate `main.cpp` text from config source (parse → resolve →
/// codegen → deferred flush). No file I/O; useful for tests and benches.
pub fn generate_source(source: &str, origin: &Path) -> Result<codegen::GenOutput, GenError> {
    let config = config::parse(source, origin)?;
    codegen::generate(&config)
}

/// Full pipeline against the filesystem: generate and write `main.cpp`
/// into `out_dir` (skipping the write when content is unchanged),
/// optionally writing a JSON report.
pub fn generate_to(
    source: &str,
    origin: &Path,
    out_dir: &Path,
    report_path: Option<&Path>,
) -> Result<GenSummary, GenError> {
    let config = config::parse(source, origin)?;
    let generated = codegen::generate(&config)?;

    let main_cpp = output::write_if_changed(&out_dir.join("main.cpp"), &generated.main_cpp)?;

    let summary = GenSummary {
        device: config.name.clone(),
        components: config.components.len(),
        main_cpp,
        stats: generated.stats,
    };

    if let Some(report_path) = report_path {
        let report = output::Report {
            device: config.name.clone(),
            board: config.board.name().to_string(),
            components: config.components.len(),
            files: vec![summary.main_cpp.clone()],
            lambdas: summary.stats,
        };
        output::write_report(report_path, &report)?;
    }

    Ok(summary)
}

/// Convenience wrapper that reads the config file itself. Used by watch
/// mode, where there is no caller holding the source text.
pub fn generate_file(
    config_path: &Path,
    out_dir: &Path,
    report_path: Option<&Path>,
) -> Result<GenSummary, GenError> {
    let source = std::fs::read_to_string(config_path).map_err(|e| {
        GenError::config(format!("could not read file: {e}"), config_path.to_path_buf())
    })?;
    generate_to(&source, config_path, out_dir, report_path)
}
