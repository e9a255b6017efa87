use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "emberc", version, about = "Configuration-driven firmware source generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate firmware source from a device description
    Generate {
        /// Device description file (TOML)
        config: PathBuf,
        /// Output directory for generated source
        #[arg(short, long, default_value = "build")]
        output: PathBuf,
        /// Write a JSON generation report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validate a device description without generating anything
    Validate {
        /// Device description file (TOML)
        config: PathBuf,
    },
    /// Watch a device description and regenerate on changes
    Watch {
        /// Device description file (TOML)
        config: PathBuf,
        /// Output directory for generated source
        #[arg(short, long, default_value = "build")]
        output: PathBuf,
        /// Don't clear terminal between runs
        #[arg(long)]
        no_clear: bool,
    },
}

fn read_source(path: &PathBuf) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config, output, report } => {
            let source = read_source(&config);
            match emberc::generate_to(&source, &config, &output, report.as_deref()) {
                Ok(summary) => {
                    let path = summary.main_cpp.path.display();
                    if summary.main_cpp.written {
                        eprintln!("  wrote {path}");
                    } else {
                        eprintln!("  unchanged {path}");
                    }
                    eprintln!(
                        "generated '{}': {} component(s), {} shared lambda(s), {} inlined",
                        summary.device,
                        summary.components,
                        summary.stats.shared,
                        summary.stats.inlined,
                    );
                }
                Err(err) => {
                    emberc::diagnostics::render_error(&source, &config.to_string_lossy(), &err);
                    std::process::exit(1);
                }
            }
        }
        Commands::Validate { config } => {
            let source = read_source(&config);
            match emberc::validate_source(&source, &config) {
                Ok(device) => {
                    eprintln!(
                        "configuration valid: '{}' on {}, {} component(s)",
                        device.name,
                        device.board.name(),
                        device.components.len(),
                    );
                }
                Err(err) => {
                    emberc::diagnostics::render_error(&source, &config.to_string_lossy(), &err);
                    std::process::exit(1);
                }
            }
        }
        Commands::Watch { config, output, no_clear } => {
            if let Err(err) = emberc::watch::watch(&config, &output, no_clear) {
                eprintln!("Watch error: {err}");
                std::process::exit(1);
            }
        }
    }
}
