//! CLI wiring for the dispatch generator.

use crate::config::ManifestConfig;
use crate::manifest::Manifest;
use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use dispatchgen_ir::MlirDialect;
use dispatchgen_library::ConfigurationCatalog;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "dispatchgen",
    about = "Generates MLIR operations for verification and profiling of compiled dispatches"
)]
pub struct Cli {
    /// Top-level build directory; sources are written under `generated/`.
    #[arg(long, default_value = ".")]
    pub build_dir: PathBuf,

    /// Print verbose output.
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub verbose: bool,

    /// Operation kinds to generate.
    #[arg(long = "operation_kind", default_value = "all", value_parser = ["matmul", "conv2d", "all"])]
    pub operation_kind: String,

    /// Comma delimited list of dispatch names to generate. A dispatch is a
    /// combination of operation and tuning configuration.
    #[arg(long, default_value = "")]
    pub dispatches: String,

    /// MLIR dialect entry point at which the operation is emitted.
    #[arg(long, value_enum, default_value = "linalg")]
    pub mlir_dialect: DialectArg,

    /// Target backend device, e.g. cuda or vulkan.
    #[arg(long, default_value = "cuda")]
    pub device: String,

    /// JSON catalog to use instead of the predefined configurations.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Write the active catalog as JSON before emitting.
    #[arg(long)]
    pub dump_catalog: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialectArg {
    Linalg,
    Flow,
    All,
}

impl DialectArg {
    pub fn dialects(&self) -> Vec<MlirDialect> {
        match self {
            DialectArg::Linalg => vec![MlirDialect::Linalg],
            DialectArg::Flow => vec![MlirDialect::Flow],
            DialectArg::All => MlirDialect::ALL.to_vec(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run_cli(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose);

    let catalog = match &cli.catalog {
        Some(path) => ConfigurationCatalog::from_json_file(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => ConfigurationCatalog::predefined(),
    };
    if let Some(path) = &cli.dump_catalog {
        catalog.to_json_file(path)?;
        info!(path = %path.display(), "wrote catalog");
    }

    info!(
        device = %cli.device,
        build_dir = %cli.build_dir.display(),
        operation_kind = %cli.operation_kind,
        dialect = ?cli.mlir_dialect,
        "generating dispatches"
    );

    let config = ManifestConfig {
        build_dir: cli.build_dir.clone(),
        device: cli.device.clone(),
    };
    let mut manifest = Manifest::new(config);
    manifest.load(&catalog)?;
    manifest.filter(&cli.operation_kind, &cli.dispatches)?;
    let report = manifest.emit_all(&cli.mlir_dialect.dialects())?;

    for dialect in cli.mlir_dialect.dialects() {
        println!(
            "{}: {} dispatches",
            dialect,
            report.count_for(dialect)
        );
    }
    if cli.verbose {
        for file in &report.dispatches {
            println!("- {}", file.path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_profiler_flags() {
        let cli = Cli::parse_from(["dispatchgen"]);
        assert_eq!(cli.build_dir, PathBuf::from("."));
        assert!(!cli.verbose);
        assert_eq!(cli.operation_kind, "all");
        assert_eq!(cli.dispatches, "");
        assert_eq!(cli.mlir_dialect, DialectArg::Linalg);
        assert_eq!(cli.device, "cuda");
    }

    #[test]
    fn verbose_accepts_bare_flag_and_value() {
        assert!(Cli::parse_from(["dispatchgen", "--verbose"]).verbose);
        assert!(Cli::parse_from(["dispatchgen", "--verbose", "True"]).verbose);
        assert!(!Cli::parse_from(["dispatchgen", "--verbose", "false"]).verbose);
    }

    #[test]
    fn operation_kind_uses_underscore_flag() {
        let cli = Cli::parse_from([
            "dispatchgen",
            "--operation_kind",
            "matmul",
            "--dispatches",
            "matmul_128x128x32",
            "--mlir-dialect",
            "all",
        ]);
        assert_eq!(cli.operation_kind, "matmul");
        assert_eq!(cli.mlir_dialect.dialects(), MlirDialect::ALL.to_vec());
        assert!(Cli::try_parse_from(["dispatchgen", "--operation_kind", "gemm"]).is_err());
    }
}
