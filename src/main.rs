//! assetid - fingerprint static assets and write a manifest.

use std::process::ExitCode;

use anyhow::{Context, Result};
use assetid::asset::{OxcMinifier, Passthrough};
use assetid::cli::Cli;
use assetid::config::AssetConfig;
use assetid::{DiskFs, Pipeline, PipelineError, log, logger};
use clap::{ColorChoice, Parser};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match build(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{:#}", err);
            if let Some(PipelineError::UnsafeLayout { .. }) = err.downcast_ref::<PipelineError>() {
                log!(
                    "hint";
                    "pass a separate output directory (`--output dist`) or set `build.output` in {}",
                    assetid::config::DEFAULT_CONFIG_FILE
                );
            }
            ExitCode::FAILURE
        }
    }
}

/// Run one pipeline build with the resolved configuration.
fn build(cli: &Cli) -> Result<()> {
    let config = AssetConfig::load(cli)?;
    logger::set_verbose(config.build.verbose);

    let build = &config.build;
    let pipeline = Pipeline::new(DiskFs).with_options(config.pipeline_options());
    let pipeline = if build.minify {
        pipeline.with_minifier(OxcMinifier::new().with_compress(build.compress))
    } else {
        pipeline.with_minifier(Passthrough)
    };

    let summary = pipeline
        .run(&build.source, &build.output)
        .with_context(|| format!("failed to process assets in `{}`", build.source.display()))?;

    log!(
        "build";
        "{} assets ({} minified, {} -> {} bytes) -> {}",
        summary.files,
        summary.minified,
        summary.bytes_in,
        summary.bytes_out,
        build.output.display()
    );
    log!("manifest"; "written to {}", summary.manifest_path.display());
    Ok(())
}
