//! Command-line surface for docpress.
//!
//! All pipeline logic lives in `docpress-core`; this module parses
//! arguments, builds the concrete collaborators (pulldown-cmark converter,
//! headless Chrome renderer, zip archiver) and reports outcomes.
//!
//! ## Subcommands
//! - `render`: run the jobs in a YAML configuration.
//! - `hydrate`: render one document per entry of a JSON data map.
//! - `dashboard`: index an output tree into HTML and/or markdown catalogs.
//!
//! For programmatic or integration use, call [`run`] with a constructed [`Cli`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docpress_core::addressing::discover_remote;
use docpress_core::archive::ZipArchiver;
use docpress_core::catalog_output::{
    generate_catalog, CatalogFormat, CatalogOptions, DEFAULT_OUTPUT, DEFAULT_SOURCE,
};
use docpress_core::hydrate::{hydrate, HydrateRequest};
use docpress_core::markdown::GfmConverter;
use docpress_core::pipeline::Pipeline;
use docpress_core::publish::Publisher;
use docpress_core::render::{ChromeRenderer, PdfOptions};
use docpress_core::template::DocumentShell;

use crate::load_config::{load_config, DEFAULT_CONFIG};

/// docpress: assemble markdown and HTML sources into PDFs and catalog them.
#[derive(Parser)]
#[clap(
    name = "docpress",
    version,
    about = "Assemble markdown/HTML sources into PDFs and build a catalog of the results"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every job in the YAML job configuration
    Render {
        /// Path to the YAML job configuration
        #[clap(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Seconds a single render may take before it is abandoned
        #[clap(long, default_value_t = 30)]
        render_timeout: u64,
    },
    /// Render one document per entry of a JSON data map through a template
    Hydrate {
        /// Path to the .html or .md template
        #[clap(long)]
        template: PathBuf,
        /// Path to the .json data file
        #[clap(long)]
        data: PathBuf,
        /// Directory the PDFs are written to
        #[clap(long)]
        output: PathBuf,
        /// Base directory for image paths (defaults to the template's directory)
        #[clap(long)]
        images: Option<PathBuf>,
        #[clap(long, default_value_t = 30)]
        render_timeout: u64,
    },
    /// Build the files dashboard for an output tree
    Dashboard {
        /// Directory to scan
        #[clap(long, default_value = DEFAULT_SOURCE)]
        source: PathBuf,
        /// Dashboard output path; the extension is swapped per format
        #[clap(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
        /// html, markdown or both
        #[clap(long, default_value = "both")]
        format: CatalogFormat,
    },
}

fn renderer(render_timeout: u64) -> ChromeRenderer {
    ChromeRenderer::new(PdfOptions::from_env().with_timeout(Duration::from_secs(render_timeout)))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Render {
            config,
            render_timeout,
        } => {
            let entries = load_config(&config)?;
            tracing::info!(command = "render", jobs = entries.len(), "Starting render");

            let converter = GfmConverter::new();
            let shell = DocumentShell::new()?;
            let renderer = renderer(render_timeout);
            let archiver = ZipArchiver;
            let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

            let report = pipeline.run_jobs(&entries).await;
            for job in report.jobs.iter().filter(|j| !j.is_success()) {
                if let Err(e) = &job.outcome {
                    tracing::error!(command = "render", source = %job.source, error = %e, "Job failed");
                }
                for failure in &job.failures {
                    tracing::error!(
                        command = "render",
                        source = %job.source,
                        document = %failure.name,
                        error = %failure.error,
                        "Document failed"
                    );
                }
            }
            tracing::info!(
                command = "render",
                succeeded = report.succeeded(),
                failed = report.failed(),
                artifacts = report.artifacts().count(),
                "Render complete"
            );
            Ok(())
        }
        Commands::Hydrate {
            template,
            data,
            output,
            images,
            render_timeout,
        } => {
            let converter = GfmConverter::new();
            let shell = DocumentShell::new()?;
            let renderer = renderer(render_timeout);
            let archiver = ZipArchiver;
            let pipeline = Pipeline::new(&converter, &shell, Publisher::new(&renderer, &archiver));

            let request = HydrateRequest {
                template_path: template,
                data_path: data,
                output_dir: output,
                images_dir: images,
            };
            let report = hydrate(&pipeline, &request).await?;
            tracing::info!(
                command = "hydrate",
                rendered = report.artifacts.len(),
                failed = report.failures.len(),
                "Hydration complete"
            );
            Ok(())
        }
        Commands::Dashboard {
            source,
            output,
            format,
        } => {
            let git_dir = if source.is_dir() {
                source.as_path()
            } else {
                Path::new(".")
            };
            let options = CatalogOptions {
                remote: discover_remote(git_dir),
                source,
                output,
                format,
            };
            let report = generate_catalog(&options)?;
            tracing::info!(
                command = "dashboard",
                sections = report.sections,
                entries = report.entries,
                written = report.written.len(),
                "Dashboard complete"
            );
            Ok(())
        }
    }
}
