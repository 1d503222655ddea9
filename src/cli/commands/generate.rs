//! Generate Command
//!
//! Analyze the repository, produce the hero image, and splice it into the README.
//!
//! Usage:
//!   repo-artist generate [PATH] [--style sketch] [--pin free]
//!   repo-artist generate --refresh-architecture --refresh-image
//!   repo-artist generate --skip-readme

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, ConfigOverrides};
use crate::pipeline::{Pipeline, PipelineOptions, PipelineOutcome};
use crate::types::Result;

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub refresh_architecture: bool,
    pub refresh_image: bool,
    pub skip_readme: bool,
    pub quiet: bool,
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let output = Output::quiet(options.quiet);
    let ctx = CommandContext::load(options.path.as_deref(), &options.overrides)?;

    output.header("repo-artist");
    output.path("Repository", &ctx.root);
    output.field("Model", format!("{} ({})", ctx.config.llm.model, ctx.config.llm.provider));
    output.field(
        "Tiers",
        ctx.config
            .active_tiers()
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" → "),
    );

    let pipeline = Pipeline::from_config(ctx.config, &ctx.root)?;
    let outcome = pipeline
        .run(&PipelineOptions {
            refresh_architecture: options.refresh_architecture,
            refresh_image: options.refresh_image,
            skip_readme: options.skip_readme,
            output_dir: None,
        })
        .await?;

    report(&output, &outcome);
    Ok(())
}

/// Summary shared by `generate` and `preview`
pub(crate) fn report(output: &Output, outcome: &PipelineOutcome) {
    output.header("Result");
    output.field("Files", outcome.harvested_files);
    output.field(
        "Architecture",
        format!(
            "{} components, {} connections ({})",
            outcome.graph.components.len(),
            outcome.graph.connections.len(),
            outcome.architecture_source
        ),
    );
    output.field("Style", outcome.prompt.template);
    if outcome.prompt.truncated {
        output.warning(&format!(
            "Prompt trimmed to {} components and {} connections",
            outcome.prompt.components_kept, outcome.prompt.connections_kept
        ));
    }

    let source = if outcome.image_cached { "cache" } else { "generated" };
    output.field(
        "Image",
        format!("{} tier via {} ({})", outcome.tier, outcome.provider, source),
    );
    if let Some(url) = &outcome.image_url {
        output.field("Source URL", url);
    }
    output.success(&format!("Wrote {}", outcome.image_path.display()));

    match (&outcome.readme, &outcome.readme_path) {
        (Some(result), Some(path)) => {
            output.success(&format!("README {}: {}", result, path.display()))
        }
        _ => output.info("README left untouched"),
    }
}
