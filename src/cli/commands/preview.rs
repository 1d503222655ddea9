//! Preview Command
//!
//! Clone a repository into an isolated workspace and render its hero image
//! without touching any README on disk. The image and a README preview land
//! in the output directory.
//!
//! Usage:
//!   repo-artist preview https://github.com/owner/repo [--branch dev] [-o out]

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::cli::util::ConfigOverrides;
use crate::config::ConfigLoader;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::types::Result;
use crate::workspace::Workspace;

use super::generate::report;

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub url: String,
    pub branch: Option<String>,
    pub output: PathBuf,
    pub overrides: ConfigOverrides,
    pub quiet: bool,
}

pub async fn run(options: PreviewOptions) -> Result<()> {
    let output = Output::quiet(options.quiet);

    // The cloned repository's own config file is never read
    let mut config = ConfigLoader::load_global()?;
    options.overrides.apply(&mut config)?;

    let out_dir = std::path::absolute(&options.output)?;
    tokio::fs::create_dir_all(&out_dir).await?;

    let workspace = Workspace::create()?;
    output.info(&format!("Cloning {}", options.url));
    let root = workspace
        .clone_repo(&options.url, options.branch.as_deref())
        .await?;

    let pipeline = Pipeline::from_config(config, &root)?;
    let outcome = pipeline.run(&PipelineOptions::preview(&out_dir)).await?;

    report(&output, &outcome);
    output.path("Preview", &out_dir);
    Ok(())
}
