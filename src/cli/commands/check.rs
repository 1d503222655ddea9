//! Check Command
//!
//! Decide whether recent changes warrant a new hero image: diff stats against
//! the upstream plus whether the cached architecture still matches the tree.
//!
//! Usage:
//!   repo-artist check [PATH] [--base origin/main]

use std::path::PathBuf;

use crate::changes::diff_stat;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, ConfigOverrides};
use crate::pipeline::Pipeline;
use crate::storage::ArchitectureCache;
use crate::types::{ArtistError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckVerdict {
    UpToDate,
    RegenerationRecommended,
}

pub async fn run(path: Option<PathBuf>, base: Option<String>, quiet: bool) -> Result<CheckVerdict> {
    let output = Output::quiet(quiet);
    let ctx = CommandContext::load(path.as_deref(), &ConfigOverrides::default())?;
    let base = base.unwrap_or_else(|| ctx.config.changes.base.clone());

    output.header("Change check");
    output.path("Repository", &ctx.root);

    let significant = match diff_stat(&ctx.root, &base).await? {
        Some(stat) => {
            output.field("Against", &base);
            output.field("Changes", stat);
            stat.is_significant(&ctx.config.changes)
        }
        None => {
            output.info(&format!("No {} revision; treating as a first push", base));
            false
        }
    };

    let harvester = Pipeline::harvester(&ctx.root, &ctx.config);
    let context = tokio::task::spawn_blocking(move || harvester.harvest())
        .await
        .map_err(|e| ArtistError::Io(std::io::Error::other(e)))??;
    let fingerprint = Pipeline::fingerprint(&context, &ctx.config);
    let cache = ArchitectureCache::for_repo(&ctx.root, &ctx.config);
    let cache_current = cache.load(&fingerprint).await.is_some();
    output.field(
        "Architecture",
        if cache_current {
            "cache matches the working tree"
        } else {
            "cache missing or out of date"
        },
    );

    if significant {
        output.warning("Significant changes detected; regenerating the hero image is recommended");
        output.info("Run `repo-artist generate --refresh-architecture`");
        Ok(CheckVerdict::RegenerationRecommended)
    } else {
        output.success("No significant changes");
        Ok(CheckVerdict::UpToDate)
    }
}
