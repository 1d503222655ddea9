//! Hero Image Pipeline
//!
//! ```text
//! Harvester → Analyzer (cache-checked) → Prompt Builder → Generation Chain → README Updater
//! ```
//!
//! Stages run strictly in order. Recoverable failures are absorbed inside a
//! stage (analysis retries, tier fallback, stale architecture); anything else
//! ends the run with a [`PipelineError`] naming the stage.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::ai::{SharedProvider, create_provider};
use crate::analyzer::{ArchitectureAnalyzer, Harvester};
use crate::config::{CacheMode, Config};
use crate::hero::{ImagePrompt, build_prompt};
use crate::imagegen::{GenerationChain, GenerationRequest};
use crate::readme::{self, ReadmeOutcome};
use crate::storage::{
    ArchitectureCache, ImageCache, image_reference, write_atomic, write_hero_image,
};
use crate::types::{
    AnalysisError, ArchitectureGraph, ArtistError, CodeContext, Fingerprint, GeneratedImage,
    PipelineError, PipelineStage, Tier,
};

/// Per-run switches layered over [`Config`]
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Ignore and replace the cached architecture
    pub refresh_architecture: bool,

    /// Ignore the image cache
    pub refresh_image: bool,

    pub skip_readme: bool,

    /// Write image and README here instead of into the repository.
    /// The repository README is read but never modified.
    pub output_dir: Option<PathBuf>,
}

impl PipelineOptions {
    /// Options for a dry run whose artifacts all land in `dir`
    pub fn preview(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(dir.into()),
            ..Self::default()
        }
    }
}

/// Where the architecture used for this run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchitectureSource {
    Analyzed,
    /// Cache entry valid for the current repository state
    Cached,
    /// Analysis produced malformed output; an older cached graph was reused
    Stale,
}

impl std::fmt::Display for ArchitectureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analyzed => write!(f, "analyzed"),
            Self::Cached => write!(f, "cached"),
            Self::Stale => write!(f, "stale cache"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub fingerprint: Fingerprint,
    pub harvested_files: usize,
    pub graph: ArchitectureGraph,
    pub architecture_source: ArchitectureSource,
    pub prompt: ImagePrompt,
    pub tier: Tier,
    pub provider: String,
    pub image_url: Option<String>,
    pub image_cached: bool,
    pub image_path: PathBuf,
    /// `None` when README handling was skipped
    pub readme: Option<ReadmeOutcome>,
    pub readme_path: Option<PathBuf>,
}

pub struct Pipeline {
    config: Config,
    root: PathBuf,
    llm: SharedProvider,
    chain: GenerationChain,
}

impl Pipeline {
    pub fn new(config: Config, root: impl Into<PathBuf>, llm: SharedProvider, chain: GenerationChain) -> Self {
        Self {
            config,
            root: root.into(),
            llm,
            chain,
        }
    }

    /// Wire the configured LLM backend and image tiers
    pub fn from_config(config: Config, root: impl Into<PathBuf>) -> crate::types::Result<Self> {
        let llm = create_provider(&config.llm)?;
        let chain = GenerationChain::from_config(&config)?;
        Ok(Self::new(config, root, llm, chain))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache key for a harvested context, leaving out the README this
    /// pipeline edits
    pub fn fingerprint(context: &CodeContext, config: &Config) -> Fingerprint {
        context.fingerprint_without(&relative_key(&config.output.readme))
    }

    /// Harvester over `root` that never reads this pipeline's own cache
    /// files, so a save cannot change the next run's fingerprint
    pub fn harvester(root: &Path, config: &Config) -> Harvester {
        let architecture_file = config.output.dir.join(&config.cache.architecture_file);
        let mut exclude = config.harvest.exclude.clone();
        exclude.push(glob::Pattern::escape(&relative_key(&architecture_file)));
        exclude.push(format!(
            "{}/**",
            glob::Pattern::escape(&relative_key(&config.cache.image_dir))
        ));
        Harvester::from_config(root, &config.harvest).with_exclude(exclude)
    }

    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub async fn run(&self, options: &PipelineOptions) -> Result<PipelineOutcome, PipelineError> {
        let analyze_err = |e: ArtistError| PipelineError::new(PipelineStage::Analyze, e);

        let context = self.harvest().await.map_err(analyze_err)?;
        if context.is_empty() {
            warn!("No eligible files found; the model will only see an empty listing");
        }
        let fingerprint = Self::fingerprint(&context, &self.config);
        info!(
            files = context.files.len(),
            omitted = context.omitted,
            bytes = context.total_bytes(),
            fingerprint = fingerprint.short(),
            "Repository harvested"
        );

        let (graph, architecture_source) = self
            .resolve_architecture(&context, &fingerprint, options.refresh_architecture)
            .await?;

        let prompt = build_prompt(&graph, self.config.prompt.style, &self.config.prompt);
        debug!(
            template = %prompt.template,
            chars = prompt.text.len(),
            truncated = prompt.truncated,
            "Hero prompt built"
        );

        let (image, image_cached) = self
            .produce_image(&graph, &prompt, &fingerprint, options.refresh_image)
            .await?;

        let update_err = |e: ArtistError| PipelineError::new(PipelineStage::Update, e);
        let image_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => self.root.join(&self.config.output.dir),
        };
        let image_path = write_hero_image(&image_dir, &self.config.output.image_stem, &image)
            .await
            .map_err(update_err)?;

        let (readme, readme_path) = if options.skip_readme || self.config.output.skip_readme {
            debug!("README update skipped");
            (None, None)
        } else {
            let (outcome, path) = self.update_readme(&image, options).await.map_err(update_err)?;
            (Some(outcome), Some(path))
        };

        info!(
            tier = %image.tier,
            provider = %image.provider,
            image = %image_path.display(),
            architecture = %architecture_source,
            "Hero image pipeline finished"
        );

        Ok(PipelineOutcome {
            fingerprint,
            harvested_files: context.files.len(),
            graph,
            architecture_source,
            prompt,
            tier: image.tier,
            provider: image.provider,
            image_url: image.url,
            image_cached,
            image_path,
            readme,
            readme_path,
        })
    }

    async fn harvest(&self) -> crate::types::Result<CodeContext> {
        let harvester = Self::harvester(&self.root, &self.config);
        tokio::task::spawn_blocking(move || harvester.harvest())
            .await
            .map_err(|e| ArtistError::Io(std::io::Error::other(e)))?
    }

    async fn resolve_architecture(
        &self,
        context: &CodeContext,
        fingerprint: &Fingerprint,
        refresh: bool,
    ) -> Result<(ArchitectureGraph, ArchitectureSource), PipelineError> {
        let cache = ArchitectureCache::for_repo(&self.root, &self.config);

        // A refresh only skips the hit; the entry stays on disk until a
        // successful analysis overwrites it
        let previous = cache.load_latest().await;

        if refresh {
            debug!(path = %cache.path().display(), "Refresh requested, bypassing architecture cache");
        } else {
            let hit = previous.as_ref().filter(|entry| match self.config.cache.mode {
                CacheMode::Fingerprint => &entry.fingerprint == fingerprint,
                CacheMode::Sticky => true,
            });
            if let Some(entry) = hit {
                info!(
                    mode = %self.config.cache.mode,
                    model = %entry.model,
                    generated_at = %entry.generated_at,
                    "Using cached architecture"
                );
                return Ok((entry.architecture.clone(), ArchitectureSource::Cached));
            }
        }

        let analyzer = ArchitectureAnalyzer::from_config(Arc::clone(&self.llm), &self.config.llm);
        match analyzer.analyze(context).await {
            Ok(graph) => {
                if let Err(e) = cache.save(fingerprint, analyzer.model(), &graph).await {
                    warn!("Failed to cache architecture: {}", e);
                }
                Ok((graph, ArchitectureSource::Analyzed))
            }
            Err(err @ AnalysisError::MalformedResponse { .. }) => match previous {
                Some(entry) => {
                    warn!(
                        cached_fingerprint = entry.fingerprint.short(),
                        "{}; reusing cached architecture", err
                    );
                    Ok((entry.architecture, ArchitectureSource::Stale))
                }
                None => Err(PipelineError::new(PipelineStage::Analyze, err)),
            },
            Err(err) => Err(PipelineError::new(PipelineStage::Analyze, err)),
        }
    }

    async fn produce_image(
        &self,
        graph: &ArchitectureGraph,
        prompt: &ImagePrompt,
        fingerprint: &Fingerprint,
        refresh: bool,
    ) -> Result<(GeneratedImage, bool), PipelineError> {
        let cache = ImageCache::for_repo(&self.root, &self.config);
        let digest = prompt.digest();
        let use_cache = self.config.cache.images;

        if use_cache
            && !refresh
            && let Some(image) = cache.load(fingerprint, &digest).await
        {
            info!(tier = %image.tier, provider = %image.provider, "Using cached image");
            return Ok((image, true));
        }

        let image = self
            .chain
            .generate(&GenerationRequest::new(prompt, graph))
            .await
            .map_err(|e| PipelineError::new(PipelineStage::Generate, e))?;

        // A structural fallback is not cached, so the next run retries the image tiers
        if use_cache
            && image.tier != Tier::Structural
            && let Err(e) = cache.save(fingerprint, &digest, &image).await
        {
            warn!("Failed to cache image: {}", e);
        }
        Ok((image, false))
    }

    async fn update_readme(
        &self,
        image: &GeneratedImage,
        options: &PipelineOptions,
    ) -> crate::types::Result<(ReadmeOutcome, PathBuf)> {
        let source = self.root.join(&self.config.output.readme);
        let (reference, dest) = match &options.output_dir {
            Some(dir) => (
                image_reference(Path::new(""), &self.config.output.image_stem, image.format),
                dir.join(readme_file_name(&self.config.output.readme)),
            ),
            None => (
                image_reference(&self.config.output.dir, &self.config.output.image_stem, image.format),
                source.clone(),
            ),
        };

        let existing = readme::read_readme(&source).await?;
        let update = readme::update(&existing, &reference);

        if update.outcome == ReadmeOutcome::Prepended {
            warn!(path = %source.display(), "README has no heading; reference prepended");
        }
        if update.outcome != ReadmeOutcome::Unchanged || dest != source {
            write_atomic(&dest, update.text.as_bytes()).await?;
        }
        info!(path = %dest.display(), outcome = %update.outcome, "README processed");
        Ok((update.outcome, dest))
    }
}

/// `/`-joined relative form, as the harvester records paths
fn relative_key(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn readme_file_name(path: &Path) -> PathBuf {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(crate::constants::paths::README_FILE))
}
