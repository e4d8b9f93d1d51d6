//! # codeclarity CLI Interface
//!
//! Command parsing and user-visible output for the `codeclarity` binary. All storage logic
//! lives in `codeclarity-core`; this module loads config, builds the object store and maps
//! each subcommand onto one core workflow.
//!
//! For programmatic or integration use, call [`run`] with a constructed [`Cli`].
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codeclarity_core::aggregate::ReleaseBundle;
use codeclarity_core::bucket::BucketResolver;
use codeclarity_core::codec::CommitSha;
use codeclarity_core::contract::SharedStore;
use codeclarity_core::publish::{
    gather_release_documentation, publish_mr_documentation, publish_release_note,
};
use codeclarity_core::request::{
    MrDocumentationRequest, ProjectRef, ReleaseNoteRequest, ReleaseTag,
};
use codeclarity_core::store::{DocumentStore, CURRENT_RELEASE};

use crate::backend::build_store;
use crate::load_config::load_config;

/// CLI for codeclarity: store merge request docs and release notes per project.
#[derive(Parser)]
#[clap(
    name = "codeclarity",
    version,
    about = "Store merge request documentation and release notes in per-project buckets"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long)]
    pub config: PathBuf,

    /// Project id (overrides the config's project section)
    #[clap(long)]
    pub project_id: Option<u64>,

    /// Project name (overrides the config's project section)
    #[clap(long)]
    pub project_name: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store documentation for one merged commit in the current release
    PublishMr {
        /// 40-character commit sha
        #[clap(long)]
        sha: String,
        /// Source branch of the merge request
        #[clap(long)]
        branch: String,
        /// Markdown file with the documentation
        #[clap(long)]
        file: PathBuf,
    },
    /// List the commit shas documented in a folder
    List {
        #[clap(long, default_value = CURRENT_RELEASE)]
        folder: String,
    },
    /// Print the documentation corpus for a release
    Gather {
        #[clap(long)]
        tag: String,
        /// Commit sha belonging to the release (repeatable)
        #[clap(long = "sha", required = true)]
        shas: Vec<String>,
    },
    /// Store a release note and move the release's merge request docs next to it
    PublishRelease {
        #[clap(long)]
        tag: String,
        /// Markdown file with the release note
        #[clap(long)]
        file: PathBuf,
        /// Commit sha belonging to the release (repeatable)
        #[clap(long = "sha")]
        shas: Vec<String>,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(&cli.config)?;
    let project = match (cli.project_id, cli.project_name, config.project.clone()) {
        (Some(id), Some(name), _) => ProjectRef::new(id, name),
        (id, name, Some(from_config)) => ProjectRef::new(
            id.unwrap_or(from_config.id),
            name.unwrap_or(from_config.name),
        ),
        _ => anyhow::bail!(
            "project coordinates missing: set --project-id/--project-name or a project section in the config"
        ),
    };
    let store = build_store(&config)?;
    let now = chrono::Local::now().naive_local();

    match cli.command {
        Commands::PublishMr { sha, branch, file } => {
            tracing::info!(command = "publish-mr", sha = %sha, branch = %branch, "Publishing merge request documentation");
            let request = MrDocumentationRequest {
                project,
                commit_sha: CommitSha::parse(&sha)?,
                source_branch: branch,
            };
            let documentation = read_markdown(&file)?;
            let uri = publish_mr_documentation(&store, &request, &documentation, &now).await?;
            println!("{uri}");
        }
        Commands::List { folder } => {
            let mut shas: Vec<CommitSha> = documents_for(&store, &project)
                .await?
                .list_shas(&folder)
                .await?
                .into_iter()
                .collect();
            shas.sort();
            for sha in shas {
                println!("{sha}");
            }
        }
        Commands::Gather { tag, shas } => {
            let request = ReleaseNoteRequest {
                project,
                release_tag: ReleaseTag::parse(&tag)?,
            };
            let bundle: ReleaseBundle = parse_shas(&shas)?.into_iter().collect();
            let corpus = gather_release_documentation(&store, &request, &bundle).await?;
            println!("{}", corpus.formatted_text);
            println!(
                "Documents: {}, estimated tokens: {}",
                corpus.total_documents, corpus.estimated_tokens
            );
        }
        Commands::PublishRelease { tag, file, shas } => {
            let request = ReleaseNoteRequest {
                project,
                release_tag: ReleaseTag::parse(&tag)?,
            };
            let shas = parse_shas(&shas)?;
            let release_note = read_markdown(&file)?;
            let publication =
                publish_release_note(&store, &request, &release_note, &shas, &now).await?;
            println!("{}", publication.uri);
            match publication.relocation {
                Some(relocation) => println!(
                    "Relocated: {} moved, {} failed",
                    relocation.moved.len(),
                    relocation.failed.len()
                ),
                None => println!("Relocation skipped after an error; see warnings"),
            }
        }
    }

    Ok(())
}

async fn documents_for(store: &SharedStore, project: &ProjectRef) -> Result<DocumentStore> {
    let resolver = BucketResolver::new(store.clone());
    let bucket = resolver.lookup(&project.bucket_name()).await?;
    Ok(DocumentStore::new(store.clone(), bucket))
}

/// Validate shas, dropping repeats.
fn parse_shas(raw: &[String]) -> Result<Vec<CommitSha>> {
    let mut seen = HashSet::new();
    let mut shas = Vec::new();
    for value in raw {
        let sha = CommitSha::parse(value.trim())?;
        if seen.insert(sha.clone()) {
            shas.push(sha);
        }
    }
    Ok(shas)
}

fn read_markdown(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
