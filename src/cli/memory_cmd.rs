//! Idea, link, settings, and preset command handlers

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::application::ports::{IdeaStore, StoreError};
use crate::domain::config::SETTINGS_KEYS;
use crate::domain::error::ConfigError;
use crate::domain::memory::{recall, relative_day, timeline, Idea};
use crate::domain::voice::ALL_PRESETS;

use super::args::{IdeasAction, LinksAction, SettingsAction};
use super::presenter::Presenter;

/// Errors from the memory subcommands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid idea id '{0}'")]
    InvalidId(String),

    #[error("No idea with id {0}")]
    NotFound(Uuid),

    #[error("Refusing to delete everything without --yes")]
    NotConfirmed,

    #[error("Failed to serialize ideas: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Export {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CommandError {
    /// Whether the error comes from bad input rather than a failed operation
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidId(_) | Self::NotConfirmed)
    }
}

/// Handle `ideas` subcommands
pub async fn handle_ideas_command<S: IdeaStore + ?Sized>(
    action: IdeasAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    match action {
        IdeasAction::List => {
            let ideas = store.ideas().await?;
            if ideas.is_empty() {
                presenter.info("No ideas captured yet");
            }
            for idea in &ideas {
                presenter.idea(idea);
            }
        }
        IdeasAction::Recall { query } => {
            let ideas = store.ideas().await?;
            let hits = recall(&ideas, &query);
            if hits.is_empty() {
                presenter.info(&format!("Nothing matches \"{}\"", query));
            }
            for hit in &hits {
                presenter.recall_hit(hit);
            }
        }
        IdeasAction::Delete { id } => {
            let id = Uuid::parse_str(id.trim()).map_err(|_| CommandError::InvalidId(id))?;
            if !store.delete_idea(id).await? {
                return Err(CommandError::NotFound(id));
            }
            presenter.success(&format!("Deleted idea {}", id));
        }
        IdeasAction::Timeline => {
            let ideas = store.ideas().await?;
            if ideas.is_empty() {
                presenter.info("No history yet");
            }
            let now = Utc::now();
            for idea in timeline(&ideas) {
                presenter.timeline_entry(&relative_day(idea.created_at, now), idea);
            }
        }
        IdeasAction::Export { path } => {
            let ideas = store.ideas().await?;
            export_ideas(&ideas, &path).await?;
            presenter.success(&format!(
                "Exported {} ideas to {}",
                ideas.len(),
                path.display()
            ));
        }
    }
    Ok(())
}

/// Write `ideas` as pretty-printed JSON, in stored order
async fn export_ideas(ideas: &[Idea], path: &Path) -> Result<(), CommandError> {
    let content = serde_json::to_string_pretty(ideas)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|source| CommandError::Export {
            path: path.to_path_buf(),
            source,
        })
}

/// Handle `links` subcommands
pub async fn handle_links_command<S: IdeaStore + ?Sized>(
    action: LinksAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    match action {
        LinksAction::List => {
            let links = store.links().await?;
            if links.is_empty() {
                presenter.info("No links yet");
                return Ok(());
            }

            let ideas = store.ideas().await?;
            let titles: HashMap<Uuid, &str> =
                ideas.iter().map(|i| (i.id, i.title.as_str())).collect();
            for link in &links {
                presenter.link(
                    link,
                    titles.get(&link.source_idea_id).copied(),
                    titles.get(&link.target_idea_id).copied(),
                );
            }
        }
    }
    Ok(())
}

/// Handle `settings` subcommands
pub async fn handle_settings_command<S: IdeaStore + ?Sized>(
    action: SettingsAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    match action {
        SettingsAction::Show => {
            let settings = store.settings().await?;
            for key in SETTINGS_KEYS {
                presenter.key_value(key, &settings.get(key).unwrap_or_default());
            }
        }
        SettingsAction::Set { key, value } => {
            let mut settings = store.settings().await?;
            settings.set(&key, &value)?;
            store.save_settings(&settings).await?;
            presenter.success(&format!(
                "{} = {}",
                key,
                settings.get(&key).unwrap_or(value)
            ));
        }
    }
    Ok(())
}

/// List voice presets
pub fn handle_presets_command(presenter: &Presenter) {
    for preset in ALL_PRESETS {
        presenter.preset(*preset);
    }
}

/// Delete all stored data
pub async fn handle_clear_command<S: IdeaStore + ?Sized>(
    confirmed: bool,
    store: &S,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    if !confirmed {
        return Err(CommandError::NotConfirmed);
    }
    store.clear_all().await?;
    presenter.success("Cleared all ideas, links, and settings");
    Ok(())
}
