//! JSON file idea store
//!
//! Ideas, links, and settings each live in their own file under the data
//! directory. Every operation rewrites the whole file; a missing file reads as
//! empty (or default settings).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::{IdeaStore, StoreError};
use crate::domain::config::UserSettings;
use crate::domain::memory::{Idea, Link};

const IDEAS_FILE: &str = "ideas.json";
const LINKS_FILE: &str = "links.json";
const SETTINGS_FILE: &str = "settings.json";

/// File-backed idea store
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Data directory of this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(file);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::ReadError(format!("{}: {}", file, e))),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::ParseError(format!("{}: {}", file, e)))
    }

    async fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::WriteError(format!("{}: {}", file, e)))?;

        let content = serde_json::to_string_pretty(value)
            .map_err(|e| StoreError::WriteError(format!("{}: {}", file, e)))?;

        fs::write(self.dir.join(file), content)
            .await
            .map_err(|e| StoreError::WriteError(format!("{}: {}", file, e)))
    }

    async fn remove(&self, file: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.dir.join(file)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::WriteError(format!("{}: {}", file, e))),
        }
    }

    async fn read_ideas(&self) -> Result<Vec<Idea>, StoreError> {
        Ok(self.read(IDEAS_FILE).await?.unwrap_or_default())
    }

    async fn read_links(&self) -> Result<Vec<Link>, StoreError> {
        Ok(self.read(LINKS_FILE).await?.unwrap_or_default())
    }
}

#[async_trait]
impl IdeaStore for JsonFileStore {
    async fn ideas(&self) -> Result<Vec<Idea>, StoreError> {
        self.read_ideas().await
    }

    async fn save_idea(&self, idea: Idea) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut ideas = self.read_ideas().await?;

        match ideas.iter_mut().find(|existing| existing.id == idea.id) {
            Some(existing) => *existing = idea,
            None => ideas.insert(0, idea),
        }

        self.write(IDEAS_FILE, &ideas).await
    }

    async fn delete_idea(&self, id: Uuid) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut ideas = self.read_ideas().await?;
        let before = ideas.len();
        ideas.retain(|idea| idea.id != id);
        let removed = ideas.len() != before;

        let mut links = self.read_links().await?;
        let link_count = links.len();
        links.retain(|link| !link.touches(&id));

        if removed {
            self.write(IDEAS_FILE, &ideas).await?;
        }
        if links.len() != link_count {
            debug!(idea = %id, removed = link_count - links.len(), "Removed dangling links");
            self.write(LINKS_FILE, &links).await?;
        }

        Ok(removed)
    }

    async fn links(&self) -> Result<Vec<Link>, StoreError> {
        self.read_links().await
    }

    async fn save_link(&self, link: Link) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut links = self.read_links().await?;
        if links.iter().any(|existing| existing.id == link.id) {
            return Ok(());
        }

        links.push(link);
        self.write(LINKS_FILE, &links).await
    }

    async fn settings(&self) -> Result<UserSettings, StoreError> {
        Ok(self.read(SETTINGS_FILE).await?.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(SETTINGS_FILE, settings).await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        for file in [IDEAS_FILE, LINKS_FILE, SETTINGS_FILE] {
            self.remove(file).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::VoicePreset;
    use chrono::Utc;

    fn idea(title: &str, tags: &[&str]) -> Idea {
        Idea::capture(title, "summary", tags.iter().copied(), Utc::now())
    }

    fn store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data"));
        (dir, store)
    }

    #[tokio::test]
    async fn empty_store_reads_defaults() {
        let (_dir, store) = store();
        assert!(store.ideas().await.unwrap().is_empty());
        assert!(store.links().await.unwrap().is_empty());
        assert_eq!(store.settings().await.unwrap(), UserSettings::default());
    }

    #[tokio::test]
    async fn new_ideas_are_prepended() {
        let (_dir, store) = store();
        store.save_idea(idea("first", &[])).await.unwrap();
        store.save_idea(idea("second", &[])).await.unwrap();

        let titles: Vec<String> = store
            .ideas()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn save_idea_replaces_in_place() {
        let (_dir, store) = store();
        let mut first = idea("first", &[]);
        store.save_idea(first.clone()).await.unwrap();
        store.save_idea(idea("second", &[])).await.unwrap();

        first.title = "renamed".into();
        store.save_idea(first.clone()).await.unwrap();

        let ideas = store.ideas().await.unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[1].id, first.id);
        assert_eq!(ideas[1].title, "renamed");
    }

    #[tokio::test]
    async fn delete_cascades_to_links() {
        let (_dir, store) = store();
        let a = idea("a", &["x"]);
        let b = idea("b", &["x"]);
        let c = idea("c", &["y"]);
        for i in [&a, &b, &c] {
            store.save_idea(i.clone()).await.unwrap();
        }
        store.save_link(Link::new(b.id, a.id, 0.8, "Shared themes")).await.unwrap();
        store.save_link(Link::new(a.id, c.id, 0.5, "manual")).await.unwrap();
        store.save_link(Link::new(b.id, c.id, 0.5, "manual")).await.unwrap();

        assert!(store.delete_idea(a.id).await.unwrap());

        let links = store.links().await.unwrap();
        assert_eq!(links.len(), 1);
        assert!(!links.iter().any(|l| l.touches(&a.id)));
        assert_eq!(store.ideas().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_unknown_idea_reports_false() {
        let (_dir, store) = store();
        store.save_idea(idea("a", &[])).await.unwrap();
        assert!(!store.delete_idea(Uuid::new_v4()).await.unwrap());
        assert_eq!(store.ideas().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_link_ignores_duplicate_id() {
        let (_dir, store) = store();
        let link = Link::new(Uuid::new_v4(), Uuid::new_v4(), 0.8, "Shared themes");
        store.save_link(link.clone()).await.unwrap();
        store.save_link(link).await.unwrap();
        assert_eq!(store.links().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn settings_round_trip_and_clear() {
        let (_dir, store) = store();
        let settings = UserSettings {
            voice_preset: VoicePreset::Creative,
            vad_sensitivity: 0.2,
            ..Default::default()
        };
        store.save_settings(&settings).await.unwrap();
        store.save_idea(idea("a", &[])).await.unwrap();
        assert_eq!(store.settings().await.unwrap(), settings);

        store.clear_all().await.unwrap();
        assert!(store.ideas().await.unwrap().is_empty());
        assert_eq!(store.settings().await.unwrap(), UserSettings::default());
    }

    #[tokio::test]
    async fn clear_on_empty_store_is_ok() {
        let (_dir, store) = store();
        store.clear_all().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).await.unwrap();
        fs::write(store.dir().join(IDEAS_FILE), "{not json").await.unwrap();

        let err = store.ideas().await.unwrap_err();
        assert!(matches!(err, StoreError::ParseError(ref m) if m.starts_with("ideas.json")));
    }

    #[tokio::test]
    async fn concurrent_saves_keep_every_idea() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);
        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save_idea(idea(&format!("idea {}", n), &[])).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.ideas().await.unwrap().len(), 8);
    }
}
