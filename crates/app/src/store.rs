//! Reading and writing the JSON documents on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use shizu_core::{
    BackupConfig, LedgerHandle, LedgerRegistry, Lineup, LineupExport, RenamePolicy, Result,
    ShizuError,
};

/// File access for ledgers, lineups and exports. Saved ledgers and exports
/// also get a timestamped copy in the configured backup directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    backups: BackupConfig,
    backup_root: PathBuf,
}

impl DocumentStore {
    /// Backup directories are resolved against `backup_root`.
    pub fn new(backups: BackupConfig, backup_root: impl Into<PathBuf>) -> Self {
        Self {
            backups,
            backup_root: backup_root.into(),
        }
    }

    pub fn read_ledger(&self, path: &Path, policy: RenamePolicy) -> Result<LedgerRegistry> {
        if !path.exists() {
            return Err(ShizuError::msg(format!(
                "ledger file does not exist at: {}",
                path.display()
            )));
        }
        let raw = fs::read_to_string(path)?;
        LedgerRegistry::from_json(&raw, policy)
    }

    pub fn write_ledger(&self, path: &Path, ledger: &LedgerRegistry) -> Result<()> {
        let content = ledger.to_json()?;
        atomic_write(path, &content)?;
        self.backup(&self.backups.ledger_dir, path, &content)?;
        tracing::info!(path = %path.display(), "saved ledger");
        Ok(())
    }

    /// Reads the lineup at `path`, or starts an empty one when the file does
    /// not exist yet.
    pub fn read_lineup(&self, path: &Path, ledger: LedgerHandle) -> Result<Lineup> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no lineup file, starting empty");
            return Ok(Lineup::new(ledger));
        }
        let raw = fs::read_to_string(path)?;
        Lineup::from_json(&raw, ledger)
    }

    pub fn write_lineup(&self, path: &Path, lineup: &Lineup) -> Result<()> {
        atomic_write(path, &lineup.to_json()?)?;
        tracing::info!(path = %path.display(), "saved lineup");
        Ok(())
    }

    pub fn write_export(&self, path: &Path, export: &LineupExport) -> Result<()> {
        let content = export.to_json()?;
        atomic_write(path, &content)?;
        self.backup(&self.backups.lineup_dir, path, &content)?;
        tracing::info!(path = %path.display(), "exported lineup");
        Ok(())
    }

    fn backup(&self, dir: &str, original: &Path, content: &str) -> Result<()> {
        if !self.backups.enabled {
            return Ok(());
        }
        let file_name = original
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ShizuError::msg(format!("no file name in {}", original.display())))?;

        let dir = self.backup_root.join(dir);
        fs::create_dir_all(&dir)?;
        let target = dir.join(backup_file_name(&Local::now(), &file_name));
        fs::write(&target, content)?;
        tracing::debug!(path = %target.display(), "wrote backup");
        Ok(())
    }
}

fn backup_file_name(now: &DateTime<Local>, file_name: &str) -> String {
    format!("{}-{}", now.format("%Y%m%d-%H%M%S"), file_name)
}

/// Writes to a sibling temp file, then renames it over `path`.
fn atomic_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::cascade::{self, LedgerChange};
    use shizu_core::{DjUpdate, EntryKind, Exporter, NullProbe, StreamConfig};
    use tempfile::tempdir;

    fn store(root: &Path) -> DocumentStore {
        DocumentStore::new(BackupConfig::default(), root)
    }

    #[test]
    fn backup_names_are_timestamped() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            backup_file_name(&now, "ledger.json"),
            "20240309-070501-ledger.json"
        );
    }

    #[test]
    fn ledger_round_trips_and_leaves_a_backup() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let path = dir.path().join("ledger.json");

        let mut ledger = LedgerRegistry::new();
        let name = ledger.create_dj();
        ledger
            .update_dj(
                &name,
                DjUpdate {
                    name: "alice".into(),
                    stream_key: Some("k1".into()),
                    ..DjUpdate::default()
                },
            )
            .unwrap();
        store.write_ledger(&path, &ledger).unwrap();

        let reloaded = store.read_ledger(&path, RenamePolicy::Reject).unwrap();
        assert_eq!(reloaded.serialize(), ledger.serialize());

        let backups: Vec<_> = fs::read_dir(dir.path().join("ledgers_backup"))
            .unwrap()
            .collect();
        assert_eq!(backups.len(), 1);
        assert!(!dir.path().join("ledger.json.tmp").exists());
    }

    #[test]
    fn missing_ledger_is_reported() {
        let dir = tempdir().unwrap();
        let err = store(dir.path())
            .read_ledger(&dir.path().join("nope.json"), RenamePolicy::Reject)
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn missing_lineup_starts_empty_and_saves() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let path = dir.path().join("lineups").join("night1.json");

        let mut registry = LedgerRegistry::new();
        registry.create_dj();
        let handle = LedgerHandle::new(registry);

        let mut lineup = store.read_lineup(&path, handle.clone()).unwrap();
        assert!(lineup.dj_entries().is_empty());
        lineup.add_dj("new-dj", true).unwrap();
        store.write_lineup(&path, &lineup).unwrap();

        let reloaded = store.read_lineup(&path, handle).unwrap();
        assert_eq!(reloaded.summarize(), lineup.summarize());
    }

    #[test]
    fn saved_lineup_follows_ledger_rename() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let path = dir.path().join("lineup.json");

        let mut registry = LedgerRegistry::new();
        registry.create_dj();
        registry.create_dj();
        let mut lineup = store
            .read_lineup(&path, LedgerHandle::new(registry.clone()))
            .unwrap();
        lineup.add_dj("new-dj", true).unwrap();
        lineup.add_dj("new-dj1", false).unwrap();
        lineup.set_vj("new-dj", Some("carol".into())).unwrap();
        store.write_lineup(&path, &lineup).unwrap();

        let update = DjUpdate {
            name: "alice".into(),
            ..DjUpdate::default()
        };
        registry.update_dj("new-dj", update).unwrap();
        let mut reopened = store
            .read_lineup(&path, LedgerHandle::new(registry.clone()))
            .unwrap();
        let change = LedgerChange::Renamed {
            old: "new-dj".into(),
            new: "alice".into(),
        };
        assert!(cascade::apply(&mut reopened, EntryKind::Dj, &change).unwrap());
        store.write_lineup(&path, &reopened).unwrap();

        let reloaded = store.read_lineup(&path, LedgerHandle::new(registry)).unwrap();
        let first = &reloaded.dj_entries()[0];
        assert_eq!(first.name, "alice");
        assert!(first.is_live);
        assert_eq!(first.vj.as_deref(), Some("carol"));
        assert!(reloaded.stale_entries().unwrap().is_empty());
    }

    #[test]
    fn export_without_backups_writes_only_target() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(
            BackupConfig {
                enabled: false,
                ..BackupConfig::default()
            },
            dir.path(),
        );
        let handle = LedgerHandle::new(LedgerRegistry::new());
        let lineup = Lineup::new(handle);
        let stream = StreamConfig::default();
        let export = lineup.export(&Exporter::new(&stream, &NullProbe)).unwrap();

        let path = dir.path().join("export.json");
        store.write_export(&path, &export).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("lineup_backup").exists());
    }
}
