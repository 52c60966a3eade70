//! The ledger: the authoritative registry of DJs and promos.
//!
//! Each collection is keyed by record name. Records are stored in listing
//! order and looked up by their own `name` field, so the key and the name
//! cannot drift apart across a rename.

mod handle;
mod records;

use crate::{config::RenamePolicy, EntryKind, Result, ShizuError};

pub use handle::LedgerHandle;
pub use records::{
    DjRecord, DjRow, DjUpdate, LedgerDocument, LedgerSummary, PromoRecord, PromoRow, PromoUpdate,
};

use records::non_empty;

/// Name probed first when a record is created; later candidates append 1, 2, ...
/// Shared by DJs and promos.
pub const AUTO_NAME_PREFIX: &str = "new-dj";

trait Named {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

impl Named for DjRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Named for PromoRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Ordered collection of uniquely named records.
#[derive(Debug, Clone)]
struct Collection<T> {
    kind: EntryKind,
    entries: Vec<T>,
}

impl<T: Named> Collection<T> {
    fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name() == name)
    }

    fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn get(&self, name: &str) -> Result<&T> {
        self.entries
            .iter()
            .find(|entry| entry.name() == name)
            .ok_or_else(|| ShizuError::not_found(self.kind, name))
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| ShizuError::not_found(self.kind, name))
    }

    /// Inserts `entry`, replacing any record already stored under its name.
    fn upsert(&mut self, entry: T) {
        match self.position(entry.name()) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }

    fn remove(&mut self, name: &str) -> Result<T> {
        let index = self.index_of(name)?;
        Ok(self.entries.remove(index))
    }

    fn next_free_name(&self) -> String {
        let mut candidate = AUTO_NAME_PREFIX.to_string();
        let mut suffix = 0usize;
        while self.contains(&candidate) {
            suffix += 1;
            candidate = format!("{AUTO_NAME_PREFIX}{suffix}");
        }
        candidate
    }

    /// Checks that `index` may take `new_name` and returns the index of a
    /// different record that would be displaced by it.
    fn check_rename(
        &self,
        index: usize,
        new_name: &str,
        policy: RenamePolicy,
    ) -> Result<Option<usize>> {
        if new_name.is_empty() {
            return Err(ShizuError::EmptyName { kind: self.kind });
        }
        match self.position(new_name) {
            Some(other) if other != index => match policy {
                RenamePolicy::Reject => Err(ShizuError::already_exists(self.kind, new_name)),
                RenamePolicy::Overwrite => Ok(Some(other)),
            },
            _ => Ok(None),
        }
    }

    /// Renames the record at `index` in place. Returns the index the record
    /// ends up at once a displaced record has been dropped.
    fn rename_at(&mut self, index: usize, new_name: String, displaced: Option<usize>) -> usize {
        let mut index = index;
        if let Some(other) = displaced {
            let lost = self.entries.remove(other);
            tracing::warn!(kind = %self.kind, name = lost.name(), "rename overwrote existing record");
            if other < index {
                index -= 1;
            }
        }
        let old = self.entries[index].name().to_string();
        if old != new_name {
            tracing::info!(kind = %self.kind, from = %old, to = %new_name, "renamed record");
            self.entries[index].set_name(new_name);
        }
        index
    }
}

/// In-memory registry of every DJ and promo known to the event.
#[derive(Debug, Clone)]
pub struct LedgerRegistry {
    djs: Collection<DjRecord>,
    promos: Collection<PromoRecord>,
    rename_policy: RenamePolicy,
}

impl Default for LedgerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerRegistry {
    pub fn new() -> Self {
        Self::with_policy(RenamePolicy::default())
    }

    pub fn with_policy(rename_policy: RenamePolicy) -> Self {
        Self {
            djs: Collection::new(EntryKind::Dj),
            promos: Collection::new(EntryKind::Promo),
            rename_policy,
        }
    }

    /// Builds a registry from a ledger document.
    pub fn from_document(document: LedgerDocument, rename_policy: RenamePolicy) -> Result<Self> {
        let mut ledger = Self::with_policy(rename_policy);
        ledger.load(document)?;
        Ok(ledger)
    }

    pub fn from_json(raw: &str, rename_policy: RenamePolicy) -> Result<Self> {
        let document: LedgerDocument = serde_json::from_str(raw)?;
        Self::from_document(document, rename_policy)
    }

    pub fn rename_policy(&self) -> RenamePolicy {
        self.rename_policy
    }

    /// Replaces both collections with the contents of `document`. A name that
    /// appears twice keeps the later record. A record without a name fails
    /// the load and leaves the registry as it was.
    pub fn load(&mut self, document: LedgerDocument) -> Result<()> {
        if document.djs.iter().any(|dj| dj.name.is_empty()) {
            return Err(ShizuError::EmptyName { kind: EntryKind::Dj });
        }
        if document.promos.iter().any(|promo| promo.name.is_empty()) {
            return Err(ShizuError::EmptyName {
                kind: EntryKind::Promo,
            });
        }

        self.reset();
        for dj in document.djs {
            self.djs.upsert(dj);
        }
        for promo in document.promos {
            self.promos.upsert(promo);
        }
        tracing::debug!(
            djs = self.djs.entries.len(),
            promos = self.promos.entries.len(),
            "loaded ledger"
        );
        Ok(())
    }

    /// Drops every record.
    pub fn reset(&mut self) {
        self.djs.entries.clear();
        self.promos.entries.clear();
    }

    pub fn djs(&self) -> &[DjRecord] {
        &self.djs.entries
    }

    pub fn promos(&self) -> &[PromoRecord] {
        &self.promos.entries
    }

    pub fn contains_dj(&self, name: &str) -> bool {
        self.djs.contains(name)
    }

    pub fn contains_promo(&self, name: &str) -> bool {
        self.promos.contains(name)
    }

    pub fn get_dj(&self, name: &str) -> Result<&DjRecord> {
        self.djs.get(name)
    }

    pub fn get_promo(&self, name: &str) -> Result<&PromoRecord> {
        self.promos.get(name)
    }

    /// Adds an empty DJ under the first free auto-generated name and returns
    /// that name.
    pub fn create_dj(&mut self) -> String {
        let name = self.djs.next_free_name();
        self.djs.entries.push(DjRecord::new(name.clone()));
        tracing::info!(%name, "created DJ");
        name
    }

    /// Adds an empty promo under the first free auto-generated name and
    /// returns that name.
    pub fn create_promo(&mut self) -> String {
        let name = self.promos.next_free_name();
        self.promos.entries.push(PromoRecord::new(name.clone()));
        tracing::info!(%name, "created promo");
        name
    }

    /// Overwrites the editable fields of the DJ stored as `name` and renames
    /// it to `update.name` when that differs. Nothing changes on error.
    pub fn update_dj(&mut self, name: &str, update: DjUpdate) -> Result<()> {
        let index = self.djs.index_of(name)?;
        let displaced = self.djs.check_rename(index, &update.name, self.rename_policy)?;
        let index = self.djs.rename_at(index, update.name, displaced);

        let dj = &mut self.djs.entries[index];
        dj.logo_path = non_empty(update.logo_path);
        dj.recording_path = non_empty(update.recording_path);
        dj.rtmp_server = non_empty(update.rtmp_server);
        dj.stream_key = non_empty(update.stream_key);
        Ok(())
    }

    /// Promo counterpart of [`LedgerRegistry::update_dj`].
    pub fn update_promo(&mut self, name: &str, update: PromoUpdate) -> Result<()> {
        let index = self.promos.index_of(name)?;
        let displaced = self
            .promos
            .check_rename(index, &update.name, self.rename_policy)?;
        let index = self.promos.rename_at(index, update.name, displaced);

        self.promos.entries[index].path = non_empty(update.path);
        Ok(())
    }

    /// Renames a DJ without touching its other fields.
    pub fn rename_dj(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let index = self.djs.index_of(old_name)?;
        let displaced = self.djs.check_rename(index, new_name, self.rename_policy)?;
        self.djs.rename_at(index, new_name.to_string(), displaced);
        Ok(())
    }

    /// Renames a promo without touching its path.
    pub fn rename_promo(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let index = self.promos.index_of(old_name)?;
        let displaced = self
            .promos
            .check_rename(index, new_name, self.rename_policy)?;
        self.promos.rename_at(index, new_name.to_string(), displaced);
        Ok(())
    }

    pub fn delete_dj(&mut self, name: &str) -> Result<DjRecord> {
        let removed = self.djs.remove(name)?;
        tracing::info!(%name, "deleted DJ");
        Ok(removed)
    }

    pub fn delete_promo(&mut self, name: &str) -> Result<PromoRecord> {
        let removed = self.promos.remove(name)?;
        tracing::info!(%name, "deleted promo");
        Ok(removed)
    }

    /// Snapshot of the registry in ledger document form, in listing order.
    pub fn serialize(&self) -> LedgerDocument {
        LedgerDocument {
            djs: self.djs.entries.clone(),
            promos: self.promos.entries.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.serialize())?)
    }

    /// Listing rows for presentation.
    pub fn summarize(&self) -> LedgerSummary {
        LedgerSummary {
            djs: self
                .djs
                .entries
                .iter()
                .map(|dj| DjRow {
                    name: dj.name.clone(),
                    has_logo: dj.has_logo(),
                    rtmp_server: dj.rtmp_server.clone(),
                    has_recording: dj.has_recording(),
                })
                .collect(),
            promos: self
                .promos
                .entries
                .iter()
                .map(|promo| PromoRow {
                    name: promo.name.clone(),
                    has_recording: promo.has_recording(),
                })
                .collect(),
        }
    }
}
