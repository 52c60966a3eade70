//! The lineup: an ordered selection of ledger entries for one event.
//!
//! Entries hold names only. The records behind them are looked up in the
//! ledger the lineup is bound to, so edits made in the ledger show up in
//! the next export and deletions surface there as stale references.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    export::{Exporter, LineupExport},
    EntryKind, LedgerHandle, LedgerRegistry, Result, ShizuError,
};

/// A DJ slot in the lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupDjEntry {
    pub name: String,
    pub is_live: bool,
    /// VJ credited alongside the set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vj: Option<String>,
}

impl LineupDjEntry {
    pub fn new(name: impl Into<String>, is_live: bool) -> Self {
        Self {
            name: name.into(),
            is_live,
            vj: None,
        }
    }

    pub fn with_vj(mut self, vj: impl Into<String>) -> Self {
        self.vj = Some(vj.into());
        self
    }
}

/// Lineup document as read from disk.
///
/// Accepts both the working shape written by [`Lineup::save`] and a
/// previously exported lineup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineupDocument {
    #[serde(default)]
    pub djs: Vec<LineupDjRow>,
    #[serde(default)]
    pub promos: Vec<LineupPromoRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupDjRow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vj: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineupDjRow {
    /// An explicit `is_live` wins; exported rows are live when they carry a
    /// `url` key, whatever its value.
    pub fn is_live(&self) -> bool {
        self.is_live
            .unwrap_or_else(|| self.extra.contains_key("url"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineupPromoRow {
    Name(String),
    Entry { name: String },
}

impl LineupPromoRow {
    pub fn name(&self) -> &str {
        match self {
            LineupPromoRow::Name(name) | LineupPromoRow::Entry { name } => name,
        }
    }
}

/// Both entry lists, in lineup order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineupSummary {
    pub djs: Vec<LineupDjEntry>,
    pub promos: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Lineup {
    djs: Vec<LineupDjEntry>,
    promos: Vec<String>,
    ledger: LedgerHandle,
}

impl Lineup {
    /// Creates an empty lineup bound to `ledger`.
    pub fn new(ledger: LedgerHandle) -> Self {
        Self {
            djs: Vec::new(),
            promos: Vec::new(),
            ledger,
        }
    }

    /// Creates a lineup from names that must all exist in `ledger`. A DJ
    /// without a recording starts out live.
    pub fn with_entries<D, P>(djs: D, promos: P, ledger: LedgerHandle) -> Result<Self>
    where
        D: IntoIterator,
        D::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let mut lineup = Self::new(ledger);
        {
            let registry = lineup.ledger.lock()?;
            for name in djs {
                let name = name.into();
                let is_live = !registry.get_dj(&name)?.has_recording();
                push_unique_dj(&mut lineup.djs, LineupDjEntry::new(name, is_live))?;
            }
            for name in promos {
                let name = name.into();
                registry.get_promo(&name)?;
                push_unique_promo(&mut lineup.promos, name)?;
            }
        }
        Ok(lineup)
    }

    pub fn from_json(raw: &str, ledger: LedgerHandle) -> Result<Self> {
        let document: LineupDocument = serde_json::from_str(raw)?;
        let mut lineup = Self::new(ledger);
        lineup.load(document)?;
        Ok(lineup)
    }

    /// Appends the entries of `document`. Names are not checked against the
    /// ledger here; a name already in the lineup fails the whole load.
    pub fn load(&mut self, document: LineupDocument) -> Result<()> {
        let mut djs = self.djs.clone();
        let mut promos = self.promos.clone();
        for row in document.djs {
            let entry = LineupDjEntry {
                is_live: row.is_live(),
                vj: row.vj.filter(|vj| !vj.is_empty()),
                name: row.name,
            };
            push_unique_dj(&mut djs, entry)?;
        }
        for row in document.promos {
            push_unique_promo(&mut promos, row.name().to_string())?;
        }

        tracing::debug!(djs = djs.len(), promos = promos.len(), "loaded lineup");
        self.djs = djs;
        self.promos = promos;
        Ok(())
    }

    /// Working document: names, live flags, VJs and order.
    pub fn save(&self) -> LineupDocument {
        LineupDocument {
            djs: self
                .djs
                .iter()
                .map(|entry| LineupDjRow {
                    name: entry.name.clone(),
                    is_live: Some(entry.is_live),
                    vj: entry.vj.clone(),
                    extra: Map::new(),
                })
                .collect(),
            promos: self
                .promos
                .iter()
                .cloned()
                .map(LineupPromoRow::Name)
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.save())?)
    }

    pub fn ledger(&self) -> &LedgerHandle {
        &self.ledger
    }

    /// Points the lineup at a different ledger. Entries are kept as they are.
    pub fn rebind(&mut self, ledger: LedgerHandle) {
        self.ledger = ledger;
    }

    pub fn dj_entries(&self) -> &[LineupDjEntry] {
        &self.djs
    }

    pub fn promo_entries(&self) -> &[String] {
        &self.promos
    }

    pub fn has_dj(&self, name: &str) -> Option<&LineupDjEntry> {
        self.djs.iter().find(|entry| entry.name == name)
    }

    pub fn has_promo(&self, name: &str) -> Option<&str> {
        self.promos
            .iter()
            .find(|promo| promo.as_str() == name)
            .map(String::as_str)
    }

    /// Appends a DJ at the end of the lineup.
    pub fn add_dj(&mut self, name: &str, is_live: bool) -> Result<()> {
        if self.has_dj(name).is_some() {
            return Err(ShizuError::already_exists(EntryKind::Dj, name));
        }
        self.ledger.lock()?.get_dj(name)?;
        self.djs.push(LineupDjEntry::new(name, is_live));
        tracing::info!(name, is_live, "added DJ to lineup");
        Ok(())
    }

    /// Appends a promo at the end of the lineup.
    pub fn add_promo(&mut self, name: &str) -> Result<()> {
        if self.has_promo(name).is_some() {
            return Err(ShizuError::already_exists(EntryKind::Promo, name));
        }
        self.ledger.lock()?.get_promo(name)?;
        self.promos.push(name.to_string());
        tracing::info!(name, "added promo to lineup");
        Ok(())
    }

    pub fn remove_dj(&mut self, name: &str) -> Result<LineupDjEntry> {
        let index = self
            .djs
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| ShizuError::not_found(EntryKind::Dj, name))?;
        Ok(self.djs.remove(index))
    }

    pub fn remove_promo(&mut self, name: &str) -> Result<String> {
        let index = self
            .promos
            .iter()
            .position(|promo| promo == name)
            .ok_or_else(|| ShizuError::not_found(EntryKind::Promo, name))?;
        Ok(self.promos.remove(index))
    }

    pub fn swap_djs(&mut self, first: usize, second: usize) -> Result<()> {
        checked_swap(&mut self.djs, first, second)
    }

    pub fn swap_promos(&mut self, first: usize, second: usize) -> Result<()> {
        checked_swap(&mut self.promos, first, second)
    }

    /// Follows a ledger rename: the entry keeps its position, live flag and VJ.
    pub fn rename_dj(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name != new_name && self.has_dj(new_name).is_some() {
            return Err(ShizuError::already_exists(EntryKind::Dj, new_name));
        }
        let entry = self
            .djs
            .iter_mut()
            .find(|entry| entry.name == old_name)
            .ok_or_else(|| ShizuError::not_found(EntryKind::Dj, old_name))?;
        entry.name = new_name.to_string();
        Ok(())
    }

    /// Follows a ledger rename, keeping the promo's position.
    pub fn rename_promo(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name != new_name && self.has_promo(new_name).is_some() {
            return Err(ShizuError::already_exists(EntryKind::Promo, new_name));
        }
        let promo = self
            .promos
            .iter_mut()
            .find(|promo| promo.as_str() == old_name)
            .ok_or_else(|| ShizuError::not_found(EntryKind::Promo, old_name))?;
        *promo = new_name.to_string();
        Ok(())
    }

    /// Sets or clears the VJ credited on a DJ entry.
    pub fn set_vj(&mut self, name: &str, vj: Option<String>) -> Result<()> {
        let entry = self
            .djs
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| ShizuError::not_found(EntryKind::Dj, name))?;
        entry.vj = vj.filter(|vj| !vj.is_empty());
        Ok(())
    }

    pub fn update_dj(&mut self, name: &str, is_live: bool) -> Result<()> {
        let entry = self
            .djs
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| ShizuError::not_found(EntryKind::Dj, name))?;
        entry.is_live = is_live;
        Ok(())
    }

    /// Entries whose names are missing from the bound ledger, DJs first.
    pub fn stale_entries(&self) -> Result<Vec<(EntryKind, String)>> {
        let registry = self.ledger.lock()?;
        Ok(self.collect_stale(&registry))
    }

    /// Drops every stale entry and returns what was dropped.
    pub fn prune_stale(&mut self) -> Result<Vec<(EntryKind, String)>> {
        let stale = {
            let registry = self.ledger.lock()?;
            self.collect_stale(&registry)
        };
        for (kind, name) in &stale {
            match kind {
                EntryKind::Dj => self.djs.retain(|entry| &entry.name != name),
                EntryKind::Promo => self.promos.retain(|promo| promo != name),
            }
            tracing::info!(%kind, %name, "dropped stale lineup entry");
        }
        Ok(stale)
    }

    fn collect_stale(&self, registry: &LedgerRegistry) -> Vec<(EntryKind, String)> {
        let djs = self
            .djs
            .iter()
            .filter(|entry| !registry.contains_dj(&entry.name))
            .map(|entry| (EntryKind::Dj, entry.name.clone()));
        let promos = self
            .promos
            .iter()
            .filter(|promo| !registry.contains_promo(promo))
            .map(|promo| (EntryKind::Promo, promo.clone()));
        djs.chain(promos).collect()
    }

    /// Builds the export document in lineup order. Fails on the first entry
    /// whose record is gone from the ledger.
    pub fn export(&self, exporter: &Exporter<'_>) -> Result<LineupExport> {
        let registry = self.ledger.lock()?;
        let mut export = LineupExport::default();

        for entry in &self.djs {
            let dj = registry
                .get_dj(&entry.name)
                .map_err(|_| stale(EntryKind::Dj, &entry.name))?;
            let mut record = exporter.dj(dj, entry.is_live);
            record.vj = entry.vj.clone();
            export.djs.push(record);
        }
        for name in &self.promos {
            let promo = registry
                .get_promo(name)
                .map_err(|_| stale(EntryKind::Promo, name))?;
            export.promos.push(exporter.promo(promo));
        }

        tracing::info!(
            djs = export.djs.len(),
            promos = export.promos.len(),
            "exported lineup"
        );
        Ok(export)
    }

    pub fn summarize(&self) -> LineupSummary {
        LineupSummary {
            djs: self.djs.clone(),
            promos: self.promos.clone(),
        }
    }
}

fn stale(kind: EntryKind, name: &str) -> ShizuError {
    ShizuError::StaleReference {
        kind,
        name: name.to_string(),
    }
}

fn push_unique_dj(djs: &mut Vec<LineupDjEntry>, entry: LineupDjEntry) -> Result<()> {
    if djs.iter().any(|existing| existing.name == entry.name) {
        return Err(ShizuError::already_exists(EntryKind::Dj, entry.name));
    }
    djs.push(entry);
    Ok(())
}

fn push_unique_promo(promos: &mut Vec<String>, name: String) -> Result<()> {
    if promos.contains(&name) {
        return Err(ShizuError::already_exists(EntryKind::Promo, name));
    }
    promos.push(name);
    Ok(())
}

fn checked_swap<T>(items: &mut [T], first: usize, second: usize) -> Result<()> {
    let len = items.len();
    for index in [first, second] {
        if index >= len {
            return Err(ShizuError::OutOfRange { index, len });
        }
    }
    items.swap(first, second);
    Ok(())
}
