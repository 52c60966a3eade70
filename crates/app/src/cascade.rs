//! Carrying ledger edits over to the lineup that references them.

use shizu_core::{EntryKind, Lineup, Result, ShizuError};

/// An edit made to one ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    Renamed { old: String, new: String },
    Deleted(String),
}

/// Applies `change` to the matching lineup entry and returns whether the
/// lineup changed.
///
/// A renamed entry keeps its slot. If the lineup already holds the new
/// name, the ledger overwrote that record and the old entry is dropped.
pub fn apply(lineup: &mut Lineup, kind: EntryKind, change: &LedgerChange) -> Result<bool> {
    let name = match change {
        LedgerChange::Renamed { old, .. } | LedgerChange::Deleted(old) => old.as_str(),
    };
    let present = match kind {
        EntryKind::Dj => lineup.has_dj(name).is_some(),
        EntryKind::Promo => lineup.has_promo(name).is_some(),
    };
    if !present {
        return Ok(false);
    }

    match change {
        LedgerChange::Renamed { old, new } if old == new => return Ok(false),
        LedgerChange::Renamed { old, new } => {
            let renamed = match kind {
                EntryKind::Dj => lineup.rename_dj(old, new),
                EntryKind::Promo => lineup.rename_promo(old, new),
            };
            match renamed {
                Ok(()) => tracing::info!(%kind, from = %old, to = %new, "renamed lineup entry"),
                Err(ShizuError::AlreadyExists { .. }) => {
                    remove(lineup, kind, old)?;
                    tracing::warn!(%kind, name = %old, "dropped lineup entry merged by rename");
                }
                Err(err) => return Err(err),
            }
        }
        LedgerChange::Deleted(name) => {
            remove(lineup, kind, name)?;
            tracing::info!(%kind, %name, "dropped deleted entry from lineup");
        }
    }
    Ok(true)
}

fn remove(lineup: &mut Lineup, kind: EntryKind, name: &str) -> Result<()> {
    match kind {
        EntryKind::Dj => lineup.remove_dj(name).map(|_| ()),
        EntryKind::Promo => lineup.remove_promo(name).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shizu_core::{
        DjRecord, LedgerDocument, LedgerHandle, LedgerRegistry, LineupDjEntry, PromoRecord,
        RenamePolicy,
    };

    fn lineup() -> Lineup {
        let registry = LedgerRegistry::from_document(
            LedgerDocument {
                djs: vec![DjRecord::new("alice"), DjRecord::new("bob")],
                promos: vec![PromoRecord::new("ad1"), PromoRecord::new("ad2")],
            },
            RenamePolicy::Reject,
        )
        .unwrap();
        let mut lineup = Lineup::new(LedgerHandle::new(registry));
        lineup.add_dj("alice", true).unwrap();
        lineup.add_dj("bob", false).unwrap();
        lineup.add_promo("ad1").unwrap();
        lineup.add_promo("ad2").unwrap();
        lineup
    }

    fn renamed(old: &str, new: &str) -> LedgerChange {
        LedgerChange::Renamed {
            old: old.into(),
            new: new.into(),
        }
    }

    #[test]
    fn rename_keeps_slot_and_live_flag() {
        let mut lineup = lineup();
        assert!(apply(&mut lineup, EntryKind::Dj, &renamed("alice", "alicia")).unwrap());
        assert_eq!(
            lineup.dj_entries(),
            [
                LineupDjEntry::new("alicia", true),
                LineupDjEntry::new("bob", false)
            ]
        );

        assert!(apply(&mut lineup, EntryKind::Promo, &renamed("ad2", "ad-main")).unwrap());
        assert_eq!(lineup.promo_entries(), ["ad1", "ad-main"]);
    }

    #[test]
    fn rename_onto_listed_name_drops_old_entry() {
        let mut lineup = lineup();
        assert!(apply(&mut lineup, EntryKind::Dj, &renamed("bob", "alice")).unwrap());
        assert_eq!(lineup.dj_entries(), [LineupDjEntry::new("alice", true)]);
    }

    #[test]
    fn delete_drops_the_entry() {
        let mut lineup = lineup();
        assert!(apply(&mut lineup, EntryKind::Promo, &LedgerChange::Deleted("ad1".into())).unwrap());
        assert_eq!(lineup.promo_entries(), ["ad2"]);
        assert!(apply(&mut lineup, EntryKind::Dj, &LedgerChange::Deleted("alice".into())).unwrap());
        assert!(lineup.has_dj("alice").is_none());
    }

    #[test]
    fn unlisted_names_leave_lineup_alone() {
        let mut lineup = lineup();
        let before = lineup.summarize();
        assert!(!apply(&mut lineup, EntryKind::Dj, &renamed("carol", "caroline")).unwrap());
        assert!(!apply(&mut lineup, EntryKind::Dj, &LedgerChange::Deleted("carol".into())).unwrap());
        assert!(!apply(&mut lineup, EntryKind::Dj, &renamed("alice", "alice")).unwrap());
        assert_eq!(lineup.summarize(), before);
    }
}
