//! Compare desired metadata against what the catalog already holds.

use plexmeta_api::{Episode, MetadataPatch, Season};

use crate::resolver::DesiredMetadata;

/// Outcome of comparing desired metadata with a remote entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeDecision {
    Unchanged,
    /// Send this patch. It carries every field present in the desired metadata.
    Apply(MetadataPatch),
}

/// Current metadata of a catalog entity.
pub trait RemoteMetadata {
    fn title(&self) -> Option<&str>;
    fn summary(&self) -> Option<&str>;
}

impl RemoteMetadata for Season {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

impl RemoteMetadata for Episode {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

/// Decide whether `remote` needs updating to match `desired`.
///
/// Only fields present in `desired` are compared, by exact string match.
pub fn decide(desired: &DesiredMetadata, remote: &impl RemoteMetadata) -> ChangeDecision {
    if field_matches(desired.title.as_deref(), remote.title())
        && field_matches(desired.summary.as_deref(), remote.summary())
    {
        ChangeDecision::Unchanged
    } else {
        ChangeDecision::Apply(desired.to_patch())
    }
}

/// Like [`decide`], but always applies when `always_modify` is set.
pub fn decide_with(
    desired: &DesiredMetadata,
    remote: &impl RemoteMetadata,
    always_modify: bool,
) -> ChangeDecision {
    if always_modify {
        ChangeDecision::Apply(desired.to_patch())
    } else {
        decide(desired, remote)
    }
}

fn field_matches(desired: Option<&str>, remote: Option<&str>) -> bool {
    match desired {
        None => true,
        Some(want) => remote == Some(want),
    }
}
