//! Allow-list partitioning of an addon collection.

use std::collections::HashSet;

use crate::config::{SyncSettings, DEFAULT_ADDONS, DEFAULT_KEEP_KEYWORDS};
use crate::entities::{AddonDescriptor, Collection};

/// Why an addon survives filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    Default,
    Keyword,
}

/// Decides which addons of a collection are protected from removal.
///
/// An addon is kept when its id is on the default allow-list, or when its id
/// contains one of the reserved keywords (case-insensitive).
#[derive(Debug, Clone)]
pub struct AddonFilter {
    default_ids: HashSet<String>,
    keywords: Vec<String>,
}

/// A collection split in two, each side in original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub kept: Collection,
    pub removed: Collection,
}

impl AddonFilter {
    pub fn new<I, K>(default_ids: I, keywords: K) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        Self {
            default_ids: default_ids.into_iter().map(Into::into).collect(),
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(
            settings.default_addons.iter().cloned(),
            settings.keep_keywords.iter().cloned(),
        )
    }

    pub fn keep_reason(&self, addon: &AddonDescriptor) -> Option<KeepReason> {
        let id = addon.id();
        if self.default_ids.contains(id) {
            return Some(KeepReason::Default);
        }
        let lowered = id.to_lowercase();
        if self.keywords.iter().any(|k| lowered.contains(k.as_str())) {
            return Some(KeepReason::Keyword);
        }
        None
    }

    pub fn is_kept(&self, addon: &AddonDescriptor) -> bool {
        self.keep_reason(addon).is_some()
    }

    /// Split `addons` into kept and removed, preserving relative order.
    pub fn partition(&self, addons: &[AddonDescriptor]) -> Partition {
        let (kept, removed): (Collection, Collection) =
            addons.iter().cloned().partition(|a| self.is_kept(a));
        Partition { kept, removed }
    }

    /// Kept addons whose protection comes from a keyword match.
    pub fn keyword_matches<'a>(&self, addons: &'a [AddonDescriptor]) -> Vec<&'a AddonDescriptor> {
        addons
            .iter()
            .filter(|a| self.keep_reason(a) == Some(KeepReason::Keyword))
            .collect()
    }

    /// The collection an account should end up with: kept addons followed by
    /// the custom set. No de-duplication between the two.
    pub fn rebuild(&self, current: &[AddonDescriptor], custom: &[AddonDescriptor]) -> Collection {
        let mut next = self.partition(current).kept;
        next.extend_from_slice(custom);
        next
    }
}

impl Default for AddonFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ADDONS, DEFAULT_KEEP_KEYWORDS)
    }
}
