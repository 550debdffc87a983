use std::collections::BTreeMap;

use quill_types::models::Platform;

/// Selected platforms in selection order, plus one identifier (handle or
/// URL) per selected platform. Deselecting drops the identifier too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformSelection {
    order: Vec<Platform>,
    ids: BTreeMap<Platform, String>,
}

impl PlatformSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a selection from a stored profile. Identifiers for platforms
    /// that are not selected are dropped.
    pub fn from_parts(platforms: &[Platform], ids: &BTreeMap<Platform, String>) -> Self {
        let mut selection = Self::new();
        for &platform in platforms {
            if !selection.is_selected(platform) {
                selection.order.push(platform);
            }
            if let Some(id) = ids.get(&platform) {
                selection.ids.insert(platform, id.clone());
            }
        }
        selection
    }

    /// Flip a platform. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, platform: Platform) -> bool {
        if self.is_selected(platform) {
            self.order.retain(|p| *p != platform);
            self.ids.remove(&platform);
            false
        } else {
            self.order.push(platform);
            true
        }
    }

    /// Set the identifier of a selected platform. Ignored for platforms
    /// that are not selected.
    pub fn set_id(&mut self, platform: Platform, value: impl Into<String>) -> bool {
        if !self.is_selected(platform) {
            return false;
        }
        self.ids.insert(platform, value.into());
        true
    }

    pub fn is_selected(&self, platform: Platform) -> bool {
        self.order.contains(&platform)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn selected(&self) -> &[Platform] {
        &self.order
    }

    pub fn id(&self, platform: Platform) -> Option<&str> {
        self.ids.get(&platform).map(String::as_str)
    }

    /// Selected platforms whose identifier is missing or blank, in
    /// selection order.
    pub fn missing_ids(&self) -> Vec<Platform> {
        self.order
            .iter()
            .copied()
            .filter(|p| self.id(*p).is_none_or(|id| id.trim().is_empty()))
            .collect()
    }

    /// Selected platforms and their trimmed identifiers.
    pub fn to_parts(&self) -> (Vec<Platform>, BTreeMap<Platform, String>) {
        let ids = self
            .order
            .iter()
            .filter_map(|p| self.ids.get(p).map(|id| (*p, id.trim().to_string())))
            .collect();
        (self.order.clone(), ids)
    }
}

/// "Twitter / X, LinkedIn" style list for error messages.
pub fn labels(platforms: &[Platform]) -> String {
    platforms
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join(", ")
}
