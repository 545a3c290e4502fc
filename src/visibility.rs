//! Folder- and item-level visibility and opacity control.
//!
//! Entries exist only for successfully loaded assets, so every operation
//! on a failed or unknown id is a no-op by construction. Folder counts,
//! by contrast, track every asset assigned to the folder, including
//! failed loads whose (disabled) cards the presentation layer still shows.

use rustc_hash::FxHashMap;

use crate::api::AssetId;
use crate::category::CategoryId;
use crate::render::{Aabb, GroupId, MaterialId, RenderScene};

/// Render order for translucent groups so they composite after opaque
/// siblings sharing the scene.
const TRANSLUCENT_RENDER_ORDER: i32 = 2;

/// Opacity percent applied when an entry is registered. Lungs start
/// translucent so mediastinal structures stay readable.
#[must_use]
pub fn default_opacity(category: CategoryId) -> u8 {
    match category {
        CategoryId::Lung => 70,
        _ => 100,
    }
}

/// Folder-level state for one category.
#[derive(Debug, Clone, Copy)]
pub struct Folder {
    /// Folder visibility flag; ANDed with each member's item toggle.
    pub visible: bool,
    /// Assets assigned to this folder (loaded or failed).
    pub count: usize,
}

/// Live control state of one successfully loaded asset.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Owning asset.
    pub asset_id: AssetId,
    /// Scene group of the loaded object.
    pub group: GroupId,
    /// Material record shared by the object's meshes.
    pub material: MaterialId,
    /// Category folder the entry belongs to.
    pub category: CategoryId,
    /// Item-level visibility toggle.
    pub item_visible: bool,
    /// Current opacity percent in `[0, 100]`.
    pub opacity_percent: u8,
}

/// Two-level visibility/opacity surface over the render scene.
///
/// Effective visibility of an entry is always
/// `folder.visible AND entry.item_visible`, recomputed on every toggle.
#[derive(Debug)]
pub struct VisibilityController {
    folders: FxHashMap<CategoryId, Folder>,
    entries: Vec<Entry>,
}

impl VisibilityController {
    /// All five folders visible and empty.
    #[must_use]
    pub fn new() -> Self {
        let mut folders = FxHashMap::default();
        for category in CategoryId::ALL {
            let _ = folders.insert(
                category,
                Folder {
                    visible: true,
                    count: 0,
                },
            );
        }
        Self {
            folders,
            entries: Vec::new(),
        }
    }

    /// Count an asset against its folder. Called once per asset at
    /// categorization time, before its load is attempted.
    pub fn record_assignment(&mut self, category: CategoryId) {
        if let Some(folder) = self.folders.get_mut(&category) {
            folder.count += 1;
        }
    }

    /// Register a successfully loaded asset and route its category's
    /// default opacity through the normal opacity path, which settles the
    /// material's transparency flags.
    pub fn register(
        &mut self,
        scene: &mut RenderScene,
        asset_id: AssetId,
        group: GroupId,
        material: MaterialId,
        category: CategoryId,
    ) {
        self.entries.push(Entry {
            asset_id,
            group,
            material,
            category,
            item_visible: true,
            opacity_percent: 100,
        });
        self.set_opacity(scene, asset_id, i32::from(default_opacity(category)));
        self.refresh(scene, asset_id);
    }

    /// Item-level toggle; affects only this entry.
    pub fn set_item_visible(
        &mut self,
        scene: &mut RenderScene,
        asset_id: AssetId,
        visible: bool,
    ) {
        if let Some(entry) = self.entry_mut(asset_id) {
            entry.item_visible = visible;
        }
        self.refresh(scene, asset_id);
    }

    /// Folder-level toggle; cascades to every member's effective
    /// visibility without touching their item toggles.
    pub fn set_folder_visible(
        &mut self,
        scene: &mut RenderScene,
        category: CategoryId,
        visible: bool,
    ) {
        if let Some(folder) = self.folders.get_mut(&category) {
            folder.visible = visible;
        }
        let members: Vec<AssetId> = self
            .entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.asset_id)
            .collect();
        for asset_id in members {
            self.refresh(scene, asset_id);
        }
    }

    /// Clamped opacity write.
    ///
    /// `opacity = percent / 100`, `transparent = percent < 100`,
    /// `depth_write = percent == 100`, depth test stays on, and the
    /// entry's group is bumped to the translucent render order whenever
    /// it is not fully opaque.
    pub fn set_opacity(
        &mut self,
        scene: &mut RenderScene,
        asset_id: AssetId,
        percent: i32,
    ) {
        let clamped = percent.clamp(0, 100) as u8;
        let Some(entry) = self.entry_mut(asset_id) else {
            return;
        };
        entry.opacity_percent = clamped;
        let group = entry.group;
        let material = entry.material;
        let opaque = clamped == 100;

        if let Some(material) = scene.material_mut(material) {
            material.opacity = f32::from(clamped) / 100.0;
            material.transparent = !opaque;
            material.depth_write = opaque;
            material.depth_test = true;
        }
        scene.set_render_order(
            group,
            if opaque { 0 } else { TRANSLUCENT_RENDER_ORDER },
        );
    }

    /// Bounding box of one entry's group, for camera focus.
    #[must_use]
    pub fn focus(
        &self,
        scene: &RenderScene,
        asset_id: AssetId,
    ) -> Option<Aabb> {
        let entry = self.entry(asset_id)?;
        let bounds = scene.world_bounds(entry.group);
        if bounds.is_empty() {
            None
        } else {
            Some(bounds)
        }
    }

    /// Effective visibility of an entry, if registered.
    #[must_use]
    pub fn effective_visibility(&self, asset_id: AssetId) -> Option<bool> {
        let entry = self.entry(asset_id)?;
        Some(self.folder_visible(entry.category) && entry.item_visible)
    }

    /// Folder state for a category.
    #[must_use]
    pub fn folder(&self, category: CategoryId) -> Option<Folder> {
        self.folders.get(&category).copied()
    }

    /// Registered entries in load order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry for an asset, if its load succeeded.
    #[must_use]
    pub fn entry(&self, asset_id: AssetId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.asset_id == asset_id)
    }

    fn entry_mut(&mut self, asset_id: AssetId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.asset_id == asset_id)
    }

    fn folder_visible(&self, category: CategoryId) -> bool {
        self.folders.get(&category).map_or(true, |f| f.visible)
    }

    fn refresh(&mut self, scene: &mut RenderScene, asset_id: AssetId) {
        let Some(entry) = self.entry(asset_id) else {
            return;
        };
        let visible = self.folder_visible(entry.category) && entry.item_visible;
        scene.set_group_visible(entry.group, visible);
    }
}

impl Default for VisibilityController {
    fn default() -> Self {
        Self::new()
    }
}
