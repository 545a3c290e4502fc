//! Per-boot viewer session: owns all state and drives the load sequence.
//!
//! A session is constructed per `boot` call and owns every map and
//! counter, so nothing leaks across scenes and the whole engine can be
//! driven headlessly. Presentation plugs in through [`SessionObserver`];
//! the engine never touches UI.

use rustc_hash::FxHashMap;

use crate::api::{
    AssetId, ModelAsset, SceneDataClient, SceneDescriptor, Transport,
};
use crate::camera::Camera;
use crate::category::CategoryId;
use crate::error::SomavisError;
use crate::loader::{AssetLoader, DecoderSet, LoadState};
use crate::material;
use crate::options::ViewerOptions;
use crate::progress::ProgressAggregator;
use crate::render::{Aabb, RenderScene};
use crate::visibility::{Entry, Folder, VisibilityController};

/// Aspect ratio used until the presentation layer reports a viewport.
const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

/// Presentation adapter: receives aggregate progress, per-asset state
/// transitions, and user-facing notices. All methods default to no-ops,
/// and `()` implements the trait for headless use.
pub trait SessionObserver {
    /// Aggregate download progress changed.
    fn on_progress(&mut self, _percent: f32) {}

    /// One asset's load state changed.
    fn on_asset_state(&mut self, _asset_id: AssetId, _state: &LoadState) {}

    /// A user-facing notice (fatal fetch failures, empty scenes).
    fn on_notice(&mut self, _message: &str) {}
}

impl SessionObserver for () {}

/// One viewer session.
///
/// Construction is the boot sequence itself: fetch the envelope, then
/// load every asset strictly sequentially, feeding the aggregator and
/// registering visibility entries for successes. Envelope failures are
/// fatal and produce no session; per-asset failures are recorded and the
/// batch continues.
pub struct ViewerSession {
    options: ViewerOptions,
    descriptor: SceneDescriptor,
    scene: RenderScene,
    visibility: VisibilityController,
    progress: ProgressAggregator,
    camera: Camera,
    global_bounds: Aabb,
    load_states: FxHashMap<AssetId, LoadState>,
}

impl ViewerSession {
    /// Boot a session for `scene_id`.
    pub fn boot(
        options: ViewerOptions,
        scene_id: u64,
        transport: &dyn Transport,
        decoders: &DecoderSet,
        observer: &mut dyn SessionObserver,
    ) -> Result<Self, SomavisError> {
        let client = SceneDataClient::new(options.api.base_url.clone());
        let descriptor = match client.fetch(transport, scene_id) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                log::error!("boot aborted: {e}");
                observer.on_notice(&e.to_string());
                return Err(e);
            }
        };

        let camera = Camera::new(&options.camera, DEFAULT_ASPECT);
        let mut session = Self {
            options,
            descriptor,
            scene: RenderScene::new(),
            visibility: VisibilityController::new(),
            progress: ProgressAggregator::new(),
            camera,
            global_bounds: Aabb::EMPTY,
            load_states: FxHashMap::default(),
        };

        if session.descriptor.models.is_empty() {
            log::info!("scene {} has no models", session.descriptor.id);
            observer.on_notice("scene has no models");
            return Ok(session);
        }

        session.progress.begin(
            session
                .descriptor
                .models
                .iter()
                .map(|m| (m.id, m.expected_size())),
        );
        let ids: Vec<AssetId> =
            session.descriptor.models.iter().map(|m| m.id).collect();
        for id in ids {
            session.transition(id, LoadState::Pending, observer);
        }
        observer.on_progress(session.progress.percent());

        let loader = AssetLoader::new(transport, decoders);
        let models = session.descriptor.models.clone();
        for (index, asset) in models.iter().enumerate() {
            session.load_one(&loader, asset, index, observer);
        }

        log::info!(
            "scene {}: {} model(s), {} loaded, progress {:.0}%",
            session.descriptor.id,
            models.len(),
            session.visibility.entries().len(),
            session.progress.percent()
        );
        session.camera.fit(&session.global_bounds);
        Ok(session)
    }

    fn load_one(
        &mut self,
        loader: &AssetLoader<'_>,
        asset: &ModelAsset,
        index: usize,
        observer: &mut dyn SessionObserver,
    ) {
        let category = CategoryId::assign(&asset.display_name);
        self.visibility.record_assignment(category);
        let material_id =
            self.scene.add_material(material::material_for(asset, index));

        self.transition(asset.id, LoadState::Loading, observer);
        let result = loader.load(
            asset,
            material_id,
            &mut self.scene,
            &mut self.progress,
            |percent| observer.on_progress(percent),
        );
        match result {
            Ok(loaded) => {
                self.visibility.register(
                    &mut self.scene,
                    asset.id,
                    loaded.group,
                    material_id,
                    category,
                );
                self.global_bounds.union(&loaded.bounds);
                self.transition(asset.id, LoadState::Loaded, observer);
            }
            Err(failure) => {
                self.transition(asset.id, LoadState::Failed(failure), observer);
            }
        }
    }

    fn transition(
        &mut self,
        asset_id: AssetId,
        state: LoadState,
        observer: &mut dyn SessionObserver,
    ) {
        observer.on_asset_state(asset_id, &state);
        let _ = self.load_states.insert(asset_id, state);
    }

    // -- Scene metadata and read access --

    /// The fetched scene description.
    #[must_use]
    pub fn descriptor(&self) -> &SceneDescriptor {
        &self.descriptor
    }

    /// The options this session was booted with.
    #[must_use]
    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    /// The render scene for the renderer's frame walk.
    #[must_use]
    pub fn render_scene(&self) -> &RenderScene {
        &self.scene
    }

    /// Current camera pose.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera access (viewport aspect updates, orbit controls).
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Accumulated bounds of everything loaded so far.
    #[must_use]
    pub fn global_bounds(&self) -> Aabb {
        self.global_bounds
    }

    /// Aggregate download progress in `[0, 100]`.
    #[must_use]
    pub fn progress_percent(&self) -> f32 {
        self.progress.percent()
    }

    /// Load state of one asset.
    #[must_use]
    pub fn load_state(&self, asset_id: AssetId) -> Option<&LoadState> {
        self.load_states.get(&asset_id)
    }

    /// Folder state for a category.
    #[must_use]
    pub fn folder(&self, category: CategoryId) -> Option<Folder> {
        self.visibility.folder(category)
    }

    /// Registered entries (successful loads) in load order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        self.visibility.entries()
    }

    /// Effective visibility of an entry, if registered.
    #[must_use]
    pub fn effective_visibility(&self, asset_id: AssetId) -> Option<bool> {
        self.visibility.effective_visibility(asset_id)
    }

    // -- Control surface --

    /// Item-level visibility toggle (no-op for failed/unknown assets).
    pub fn set_item_visible(&mut self, asset_id: AssetId, visible: bool) {
        self.visibility
            .set_item_visible(&mut self.scene, asset_id, visible);
    }

    /// Folder-level visibility toggle, cascading to all members.
    pub fn set_folder_visible(&mut self, category: CategoryId, visible: bool) {
        self.visibility
            .set_folder_visible(&mut self.scene, category, visible);
    }

    /// Clamped opacity write (no-op for failed/unknown assets).
    pub fn set_opacity(&mut self, asset_id: AssetId, percent: i32) {
        self.visibility
            .set_opacity(&mut self.scene, asset_id, percent);
    }

    /// Frame one loaded asset. Returns whether a fit happened.
    pub fn focus(&mut self, asset_id: AssetId) -> bool {
        match self.visibility.focus(&self.scene, asset_id) {
            Some(bounds) => {
                self.camera.fit(&bounds);
                true
            }
            None => false,
        }
    }

    /// Frame everything loaded so far.
    pub fn fit_all(&mut self) {
        let bounds = self.global_bounds;
        self.camera.fit(&bounds);
    }

    /// Return the camera to the home pose.
    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }
}
