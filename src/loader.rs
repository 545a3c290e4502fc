//! Per-format asset loading: dispatch, download, decode, scene insertion.
//!
//! One asset is loaded at a time, to a terminal outcome, before the next
//! begins. Exactly one progress force-credit happens per asset on every
//! path, which is what keeps the aggregate verifiable whatever a loader
//! or the network does.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use crate::api::{ModelAsset, ProgressEvent, Transport, TransportError};
use crate::progress::ProgressAggregator;
use crate::render::{Aabb, GroupId, MaterialId, RenderObject, RenderScene};

/// Source data is Z-up; the render scene is Y-up.
pub const AXIS_CORRECTION_X: f32 = -FRAC_PI_2;

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

/// Format family of a declared `file_type`, the sole dispatch key.
///
/// The recognized strings are part of the upstream contract. Anything
/// outside the four supported families is an explicit
/// [`FileFormat::Unsupported`] and fails before any network I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Scene-graph mesh containers (`glb`, `gltf`).
    Gltf,
    /// Compressed geometry (`drc`, `draco`).
    Draco,
    /// Raw triangle meshes (`stl`).
    Stl,
    /// Plain-text meshes (`obj`).
    Obj,
    /// Everything else.
    Unsupported,
}

impl FileFormat {
    /// Map a declared file-type string to its family, case-insensitively.
    #[must_use]
    pub fn from_declared(file_type: &str) -> Self {
        match file_type.trim().to_ascii_lowercase().as_str() {
            "glb" | "gltf" => Self::Gltf,
            "drc" | "draco" => Self::Draco,
            "stl" => Self::Stl,
            "obj" => Self::Obj,
            _ => Self::Unsupported,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder capabilities
// ---------------------------------------------------------------------------

/// Failure reported by a [`MeshDecoder`].
#[derive(Debug)]
pub struct DecodeError {
    message: String,
}

impl DecodeError {
    /// Wrap a backend decode failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DecodeError {}

/// A format-family decode capability supplied by the render backend:
/// given a full payload, produce a renderable object.
pub trait MeshDecoder {
    /// Decode `bytes` into a renderable object.
    fn decode(&self, bytes: &[u8]) -> Result<RenderObject, DecodeError>;
}

/// One decoder per supported format family.
pub struct DecoderSet {
    gltf: Box<dyn MeshDecoder>,
    draco: Box<dyn MeshDecoder>,
    stl: Box<dyn MeshDecoder>,
    obj: Box<dyn MeshDecoder>,
}

impl DecoderSet {
    /// Assemble the set from the backend's four decode capabilities.
    #[must_use]
    pub fn new(
        gltf: Box<dyn MeshDecoder>,
        draco: Box<dyn MeshDecoder>,
        stl: Box<dyn MeshDecoder>,
        obj: Box<dyn MeshDecoder>,
    ) -> Self {
        Self {
            gltf,
            draco,
            stl,
            obj,
        }
    }

    fn decoder_for(&self, format: FileFormat) -> Option<&dyn MeshDecoder> {
        match format {
            FileFormat::Gltf => Some(self.gltf.as_ref()),
            FileFormat::Draco => Some(self.draco.as_ref()),
            FileFormat::Stl => Some(self.stl.as_ref()),
            FileFormat::Obj => Some(self.obj.as_ref()),
            FileFormat::Unsupported => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Load lifecycle
// ---------------------------------------------------------------------------

/// Terminal failure of one asset load. Never fatal for the batch.
#[derive(Debug)]
pub enum LoadFailure {
    /// The declared file type has no decoder family; detected before any
    /// network I/O.
    Unsupported {
        /// The declared type string, for operator logs.
        declared: String,
    },
    /// The download failed.
    Transport(TransportError),
    /// The payload did not decode.
    Decode(DecodeError),
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { declared } => {
                write!(f, "unsupported file type: {declared:?}")
            }
            Self::Transport(e) => write!(f, "download failed: {e}"),
            Self::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

/// Lifecycle of one asset load. `Loaded` and `Failed` are terminal.
#[derive(Debug, Default)]
pub enum LoadState {
    /// Not yet reached by the sequential loop.
    #[default]
    Pending,
    /// Download/decode in flight.
    Loading,
    /// In the scene with a registered control entry.
    Loaded,
    /// Terminal failure; controls for the asset stay disabled.
    Failed(LoadFailure),
}

/// A successfully loaded asset: its scene group and the bounds it
/// contributes to the global box.
#[derive(Debug, Clone, Copy)]
pub struct LoadedAsset {
    /// Wrapper group inserted into the scene.
    pub group: GroupId,
    /// Group bounds after the axis correction.
    pub bounds: Aabb,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Sequential per-asset loader over the injected transport and decoders.
pub struct AssetLoader<'a> {
    transport: &'a dyn Transport,
    decoders: &'a DecoderSet,
}

impl<'a> AssetLoader<'a> {
    /// Bundle the injected transport and decode capabilities.
    #[must_use]
    pub fn new(transport: &'a dyn Transport, decoders: &'a DecoderSet) -> Self {
        Self {
            transport,
            decoders,
        }
    }

    /// Load one asset to a terminal outcome.
    ///
    /// On success the decoded object is wrapped in a group with the axis
    /// correction, bound to `material`, and added to `scene`. On every
    /// path the asset's remaining expected bytes are force-credited, and
    /// `on_percent` observes the aggregate after each progress change.
    pub fn load(
        &self,
        asset: &ModelAsset,
        material: MaterialId,
        scene: &mut RenderScene,
        progress: &mut ProgressAggregator,
        mut on_percent: impl FnMut(f32),
    ) -> Result<LoadedAsset, LoadFailure> {
        let result =
            self.try_load(asset, material, scene, progress, &mut on_percent);
        progress.finish(asset.id);
        on_percent(progress.percent());
        result
    }

    fn try_load(
        &self,
        asset: &ModelAsset,
        material: MaterialId,
        scene: &mut RenderScene,
        progress: &mut ProgressAggregator,
        on_percent: &mut dyn FnMut(f32),
    ) -> Result<LoadedAsset, LoadFailure> {
        let format = FileFormat::from_declared(&asset.file_type);
        let Some(decoder) = self.decoders.decoder_for(format) else {
            log::warn!(
                "unsupported file type {:?} for model {} ({})",
                asset.file_type,
                asset.id,
                asset.display_name
            );
            return Err(LoadFailure::Unsupported {
                declared: asset.file_type.clone(),
            });
        };

        let id = asset.id;
        let bytes = self
            .transport
            .fetch_streaming(&asset.file_path, &mut |event: ProgressEvent| {
                progress.record(id, event.loaded, event.total);
                on_percent(progress.percent());
            })
            .map_err(|e| {
                log::error!("download failed for model {id}: {e}");
                LoadFailure::Transport(e)
            })?;

        let object = decoder.decode(&bytes).map_err(|e| {
            log::error!("decode failed for model {id}: {e}");
            LoadFailure::Decode(e)
        })?;

        let group = scene.add_group(object, material, AXIS_CORRECTION_X);
        let bounds = scene.world_bounds(group);
        log::debug!(
            "model {id} ({}) loaded as group {group:?}",
            asset.display_name
        );
        Ok(LoadedAsset { group, bounds })
    }
}
