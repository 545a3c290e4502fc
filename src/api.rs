//! Scene envelope client and the byte-transport seam.
//!
//! The upstream endpoint answers
//! `{ "code": 0|n, "msg": ..., "data": { "scene": ..., "models": [...] } }`;
//! anything other than a well-formed `code == 0` body is fatal for the
//! boot sequence. Wire field names are part of the upstream contract and
//! must not drift.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SomavisError;
use crate::options::HttpOptions;

/// Identifier of one model asset (the upstream row id).
pub type AssetId = u64;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// One chunk-level progress event from a streaming fetch.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    /// Bytes received so far.
    pub loaded: u64,
    /// Total bytes expected, when the server reports one.
    pub total: Option<u64>,
}

/// Errors produced by a [`Transport`].
#[derive(Debug)]
pub enum TransportError {
    /// Server answered with a non-success HTTP status.
    Status(u16),
    /// Connection, DNS, TLS, or timeout failure.
    Network(String),
    /// I/O failure while streaming the response body.
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Io(e) => write!(f, "read error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Blocking byte transport for the scene endpoint and model payloads.
///
/// The engine issues one request at a time, always on the calling thread;
/// implementations need no interior synchronization.
pub trait Transport {
    /// Fetch `url` fully into memory.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;

    /// Fetch `url`, reporting chunk-level progress through `on_progress`.
    fn fetch_streaming(
        &self,
        url: &str,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Vec<u8>, TransportError>;
}

/// Production transport backed by `ureq`, with one global timeout as the
/// only stall protection (no retries, by design).
pub struct HttpTransport {
    agent: ureq::Agent,
    chunk_size: usize,
}

impl HttpTransport {
    /// Build a transport with the given global timeout and streaming
    /// chunk size.
    #[must_use]
    pub fn new(timeout: Duration, chunk_size: usize) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Build a transport from viewer options.
    #[must_use]
    pub fn from_options(http: &HttpOptions) -> Self {
        Self::new(Duration::from_secs(http.timeout_secs), http.chunk_size)
    }

    fn start(
        &self,
        url: &str,
    ) -> Result<ureq::http::Response<ureq::Body>, TransportError> {
        self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::StatusCode(code) => TransportError::Status(code),
            other => TransportError::Network(other.to_string()),
        })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.start(url)?;
        let mut body = response.into_body();
        let mut reader = body.with_config().limit(u64::MAX).reader();
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf).map_err(TransportError::Io)?;
        Ok(buf)
    }

    fn fetch_streaming(
        &self,
        url: &str,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Vec<u8>, TransportError> {
        let response = self.start(url)?;
        let total = content_length(response.headers());
        let mut body = response.into_body();
        let mut reader = body.with_config().limit(u64::MAX).reader();
        let mut buf = Vec::new();
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let n = reader.read(&mut chunk).map_err(TransportError::Io)?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            on_progress(ProgressEvent {
                loaded: buf.len() as u64,
                total,
            });
        }
        Ok(buf)
    }
}

fn content_length(headers: &ureq::http::HeaderMap) -> Option<u64> {
    headers
        .get(ureq::http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// One loadable model row from the envelope (`data.models[]`).
///
/// The upstream serializes absent optionals as empty strings; consumers
/// treat empty and absent alike.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelAsset {
    /// Upstream row id.
    #[serde(default)]
    pub id: AssetId,
    /// Display name; drives categorization.
    #[serde(default)]
    pub display_name: String,
    /// Download URL (signed by the backend). Records without one are
    /// filtered out before loading.
    #[serde(default)]
    pub file_path: String,
    /// Declared format string. Family-routed, never sniffed.
    #[serde(default)]
    pub file_type: String,
    /// MIME type, informational only.
    #[serde(default)]
    pub mime: Option<String>,
    /// Payload size in bytes, when known.
    #[serde(default, alias = "file_size_bytes")]
    pub file_size: Option<i64>,
    /// Content hash, informational only.
    #[serde(default)]
    pub file_hash: Option<String>,
    /// Preferred display color.
    #[serde(default)]
    pub color_hex: Option<String>,
    /// Physical material label (e.g. a print filament name).
    #[serde(default)]
    pub material_text: Option<String>,
    /// Free-form metadata blob (JSON text, uninterpreted).
    #[serde(default)]
    pub info_json: Option<String>,
}

impl ModelAsset {
    /// Expected payload size for progress accounting: the declared size
    /// when positive, otherwise 1 so even unknown-size assets move the
    /// aggregate exactly once.
    #[must_use]
    pub fn expected_size(&self) -> u64 {
        match self.file_size {
            Some(size) if size > 0 => size as u64,
            _ => 1,
        }
    }

    /// Whether the record carries a usable download URL.
    #[must_use]
    pub fn has_url(&self) -> bool {
        !self.file_path.trim().is_empty()
    }
}

/// Scene metadata row from the envelope (`data.scene`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneInfo {
    /// Scene row id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Imaging accession number.
    #[serde(default)]
    pub imaging_number: Option<String>,
    /// Imaging date.
    #[serde(default)]
    pub imaging_date: Option<String>,
    /// Reconstruction date.
    #[serde(default)]
    pub recon_date: Option<String>,
}

/// Immutable scene description assembled from one envelope fetch.
#[derive(Debug, Clone)]
pub struct SceneDescriptor {
    /// Scene id (falls back to the requested id when the row omits one).
    pub id: u64,
    /// Display title (may be empty).
    pub title: String,
    /// Imaging accession number.
    pub imaging_number: Option<String>,
    /// Imaging date.
    pub imaging_date: Option<String>,
    /// Reconstruction date.
    pub recon_date: Option<String>,
    /// Loadable models in upstream order, URL-less records filtered out.
    pub models: Vec<ModelAsset>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    scene: Option<SceneInfo>,
    #[serde(default)]
    models: Option<Vec<ModelAsset>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the scene-detail endpoint.
pub struct SceneDataClient {
    base_url: String,
}

impl SceneDataClient {
    /// Client for the given API base (e.g. `https://host/tv/api`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        Self {
            base_url: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Scene-detail URL for one scene id.
    #[must_use]
    pub fn scene_detail_url(&self, scene_id: u64) -> String {
        format!("{}/sceneDetail?scene_id={scene_id}", self.base_url)
    }

    /// Fetch and validate the scene envelope. Transport failures, a
    /// non-JSON body, and `code != 0` are all fatal; there is no retry.
    pub fn fetch(
        &self,
        transport: &dyn Transport,
        scene_id: u64,
    ) -> Result<SceneDescriptor, SomavisError> {
        let url = self.scene_detail_url(scene_id);
        log::info!("fetching scene envelope: {url}");
        let body = transport.fetch(&url)?;
        let envelope: Envelope = serde_json::from_slice(&body)
            .map_err(|e| SomavisError::Envelope(e.to_string()))?;
        if envelope.code != 0 {
            return Err(SomavisError::Api {
                code: envelope.code,
                msg: envelope.msg,
            });
        }

        let data = envelope.data.unwrap_or_default();
        let scene = data.scene.unwrap_or_default();
        let all_models = data.models.unwrap_or_default();
        let total = all_models.len();
        let models: Vec<ModelAsset> =
            all_models.into_iter().filter(ModelAsset::has_url).collect();
        if models.len() < total {
            log::warn!(
                "dropped {} model record(s) without a download URL",
                total - models.len()
            );
        }

        Ok(SceneDescriptor {
            id: scene.id.unwrap_or(scene_id),
            title: scene.title.unwrap_or_default(),
            imaging_number: scene.imaging_number,
            imaging_date: scene.imaging_date,
            recon_date: scene.recon_date,
            models,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticTransport(Vec<u8>);

    impl Transport for StaticTransport {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            Ok(self.0.clone())
        }

        fn fetch_streaming(
            &self,
            _url: &str,
            on_progress: &mut dyn FnMut(ProgressEvent),
        ) -> Result<Vec<u8>, TransportError> {
            on_progress(ProgressEvent {
                loaded: self.0.len() as u64,
                total: Some(self.0.len() as u64),
            });
            Ok(self.0.clone())
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Status(502))
        }

        fn fetch_streaming(
            &self,
            _url: &str,
            _on_progress: &mut dyn FnMut(ProgressEvent),
        ) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Status(502))
        }
    }

    const GOOD_BODY: &str = r#"{
        "code": 0,
        "msg": "ok",
        "data": {
            "scene": {
                "id": 16,
                "title": "术前重建",
                "imaging_number": "IMG-001",
                "imaging_date": "2024-03-01",
                "recon_date": "2024-03-02"
            },
            "models": [
                {
                    "id": 1,
                    "display_name": "心脏",
                    "file_path": "https://cdn.example/heart.stl",
                    "file_type": "stl",
                    "mime": "model/stl",
                    "file_size": 1000,
                    "color_hex": "",
                    "material_text": ""
                },
                {
                    "id": 2,
                    "display_name": "无路径",
                    "file_path": "",
                    "file_type": "stl"
                },
                {
                    "id": 3,
                    "display_name": "骨骼",
                    "file_path": "https://cdn.example/bone.drc",
                    "file_type": "drc",
                    "file_size_bytes": 2048
                }
            ]
        }
    }"#;

    #[test]
    fn scene_detail_url_shape() {
        let client = SceneDataClient::new("https://host/tv/api/");
        assert_eq!(
            client.scene_detail_url(16),
            "https://host/tv/api/sceneDetail?scene_id=16"
        );
    }

    #[test]
    fn fetch_parses_and_filters() {
        let client = SceneDataClient::new("/tv/api");
        let transport = StaticTransport(GOOD_BODY.into());
        let descriptor = client.fetch(&transport, 16).unwrap();

        assert_eq!(descriptor.id, 16);
        assert_eq!(descriptor.title, "术前重建");
        assert_eq!(descriptor.imaging_number.as_deref(), Some("IMG-001"));
        // The URL-less record is filtered out before loading.
        assert_eq!(descriptor.models.len(), 2);
        assert_eq!(descriptor.models[0].display_name, "心脏");
        // file_size_bytes is accepted as an alias for file_size.
        assert_eq!(descriptor.models[1].expected_size(), 2048);
    }

    #[test]
    fn nonzero_code_is_fatal() {
        let client = SceneDataClient::new("/tv/api");
        let body = r#"{ "code": 404, "msg": "scene not found", "data": {} }"#;
        let transport = StaticTransport(body.into());
        match client.fetch(&transport, 99) {
            Err(SomavisError::Api { code, msg }) => {
                assert_eq!(code, 404);
                assert_eq!(msg, "scene not found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_fatal() {
        let client = SceneDataClient::new("/tv/api");
        let transport = StaticTransport(b"<html>gateway</html>".to_vec());
        assert!(matches!(
            client.fetch(&transport, 1),
            Err(SomavisError::Envelope(_))
        ));
    }

    #[test]
    fn transport_failure_is_fatal() {
        let client = SceneDataClient::new("/tv/api");
        assert!(matches!(
            client.fetch(&FailingTransport, 1),
            Err(SomavisError::Transport(TransportError::Status(502)))
        ));
    }

    #[test]
    fn null_models_mean_an_empty_scene() {
        let client = SceneDataClient::new("/tv/api");
        let body =
            r#"{ "code": 0, "msg": "ok", "data": { "scene": null, "models": null } }"#;
        let transport = StaticTransport(body.into());
        let descriptor = client.fetch(&transport, 7).unwrap();
        assert_eq!(descriptor.id, 7);
        assert!(descriptor.models.is_empty());
    }

    #[test]
    fn expected_size_defaults_to_one() {
        let mut asset: ModelAsset = serde_json::from_str(
            r#"{ "display_name": "x", "file_path": "u", "file_type": "stl" }"#,
        )
        .unwrap();
        assert_eq!(asset.expected_size(), 1);
        asset.file_size = Some(0);
        assert_eq!(asset.expected_size(), 1);
        asset.file_size = Some(-5);
        assert_eq!(asset.expected_size(), 1);
        asset.file_size = Some(123);
        assert_eq!(asset.expected_size(), 123);
    }
}
