//! Model adapter: Implementation of SurvivalModel from a model directory.
//!
//! A model directory contains:
//! - `model.json`: the serialized classifier (see [`artifact`])
//! - `manifest.json`: the encoding contract plus SHA-256 hashes of bound files
//! - `model.sig` (optional): Ed25519 signature over the raw manifest bytes
//!
//! # Contract
//!
//! The manifest declares the feature names and encoding version the model
//! was trained on. Loading fails unless both match the encoder exactly, so a
//! model trained on a different column order can never be served.
//!
//! # Signatures
//!
//! When `model.sig` is present it is always verified, against the base64
//! public key configured through `SURVIVAL_MODEL_PUBKEY_B64_FILE`. An
//! unsigned manifest is accepted only when signatures are not required.

pub mod artifact;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{
    EncodedFeatureVector, SurvivalLabel, ENCODING_VERSION, FEATURE_COUNT, FEATURE_NAMES,
};
use crate::ports::{ModelInfo, PredictionError, SurvivalModel};

pub use artifact::ModelArtifact;

pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Supported manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Error type for model loading. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Model directory not found: {0:?}")]
    MissingDirectory(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {file} format: {source}")]
    Format {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Manifest rejected: {0}")]
    Manifest(String),

    #[error("File hash mismatch for {0}")]
    HashMismatch(String),

    #[error("Signature verification failed: {0}")]
    Signature(String),

    #[error("Invalid model artifact: {0}")]
    Artifact(String),
}

/// Signed description of a model directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    pub encoding_version: String,
    pub feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce_b64: Option<String>,
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    /// Manifest binding `model_bytes` as `model.json` under the current encoding.
    #[must_use]
    pub fn bind(model_bytes: &[u8]) -> Self {
        let mut files = BTreeMap::new();
        files.insert(MODEL_FILE.to_string(), sha256_hex(model_bytes));
        Self {
            version: MANIFEST_VERSION,
            encoding_version: ENCODING_VERSION.to_string(),
            feature_names: FEATURE_NAMES.iter().map(|n| (*n).to_string()).collect(),
            serial: None,
            created_at: None,
            nonce_b64: None,
            files,
        }
    }

    /// Check the declared contract against the encoder.
    fn check_contract(&self) -> Result<(), LoadError> {
        if self.version != MANIFEST_VERSION {
            return Err(LoadError::Manifest(format!(
                "unsupported manifest version {}",
                self.version
            )));
        }
        if self.encoding_version != ENCODING_VERSION {
            return Err(LoadError::Manifest(format!(
                "encoding version {:?} does not match {:?}",
                self.encoding_version, ENCODING_VERSION
            )));
        }
        if self.feature_names.len() != FEATURE_COUNT {
            return Err(LoadError::Manifest(format!(
                "manifest declares {} features, encoder produces {FEATURE_COUNT}",
                self.feature_names.len()
            )));
        }
        if let Some((i, (declared, expected))) = self
            .feature_names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .enumerate()
            .find(|(_, (d, e))| d.as_str() != **e)
        {
            return Err(LoadError::Manifest(format!(
                "feature {i} is {declared:?} in the manifest but {expected:?} in the encoder"
            )));
        }
        if let Some(nonce) = &self.nonce_b64 {
            let raw = base64::engine::general_purpose::STANDARD
                .decode(nonce.trim())
                .map_err(|e| LoadError::Manifest(format!("invalid nonce base64: {e}")))?;
            if raw.len() != 16 {
                return Err(LoadError::Manifest(
                    "nonce must decode to exactly 16 bytes".into(),
                ));
            }
        }
        if !self.files.contains_key(MODEL_FILE) {
            return Err(LoadError::Manifest(format!("manifest must bind {MODEL_FILE}")));
        }
        Ok(())
    }
}

/// How strictly to treat manifest signatures.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// File holding the base64 Ed25519 verifying key
    pub pubkey_file: Option<PathBuf>,
    /// Refuse manifests without `model.sig`
    pub require_signature: bool,
}

/// A verified model loaded from disk.
#[derive(Debug)]
pub struct ArtifactModel {
    artifact: ModelArtifact,
    manifest: ModelManifest,
    signed: bool,
}

impl ArtifactModel {
    /// Load and verify a model directory.
    ///
    /// A path to a file inside the directory is accepted as well.
    ///
    /// # Errors
    /// Returns `LoadError` if any file is missing, malformed, unsigned when a
    /// signature is required, or does not match the encoder contract.
    pub fn load(model_dir: &Path, options: &LoadOptions) -> Result<Self, LoadError> {
        let base_dir = if model_dir.is_file() {
            model_dir.parent().unwrap_or(model_dir)
        } else {
            model_dir
        };
        if !base_dir.is_dir() {
            return Err(LoadError::MissingDirectory(model_dir.to_path_buf()));
        }

        let manifest_path = base_dir.join(MANIFEST_FILE);
        let manifest_bytes = read(&manifest_path)?;

        let signed = verify_signature(base_dir, &manifest_bytes, options)?;

        let manifest: ModelManifest =
            serde_json::from_slice(&manifest_bytes).map_err(|source| LoadError::Format {
                file: MANIFEST_FILE,
                source,
            })?;
        manifest.check_contract()?;

        for (rel, expected_hex) in &manifest.files {
            let mut components = Path::new(rel).components();
            let plain = matches!(components.next(), Some(Component::Normal(_)))
                && components.next().is_none();
            if !plain {
                return Err(LoadError::Manifest(format!(
                    "bound file {rel:?} must live directly in the model directory"
                )));
            }
            let bytes = read(&base_dir.join(rel))?;
            if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
                return Err(LoadError::HashMismatch(rel.clone()));
            }
        }

        let model_path = base_dir.join(MODEL_FILE);
        let model_bytes = read(&model_path)?;
        let artifact: ModelArtifact =
            serde_json::from_slice(&model_bytes).map_err(|source| LoadError::Format {
                file: MODEL_FILE,
                source,
            })?;
        artifact
            .validate(FEATURE_COUNT)
            .map_err(LoadError::Artifact)?;

        tracing::info!(
            "Loaded model from {:?} (kind={}, estimators={}, encoding={}, signed={})",
            model_path,
            artifact.kind(),
            artifact.estimators(),
            manifest.encoding_version,
            signed
        );

        Ok(Self {
            artifact,
            manifest,
            signed,
        })
    }

    #[must_use]
    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    fn checked_input<'a>(
        &self,
        features: &'a EncodedFeatureVector,
    ) -> Result<&'a [f64], PredictionError> {
        if let Some(name) = features.first_non_finite() {
            return Err(PredictionError::NonFinite(name));
        }
        Ok(features.as_slice())
    }
}

impl SurvivalModel for ArtifactModel {
    fn predict(&self, features: &EncodedFeatureVector) -> Result<SurvivalLabel, PredictionError> {
        self.artifact.label(self.checked_input(features)?)
    }

    fn predict_proba(
        &self,
        features: &EncodedFeatureVector,
    ) -> Result<Option<f64>, PredictionError> {
        self.artifact
            .positive_probability(self.checked_input(features)?)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            kind: self.artifact.kind().to_string(),
            estimators: self.artifact.estimators(),
            encoding_version: self.manifest.encoding_version.clone(),
            signed: self.signed,
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Verify `model.sig` if present. Returns whether the manifest was signed.
fn verify_signature(
    base_dir: &Path,
    manifest_bytes: &[u8],
    options: &LoadOptions,
) -> Result<bool, LoadError> {
    let sig_path = base_dir.join(SIGNATURE_FILE);
    if !sig_path.exists() {
        if options.require_signature {
            return Err(LoadError::Signature(format!(
                "{SIGNATURE_FILE} not found in {base_dir:?} and signed models are required"
            )));
        }
        tracing::warn!("Loading unsigned model manifest from {:?}", base_dir);
        return Ok(false);
    }

    let pubkey_file = options.pubkey_file.as_ref().ok_or_else(|| {
        LoadError::Signature(format!(
            "{SIGNATURE_FILE} present but no verifying key configured"
        ))
    })?;
    let key_b64 = fs::read_to_string(pubkey_file).map_err(|source| LoadError::Read {
        path: pubkey_file.clone(),
        source,
    })?;
    let verifying_key = verifying_key_from_b64(&key_b64)?;

    let sig_bytes = read(&sig_path)?;
    let sig_array: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| LoadError::Signature("invalid signature length (expected 64 bytes)".into()))?;
    let signature = Signature::from_bytes(&sig_array);

    verifying_key
        .verify(manifest_bytes, &signature)
        .map_err(|_| LoadError::Signature("manifest signature does not verify".into()))?;

    tracing::info!("Model manifest signature verified");
    Ok(true)
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `LoadError::Signature` on bad base64 or an invalid key.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, LoadError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| LoadError::Signature("invalid public key base64".into()))?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| LoadError::Signature("invalid public key length (expected 32 bytes)".into()))?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| LoadError::Signature("invalid verifying key".into()))
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |diff, (x, y)| diff | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact::{DecisionTree, LinearModel, TreeEnsemble, TreeNode};
    use ed25519_dalek::{Signer, SigningKey};
    use tempfile::tempdir;

    fn stage_tree() -> ModelArtifact {
        // Stage code <= 1 (I/II) survives, otherwise not.
        ModelArtifact::TreeEnsemble(TreeEnsemble {
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 1,
                        threshold: 1.5,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: [1.0, 3.0] },
                    TreeNode::Leaf { value: [4.0, 1.0] },
                ],
            }],
        })
    }

    fn write_model(dir: &Path, artifact: &ModelArtifact) -> ModelManifest {
        let bytes = serde_json::to_vec(artifact).expect("serialize model");
        fs::write(dir.join(MODEL_FILE), &bytes).expect("write model");
        ModelManifest::bind(&bytes)
    }

    fn write_manifest(dir: &Path, manifest: &ModelManifest) -> Vec<u8> {
        let bytes = serde_json::to_vec_pretty(manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        bytes
    }

    fn features(stage: f64) -> EncodedFeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[1] = stage;
        EncodedFeatureVector::from_values(values)
    }

    fn signing_setup(dir: &Path) -> (SigningKey, LoadOptions) {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let pub_b64 = base64::engine::general_purpose::STANDARD
            .encode(signing_key.verifying_key().as_bytes());
        let pub_path = dir.join("pubkey.b64");
        fs::write(&pub_path, pub_b64).expect("write pubkey");
        let options = LoadOptions {
            pubkey_file: Some(pub_path),
            require_signature: true,
        };
        (signing_key, options)
    }

    #[test]
    fn test_load_unsigned_model() {
        let temp = tempdir().expect("tempdir");
        let manifest = write_model(temp.path(), &stage_tree());
        write_manifest(temp.path(), &manifest);

        let model = ArtifactModel::load(temp.path(), &LoadOptions::default()).expect("load");
        let info = model.info();
        assert_eq!(info.kind, "tree_ensemble");
        assert_eq!(info.estimators, 1);
        assert!(!info.signed);

        assert_eq!(model.predict(&features(0.0)).expect("predict"), SurvivalLabel::Survived);
        assert_eq!(
            model.predict_proba(&features(0.0)).expect("proba"),
            Some(0.75)
        );
        assert_eq!(
            model.predict(&features(3.0)).expect("predict"),
            SurvivalLabel::NotSurvived
        );
    }

    #[test]
    fn test_load_accepts_file_path() {
        let temp = tempdir().expect("tempdir");
        let manifest = write_model(temp.path(), &stage_tree());
        write_manifest(temp.path(), &manifest);

        let model = ArtifactModel::load(&temp.path().join(MODEL_FILE), &LoadOptions::default());
        assert!(model.is_ok());
    }

    #[test]
    fn test_missing_directory_fails_fast() {
        let temp = tempdir().expect("tempdir");
        let result = ArtifactModel::load(&temp.path().join("nope"), &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::MissingDirectory(_))));
    }

    #[test]
    fn test_missing_manifest_fails() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &stage_tree());
        let result = ArtifactModel::load(temp.path(), &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Read { .. })));
    }

    #[test]
    fn test_feature_order_mismatch_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let mut manifest = write_model(temp.path(), &stage_tree());
        manifest.feature_names.swap(0, 1);
        write_manifest(temp.path(), &manifest);

        let err = ArtifactModel::load(temp.path(), &LoadOptions::default()).expect_err("reject");
        assert!(matches!(err, LoadError::Manifest(_)));
        assert!(err.to_string().contains("cancer_stage"));
    }

    #[test]
    fn test_encoding_version_mismatch_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let mut manifest = write_model(temp.path(), &stage_tree());
        manifest.encoding_version = "lung-survival-v0".into();
        write_manifest(temp.path(), &manifest);

        let result = ArtifactModel::load(temp.path(), &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Manifest(_))));
    }

    #[test]
    fn test_hash_mismatch_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let manifest = write_model(temp.path(), &stage_tree());
        write_manifest(temp.path(), &manifest);
        fs::write(temp.path().join(MODEL_FILE), b"{\"kind\":\"linear\"}").expect("tamper");

        let result = ArtifactModel::load(temp.path(), &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::HashMismatch(f)) if f == MODEL_FILE));
    }

    #[test]
    fn test_bound_paths_must_stay_in_directory() {
        let temp = tempdir().expect("tempdir");
        let mut manifest = write_model(temp.path(), &stage_tree());
        manifest
            .files
            .insert("../outside.json".into(), sha256_hex(b"{}"));
        write_manifest(temp.path(), &manifest);

        let result = ArtifactModel::load(temp.path(), &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Manifest(_))));
    }

    #[test]
    fn test_corrupt_model_json_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let bytes = b"not json".to_vec();
        fs::write(temp.path().join(MODEL_FILE), &bytes).expect("write");
        write_manifest(temp.path(), &ModelManifest::bind(&bytes));

        let result = ArtifactModel::load(temp.path(), &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Format { file: MODEL_FILE, .. })));
    }

    #[test]
    fn test_structurally_invalid_model_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let short = ModelArtifact::Linear(LinearModel {
            coefficients: vec![1.0; 3],
            intercept: 0.0,
            scaler_mean: None,
            scaler_scale: None,
            probability: true,
        });
        let manifest = write_model(temp.path(), &short);
        write_manifest(temp.path(), &manifest);

        let result = ArtifactModel::load(temp.path(), &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Artifact(_))));
    }

    #[test]
    fn test_required_signature_missing() {
        let temp = tempdir().expect("tempdir");
        let manifest = write_model(temp.path(), &stage_tree());
        write_manifest(temp.path(), &manifest);

        let options = LoadOptions {
            pubkey_file: None,
            require_signature: true,
        };
        let result = ArtifactModel::load(temp.path(), &options);
        assert!(matches!(result, Err(LoadError::Signature(_))));
    }

    #[test]
    fn test_signed_manifest_loads() {
        let temp = tempdir().expect("tempdir");
        let (signing_key, options) = signing_setup(temp.path());
        let manifest = write_model(temp.path(), &stage_tree());
        let manifest_bytes = write_manifest(temp.path(), &manifest);
        let signature: Signature = signing_key.sign(&manifest_bytes);
        fs::write(temp.path().join(SIGNATURE_FILE), signature.to_bytes()).expect("write sig");

        let model = ArtifactModel::load(temp.path(), &options).expect("load");
        assert!(model.info().signed);
        assert_eq!(model.manifest(), &manifest);
    }

    #[test]
    fn test_tampered_signed_manifest_fails() {
        let temp = tempdir().expect("tempdir");
        let (signing_key, options) = signing_setup(temp.path());
        let manifest = write_model(temp.path(), &stage_tree());
        let manifest_bytes = write_manifest(temp.path(), &manifest);
        let signature: Signature = signing_key.sign(&manifest_bytes);
        fs::write(temp.path().join(SIGNATURE_FILE), signature.to_bytes()).expect("write sig");

        let mut altered = manifest.clone();
        altered.serial = Some(42);
        write_manifest(temp.path(), &altered);

        let result = ArtifactModel::load(temp.path(), &options);
        assert!(matches!(result, Err(LoadError::Signature(_))));
    }

    #[test]
    fn test_non_finite_input_is_a_prediction_error() {
        let temp = tempdir().expect("tempdir");
        let manifest = write_model(temp.path(), &stage_tree());
        write_manifest(temp.path(), &manifest);
        let model = ArtifactModel::load(temp.path(), &LoadOptions::default()).expect("load");

        let mut values = [0.0; FEATURE_COUNT];
        values[3] = f64::NAN;
        let result = model.predict(&EncodedFeatureVector::from_values(values));
        assert!(matches!(result, Err(PredictionError::NonFinite("bmi"))));
    }

    #[test]
    fn test_bundled_model_directory_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let model = ArtifactModel::load(&dir, &LoadOptions::default()).expect("bundled model");
        assert_eq!(model.info().encoding_version, ENCODING_VERSION);
    }
}
