//! Model signing utility.
//!
//! Writes `manifest.json` (encoding contract plus SHA-256 of `model.json`)
//! and an Ed25519 signature `model.sig` over the manifest bytes.
//!
//! # Usage
//!
//! ```bash
//! sign_model <model_dir> [--serial <n>] [--nonce-b64 <b64>] [--unsigned]
//! ```
//!
//! The 32-byte signing seed (base64) is read from
//! `SURVIVAL_MODEL_SIGNING_KEY_B64_FILE` or
//! `/run/secrets/survival_model_signing_key_b64`. `--unsigned` writes the
//! manifest only.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::RngCore;
use zeroize::Zeroizing;

use survival_intake::adapters::model::{
    ArtifactModel, LoadOptions, ModelManifest, MANIFEST_FILE, MODEL_FILE, SIGNATURE_FILE,
};
use survival_intake::ports::SurvivalModel;

const KEY_FILE_ENV: &str = "SURVIVAL_MODEL_SIGNING_KEY_B64_FILE";
const KEY_SECRET_PATH: &str = "/run/secrets/survival_model_signing_key_b64";

struct Args {
    model_dir: PathBuf,
    serial: Option<u64>,
    nonce_b64: Option<String>,
    unsigned: bool,
}

const USAGE: &str =
    "Usage: sign_model <model_dir> [--serial <u64>] [--nonce-b64 <b64_16_bytes>] [--unsigned]";

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut model_dir = None;
    let mut serial = None;
    let mut nonce_b64 = None;
    let mut unsigned = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--serial" => {
                let v = args.next().ok_or_else(|| anyhow!(USAGE))?;
                serial = Some(v.trim().parse::<u64>().context("--serial must be a u64")?);
            }
            "--nonce-b64" => nonce_b64 = Some(args.next().ok_or_else(|| anyhow!(USAGE))?),
            "--unsigned" => unsigned = true,
            "-h" | "--help" => bail!(USAGE),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => bail!(USAGE),
        }
    }

    Ok(Args {
        model_dir: model_dir.ok_or_else(|| anyhow!(USAGE))?,
        serial,
        nonce_b64,
        unsigned,
    })
}

fn read_signing_key() -> Result<SigningKey> {
    let path = env::var(KEY_FILE_ENV).unwrap_or_else(|_| KEY_SECRET_PATH.to_string());
    let content = Zeroizing::new(
        fs::read_to_string(path.trim())
            .with_context(|| format!("missing signing key: set {KEY_FILE_ENV} or mount {KEY_SECRET_PATH}"))?,
    );
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(content.trim())
            .context("invalid base64 in signing key")?,
    );
    let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
        raw.as_slice()
            .try_into()
            .map_err(|_| anyhow!("signing seed must be 32 bytes (got {})", raw.len()))?,
    );
    Ok(SigningKey::from_bytes(&seed))
}

fn nonce_b64(supplied: Option<String>) -> Result<String> {
    match supplied {
        Some(v) => {
            let raw = general_purpose::STANDARD
                .decode(v.trim())
                .context("invalid base64 nonce")?;
            if raw.len() != 16 {
                bail!("nonce must decode to exactly 16 bytes");
            }
            Ok(v.trim().to_string())
        }
        None => {
            let mut nonce = [0u8; 16];
            rand::rngs::OsRng.fill_bytes(&mut nonce);
            Ok(general_purpose::STANDARD.encode(nonce))
        }
    }
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let model_dir = if args.model_dir.is_file() {
        args.model_dir
            .parent()
            .ok_or_else(|| anyhow!("model path has no parent directory"))?
            .to_path_buf()
    } else {
        args.model_dir
    };

    let model_path = model_dir.join(MODEL_FILE);
    let model_bytes =
        fs::read(&model_path).with_context(|| format!("failed to read {}", model_path.display()))?;

    let created_at = chrono::Utc::now().timestamp();
    let mut manifest = ModelManifest::bind(&model_bytes);
    manifest.created_at = Some(created_at);
    manifest.serial = Some(
        args.serial
            .unwrap_or_else(|| u64::try_from(created_at).unwrap_or(1)),
    );
    manifest.nonce_b64 = Some(nonce_b64(args.nonce_b64)?);

    let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;
    let manifest_path = model_dir.join(MANIFEST_FILE);
    write(&manifest_path, &manifest_bytes)?;
    println!("Wrote manifest: {}", manifest_path.display());

    let sig_path = model_dir.join(SIGNATURE_FILE);
    let mut options = LoadOptions::default();
    if args.unsigned {
        if sig_path.exists() {
            fs::remove_file(&sig_path)
                .with_context(|| format!("failed to remove stale {}", sig_path.display()))?;
        }
    } else {
        let signing_key = read_signing_key()?;
        let sig: Signature = signing_key.sign(&manifest_bytes);
        write(&sig_path, &sig.to_bytes())?;
        println!("Wrote signature: {}", sig_path.display());

        let pubkey_b64 = general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes());
        let pubkey_path = model_dir.join("model.pub.b64");
        write(&pubkey_path, pubkey_b64.as_bytes())?;
        println!("Verifying key (base64): {pubkey_b64}");
        options = LoadOptions {
            pubkey_file: Some(pubkey_path),
            require_signature: true,
        };
    }

    // Re-load through the runtime path so a bad artifact is caught here.
    let model = ArtifactModel::load(&model_dir, &options)?;
    let info = model.info();
    println!(
        "Verified {} model ({} estimators, encoding {})",
        info.kind, info.estimators, info.encoding_version
    );

    Ok(())
}
