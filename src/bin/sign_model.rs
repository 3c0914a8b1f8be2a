//! Model signing utility for Cardiorisk artifacts.
//!
//! Writes a manifest (`manifest.json`) binding every model JSON file in a
//! directory by SHA-256, and an Ed25519 signature over it (`model.sig`).
//!
//! # Usage
//!
//! ```bash
//! # sign with an existing seed
//! CARDIORISK_MODEL_SIGNING_KEY_B64_FILE=/run/secrets/seed sign_model model/
//!
//! # generate a fresh seed (written 0600, never overwritten) and sign
//! sign_model model/ --new-key signing_seed.b64
//! ```
//!
//! The base64 verifying key is printed; point
//! `CARDIORISK_MODEL_PUBKEY_B64_FILE` at a file holding it.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use cardiorisk::adapters::artifact::{sha256_hex, ModelManifest, MANIFEST_FILE, SIGNATURE_FILE};

const KEY_FILE_ENV: &str = "CARDIORISK_MODEL_SIGNING_KEY_B64_FILE";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

struct Args {
    model_dir: PathBuf,
    new_key: Option<PathBuf>,
}

fn usage() -> anyhow::Error {
    anyhow::anyhow!("Usage: sign_model <model_dir> [--new-key <seed_path>]")
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut model_dir = None;
    let mut new_key = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--new-key" => new_key = Some(PathBuf::from(args.next().ok_or_else(usage)?)),
            "-h" | "--help" => return Err(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    Ok(Args {
        model_dir: model_dir.ok_or_else(usage)?,
        new_key,
    })
}

fn read_seed() -> Result<Seed> {
    let path = env::var(KEY_FILE_ENV)
        .with_context(|| format!("{KEY_FILE_ENV} is not set (or pass --new-key <path>)"))?;
    let b64 = Zeroizing::new(
        fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
    );
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .context("Invalid base64 in signing key")?,
    );

    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn generate_seed(path: &Path) -> Result<Seed> {
    if path.exists() {
        bail!("Refusing to overwrite existing file {path:?}");
    }

    let mut seed = Seed([0u8; 32]);
    rand::rngs::OsRng.fill_bytes(&mut seed.0);
    let b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts
        .open(path)
        .with_context(|| format!("Failed to create {path:?}"))?;
    file.write_all(b64.as_bytes())?;
    file.write_all(b"\n")?;

    println!("Wrote new signing seed: {path:?}");
    Ok(seed)
}

/// SHA-256 of every `*.json` artifact in `dir`, keyed by file name.
fn hash_artifacts(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();

    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {dir:?}"))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !path.is_file() || !name.ends_with(".json") || name == MANIFEST_FILE {
            continue;
        }
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(name.to_string(), sha256_hex(&bytes));
    }

    if files.is_empty() {
        bail!("No model JSON found in {dir:?}");
    }
    Ok(files)
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let model_dir = if args.model_dir.is_file() {
        args.model_dir
            .parent()
            .context("Model path has no parent directory")?
            .to_path_buf()
    } else {
        args.model_dir
    };

    let seed = match &args.new_key {
        Some(path) => generate_seed(path)?,
        None => read_seed()?,
    };
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let files = hash_artifacts(&model_dir)?;
    for name in files.keys() {
        println!("Binding {name}");
    }

    let manifest_bytes = serde_json::to_vec_pretty(&ModelManifest::new(files))
        .context("Failed to serialize manifest")?;
    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let signature: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, signature.to_bytes())
        .with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "PUBKEY (base64)={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );

    Ok(())
}
