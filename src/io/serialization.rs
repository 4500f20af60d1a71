// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Track request serialization.
//!
//! This module writes the annotation set handed to the tracking step in
//! YAML or JSON format.

use crate::models::track::TrackRequest;
use anyhow::{bail, Result};
use std::path::Path;

/// Export a track request to YAML format.
pub fn export_yaml(request: &TrackRequest, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(request)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export a track request to JSON format.
pub fn export_json(request: &TrackRequest, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(request)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Export in the format implied by the file extension.
pub fn export(request: &TrackRequest, path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => export_yaml(request, path),
        Some("json") => export_json(request, path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}
