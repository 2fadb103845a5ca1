//! OSRM dataset preparation (Geofabrik download + docker preprocessing).
//!
//! Each travel profile needs its own extract, so datasets live under
//! `<data_root>/<region>/<profile>/`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

use crate::model::TransportMode;

#[derive(Debug, Clone)]
pub struct GeofabrikRegion {
    /// Geofabrik region path, e.g. "europe/germany/berlin".
    pub path: String,
}

impl GeofabrikRegion {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("region")
    }

    pub fn url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.path)
    }
}

/// OSRM routing profiles shipped with the `osrm/osrm-backend` image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsrmProfile {
    Car,
    Bicycle,
    Foot,
}

impl OsrmProfile {
    /// Profile that serves `mode`, if OSRM can route it at all.
    pub fn for_mode(mode: TransportMode) -> Option<Self> {
        match mode {
            TransportMode::Car => Some(OsrmProfile::Car),
            TransportMode::Bicycle => Some(OsrmProfile::Bicycle),
            TransportMode::Walking => Some(OsrmProfile::Foot),
            TransportMode::PublicTransit => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OsrmProfile::Car => "car",
            OsrmProfile::Bicycle => "bicycle",
            OsrmProfile::Foot => "foot",
        }
    }

    /// Lua script path inside the OSRM image.
    pub fn lua_path(self) -> String {
        format!("/opt/{}.lua", self.name())
    }
}

#[derive(Debug, Clone)]
pub struct OsrmDatasetConfig {
    pub region: GeofabrikRegion,
    pub data_root: PathBuf,
    pub profile: OsrmProfile,
}

impl OsrmDatasetConfig {
    pub fn new(region: GeofabrikRegion, data_root: impl Into<PathBuf>, profile: OsrmProfile) -> Self {
        Self {
            region,
            data_root: data_root.into(),
            profile,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmDataset {
    /// Directory to mount as `/data` in the OSRM container.
    pub data_dir: PathBuf,
    pub osrm_base: PathBuf,
    pub pbf_path: PathBuf,
}

impl OsrmDataset {
    /// File name of the `.osrm` base inside the container.
    pub fn container_path(&self) -> String {
        format!("/data/{}", file_name(&self.osrm_base))
    }
}

#[derive(Debug, Error)]
pub enum OsrmDataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("preprocessing failed: {0}")]
    ProcessFailure(String),
}

impl OsrmDataset {
    /// Downloads and preprocesses (MLD) the dataset unless it is already in place.
    pub fn ensure(config: &OsrmDatasetConfig) -> Result<Self, OsrmDataError> {
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        let region_name = config.region.name();
        let data_dir = data_root.join(region_name).join(config.profile.name());
        fs::create_dir_all(&data_dir)?;

        let pbf_path = data_dir.join(format!("{}-latest.osm.pbf", region_name));
        if !pbf_path.exists() {
            info!(url = %config.region.url(), "downloading OSM extract");
            download_pbf(&config.region.url(), &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{}-latest.osrm", region_name));
        if !osrm_base.exists() {
            info!(profile = config.profile.name(), "running osrm-extract");
            run_docker(
                &[
                    "osrm-extract",
                    "-p",
                    &config.profile.lua_path(),
                    &format!("/data/{}", file_name(&pbf_path)),
                ],
                &data_dir,
            )?;
        }

        if !mld_ready(&osrm_base) {
            let base = format!("/data/{}", file_name(&osrm_base));
            run_docker(&["osrm-partition", &base], &data_dir)?;
            run_docker(&["osrm-customize", &base], &data_dir)?;
        }

        Ok(Self {
            data_dir,
            osrm_base,
            pbf_path,
        })
    }
}

fn download_pbf(url: &str, dest: &Path) -> Result<(), OsrmDataError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    let bytes = response.bytes()?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn mld_ready(osrm_base: &Path) -> bool {
    ["osrm.partition", "osrm.mldgr", "osrm.cells"]
        .iter()
        .all(|ext| osrm_base.with_extension(ext).exists())
        && osrm_base.exists()
}

fn run_docker(args: &[&str], data_dir: &Path) -> Result<(), OsrmDataError> {
    let status = Command::new("docker")
        .arg("run")
        .arg("--rm")
        .arg("-t")
        .arg("-v")
        .arg(format!("{}:/data", data_dir.display()))
        .arg("osrm/osrm-backend")
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(OsrmDataError::ProcessFailure(format!(
            "docker {} exited with status {}",
            args.first().copied().unwrap_or_default(),
            status
        )))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}
