//! Application configuration constants.
//! Tuning and defaults in one place.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Optional settings file looked up in the working directory (CLI only).
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }
}

// ---- Worker threads ----

/// Thread limits for resolving "autodetect" parallelism.
#[derive(Clone, Copy, Debug)]
pub struct WorkerLimits {
    /// Available threads (from rayon); set by [`WorkerLimits::current()`].
    pub all_threads: usize,
}

impl WorkerLimits {
    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
        }
    }
}

// ---- Scoring ----

pub struct ScoringConsts;

impl ScoringConsts {
    /// Hits scoring at least this are reported by default.
    pub const DEFAULT_REPORT_THRESHOLD: f32 = 10.0;
}

/// Sequence-to-profile builder defaults.
pub struct BuilderConsts;

impl BuilderConsts {
    pub const MATCH_SCORE: f32 = 5.0;
    pub const MISMATCH_SCORE: f32 = -4.0;
}

// ---- Press ----

/// Companion files written by `press`, and the optimized-profile parameters.
pub struct PressConsts;

impl PressConsts {
    /// Model store (JSON lines).
    pub const MODEL_EXT: &'static str = "psm";
    /// Optimized (quantized) profile store.
    pub const PROFILE_EXT: &'static str = "psp";
    /// Filter store (per-position best score).
    pub const FILTER_EXT: &'static str = "psf";
    /// Name/accession index.
    pub const INDEX_EXT: &'static str = "psi";
    /// Expected target length recorded with every optimized profile.
    pub const DEFAULT_TARGET_LENGTH: u32 = 400;
    /// Largest magnitude of a quantized score.
    pub const QUANT_MAX: f32 = 127.0;

    /// All output extensions, in the order they are checked and removed.
    pub const ALL_EXTS: [&'static str; 4] = [
        Self::MODEL_EXT,
        Self::INDEX_EXT,
        Self::FILTER_EXT,
        Self::PROFILE_EXT,
    ];

    /// `<base>.<ext>`, appending to whatever extension `base` already has.
    pub fn output_path(base: &Path, ext: &str) -> PathBuf {
        let mut s = base.as_os_str().to_owned();
        s.push(".");
        s.push(ext);
        PathBuf::from(s)
    }
}

// ---- Progress ----

pub struct ProgressConsts;

impl ProgressConsts {
    pub const SEARCH_DESC: &'static str = "Searching";
}
