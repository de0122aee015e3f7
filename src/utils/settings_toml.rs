//! Load `.profsearch.toml` from a directory (CLI only). Lib callers pass [`SearchOpts`](crate::SearchOpts) directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SettingsToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    jobs: Option<usize>,
    verbose: Option<bool>,
    report_threshold: Option<f32>,
    max_hits: Option<usize>,
    match_score: Option<f32>,
    mismatch_score: Option<f32>,
}

/// Parse settings text. Unknown keys are ignored.
pub(crate) fn parse_settings_toml(s: &str) -> Result<SettingsToml, toml::de::Error> {
    toml::from_str(s)
}

/// Load the settings file from `dir`. Ok(None) when there is no readable file; an invalid
/// file is an error.
pub(crate) fn load_settings_toml(dir: &Path) -> Result<Option<SettingsToml>> {
    let path = dir.join(PackagePaths::get().settings_filename());
    let Ok(s) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    parse_settings_toml(&s)
        .map(Some)
        .with_context(|| format!("parse {}", path.display()))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident => $($opts_field:ident).+) => {
        if let Some(v) = $section.$field {
            $opts.$($opts_field).+ = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI flags.
pub(crate) fn apply_file_to_opts(file: &SettingsToml, opts: &mut Opts) {
    let section = &file.settings;
    apply_file_opt!(section, opts, jobs => jobs);
    apply_file_opt!(section, opts, verbose => verbose);
    apply_file_opt!(section, opts, report_threshold => pipeline.report_threshold);
    if section.max_hits.is_some() {
        opts.pipeline.max_hits = section.max_hits;
    }
    apply_file_opt!(section, opts, match_score => match_score);
    apply_file_opt!(section, opts, mismatch_score => mismatch_score);
}
