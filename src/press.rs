//! Press: write models into a model store, an optimized-profile store, a filter store and an
//! index, so a single model can later be fetched by name or accession.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::engine::alphabet::Alphabet;
use crate::engine::profile::{Profile, write_model};
use crate::errors::{InputError, ScoringError};
use crate::utils::config::PressConsts;

/// Byte offsets of one model's records in the three stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offsets {
    pub model: u64,
    pub profile: u64,
    pub filter: u64,
}

/// Quantized profile as stored in the optimized-profile store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizedProfile {
    pub name: String,
    pub alphabet: Alphabet,
    /// Expected target length the profile was configured for.
    pub target_length: u32,
    /// `score = quantized / scale`.
    pub scale: f32,
    pub scores: Vec<Vec<i8>>,
}

impl OptimizedProfile {
    /// Quantize `profile` so its largest magnitude maps to [`PressConsts::QUANT_MAX`].
    pub fn from_profile(profile: &Profile, target_length: u32) -> Self {
        let max_abs = profile
            .scores
            .iter()
            .flatten()
            .fold(0.0_f32, |m, s| m.max(s.abs()));
        let scale = if max_abs > 0.0 {
            PressConsts::QUANT_MAX / max_abs
        } else {
            1.0
        };
        let scores = profile
            .scores
            .iter()
            .map(|row| {
                row.iter()
                    .map(|s| {
                        (s * scale)
                            .round()
                            .clamp(-PressConsts::QUANT_MAX, PressConsts::QUANT_MAX)
                            as i8
                    })
                    .collect()
            })
            .collect();
        Self {
            name: profile.name.clone(),
            alphabet: profile.alphabet,
            target_length,
            scale,
            scores,
        }
    }
}

/// Per-position best score, used to skip targets cheaply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterRecord {
    pub name: String,
    pub best: Vec<f32>,
}

impl FilterRecord {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            best: profile
                .scores
                .iter()
                .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
                .collect(),
        }
    }
}

/// One line of the index: a model name with its offsets, or an accession pointing at a name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IndexRecord {
    Key { name: String, offsets: Offsets },
    Alias { alias: String, name: String },
}

/// Writer that tracks how many bytes went through it (the next record's offset).
struct CountingWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    fn position(&self) -> u64 {
        self.written
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn create_store(base: &Path, ext: &str) -> Result<CountingWriter<BufWriter<File>>> {
    let path = PressConsts::output_path(base, ext);
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    Ok(CountingWriter::new(BufWriter::new(file)))
}

fn write_json_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Paths of the four files `press` writes for `base`.
pub fn press_outputs(base: &Path) -> Vec<PathBuf> {
    PressConsts::ALL_EXTS
        .iter()
        .map(|ext| PressConsts::output_path(base, ext))
        .collect()
}

/// Fail with [`InputError::OutputExists`] if any output of `base` exists, unless `force`, in
/// which case existing outputs are removed.
pub fn prepare_press_outputs(base: &Path, force: bool) -> Result<()> {
    for path in press_outputs(base) {
        if !path.exists() {
            continue;
        }
        if !force {
            return Err(InputError::OutputExists {
                path: path.display().to_string(),
            }
            .into());
        }
        debug!("Removing existing {}", path.display());
        std::fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(())
}

/// Write `models` to the four stores next to `base`. Every model must use the alphabet of the
/// first one. Returns the number of models written.
pub fn press<I>(models: I, base: &Path) -> Result<usize>
where
    I: IntoIterator<Item = Profile>,
{
    let mut model_store = create_store(base, PressConsts::MODEL_EXT)?;
    let mut profile_store = create_store(base, PressConsts::PROFILE_EXT)?;
    let mut filter_store = create_store(base, PressConsts::FILTER_EXT)?;
    let mut index = create_store(base, PressConsts::INDEX_EXT)?;

    let mut alphabet: Option<Alphabet> = None;
    let mut count = 0_usize;
    for model in models {
        let expected = *alphabet.get_or_insert(model.alphabet);
        if model.alphabet != expected {
            return Err(ScoringError::AlphabetMismatch {
                name: model.name.clone(),
                expected,
                found: model.alphabet,
            }
            .into());
        }
        model.validate()?;

        let offsets = Offsets {
            model: model_store.position(),
            profile: profile_store.position(),
            filter: filter_store.position(),
        };
        write_model(&mut model_store, &model)?;
        write_json_line(
            &mut profile_store,
            &OptimizedProfile::from_profile(&model, PressConsts::DEFAULT_TARGET_LENGTH),
        )?;
        write_json_line(&mut filter_store, &FilterRecord::from_profile(&model))?;
        write_json_line(
            &mut index,
            &IndexRecord::Key {
                name: model.name.clone(),
                offsets,
            },
        )?;
        if let Some(acc) = &model.accession {
            write_json_line(
                &mut index,
                &IndexRecord::Alias {
                    alias: acc.clone(),
                    name: model.name.clone(),
                },
            )?;
        }
        count += 1;
    }

    for store in [&mut model_store, &mut profile_store, &mut filter_store, &mut index] {
        store.flush()?;
    }
    info!("Pressed {} models into {}.*", count, base.display());
    Ok(count)
}

/// Read the index written by [`press`] for `base`.
pub fn read_press_index(base: &Path) -> Result<Vec<IndexRecord>> {
    let path = PressConsts::output_path(base, PressConsts::INDEX_EXT);
    let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
    BufReader::new(file)
        .lines()
        .enumerate()
        .map(|(i, line)| -> Result<IndexRecord> {
            let line = line?;
            serde_json::from_str(&line)
                .with_context(|| format!("parse {} line {}", path.display(), i + 1))
        })
        .collect()
}

/// Fetch one pressed model by name or accession, seeking straight to its model-store record.
pub fn fetch_pressed_model(base: &Path, key: &str) -> Result<Option<Profile>> {
    let index = read_press_index(base)?;
    let name = index
        .iter()
        .find_map(|r| match r {
            IndexRecord::Alias { alias, name } if alias == key => Some(name.as_str()),
            _ => None,
        })
        .unwrap_or(key);
    let Some(offsets) = index.iter().find_map(|r| match r {
        IndexRecord::Key { name: n, offsets } if n == name => Some(*offsets),
        _ => None,
    }) else {
        return Ok(None);
    };

    let path = PressConsts::output_path(base, PressConsts::MODEL_EXT);
    let mut file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
    file.seek(SeekFrom::Start(offsets.model))?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;
    let model = serde_json::from_str(&line)
        .with_context(|| format!("parse model '{}' at offset {}", name, offsets.model))?;
    Ok(Some(model))
}
