//! Text and digital sequences, and a FASTA reader.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::engine::alphabet::Alphabet;
use crate::errors::InputError;

/// A sequence as read from a file: raw residue bytes, whitespace stripped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextSequence {
    pub name: String,
    pub description: String,
    pub residues: Vec<u8>,
}

impl TextSequence {
    pub fn digitize(&self, alphabet: Alphabet) -> Result<DigitalSequence, InputError> {
        Ok(DigitalSequence {
            name: self.name.clone(),
            alphabet,
            data: alphabet.digitize(&self.name, &self.residues)?,
        })
    }
}

/// A sequence in digital codes of a known alphabet. Corpus records and sequence queries.
#[derive(Clone, Debug, PartialEq)]
pub struct DigitalSequence {
    pub name: String,
    pub alphabet: Alphabet,
    pub data: Vec<u8>,
}

impl DigitalSequence {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Parse multi-record FASTA. Header is `>name description`; residue lines may wrap; blank
/// lines are ignored.
pub fn parse_fasta<R: BufRead>(reader: R) -> Result<Vec<TextSequence>> {
    let mut records: Vec<TextSequence> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read FASTA line {}", i + 1))?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            let header = header.trim();
            let (name, description) = match header.split_once(char::is_whitespace) {
                Some((n, d)) => (n, d.trim()),
                None => (header, ""),
            };
            if name.is_empty() {
                return Err(InputError::MalformedFasta {
                    line: i + 1,
                    reason: "header without a sequence name".to_string(),
                }
                .into());
            }
            records.push(TextSequence {
                name: name.to_string(),
                description: description.to_string(),
                residues: Vec::new(),
            });
        } else {
            let Some(current) = records.last_mut() else {
                return Err(InputError::MalformedFasta {
                    line: i + 1,
                    reason: "residues before the first header".to_string(),
                }
                .into());
            };
            current
                .residues
                .extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
        }
    }
    Ok(records)
}

/// Read all records of a FASTA file.
pub fn read_fasta(path: &Path) -> Result<Vec<TextSequence>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    parse_fasta(BufReader::new(file)).with_context(|| format!("parse {}", path.display()))
}

/// Guess the alphabet of `records` from their residues.
pub fn guess_alphabet(records: &[TextSequence]) -> Option<Alphabet> {
    Alphabet::guess(records.iter().map(|r| r.residues.as_slice()))
}

/// Digitize every record in parallel, keeping input order.
pub fn digitize_all(records: &[TextSequence], alphabet: Alphabet) -> Result<Vec<DigitalSequence>> {
    let digital = records
        .par_iter()
        .map(|r| r.digitize(alphabet))
        .collect::<Result<Vec<_>, InputError>>()?;
    Ok(digital)
}

/// Read a FASTA file and digitize it, guessing the alphabet when `alphabet` is None.
pub fn load_corpus(path: &Path, alphabet: Option<Alphabet>) -> Result<Vec<DigitalSequence>> {
    let records = read_fasta(path)?;
    let alphabet = match alphabet.or_else(|| guess_alphabet(&records)) {
        Some(a) => a,
        None => {
            return Err(InputError::UndetectableAlphabet {
                path: path.display().to_string(),
            }
            .into());
        }
    };
    log::debug!(
        "Loaded {} {} sequences from {}",
        records.len(),
        alphabet,
        path.display()
    );
    digitize_all(&records, alphabet)
}
