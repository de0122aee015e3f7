//! Biological alphabets: symbol sets, digitization and guessing from raw residues.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::InputError;

/// Residue alphabet of a sequence or profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alphabet {
    Amino,
    Dna,
    Rna,
}

impl Alphabet {
    const AMINO: &'static [u8] = b"ACDEFGHIKLMNPQRSTVWY";
    const DNA: &'static [u8] = b"ACGT";
    const RNA: &'static [u8] = b"ACGU";

    /// Canonical symbols, in digital code order.
    pub fn symbols(&self) -> &'static [u8] {
        match self {
            Alphabet::Amino => Self::AMINO,
            Alphabet::Dna => Self::DNA,
            Alphabet::Rna => Self::RNA,
        }
    }

    /// Number of canonical symbols (one profile score column each).
    pub fn size(&self) -> usize {
        self.symbols().len()
    }

    /// Fully degenerate symbol ("any residue"). Digitized to code `size()`.
    pub fn any_symbol(&self) -> u8 {
        match self {
            Alphabet::Amino => b'X',
            Alphabet::Dna | Alphabet::Rna => b'N',
        }
    }

    /// Digital code of one residue (case-insensitive), or None if not in this alphabet.
    pub fn encode(&self, residue: u8) -> Option<u8> {
        let upper = residue.to_ascii_uppercase();
        if upper == self.any_symbol() {
            return Some(self.size() as u8);
        }
        self.symbols()
            .iter()
            .position(|&s| s == upper)
            .map(|p| p as u8)
    }

    /// Symbol for a digital code; the degenerate symbol for anything past the canonical set.
    pub fn decode(&self, code: u8) -> u8 {
        self.symbols()
            .get(code as usize)
            .copied()
            .unwrap_or_else(|| self.any_symbol())
    }

    /// Digitize `residues` of the sequence `name`.
    pub fn digitize(&self, name: &str, residues: &[u8]) -> Result<Vec<u8>, InputError> {
        residues
            .iter()
            .enumerate()
            .map(|(position, &r)| {
                self.encode(r).ok_or_else(|| InputError::InvalidResidue {
                    name: name.to_string(),
                    residue: r as char,
                    position,
                    alphabet: *self,
                })
            })
            .collect()
    }

    /// Guess the alphabet of a set of residue strings. Nucleotide alphabets win when every
    /// residue fits; None when there are no residues or some residue fits no alphabet.
    pub fn guess<'a, I>(sequences: I) -> Option<Alphabet>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut seen = [false; 256];
        let mut any = false;
        for seq in sequences {
            for &r in seq {
                seen[r.to_ascii_uppercase() as usize] = true;
                any = true;
            }
        }
        if !any {
            return None;
        }
        [Alphabet::Dna, Alphabet::Rna, Alphabet::Amino]
            .into_iter()
            .find(|alphabet| {
                seen.iter()
                    .enumerate()
                    .filter(|(_, s)| **s)
                    .all(|(c, _)| alphabet.encode(c as u8).is_some())
            })
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alphabet::Amino => "amino",
            Alphabet::Dna => "dna",
            Alphabet::Rna => "rna",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_case_insensitive() {
        assert_eq!(Alphabet::Dna.encode(b'g'), Some(2));
        assert_eq!(Alphabet::Dna.encode(b'G'), Some(2));
    }

    #[test]
    fn test_any_symbol_encodes_past_canonical() {
        assert_eq!(Alphabet::Amino.encode(b'X'), Some(20));
        assert_eq!(Alphabet::Rna.encode(b'n'), Some(4));
        assert_eq!(Alphabet::Dna.decode(4), b'N');
    }

    #[test]
    fn test_digitize_rejects_foreign_residue() {
        let err = Alphabet::Dna.digitize("s1", b"ACGU").unwrap_err();
        match err {
            InputError::InvalidResidue {
                residue, position, ..
            } => {
                assert_eq!(residue, 'U');
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_guess_prefers_nucleotides() {
        let seqs: Vec<&[u8]> = vec![b"ACGTTGCA", b"acgn"];
        assert_eq!(Alphabet::guess(seqs), Some(Alphabet::Dna));
        let seqs: Vec<&[u8]> = vec![b"ACGUU"];
        assert_eq!(Alphabet::guess(seqs), Some(Alphabet::Rna));
    }

    #[test]
    fn test_guess_amino() {
        let seqs: Vec<&[u8]> = vec![b"MKVLAAGIW", b"ACGT"];
        assert_eq!(Alphabet::guess(seqs), Some(Alphabet::Amino));
    }

    #[test]
    fn test_guess_none() {
        let empty: Vec<&[u8]> = vec![];
        assert_eq!(Alphabet::guess(empty), None);
        let seqs: Vec<&[u8]> = vec![b"ACG#"];
        assert_eq!(Alphabet::guess(seqs), None);
    }
}
