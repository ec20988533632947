//! Correlation mode descriptors.
//!
//! A [`Mode`] is a stateless descriptor: which annotation dimension
//! produces the database key, which produces the value, plus the key
//! separator and value-suffix marker that keep the ten key spaces
//! apart in one flat file. All mutable state lives in the analyze /
//! augment passes.

use crate::errors::EngineError;

/// What produces the database key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDim {
    /// Strong's tokens; keys use the `*` separator.
    Strongs,
    /// Parsed source indices (falling back to the per-verse counter);
    /// keys use the `@` separator.
    Index,
    /// Index tokens read from the raw `src` attribute; same key space
    /// as [`SourceDim::Index`].
    AttrIndex,
}

/// What produces the database value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDim {
    Morph,
    Strongs,
    Index,
    /// Ordered, comma-joined index list (the one list-valued shape).
    IndexList,
    Attributes,
}

/// One of the ten fixed correlation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Strongs2Morph,
    Index2Morph,
    Strongs2Index,
    StrongsList2Index,
    Index2Strongs,
    Strongs2Attr,
    Index2Attr,
    AttrIndex2Morph,
    AttrIndex2Strongs,
    AttrIndex2Attr,
}

impl Mode {
    pub const ALL: [Mode; 10] = [
        Mode::Strongs2Morph,
        Mode::Index2Morph,
        Mode::Strongs2Index,
        Mode::StrongsList2Index,
        Mode::Index2Strongs,
        Mode::Strongs2Attr,
        Mode::Index2Attr,
        Mode::AttrIndex2Morph,
        Mode::AttrIndex2Strongs,
        Mode::AttrIndex2Attr,
    ];

    /// The two/three letter command-line code.
    pub fn code(self) -> &'static str {
        match self {
            Mode::Strongs2Morph => "S",
            Mode::Index2Morph => "I",
            Mode::Strongs2Index => "SI",
            Mode::StrongsList2Index => "SLI",
            Mode::Index2Strongs => "IS",
            Mode::Strongs2Attr => "SA",
            Mode::Index2Attr => "IA",
            Mode::AttrIndex2Morph => "AI",
            Mode::AttrIndex2Strongs => "AIS",
            Mode::AttrIndex2Attr => "AIA",
        }
    }

    /// Resolve a command-line code. Unknown codes are a fatal
    /// configuration error.
    pub fn from_code(code: &str) -> Result<Mode, EngineError> {
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.code() == code)
            .ok_or_else(|| EngineError::config(format!("unknown mode: {}", code)))
    }

    pub fn source(self) -> SourceDim {
        match self {
            Mode::Strongs2Morph | Mode::Strongs2Index | Mode::StrongsList2Index
            | Mode::Strongs2Attr => SourceDim::Strongs,
            Mode::Index2Morph | Mode::Index2Strongs | Mode::Index2Attr => SourceDim::Index,
            Mode::AttrIndex2Morph | Mode::AttrIndex2Strongs | Mode::AttrIndex2Attr => {
                SourceDim::AttrIndex
            }
        }
    }

    pub fn target(self) -> TargetDim {
        match self {
            Mode::Strongs2Morph | Mode::Index2Morph | Mode::AttrIndex2Morph => TargetDim::Morph,
            Mode::Index2Strongs | Mode::AttrIndex2Strongs => TargetDim::Strongs,
            Mode::Strongs2Index => TargetDim::Index,
            Mode::StrongsList2Index => TargetDim::IndexList,
            Mode::Strongs2Attr | Mode::Index2Attr | Mode::AttrIndex2Attr => TargetDim::Attributes,
        }
    }

    /// Key separator: `*` for Strong's-keyed modes, `@` otherwise.
    pub fn separator(self) -> char {
        match self.source() {
            SourceDim::Strongs => '*',
            SourceDim::Index | SourceDim::AttrIndex => '@',
        }
    }

    /// Value-suffix marker appended to the key.
    pub fn suffix(self) -> &'static str {
        match self.target() {
            TargetDim::Morph => "",
            TargetDim::Strongs | TargetDim::Index => "@",
            TargetDim::IndexList => "@L",
            TargetDim::Attributes => "+",
        }
    }
}

/// Parse a comma-separated mode code list (e.g. `S,SI,SLI`).
pub fn parse_modes(codes: &str) -> Result<Vec<Mode>, EngineError> {
    codes.split(',').map(Mode::from_code).collect()
}

/// The default mode set: Strong's → morphology.
pub fn default_modes() -> Vec<Mode> {
    vec![Mode::Strongs2Morph]
}
