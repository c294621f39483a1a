//! Four-character chunk codes and the table of well-known ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 4-byte chunk code, stored big-endian so that `RIFF` reads left to right.
///
/// Codes compare as plain `u32`s. A code is valid when every byte is
/// printable ASCII (`0x20..=0x7E`) or when it is the all-zero [`FourCC::NULL`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub u32);

impl FourCC {
    /// Outermost group code.
    pub const RIFF: FourCC = FourCC::from_bytes(*b"RIFF");
    /// Nested group code.
    pub const LIST: FourCC = FourCC::from_bytes(*b"LIST");
    /// All-zero sentinel.
    pub const NULL: FourCC = FourCC(0);
    /// All-space filler.
    pub const BLANK: FourCC = FourCC::from_bytes(*b"    ");
    /// Padding chunk.
    pub const JUNK: FourCC = FourCC::from_bytes(*b"JUNK");

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn is_valid(self) -> bool {
        self == Self::NULL || self.to_bytes().iter().all(|b| (0x20..=0x7E).contains(b))
    }

    /// `RIFF` or `LIST`.
    pub fn is_group(self) -> bool {
        self == Self::RIFF || self == Self::LIST
    }

    /// Reserved no-op ids that may be skipped wherever they appear.
    pub fn is_filler(self) -> bool {
        self == Self::NULL || self == Self::BLANK || self == Self::JUNK
    }

    /// Whether this code may serve as the sub-type of a group.
    pub fn is_group_type(self) -> bool {
        self != Self::NULL && self.is_valid() && !self.is_group()
    }

    /// Whether this code may identify a local chunk inside a group.
    pub fn is_local_id(self) -> bool {
        self.is_valid() && !self.is_group()
    }

    /// Human-readable name, or `"Unsupported"` for unregistered codes.
    pub fn name(self) -> &'static str {
        KnownId::from_fourcc(self).name()
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            if (0x20..=0x7E).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02X}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{}\")", self)
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        Self::from_bytes(bytes)
    }
}

/// Error returned when a string is not exactly four ASCII characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFourCCError(pub String);

impl fmt::Display for ParseFourCCError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a four-character ASCII code", self.0)
    }
}

impl std::error::Error for ParseFourCCError {}

impl FromStr for FourCC {
    type Err = ParseFourCCError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ParseFourCCError(s.to_string()))?;
        if !bytes.is_ascii() {
            return Err(ParseFourCCError(s.to_string()));
        }
        Ok(Self::from_bytes(bytes))
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FourCC {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Chunk ids with a registered human-readable name.
///
/// Several formats reuse the same code (`smpl` is the sampler chunk in WAV
/// and the sample pool in SoundFont 2), so names describe the code rather
/// than one format's reading of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnownId {
    Riff,
    List,
    Junk,
    Pad,
    // WAV
    Wave,
    Format,
    Data,
    Fact,
    Cue,
    Sampler,
    Instrument,
    Broadcast,
    Acid,
    // INFO list
    Info,
    Name,
    Artist,
    Comment,
    Copyright,
    CreationDate,
    Software,
    Engineer,
    Product,
    // SoundFont 2
    SoundFont,
    SfVersion,
    SoundEngine,
    SampleData,
    PresetData,
    PresetHeaders,
    PresetBags,
    PresetModulators,
    PresetGenerators,
    InstrumentBags,
    InstrumentModulators,
    InstrumentGenerators,
    SampleHeaders,
    // DLS
    Dls,
    Collection,
    /// Any code not in the table.
    Unsupported,
}

/// Code-to-id table backing [`KnownId::from_fourcc`].
const KNOWN_IDS: &[([u8; 4], KnownId)] = &[
    (*b"RIFF", KnownId::Riff),
    (*b"LIST", KnownId::List),
    (*b"JUNK", KnownId::Junk),
    (*b"PAD ", KnownId::Pad),
    (*b"WAVE", KnownId::Wave),
    (*b"fmt ", KnownId::Format),
    (*b"data", KnownId::Data),
    (*b"fact", KnownId::Fact),
    (*b"cue ", KnownId::Cue),
    (*b"smpl", KnownId::Sampler),
    (*b"inst", KnownId::Instrument),
    (*b"bext", KnownId::Broadcast),
    (*b"acid", KnownId::Acid),
    (*b"INFO", KnownId::Info),
    (*b"INAM", KnownId::Name),
    (*b"IART", KnownId::Artist),
    (*b"ICMT", KnownId::Comment),
    (*b"ICOP", KnownId::Copyright),
    (*b"ICRD", KnownId::CreationDate),
    (*b"ISFT", KnownId::Software),
    (*b"IENG", KnownId::Engineer),
    (*b"IPRD", KnownId::Product),
    (*b"sfbk", KnownId::SoundFont),
    (*b"ifil", KnownId::SfVersion),
    (*b"isng", KnownId::SoundEngine),
    (*b"sdta", KnownId::SampleData),
    (*b"pdta", KnownId::PresetData),
    (*b"phdr", KnownId::PresetHeaders),
    (*b"pbag", KnownId::PresetBags),
    (*b"pmod", KnownId::PresetModulators),
    (*b"pgen", KnownId::PresetGenerators),
    (*b"ibag", KnownId::InstrumentBags),
    (*b"imod", KnownId::InstrumentModulators),
    (*b"igen", KnownId::InstrumentGenerators),
    (*b"shdr", KnownId::SampleHeaders),
    (*b"DLS ", KnownId::Dls),
    (*b"colh", KnownId::Collection),
];

impl KnownId {
    pub fn from_fourcc(id: FourCC) -> Self {
        KNOWN_IDS
            .iter()
            .find(|(code, _)| FourCC::from_bytes(*code) == id)
            .map(|(_, known)| *known)
            .unwrap_or(KnownId::Unsupported)
    }

    /// The code for this id, or `None` for [`KnownId::Unsupported`].
    pub fn fourcc(self) -> Option<FourCC> {
        KNOWN_IDS
            .iter()
            .find(|(_, known)| *known == self)
            .map(|(code, _)| FourCC::from_bytes(*code))
    }

    pub fn name(self) -> &'static str {
        match self {
            KnownId::Riff => "RIFF container",
            KnownId::List => "List",
            KnownId::Junk => "Junk",
            KnownId::Pad => "Padding",
            KnownId::Wave => "WAVE form",
            KnownId::Format => "Format",
            KnownId::Data => "Data",
            KnownId::Fact => "Fact",
            KnownId::Cue => "Cue points",
            KnownId::Sampler => "Sampler",
            KnownId::Instrument => "Instrument",
            KnownId::Broadcast => "Broadcast extension",
            KnownId::Acid => "ACID loop",
            KnownId::Info => "Info list",
            KnownId::Name => "Name",
            KnownId::Artist => "Artist",
            KnownId::Comment => "Comment",
            KnownId::Copyright => "Copyright",
            KnownId::CreationDate => "Creation date",
            KnownId::Software => "Software",
            KnownId::Engineer => "Engineer",
            KnownId::Product => "Product",
            KnownId::SoundFont => "SoundFont bank",
            KnownId::SfVersion => "SoundFont version",
            KnownId::SoundEngine => "Sound engine",
            KnownId::SampleData => "Sample data list",
            KnownId::PresetData => "Preset data list",
            KnownId::PresetHeaders => "Preset headers",
            KnownId::PresetBags => "Preset bags",
            KnownId::PresetModulators => "Preset modulators",
            KnownId::PresetGenerators => "Preset generators",
            KnownId::InstrumentBags => "Instrument bags",
            KnownId::InstrumentModulators => "Instrument modulators",
            KnownId::InstrumentGenerators => "Instrument generators",
            KnownId::SampleHeaders => "Sample headers",
            KnownId::Dls => "DLS collection",
            KnownId::Collection => "Collection header",
            KnownId::Unsupported => "Unsupported",
        }
    }
}
