//! The typed project manifest.
//!
//! A [`Manifest`] holds the platform-agnostic part of a project (disk name,
//! code files, charmaps, shared files) and one [`PlatformAssets`] set per
//! [`Platform`]. Scalar options that only make sense on one machine live in
//! [`AtariOptions`] and [`OricOptions`].
//!
//! Every field starts at a documented default on [`Manifest::new`]. The
//! manifest is only changed through its explicit editing operations (see
//! [`crate::slots`] for the list operations); the codec and the plan
//! compilers only ever read it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ManifestError, ManifestResult};

/// Disk name given to a freshly created project.
pub const DEFAULT_DISK_NAME: &str = "diskname";

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// A target machine. The declaration order is the canonical platform order
/// used wherever per-platform fields are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Apple,
    Atari,
    C64,
    /// The Atari Lynx handheld.
    Lynx,
    Oric,
}

impl Platform {
    /// All platforms in canonical order.
    pub const ALL: [Platform; 5] = [
        Platform::Apple,
        Platform::Atari,
        Platform::C64,
        Platform::Lynx,
        Platform::Oric,
    ];

    /// Lowercase key used in file names, build directories and slot keys.
    pub fn key(self) -> &'static str {
        match self {
            Platform::Apple => "apple",
            Platform::Atari => "atari",
            Platform::C64 => "c64",
            Platform::Lynx => "lynx",
            Platform::Oric => "oric",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Apple => "Apple",
            Platform::Atari => "Atari",
            Platform::C64 => "C64",
            Platform::Lynx => "Lynx",
            Platform::Oric => "Oric",
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = ManifestError;

    fn from_str(s: &str) -> ManifestResult<Self> {
        Platform::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| ManifestError::UnknownOption {
                option: "platform",
                value: s.to_owned(),
                expected: join_labels(Platform::ALL.iter().map(|p| p.key())),
            })
    }
}

// ---------------------------------------------------------------------------
// AssetPath
// ---------------------------------------------------------------------------

/// A project-root relative asset path, always stored with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetPath(String);

impl AssetPath {
    /// Wrap a relative path, converting any `\` separators to `/`.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The lowercased file name with every occurrence of `suffix` removed.
    ///
    /// This is the stem converted resources are named after, e.g.
    /// `gfx/Title-apple.png` with suffix `-apple.png` gives `title`. A file
    /// that does not carry the suffix keeps its full lowercased name.
    pub fn file_base(&self, suffix: &str) -> String {
        let name = self.file_name().to_lowercase();
        if suffix.is_empty() {
            name
        } else {
            name.replace(suffix, "")
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

// ---------------------------------------------------------------------------
// Platform asset set
// ---------------------------------------------------------------------------

/// Sprite sheet geometry: how many frames the sheet holds and the size of one
/// frame in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteParams {
    pub frames: u32,
    pub width: u32,
    pub height: u32,
}

impl SpriteParams {
    pub fn new(frames: u32, width: u32, height: u32) -> Self {
        Self {
            frames,
            width,
            height,
        }
    }

    /// Returns `true` when every dimension is non-zero.
    pub fn is_complete(&self) -> bool {
        self.frames > 0 && self.width > 0 && self.height > 0
    }
}

impl Default for SpriteParams {
    /// One 8x8 frame.
    fn default() -> Self {
        Self::new(1, 8, 8)
    }
}

/// The assets selected for one target platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformAssets {
    pub(crate) bitmaps: Vec<AssetPath>,
    pub(crate) charset: Option<AssetPath>,
    pub(crate) sprites: Option<AssetPath>,
    pub(crate) sprite_params: SpriteParams,
    pub(crate) chunks: Option<AssetPath>,
    pub(crate) music: Vec<AssetPath>,
}

impl PlatformAssets {
    pub fn bitmaps(&self) -> &[AssetPath] {
        &self.bitmaps
    }

    pub fn charset(&self) -> Option<&AssetPath> {
        self.charset.as_ref()
    }

    pub fn sprites(&self) -> Option<&AssetPath> {
        self.sprites.as_ref()
    }

    pub fn sprite_params(&self) -> SpriteParams {
        self.sprite_params
    }

    /// The chunk-definition file, if any.
    pub fn chunks(&self) -> Option<&AssetPath> {
        self.chunks.as_ref()
    }

    pub fn music(&self) -> &[AssetPath] {
        &self.music
    }

    /// Returns `true` when no asset of any category is selected.
    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
            && self.charset.is_none()
            && self.sprites.is_none()
            && self.chunks.is_none()
            && self.music.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Platform options
// ---------------------------------------------------------------------------

/// Atari disk capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskSize {
    #[default]
    #[serde(rename = "180KB")]
    Kb180,
    #[serde(rename = "360KB")]
    Kb360,
}

impl DiskSize {
    pub const ALL: [DiskSize; 2] = [DiskSize::Kb180, DiskSize::Kb360];

    pub fn label(self) -> &'static str {
        match self {
            DiskSize::Kb180 => "180KB",
            DiskSize::Kb360 => "360KB",
        }
    }

    /// Number of 256-byte sectors on the ATR image.
    pub fn sectors(self) -> u32 {
        match self {
            DiskSize::Kb180 => 720,
            DiskSize::Kb360 => 1440,
        }
    }
}

impl FromStr for DiskSize {
    type Err = ManifestError;

    fn from_str(s: &str) -> ManifestResult<Self> {
        DiskSize::ALL
            .into_iter()
            .find(|d| d.label() == s)
            .ok_or_else(|| ManifestError::UnknownOption {
                option: "Atari disk size",
                value: s.to_owned(),
                expected: join_labels(DiskSize::ALL.iter().map(|d| d.label())),
            })
    }
}

/// Oric bitmap conversion mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageQuality {
    /// Dithered hires conversion through the Lua converter.
    #[serde(rename = "Hires(Noisy)")]
    Noisy,
    #[default]
    #[serde(rename = "Hires(Clean)")]
    Clean,
}

impl ImageQuality {
    pub const ALL: [ImageQuality; 2] = [ImageQuality::Noisy, ImageQuality::Clean];

    pub fn label(self) -> &'static str {
        match self {
            ImageQuality::Noisy => "Hires(Noisy)",
            ImageQuality::Clean => "Hires(Clean)",
        }
    }
}

impl FromStr for ImageQuality {
    type Err = ManifestError;

    fn from_str(s: &str) -> ManifestResult<Self> {
        ImageQuality::ALL
            .into_iter()
            .find(|q| q.label() == s)
            .ok_or_else(|| ManifestError::UnknownOption {
                option: "Oric image quality",
                value: s.to_owned(),
                expected: join_labels(ImageQuality::ALL.iter().map(|q| q.label())),
            })
    }
}

/// Options that only apply to the Atari build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtariOptions {
    /// Drop the character generator region from the memory map.
    pub no_text: bool,
    pub disk_size: DiskSize,
}

/// Options that only apply to the Oric build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OricOptions {
    /// Dithering level handed to the bitmap and charset converters.
    pub dithering: f32,
    pub quality: ImageQuality,
}

impl Default for OricOptions {
    fn default() -> Self {
        Self {
            dithering: 0.5,
            quality: ImageQuality::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// The complete description of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub(crate) disk_name: String,
    pub(crate) code_files: Vec<AssetPath>,
    pub(crate) charmap_files: Vec<AssetPath>,
    pub(crate) shared_files: Vec<AssetPath>,
    pub(crate) apple: PlatformAssets,
    pub(crate) atari: PlatformAssets,
    pub(crate) c64: PlatformAssets,
    pub(crate) lynx: PlatformAssets,
    pub(crate) oric: PlatformAssets,
    pub(crate) atari_options: AtariOptions,
    pub(crate) oric_options: OricOptions,
}

impl Manifest {
    /// Create an empty project: no files, every option at its default.
    pub fn new() -> Self {
        Self {
            disk_name: DEFAULT_DISK_NAME.to_owned(),
            code_files: Vec::new(),
            charmap_files: Vec::new(),
            shared_files: Vec::new(),
            apple: PlatformAssets::default(),
            atari: PlatformAssets::default(),
            c64: PlatformAssets::default(),
            lynx: PlatformAssets::default(),
            oric: PlatformAssets::default(),
            atari_options: AtariOptions::default(),
            oric_options: OricOptions::default(),
        }
    }

    pub fn disk_name(&self) -> &str {
        &self.disk_name
    }

    pub fn code_files(&self) -> &[AssetPath] {
        &self.code_files
    }

    pub fn charmap_files(&self) -> &[AssetPath] {
        &self.charmap_files
    }

    pub fn shared_files(&self) -> &[AssetPath] {
        &self.shared_files
    }

    /// The asset set of one platform.
    pub fn assets(&self, platform: Platform) -> &PlatformAssets {
        match platform {
            Platform::Apple => &self.apple,
            Platform::Atari => &self.atari,
            Platform::C64 => &self.c64,
            Platform::Lynx => &self.lynx,
            Platform::Oric => &self.oric,
        }
    }

    pub(crate) fn assets_mut(&mut self, platform: Platform) -> &mut PlatformAssets {
        match platform {
            Platform::Apple => &mut self.apple,
            Platform::Atari => &mut self.atari,
            Platform::C64 => &mut self.c64,
            Platform::Lynx => &mut self.lynx,
            Platform::Oric => &mut self.oric,
        }
    }

    pub fn atari_options(&self) -> AtariOptions {
        self.atari_options
    }

    pub fn oric_options(&self) -> OricOptions {
        self.oric_options
    }

    // -- scalar edits -------------------------------------------------------

    pub fn set_disk_name(&mut self, name: impl Into<String>) {
        self.disk_name = name.into();
    }

    pub fn set_sprite_params(&mut self, platform: Platform, params: SpriteParams) {
        self.assets_mut(platform).sprite_params = params;
    }

    pub fn set_atari_no_text(&mut self, no_text: bool) {
        self.atari_options.no_text = no_text;
    }

    pub fn set_atari_disk_size(&mut self, size: DiskSize) {
        self.atari_options.disk_size = size;
    }

    pub fn set_oric_dithering(&mut self, dithering: f32) {
        self.oric_options.dithering = dithering;
    }

    pub fn set_oric_quality(&mut self, quality: ImageQuality) {
        self.oric_options.quality = quality;
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
