//! List editing operations on the manifest.
//!
//! Every editable list of a project is addressed by an [`AssetSlot`]. Slots
//! are either ordered (code files, bitmaps, music, ...) or single-select
//! (charset, sprite sheet, chunk definition). Adding to a single-select slot
//! replaces whatever was there.
//!
//! Paths enter the manifest through [`Manifest::pick_into`], which asks an
//! [`AssetPicker`] collaborator for a file and normalizes the answer against
//! the [`ProjectRoot`] at that moment. Stored paths are never re-derived
//! later.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::project::{AssetPath, Manifest, Platform};
use crate::{ManifestError, ManifestResult};

// ---------------------------------------------------------------------------
// AssetSlot
// ---------------------------------------------------------------------------

/// One editable list of the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSlot {
    Code,
    Charmap,
    Shared,
    Bitmap(Platform),
    Charset(Platform),
    Sprites(Platform),
    Chunks(Platform),
    Music(Platform),
}

impl AssetSlot {
    /// Returns `true` for slots that hold at most one path.
    pub fn is_single(self) -> bool {
        matches!(
            self,
            AssetSlot::Charset(_) | AssetSlot::Sprites(_) | AssetSlot::Chunks(_)
        )
    }

    /// The platform this slot belongs to, if it is platform specific.
    pub fn platform(self) -> Option<Platform> {
        match self {
            AssetSlot::Code | AssetSlot::Charmap | AssetSlot::Shared => None,
            AssetSlot::Bitmap(p)
            | AssetSlot::Charset(p)
            | AssetSlot::Sprites(p)
            | AssetSlot::Chunks(p)
            | AssetSlot::Music(p) => Some(p),
        }
    }

    /// Dialog title shown when picking a file for this slot.
    pub fn title(self) -> &'static str {
        match self {
            AssetSlot::Code => "Select Code File",
            AssetSlot::Charmap => "Select Character Map",
            AssetSlot::Shared => "Select Asset File",
            AssetSlot::Bitmap(_) => "Select Bitmap",
            AssetSlot::Charset(_) => "Select Character Set",
            AssetSlot::Sprites(_) => "Select Sprite Sheet",
            AssetSlot::Chunks(_) => "Select Chunks Definition",
            AssetSlot::Music(_) => "Select Music Track",
        }
    }

    /// File filter handed to the picker.
    pub fn filter(self) -> AssetFilter {
        let (description, pattern) = match self {
            AssetSlot::Code => ("C files", "*.c"),
            AssetSlot::Charmap => ("Character maps", "*.map"),
            AssetSlot::Shared => ("All files", "*.*"),
            AssetSlot::Bitmap(_) | AssetSlot::Charset(_) | AssetSlot::Sprites(_) => {
                ("PNG files", "*.png")
            }
            AssetSlot::Chunks(_) => ("Text files", "*.txt"),
            AssetSlot::Music(Platform::Apple) => ("DUET M files", "*.m"),
            AssetSlot::Music(Platform::Atari) => ("RMT files", "*.rmt"),
            AssetSlot::Music(Platform::C64) => ("SID files", "*.sid"),
            AssetSlot::Music(Platform::Lynx) => ("Chipper files", "*.asm"),
            AssetSlot::Music(Platform::Oric) => ("YM files", "*.ym"),
        };
        AssetFilter {
            title: self.title(),
            description,
            pattern,
        }
    }

    fn kind(self) -> &'static str {
        match self {
            AssetSlot::Code => "code",
            AssetSlot::Charmap => "charmap",
            AssetSlot::Shared => "shared",
            AssetSlot::Bitmap(_) => "bitmap",
            AssetSlot::Charset(_) => "charset",
            AssetSlot::Sprites(_) => "sprites",
            AssetSlot::Chunks(_) => "chunks",
            AssetSlot::Music(_) => "music",
        }
    }
}

impl fmt::Display for AssetSlot {
    /// `code`, `charmap`, `shared`, or `<platform>.<kind>` such as
    /// `apple.bitmap`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.platform() {
            Some(p) => write!(f, "{}.{}", p.key(), self.kind()),
            None => f.write_str(self.kind()),
        }
    }
}

impl FromStr for AssetSlot {
    type Err = ManifestError;

    fn from_str(s: &str) -> ManifestResult<Self> {
        let unknown = || ManifestError::UnknownSlot { key: s.to_owned() };
        let slot = match s.split_once('.') {
            None => match s {
                "code" => AssetSlot::Code,
                "charmap" => AssetSlot::Charmap,
                "shared" => AssetSlot::Shared,
                _ => return Err(unknown()),
            },
            Some((platform, kind)) => {
                let platform: Platform = platform.parse().map_err(|_| unknown())?;
                match kind {
                    "bitmap" => AssetSlot::Bitmap(platform),
                    "charset" => AssetSlot::Charset(platform),
                    "sprites" => AssetSlot::Sprites(platform),
                    "chunks" => AssetSlot::Chunks(platform),
                    "music" => AssetSlot::Music(platform),
                    _ => return Err(unknown()),
                }
            }
        };
        Ok(slot)
    }
}

// ---------------------------------------------------------------------------
// Picker collaborator
// ---------------------------------------------------------------------------

/// Description of the files a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetFilter {
    pub title: &'static str,
    pub description: &'static str,
    /// Glob pattern, e.g. `*.png`.
    pub pattern: &'static str,
}

/// Something that can produce a file path on request, such as a file dialog
/// or a command-line argument. Returning `None` means the user cancelled.
pub trait AssetPicker {
    fn pick(&mut self, filter: &AssetFilter) -> Option<PathBuf>;
}

impl<F> AssetPicker for F
where
    F: FnMut(&AssetFilter) -> Option<PathBuf>,
{
    fn pick(&mut self, filter: &AssetFilter) -> Option<PathBuf> {
        self(filter)
    }
}

/// The directory every stored asset path is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot(PathBuf);

impl ProjectRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Strip the root prefix from a picked path. Paths outside the root are
    /// kept as given.
    pub fn relativize(&self, picked: &Path) -> AssetPath {
        let relative = picked.strip_prefix(&self.0).unwrap_or(picked);
        AssetPath::new(relative.to_string_lossy().into_owned())
    }
}

// ---------------------------------------------------------------------------
// Manifest list operations
// ---------------------------------------------------------------------------

impl Manifest {
    /// The paths currently held by a slot, in order. Single-select slots
    /// yield zero or one path.
    pub fn paths(&self, slot: AssetSlot) -> &[AssetPath] {
        match slot {
            AssetSlot::Code => &self.code_files,
            AssetSlot::Charmap => &self.charmap_files,
            AssetSlot::Shared => &self.shared_files,
            AssetSlot::Bitmap(p) => &self.assets(p).bitmaps,
            AssetSlot::Music(p) => &self.assets(p).music,
            AssetSlot::Charset(p) => single(&self.assets(p).charset),
            AssetSlot::Sprites(p) => single(&self.assets(p).sprites),
            AssetSlot::Chunks(p) => single(&self.assets(p).chunks),
        }
    }

    /// Append a path to an ordered slot, or replace the content of a
    /// single-select slot.
    pub fn add(&mut self, slot: AssetSlot, path: AssetPath) {
        match self.list_mut(slot) {
            SlotMut::Many(list) => list.push(path),
            SlotMut::One(current) => *current = Some(path),
        }
    }

    /// Remove the path at `index`, returning it. Out-of-range indices leave
    /// the slot untouched.
    pub fn remove(&mut self, slot: AssetSlot, index: usize) -> Option<AssetPath> {
        match self.list_mut(slot) {
            SlotMut::Many(list) => (index < list.len()).then(|| list.remove(index)),
            SlotMut::One(current) => {
                if index == 0 {
                    current.take()
                } else {
                    None
                }
            }
        }
    }

    /// Ask `picker` for a file matching the slot's filter and add it,
    /// relative to `root`. Returns the stored path, or `None` if the picker
    /// was cancelled.
    pub fn pick_into(
        &mut self,
        slot: AssetSlot,
        picker: &mut impl AssetPicker,
        root: &ProjectRoot,
    ) -> Option<AssetPath> {
        let picked = picker.pick(&slot.filter())?;
        let path = root.relativize(&picked);
        tracing::debug!(slot = %slot, path = %path, "asset selected");
        self.add(slot, path.clone());
        Some(path)
    }

    /// Replace the whole content of a slot. Used by the codec, which has
    /// already checked single-select lengths.
    pub(crate) fn replace(&mut self, slot: AssetSlot, mut paths: Vec<AssetPath>) {
        match self.list_mut(slot) {
            SlotMut::Many(list) => *list = paths,
            SlotMut::One(current) => *current = paths.pop(),
        }
    }

    fn list_mut(&mut self, slot: AssetSlot) -> SlotMut<'_> {
        match slot {
            AssetSlot::Code => SlotMut::Many(&mut self.code_files),
            AssetSlot::Charmap => SlotMut::Many(&mut self.charmap_files),
            AssetSlot::Shared => SlotMut::Many(&mut self.shared_files),
            AssetSlot::Bitmap(p) => SlotMut::Many(&mut self.assets_mut(p).bitmaps),
            AssetSlot::Music(p) => SlotMut::Many(&mut self.assets_mut(p).music),
            AssetSlot::Charset(p) => SlotMut::One(&mut self.assets_mut(p).charset),
            AssetSlot::Sprites(p) => SlotMut::One(&mut self.assets_mut(p).sprites),
            AssetSlot::Chunks(p) => SlotMut::One(&mut self.assets_mut(p).chunks),
        }
    }
}

enum SlotMut<'a> {
    Many(&'a mut Vec<AssetPath>),
    One(&'a mut Option<AssetPath>),
}

fn single(path: &Option<AssetPath>) -> &[AssetPath] {
    match path {
        Some(p) => std::slice::from_ref(p),
        None => &[],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
