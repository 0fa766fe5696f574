//! Unity Manifest -- the project description behind every disk build.
//!
//! A project lists the C sources, the shared assets and, for each of the five
//! target machines, the bitmaps, charset, sprite sheet, chunk definition and
//! music tracks that end up on that machine's disk or cartridge image.
//!
//! # Modules
//!
//! - [`project`]: the typed manifest ([`Manifest`], [`PlatformAssets`],
//!   platform options) and its defaults.
//! - [`slots`]: editing operations addressed by [`AssetSlot`], the
//!   [`AssetPicker`] collaborator and project-root path normalization.
//! - [`codec`]: the marker-scan record stream used to save and load projects
//!   across schema revisions.
//!
//! # Example
//!
//! ```
//! use unity_manifest::prelude::*;
//!
//! let mut manifest = Manifest::new();
//! manifest.set_disk_name("demo");
//! manifest.add(AssetSlot::Code, AssetPath::new("projects/demo/src/main.c"));
//! manifest.add(AssetSlot::Bitmap(Platform::Apple), AssetPath::new("projects/demo/art.png"));
//!
//! let mut bytes = Vec::new();
//! codec::write_to(&manifest, &mut bytes).unwrap();
//! let loaded = codec::read_from(bytes.as_slice()).unwrap();
//! assert_eq!(loaded, manifest);
//! ```

#![deny(unsafe_code)]

pub mod codec;
pub mod project;
pub mod slots;

use std::path::PathBuf;

pub use project::{
    AssetPath, AtariOptions, DiskSize, ImageQuality, Manifest, OricOptions, Platform,
    PlatformAssets, SpriteParams,
};
pub use slots::{AssetFilter, AssetPicker, AssetSlot, ProjectRoot};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while reading, writing or editing a project manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// An I/O failure on a stream with no associated path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O failure while opening or creating a project file.
    #[error("I/O error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The persisted record stream could not be interpreted.
    #[error("malformed project file: {details}")]
    Format { details: String },

    /// A textual slot key did not name any asset slot.
    #[error("unknown asset slot '{key}'")]
    UnknownSlot { key: String },

    /// A textual option value did not match any known choice.
    #[error("unknown value '{value}' for {option}. Expected one of: [{expected}]")]
    UnknownOption {
        option: &'static str,
        value: String,
        expected: String,
    },
}

impl ManifestError {
    pub(crate) fn format(details: impl Into<String>) -> Self {
        Self::Format {
            details: details.into(),
        }
    }
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::codec;
    pub use crate::project::{
        AssetPath, AtariOptions, DiskSize, ImageQuality, Manifest, OricOptions, Platform,
        PlatformAssets, SpriteParams,
    };
    pub use crate::slots::{AssetFilter, AssetPicker, AssetSlot, ProjectRoot};
    pub use crate::{ManifestError, ManifestResult};
}
