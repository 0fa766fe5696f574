//! Unity Build -- turns a project manifest into per-platform build plans.
//!
//! Compilation is a pure function of a [`Manifest`] and a [`Toolchain`]. For
//! every target machine a [`PlatformCompiler`] fills the same four-phase
//! skeleton (convert assets, build the runtime library, link, pack the disk
//! image) with that machine's tools and flags. Nothing is executed here: the
//! resulting [`BuildPlan`]s are handed to an external executor, which
//! resolves build-time references (chunk lists, file sizes, artifacts
//! produced by earlier steps) as it goes.
//!
//! # Modules
//!
//! - [`plan`]: steps, templates and build-time resolution.
//! - [`index`]: positional resource names per platform.
//! - [`compiler`]: the shared skeleton, validation and entry points.
//! - [`platform`]: the five platform configurations.
//! - [`resource_table`]: the generated Lynx resource table.
//! - [`toolchain`]: tool and source locations.
//!
//! # Example
//!
//! ```
//! use unity_build::prelude::*;
//! use unity_manifest::prelude::*;
//!
//! let mut manifest = Manifest::new();
//! manifest.set_disk_name("demo");
//! manifest.add(AssetSlot::Code, AssetPath::new("main.c"));
//!
//! let plans = compile_platform(Platform::Apple, &manifest, &Toolchain::default()).unwrap();
//! assert_eq!(plans.len(), 2); // 64k and 128k images
//! assert_eq!(plans[0].image, "build/demo-apple64k.do");
//! assert!(plans[0].phase(Phase::Library).count() > 0);
//! ```

#![deny(unsafe_code)]

pub mod compiler;
pub mod index;
pub mod plan;
pub mod platform;
pub mod resource_table;
pub mod toolchain;

pub use compiler::{compile_all, compile_platform, compiler_for, PlatformCompiler};
pub use index::{Category, ChunkList, Resource, ResourceIndex};
pub use plan::{BuildEnv, BuildPlan, Command, Phase, SimulatedEnv, Step};
pub use toolchain::Toolchain;

use unity_manifest::{Manifest, Platform, SpriteParams};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A manifest that cannot be compiled. Reported before any plan is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The project has no C source files.
    #[error("project '{disk}' has no code files; add at least one C source")]
    NoCodeFiles { disk: String },

    /// The disk name is empty, so no output file name can be derived.
    #[error("disk name is empty")]
    EmptyDiskName,

    /// Sprites are selected but the geometry the converter needs is zero.
    #[error(
        "{platform} sprites need non-zero parameters \
         (frames {}, width {}, height {})",
        .params.frames, .params.width, .params.height
    )]
    IncompleteSprites {
        platform: Platform,
        params: SpriteParams,
    },
}

/// Result alias for compilation.
pub type BuildResult<T> = Result<T, ValidationError>;

/// Check the preconditions shared by every platform compiler.
pub fn validate(manifest: &Manifest) -> BuildResult<()> {
    if manifest.code_files().is_empty() {
        return Err(ValidationError::NoCodeFiles {
            disk: manifest.disk_name().to_owned(),
        });
    }
    if manifest.disk_name().trim().is_empty() {
        return Err(ValidationError::EmptyDiskName);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::compiler::{compile_all, compile_platform, compiler_for, PlatformCompiler};
    pub use crate::index::{Category, ChunkList, Resource, ResourceIndex};
    pub use crate::plan::{
        BuildEnv, BuildPlan, Command, EntryField, Fragment, Invocation, Item, Phase,
        SimulatedEnv, Step, Text,
    };
    pub use crate::toolchain::Toolchain;
    pub use crate::{validate, BuildResult, ValidationError};
}
