//! Positional resource names.
//!
//! Every asset a platform build ships gets a name derived from its category
//! and its 0-based position in that category: the second bitmap is `bmp01`,
//! the first music track `mus00`. Categories are numbered independently, so
//! `bmp00` and `mus00` never clash.
//!
//! Chunk definitions are different. One definition expands into a variable
//! number of files, and only the external chunk preprocessor knows how many.
//! The index therefore records the list file that preprocessor writes
//! ([`ChunkList`]) instead of inventing names or a count.

use std::fmt;

use serde::Serialize;
use unity_manifest::{AssetPath, AssetSlot, Manifest, Platform, SpriteParams};

use crate::plan::Fragment;
use crate::toolchain::Toolchain;

/// A resource category with its own numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bitmap,
    Charmap,
    Music,
    Shared,
    Charset,
}

impl Category {
    /// Name prefix of the category.
    pub fn prefix(self) -> &'static str {
        match self {
            Category::Bitmap => "bmp",
            Category::Charmap => "map",
            Category::Music => "mus",
            Category::Shared => "shr",
            Category::Charset => "chr",
        }
    }

    /// The suffix stripped from source file names to form the stem, e.g.
    /// `-apple.png` for Apple bitmaps.
    pub fn suffix(self, platform: Platform) -> String {
        match self {
            Category::Bitmap | Category::Charset => format!("-{}.png", platform.key()),
            Category::Music => {
                let ext = match platform {
                    Platform::Apple => "m",
                    Platform::Atari => "rmt",
                    Platform::C64 => "sid",
                    Platform::Lynx => "asm",
                    Platform::Oric => "ym",
                };
                format!("-{}.{ext}", platform.key())
            }
            Category::Charmap if platform == Platform::Apple => ".map".to_owned(),
            Category::Charmap | Category::Shared => String::new(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One indexed asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub category: Category,
    /// 0-based position within the category.
    pub index: usize,
    /// The asset path as stored in the manifest.
    pub source: AssetPath,
    /// Lowercased file name without the platform suffix.
    pub stem: String,
}

impl Resource {
    /// `{prefix}{index:02}`, e.g. `bmp00`.
    pub fn name(&self) -> String {
        format!("{}{:02}", self.category.prefix(), self.index)
    }

    /// Assembly symbol for one role of the resource, e.g. `symbol("Data")`
    /// gives `_musData01`.
    pub fn symbol(&self, role: &str) -> String {
        format!("_{}{role}{:02}", self.category.prefix(), self.index)
    }
}

/// The build-time list of files a chunk definition expands into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkList {
    /// The chunk definition selected in the manifest.
    pub source: AssetPath,
    /// List file written by the chunk preprocessor, one entry per line.
    pub list: String,
}

impl ChunkList {
    /// Number of listed chunks plus `offset`, resolved at build time.
    pub fn count(&self, offset: usize) -> Fragment {
        Fragment::ListCount {
            list: self.list.clone(),
            offset,
        }
    }
}

/// All resources of one platform, numbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceIndex {
    pub platform: Platform,
    bitmaps: Vec<Resource>,
    charmaps: Vec<Resource>,
    music: Vec<Resource>,
    shared: Vec<Resource>,
    charset: Option<Resource>,
    sprites: Option<AssetPath>,
    sprite_params: SpriteParams,
    chunks: Option<ChunkList>,
}

impl ResourceIndex {
    pub fn build(manifest: &Manifest, platform: Platform, toolchain: &Toolchain) -> Self {
        let assets = manifest.assets(platform);
        let number = |category: Category, paths: &[AssetPath]| -> Vec<Resource> {
            let suffix = category.suffix(platform);
            paths
                .iter()
                .enumerate()
                .map(|(index, source)| Resource {
                    category,
                    index,
                    source: source.clone(),
                    stem: source.file_base(&suffix),
                })
                .collect()
        };

        let index = Self {
            platform,
            bitmaps: number(Category::Bitmap, assets.bitmaps()),
            charmaps: number(Category::Charmap, manifest.charmap_files()),
            music: number(Category::Music, assets.music()),
            shared: number(Category::Shared, manifest.shared_files()),
            charset: number(Category::Charset, manifest.paths(AssetSlot::Charset(platform))).pop(),
            sprites: assets.sprites().cloned(),
            sprite_params: assets.sprite_params(),
            chunks: assets.chunks().map(|source| ChunkList {
                source: source.clone(),
                list: toolchain.platform_file(platform, "chunks.lst"),
            }),
        };
        tracing::debug!(
            platform = %platform,
            files = index.static_count(),
            chunks = index.chunks.is_some(),
            "indexed resources"
        );
        index
    }

    pub fn bitmaps(&self) -> &[Resource] {
        &self.bitmaps
    }

    pub fn charmaps(&self) -> &[Resource] {
        &self.charmaps
    }

    pub fn music(&self) -> &[Resource] {
        &self.music
    }

    pub fn shared(&self) -> &[Resource] {
        &self.shared
    }

    pub fn charset(&self) -> Option<&Resource> {
        self.charset.as_ref()
    }

    pub fn sprites(&self) -> Option<&AssetPath> {
        self.sprites.as_ref()
    }

    pub fn sprite_params(&self) -> SpriteParams {
        self.sprite_params
    }

    pub fn chunks(&self) -> Option<&ChunkList> {
        self.chunks.as_ref()
    }

    /// Bitmaps, charmaps, music and shared files, in that order.
    pub fn files(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.bitmaps
            .iter()
            .chain(&self.charmaps)
            .chain(&self.music)
            .chain(&self.shared)
    }

    /// Number of files known before the build runs; chunks are not included.
    pub fn static_count(&self) -> usize {
        self.bitmaps.len() + self.charmaps.len() + self.music.len() + self.shared.len()
    }

    /// Whether the image carries any file at all, chunks included.
    pub fn has_files(&self) -> bool {
        self.static_count() > 0 || self.chunks.is_some()
    }
}
