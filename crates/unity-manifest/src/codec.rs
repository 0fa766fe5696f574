//! Project file persistence.
//!
//! A project file is a stream of self-describing records, one JSON value per
//! line. A record is an integer, a text, a flag or a list of texts:
//!
//! ```text
//! 2
//! "entries"
//! "demo"
//! "1"
//! ...
//! "listboxes"
//! ["projects/demo/main.c"]
//! ...
//! ```
//!
//! The stream opens with the format version, followed by four sections in a
//! fixed order (`entries`, `listboxes`, `checkbuttons`, `comboboxes`), each
//! introduced by a marker record equal to its name. Fields within a section
//! are positional and only ever appended to, never reordered.
//!
//! Loading does not branch on the version. It scans forward to each marker,
//! discarding unknown records on the way, and reads fields in order. A field
//! slot that turns out to hold the next section's marker ends the section
//! early, so files written by older revisions with fewer fields still load,
//! and every field they lack keeps its default.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::project::{AssetPath, DiskSize, ImageQuality, Manifest, Platform};
use crate::slots::AssetSlot;
use crate::{ManifestError, ManifestResult};

/// Version written at the head of every project file.
pub const FORMAT_VERSION: i64 = 2;

/// Conventional project file extension.
pub const FILE_EXTENSION: &str = "builder";

/// One persisted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Int(i64),
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl Record {
    fn kind(&self) -> &'static str {
        match self {
            Record::Int(_) => "integer",
            Record::Flag(_) => "flag",
            Record::Text(_) => "text",
            Record::List(_) => "list",
        }
    }

    fn is_marker(&self, markers: &[&str]) -> bool {
        matches!(self, Record::Text(t) if markers.contains(&t.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// A positional field of one section.
#[derive(Debug, Clone, Copy)]
enum Field {
    DiskName,
    SpriteFrames(Platform),
    SpriteWidth(Platform),
    SpriteHeight(Platform),
    OricDithering,
    List(AssetSlot),
    AtariNoText,
    AtariDiskSize,
    OricQuality,
}

struct Section {
    /// Accepted marker names; the first one is written.
    markers: &'static [&'static str],
    fields: Vec<Field>,
}

fn layout() -> [Section; 4] {
    use Platform::*;

    let mut entries = vec![Field::DiskName];
    for p in Platform::ALL {
        entries.extend([
            Field::SpriteFrames(p),
            Field::SpriteWidth(p),
            Field::SpriteHeight(p),
        ]);
    }
    entries.push(Field::OricDithering);

    let mut lists = vec![AssetSlot::Code];
    for p in [Apple, Atari, C64, Oric] {
        lists.extend([AssetSlot::Bitmap(p), AssetSlot::Sprites(p), AssetSlot::Music(p)]);
    }
    lists.push(AssetSlot::Shared);
    lists.extend([
        AssetSlot::Bitmap(Lynx),
        AssetSlot::Sprites(Lynx),
        AssetSlot::Music(Lynx),
    ]);
    lists.extend(Platform::ALL.map(AssetSlot::Chunks));
    lists.extend(Platform::ALL.map(AssetSlot::Charset));
    lists.push(AssetSlot::Charmap);

    [
        Section {
            markers: &["entries"],
            fields: entries,
        },
        Section {
            markers: &["listboxes", "lists"],
            fields: lists.into_iter().map(Field::List).collect(),
        },
        Section {
            markers: &["checkbuttons"],
            fields: vec![Field::AtariNoText],
        },
        Section {
            markers: &["comboboxes"],
            fields: vec![Field::AtariDiskSize, Field::OricQuality],
        },
    ]
}

fn encode(field: Field, manifest: &Manifest) -> Record {
    match field {
        Field::DiskName => Record::Text(manifest.disk_name().to_owned()),
        Field::SpriteFrames(p) => {
            Record::Text(manifest.assets(p).sprite_params().frames.to_string())
        }
        Field::SpriteWidth(p) => Record::Text(manifest.assets(p).sprite_params().width.to_string()),
        Field::SpriteHeight(p) => {
            Record::Text(manifest.assets(p).sprite_params().height.to_string())
        }
        Field::OricDithering => Record::Text(manifest.oric_options().dithering.to_string()),
        Field::List(slot) => Record::List(
            manifest
                .paths(slot)
                .iter()
                .map(|p| p.as_str().to_owned())
                .collect(),
        ),
        Field::AtariNoText => Record::Flag(manifest.atari_options().no_text),
        Field::AtariDiskSize => Record::Text(manifest.atari_options().disk_size.label().to_owned()),
        Field::OricQuality => Record::Text(manifest.oric_options().quality.label().to_owned()),
    }
}

fn apply(field: Field, record: Record, manifest: &mut Manifest) -> ManifestResult<()> {
    match (field, record) {
        (Field::DiskName, Record::Text(name)) => manifest.set_disk_name(name),
        (Field::SpriteFrames(p), Record::Text(t)) => {
            manifest.assets_mut(p).sprite_params.frames = parse_number(&t, "sprite frames")?;
        }
        (Field::SpriteWidth(p), Record::Text(t)) => {
            manifest.assets_mut(p).sprite_params.width = parse_number(&t, "sprite width")?;
        }
        (Field::SpriteHeight(p), Record::Text(t)) => {
            manifest.assets_mut(p).sprite_params.height = parse_number(&t, "sprite height")?;
        }
        (Field::OricDithering, Record::Text(t)) => {
            let dithering = t.trim().parse::<f32>().map_err(|_| {
                ManifestError::format(format!("Oric dithering '{t}' is not a number"))
            })?;
            manifest.set_oric_dithering(dithering);
        }
        (Field::List(slot), Record::List(paths)) => {
            if slot.is_single() && paths.len() > 1 {
                return Err(ManifestError::format(format!(
                    "{slot} holds {} paths but accepts at most one",
                    paths.len()
                )));
            }
            manifest.replace(slot, paths.into_iter().map(AssetPath::new).collect());
        }
        (Field::AtariNoText, Record::Flag(flag)) => manifest.set_atari_no_text(flag),
        (Field::AtariDiskSize, Record::Text(label)) => {
            let size: DiskSize = label.parse().map_err(|e: ManifestError| {
                ManifestError::format(e.to_string())
            })?;
            manifest.set_atari_disk_size(size);
        }
        (Field::OricQuality, Record::Text(label)) => {
            let quality: ImageQuality = label.parse().map_err(|e: ManifestError| {
                ManifestError::format(e.to_string())
            })?;
            manifest.set_oric_quality(quality);
        }
        (field, record) => {
            return Err(ManifestError::format(format!(
                "unexpected {} record for field {field:?}",
                record.kind()
            )));
        }
    }
    Ok(())
}

fn parse_number(text: &str, what: &str) -> ManifestResult<u32> {
    text.trim()
        .parse()
        .map_err(|_| ManifestError::format(format!("{what} '{text}' is not a number")))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write `manifest` to `path`, replacing any existing file.
pub fn save(manifest: &Manifest, path: impl AsRef<Path>) -> ManifestResult<()> {
    let path = path.as_ref();
    let file_error = |source| ManifestError::File {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(file_error)?;
    let mut writer = BufWriter::new(file);
    write_to(manifest, &mut writer)?;
    writer.flush().map_err(file_error)?;
    tracing::debug!(path = %path.display(), "project saved");
    Ok(())
}

/// Write the record stream for `manifest` to any writer.
pub fn write_to<W: Write>(manifest: &Manifest, mut writer: W) -> ManifestResult<()> {
    write_record(&mut writer, &Record::Int(FORMAT_VERSION))?;
    for section in layout() {
        write_record(&mut writer, &Record::Text(section.markers[0].to_owned()))?;
        for field in section.fields {
            write_record(&mut writer, &encode(field, manifest))?;
        }
    }
    Ok(())
}

fn write_record<W: Write>(writer: &mut W, record: &Record) -> ManifestResult<()> {
    serde_json::to_writer(&mut *writer, record).map_err(json_error)?;
    writer.write_all(b"\n")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Load a project file.
pub fn load(path: impl AsRef<Path>) -> ManifestResult<Manifest> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ManifestError::File {
        path: path.to_path_buf(),
        source,
    })?;
    read_from(BufReader::new(file))
}

/// Read a record stream into a fresh manifest.
pub fn read_from<R: Read>(reader: R) -> ManifestResult<Manifest> {
    let mut records = serde_json::Deserializer::from_reader(reader).into_iter::<Record>();
    let mut next = move || records.next().transpose().map_err(json_error);

    match next()? {
        None => return Err(ManifestError::format("empty project file")),
        Some(Record::Int(version)) => {
            tracing::info!(version, "loading project file");
            if version > FORMAT_VERSION {
                tracing::warn!(
                    version,
                    supported = FORMAT_VERSION,
                    "project written by a newer builder; unknown fields are ignored"
                );
            }
        }
        Some(other) => {
            return Err(ManifestError::format(format!(
                "expected format version, found {} record",
                other.kind()
            )));
        }
    }

    let mut manifest = Manifest::new();
    let sections = layout();
    // Set when a section ended on the following section's marker.
    let mut at_marker = false;

    for (i, section) in sections.iter().enumerate() {
        if !at_marker {
            loop {
                match next()? {
                    Some(record) if record.is_marker(section.markers) => break,
                    Some(record) => {
                        tracing::debug!(?record, section = section.markers[0], "skipping record");
                    }
                    None if i == 0 => {
                        return Err(ManifestError::format("missing 'entries' section"));
                    }
                    None => return Ok(manifest),
                }
            }
        }
        at_marker = false;

        let next_markers = sections.get(i + 1).map_or(&[][..], |s| s.markers);
        for &field in &section.fields {
            let Some(record) = next()? else {
                return Ok(manifest);
            };
            if record.is_marker(next_markers) {
                tracing::debug!(
                    section = section.markers[0],
                    "section ended early; remaining fields keep defaults"
                );
                at_marker = true;
                break;
            }
            apply(field, record, &mut manifest)?;
        }
    }

    Ok(manifest)
}

fn json_error(err: serde_json::Error) -> ManifestError {
    if err.is_io() {
        ManifestError::Io(io::Error::from(err))
    } else {
        ManifestError::format(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
