//! The Lynx resource table, `build/lynx/data.asm`.
//!
//! The Lynx cartridge has no file system, so every asset is linked into the
//! program and looked up through generated tables: a file count, a size
//! table, a name table, and one data segment per file. Sizes of converted
//! files and everything about chunk files are only known once the convert
//! phase has run, so those records carry build-time references.
//!
//! The size table and the name table list the same files in the same order:
//! bitmaps, charmaps, music, shared, then the listed chunks.

use unity_manifest::Platform;

use crate::index::{Category, Resource, ResourceIndex};
use crate::plan::{EntryField, Fragment, Item, Text};
use crate::toolchain::Toolchain;

const GLOBALS: [&str; 10] = [
    "_fileNum",
    "_fileSizes",
    "_fileNames",
    "_charNum",
    "_charData",
    "_charFlags",
    "_spriteNum",
    "_spriteData",
    "_cursorData",
    "_keybrdData",
];

/// Rows and columns of the charset glyph grid.
const CHAR_ROWS: usize = 4;
const CHAR_COLS: usize = 32;

/// File the resource is linked from, relative to `build/lynx`.
fn linked_file(resource: &Resource) -> String {
    match resource.category {
        Category::Bitmap => format!("{}.spr", resource.stem),
        Category::Music => format!("music{:02}.asm", resource.index),
        _ => resource.stem.clone(),
    }
}

/// Name the program opens the resource by.
fn file_name(resource: &Resource) -> String {
    match resource.category {
        Category::Bitmap => format!("{}.img", resource.stem),
        Category::Music => format!("{}.mus", resource.stem),
        _ => resource.stem.clone(),
    }
}

/// Every record of `data.asm`, in order.
pub fn records(index: &ResourceIndex, toolchain: &Toolchain) -> Vec<Item> {
    let mut out: Vec<Item> = GLOBALS
        .iter()
        .map(|g| Item::from(format!(".global {g}")))
        .collect();
    out.push(";".into());
    out.push(".segment \"RODATA\"".into());

    file_tables(index, toolchain, &mut out);
    out.push(";".into());
    charset(index, &mut out);
    out.push(";".into());
    sprites(index, &mut out);
    out.push(";".into());

    out.push("_cursorData: .incbin \"cursor.spr\"".into());
    out.push("_keybrdData: .incbin \"keyboard.spr\"".into());
    out
}

fn file_tables(index: &ResourceIndex, toolchain: &Toolchain, out: &mut Vec<Item>) {
    let static_count = index.static_count();
    let count = match index.chunks() {
        Some(chunks) => chunks.count(static_count),
        None => Fragment::Lit(static_count.to_string()),
    };
    out.push(Text::lit("_fileNum: .byte ").push(count).into());

    if !index.has_files() {
        out.push("_fileSizes: .word 0".into());
        out.push("_fileNames: .addr _dummyName".into());
        out.push("_dummyName: .byte 0".into());
        return;
    }

    // Chunk entries continue the list after a comma only if something precedes them.
    let leading = if static_count > 0 { "," } else { "" };

    let mut sizes = Text::lit("_fileSizes: .word ");
    let mut names = Text::lit("_fileNames: .addr ");
    for (i, resource) in index.files().enumerate() {
        if i > 0 {
            sizes = sizes.push_lit(",");
            names = names.push_lit(",");
        }
        let path = toolchain.platform_file(Platform::Lynx, &linked_file(resource));
        sizes = sizes.push(Fragment::SizeOf(path));
        names = names.push_lit(resource.symbol("Name"));
    }
    if let Some(chunks) = index.chunks() {
        sizes = sizes.push(Fragment::EachListed {
            list: chunks.list.clone(),
            each: Text::entry(EntryField::Size),
            separator: ",".into(),
            leading: leading.into(),
            // The chunk preprocessor runs in the Lynx work directory.
            base: Some(toolchain.platform_dir(Platform::Lynx)),
        });
        names = names.push(Fragment::EachListed {
            list: chunks.list.clone(),
            each: Text::lit("_shkName").push(Fragment::Entry(EntryField::Index)),
            separator: ",".into(),
            leading: leading.into(),
            base: None,
        });
    }
    out.push(sizes.into());
    out.push(names.into());

    for resource in index.files() {
        out.push(
            format!(
                "{}: .byte \"{}\",0",
                resource.symbol("Name"),
                file_name(resource)
            )
            .into(),
        );
    }
    if let Some(chunks) = index.chunks() {
        out.push(Item::PerEntry {
            list: chunks.list.clone(),
            each: vec![Text::lit("_shkName")
                .push(Fragment::Entry(EntryField::Index))
                .push_lit(": .byte \"")
                .push(Fragment::Entry(EntryField::FileName))
                .push_lit("\",0")],
        });
    }

    out.push(";".into());
    // Charmaps continue the bitmap segment numbering.
    let bitmaps = index.bitmaps().len();
    for bitmap in index.bitmaps() {
        out.push(format!(".segment \"BMP{}DATA\"", bitmap.index).into());
        out.push(format!("{}: .incbin \"{}\"", bitmap.symbol("Data"), linked_file(bitmap)).into());
    }
    for charmap in index.charmaps() {
        out.push(format!(".segment \"BMP{}DATA\"", bitmaps + charmap.index).into());
        out.push(format!("{}: .incbin \"{}\"", charmap.symbol("Data"), linked_file(charmap)).into());
    }
    for track in index.music() {
        out.push(format!(".segment \"MUS{}DATA\"", track.index).into());
        out.push(format!(".import {}", track.symbol("Data")).into());
    }
    for file in index.shared() {
        out.push(format!(".segment \"SHR{}DATA\"", file.index).into());
        out.push(format!("{}: .incbin \"{}\"", file.symbol("Data"), linked_file(file)).into());
    }
    if let Some(chunks) = index.chunks() {
        out.push(Item::PerEntry {
            list: chunks.list.clone(),
            each: vec![
                Text::lit(".segment \"SHK")
                    .push(Fragment::Entry(EntryField::Index))
                    .push_lit("DATA\""),
                Text::lit("_shkData")
                    .push(Fragment::Entry(EntryField::Index))
                    .push_lit(": .incbin \"")
                    .push(Fragment::Entry(EntryField::FileName))
                    .push_lit("\""),
            ],
        });
    }
}

fn charset(index: &ResourceIndex, out: &mut Vec<Item>) {
    out.push(".segment \"RODATA\"".into());
    if index.charset().is_none() {
        out.push("_charNum: .byte 0".into());
        out.push("_charData: .byte 0".into());
        out.push("_charFlags: .byte 0".into());
        return;
    }

    let cells = CHAR_ROWS * CHAR_COLS;
    let labels: Vec<String> = (0..cells)
        .map(|i| format!("_chr{i:03}"))
        .chain((cells..2 * cells).map(|i| format!("_fnt{i:03}")))
        .collect();
    out.push("_charNum: .byte 255".into());
    out.push(format!("_charData: .addr {}", labels.join(", ")).into());

    for (sheet, offset) in [("char", 0), ("font", cells)] {
        for r in 0..CHAR_ROWS {
            for c in 0..CHAR_COLS {
                let label = &labels[offset + r * CHAR_COLS + c];
                out.push(format!("{label}: .incbin \"{sheet}{r:03}{c:03}.spr\"").into());
            }
        }
    }
    out.push("_charFlags: .incbin \"charset.dat\"".into());
}

fn sprites(index: &ResourceIndex, out: &mut Vec<Item>) {
    out.push(".segment \"RODATA\"".into());
    if index.sprites().is_none() {
        out.push("_spriteNum: .byte 0".into());
        out.push("_spriteData: .byte 0".into());
        return;
    }

    let frames = index.sprite_params().frames;
    out.push(format!("_spriteNum: .byte {frames}").into());
    let labels: Vec<String> = (0..frames).map(|i| format!("_spr{i:03}")).collect();
    out.push(format!("_spriteData: .addr {}", labels.join(", ")).into());
    for (i, label) in labels.iter().enumerate() {
        out.push(format!("{label}: .incbin \"sprites{i:03}000.spr\"").into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::SimulatedEnv;
    use unity_manifest::{AssetPath, AssetSlot, Manifest, SpriteParams};

    fn table(manifest: &Manifest) -> Vec<Item> {
        let tc = Toolchain::default();
        records(&ResourceIndex::build(manifest, Platform::Lynx, &tc), &tc)
    }

    fn render(items: &[Item], env: &SimulatedEnv) -> Vec<String> {
        let step = crate::plan::Step::Emit {
            target: "build/lynx/data.asm".into(),
            records: items.to_vec(),
        };
        match step.resolve(env).pop() {
            Some(crate::plan::Command::Append { records, .. }) => records,
            other => panic!("expected an append, got {other:?}"),
        }
    }

    fn line<'a>(lines: &'a [String], prefix: &str) -> &'a str {
        lines
            .iter()
            .find(|l| l.starts_with(prefix))
            .map(String::as_str)
            .unwrap_or_else(|| panic!("no record starting with {prefix}"))
    }

    #[test]
    fn empty_project_uses_dummy_tables() {
        let lines = render(&table(&Manifest::new()), &SimulatedEnv::new());
        assert_eq!(line(&lines, "_fileNum"), "_fileNum: .byte 0");
        assert_eq!(line(&lines, "_fileSizes"), "_fileSizes: .word 0");
        assert_eq!(line(&lines, "_fileNames"), "_fileNames: .addr _dummyName");
        assert!(lines.contains(&"_dummyName: .byte 0".to_owned()));
        assert_eq!(line(&lines, "_charNum"), "_charNum: .byte 0");
        assert_eq!(line(&lines, "_spriteNum"), "_spriteNum: .byte 0");
        assert_eq!(lines.last().unwrap(), "_keybrdData: .incbin \"keyboard.spr\"");
    }

    #[test]
    fn files_and_chunks_share_the_tables() {
        let mut m = Manifest::new();
        m.add(AssetSlot::Bitmap(Platform::Lynx), AssetPath::new("gfx/title-lynx.png"));
        m.add(AssetSlot::Charmap, AssetPath::new("maps/level1.map"));
        m.add(AssetSlot::Music(Platform::Lynx), AssetPath::new("music/theme-lynx.asm"));
        m.add(AssetSlot::Chunks(Platform::Lynx), AssetPath::new("chunks.txt"));

        let env = SimulatedEnv::new()
            .with_list("build/lynx/chunks.lst", ["../../build/lynx/hud.chk"])
            .with_size("build/lynx/title.spr", 1200)
            .with_size("build/lynx/level1.map", 400)
            .with_size("build/lynx/music00.asm", 900)
            .with_size("build/lynx/hud.chk", 64);
        let lines = render(&table(&m), &env);

        assert_eq!(line(&lines, "_fileNum"), "_fileNum: .byte 4");
        assert_eq!(line(&lines, "_fileSizes"), "_fileSizes: .word 1200,400,900,64");
        assert_eq!(
            line(&lines, "_fileNames"),
            "_fileNames: .addr _bmpName00,_mapName00,_musName00,_shkName0"
        );
        assert_eq!(line(&lines, "_bmpName00"), "_bmpName00: .byte \"title.img\",0");
        assert_eq!(line(&lines, "_musName00"), "_musName00: .byte \"theme.mus\",0");
        assert_eq!(line(&lines, "_shkName0"), "_shkName0: .byte \"hud.chk\",0");
        assert!(lines.contains(&".segment \"BMP1DATA\"".to_owned()));
        assert_eq!(line(&lines, "_mapData00"), "_mapData00: .incbin \"level1.map\"");
        assert!(lines.contains(&".import _musData00".to_owned()));
        assert!(lines.contains(&".segment \"SHK0DATA\"".to_owned()));
        assert_eq!(line(&lines, "_shkData0"), "_shkData0: .incbin \"hud.chk\"");
    }

    #[test]
    fn only_chunks_need_no_leading_comma() {
        let mut m = Manifest::new();
        m.add(AssetSlot::Chunks(Platform::Lynx), AssetPath::new("chunks.txt"));
        let env = SimulatedEnv::new()
            .with_list("build/lynx/chunks.lst", ["a.chk", "b.chk"])
            .with_size("build/lynx/a.chk", 10)
            .with_size("build/lynx/b.chk", 20);
        let lines = render(&table(&m), &env);

        assert_eq!(line(&lines, "_fileNum"), "_fileNum: .byte 2");
        assert_eq!(line(&lines, "_fileSizes"), "_fileSizes: .word 10,20");
        assert_eq!(line(&lines, "_fileNames"), "_fileNames: .addr _shkName0,_shkName1");
    }

    #[test]
    fn charset_lists_every_glyph_cell() {
        let mut m = Manifest::new();
        m.add(AssetSlot::Charset(Platform::Lynx), AssetPath::new("gfx/chars-lynx.png"));
        let lines = render(&table(&m), &SimulatedEnv::new());

        let char_data = line(&lines, "_charData");
        assert!(char_data.starts_with("_charData: .addr _chr000, _chr001"));
        assert!(char_data.ends_with("_fnt254, _fnt255"));
        assert_eq!(line(&lines, "_chr033"), "_chr033: .incbin \"char001001.spr\"");
        assert_eq!(line(&lines, "_fnt128"), "_fnt128: .incbin \"font000000.spr\"");
        assert_eq!(line(&lines, "_fnt255"), "_fnt255: .incbin \"font003031.spr\"");
        assert_eq!(line(&lines, "_charFlags"), "_charFlags: .incbin \"charset.dat\"");
    }

    #[test]
    fn sprite_frames_are_listed() {
        let mut m = Manifest::new();
        m.add(AssetSlot::Sprites(Platform::Lynx), AssetPath::new("gfx/sprites-lynx.png"));
        m.set_sprite_params(Platform::Lynx, SpriteParams::new(3, 16, 16));
        let lines = render(&table(&m), &SimulatedEnv::new());

        assert_eq!(line(&lines, "_spriteNum"), "_spriteNum: .byte 3");
        assert_eq!(line(&lines, "_spriteData"), "_spriteData: .addr _spr000, _spr001, _spr002");
        assert_eq!(line(&lines, "_spr002"), "_spr002: .incbin \"sprites002000.spr\"");
    }
}
