//! Integration tests for project file persistence: file round trips, legacy
//! layouts and malformed streams.

use proptest::prelude::*;
use unity_manifest::prelude::*;

// -- helpers ----------------------------------------------------------------

fn stream(lines: &[&str]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn sample_manifest() -> Manifest {
    let mut m = Manifest::new();
    m.set_disk_name("demo");
    m.add(AssetSlot::Code, AssetPath::new("projects/demo/src/main.c"));
    m.add(AssetSlot::Code, AssetPath::new("projects/demo/src/game.c"));
    m.add(AssetSlot::Charmap, AssetPath::new("projects/demo/maps/level1.map"));
    m.add(AssetSlot::Shared, AssetPath::new("projects/demo/data/scores.dat"));
    m.add(AssetSlot::Bitmap(Platform::Apple), AssetPath::new("gfx/title-apple.png"));
    m.add(AssetSlot::Sprites(Platform::Atari), AssetPath::new("gfx/sprites-atari.png"));
    m.add(AssetSlot::Music(Platform::C64), AssetPath::new("music/theme-c64.sid"));
    m.add(AssetSlot::Chunks(Platform::Lynx), AssetPath::new("chunks/chunks-lynx.txt"));
    m.add(AssetSlot::Charset(Platform::Oric), AssetPath::new("gfx/font-oric.png"));
    m.set_sprite_params(Platform::Lynx, SpriteParams::new(6, 13, 15));
    m.set_atari_no_text(true);
    m.set_atari_disk_size(DiskSize::Kb360);
    m.set_oric_dithering(0.7);
    m.set_oric_quality(ImageQuality::Noisy);
    m
}

// -- file round trips -------------------------------------------------------

#[test]
fn save_then_load_restores_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.builder");
    let manifest = sample_manifest();

    codec::save(&manifest, &path).unwrap();
    let loaded = codec::load(&path).unwrap();

    assert_eq!(loaded, manifest);
}

#[test]
fn save_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.builder");

    codec::save(&sample_manifest(), &path).unwrap();
    codec::save(&Manifest::new(), &path).unwrap();

    assert_eq!(codec::load(&path).unwrap(), Manifest::new());
}

#[test]
fn load_missing_file_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.builder");

    let err = codec::load(&path).unwrap_err();
    match err {
        ManifestError::File { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected a file error, got {other}"),
    }
}

// -- older layouts ----------------------------------------------------------

#[test]
fn entries_only_file_leaves_other_fields_at_defaults() {
    let text = stream(&[
        "1", "\"entries\"", "\"oldgame\"", "\"2\"", "\"16\"", "\"8\"",
    ]);

    let m = codec::read_from(text.as_bytes()).unwrap();

    assert_eq!(m.disk_name(), "oldgame");
    assert_eq!(m.assets(Platform::Apple).sprite_params(), SpriteParams::new(2, 16, 8));
    assert_eq!(m.assets(Platform::Atari).sprite_params(), SpriteParams::default());
    assert!(m.code_files().is_empty());
    assert_eq!(m.atari_options(), AtariOptions::default());
    assert_eq!(m.oric_options(), OricOptions::default());
}

#[test]
fn short_section_ends_on_next_marker() {
    // An early revision without sprite parameters or dithering.
    let text = stream(&[
        "1",
        "\"entries\"",
        "\"short\"",
        "\"lists\"",
        "[\"main.c\"]",
        "[\"title.png\"]",
        "\"checkbuttons\"",
        "true",
    ]);

    let m = codec::read_from(text.as_bytes()).unwrap();

    assert_eq!(m.disk_name(), "short");
    assert_eq!(m.code_files(), [AssetPath::new("main.c")]);
    assert_eq!(m.assets(Platform::Apple).bitmaps(), [AssetPath::new("title.png")]);
    assert!(m.atari_options().no_text);
    assert_eq!(m.oric_options().dithering, 0.5);
    assert_eq!(m.oric_options().quality, ImageQuality::Clean);
}

#[test]
fn unknown_records_before_a_marker_are_skipped() {
    let text = stream(&[
        "2",
        "\"window geometry\"",
        "640",
        "\"entries\"",
        "\"skipper\"",
        "\"listboxes\"",
        "\"checkbuttons\"",
        "\"comboboxes\"",
        "\"360KB\"",
    ]);

    let m = codec::read_from(text.as_bytes()).unwrap();

    assert_eq!(m.disk_name(), "skipper");
    assert_eq!(m.atari_options().disk_size, DiskSize::Kb360);
    assert_eq!(m.oric_options().quality, ImageQuality::Clean);
}

#[test]
fn trailing_records_after_last_field_are_ignored() {
    let mut bytes = Vec::new();
    codec::write_to(&sample_manifest(), &mut bytes).unwrap();
    bytes.extend_from_slice(b"\"future\"\n[\"extra\"]\n42\n");

    assert_eq!(codec::read_from(bytes.as_slice()).unwrap(), sample_manifest());
}

// -- malformed streams ------------------------------------------------------

fn format_error(text: &str) -> String {
    match codec::read_from(text.as_bytes()) {
        Err(ManifestError::Format { details }) => details,
        Err(other) => panic!("expected a format error, got {other}"),
        Ok(m) => panic!("expected a format error, loaded {m:?}"),
    }
}

#[test]
fn empty_stream_is_rejected() {
    assert!(format_error("").contains("empty"));
}

#[test]
fn missing_entries_marker_is_rejected() {
    let details = format_error(&stream(&["2", "\"listboxes\"", "[]"]));
    assert!(details.contains("entries"), "{details}");
}

#[test]
fn truncated_record_is_rejected() {
    format_error("2\n\"entries\"\n\"unterminated\n");
}

#[test]
fn unparsable_sprite_width_is_rejected() {
    let details = format_error(&stream(&["2", "\"entries\"", "\"demo\"", "\"1\"", "\"wide\""]));
    assert!(details.contains("sprite width"), "{details}");
}

#[test]
fn unknown_disk_size_label_is_rejected() {
    let details = format_error(&stream(&[
        "2",
        "\"entries\"",
        "\"demo\"",
        "\"listboxes\"",
        "\"checkbuttons\"",
        "\"comboboxes\"",
        "\"720KB\"",
    ]));
    assert!(details.contains("720KB"), "{details}");
}

#[test]
fn two_paths_in_single_select_list_are_rejected() {
    let mut m = Manifest::new();
    m.add(AssetSlot::Charset(Platform::Apple), AssetPath::new("font.png"));
    let mut bytes = Vec::new();
    codec::write_to(&m, &mut bytes).unwrap();
    let text = String::from_utf8(bytes)
        .unwrap()
        .replace("[\"font.png\"]", "[\"a.png\",\"b.png\"]");

    let details = format_error(&text);
    assert!(details.contains("apple.charset"), "{details}");
}

// -- properties -------------------------------------------------------------

fn arb_paths(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}/[A-Za-z0-9_-]{1,10}\\.[a-z]{1,3}", 0..=max)
}

fn arb_params() -> impl Strategy<Value = SpriteParams> {
    (0u32..64, 0u32..64, 0u32..64).prop_map(|(f, w, h)| SpriteParams::new(f, w, h))
}

prop_compose! {
    fn arb_manifest()(
        name in "demo[a-z0-9]{0,8}",
        code in arb_paths(4),
        shared in arb_paths(3),
        bitmaps in prop::collection::vec(arb_paths(3), 5),
        singles in prop::collection::vec(arb_paths(1), 15),
        params in prop::collection::vec(arb_params(), 5),
        no_text in any::<bool>(),
        big_disk in any::<bool>(),
        noisy in any::<bool>(),
        dithering in 0.0f32..1.0,
    ) -> Manifest {
        let mut m = Manifest::new();
        m.set_disk_name(name);
        for p in code {
            m.add(AssetSlot::Code, AssetPath::new(p));
        }
        for p in shared {
            m.add(AssetSlot::Shared, AssetPath::new(p));
        }
        for (i, platform) in Platform::ALL.into_iter().enumerate() {
            for p in &bitmaps[i] {
                m.add(AssetSlot::Bitmap(platform), AssetPath::new(p.as_str()));
                m.add(AssetSlot::Music(platform), AssetPath::new(p.as_str()));
            }
            let slots = [
                AssetSlot::Charset(platform),
                AssetSlot::Sprites(platform),
                AssetSlot::Chunks(platform),
            ];
            for (j, slot) in slots.into_iter().enumerate() {
                for p in &singles[i * 3 + j] {
                    m.add(slot, AssetPath::new(p.as_str()));
                }
            }
            m.set_sprite_params(platform, params[i]);
        }
        m.set_atari_no_text(no_text);
        m.set_atari_disk_size(if big_disk { DiskSize::Kb360 } else { DiskSize::Kb180 });
        m.set_oric_quality(if noisy { ImageQuality::Noisy } else { ImageQuality::Clean });
        m.set_oric_dithering(dithering);
        m
    }
}

proptest! {
    #[test]
    fn write_then_read_is_identity(manifest in arb_manifest()) {
        let mut bytes = Vec::new();
        codec::write_to(&manifest, &mut bytes).unwrap();
        let loaded = codec::read_from(bytes.as_slice()).unwrap();
        prop_assert_eq!(loaded, manifest);
    }
}
