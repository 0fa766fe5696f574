//! End-to-end compilation scenarios and plan properties.

use proptest::prelude::*;

use unity_build::prelude::*;
use unity_manifest::prelude::*;

// -- helpers ---------------------------------------------------------------

fn demo() -> Manifest {
    let mut m = Manifest::new();
    m.set_disk_name("demo");
    m.add(AssetSlot::Code, AssetPath::new("main.c"));
    m
}

fn plans_for(platform: Platform, manifest: &Manifest) -> Vec<BuildPlan> {
    compile_platform(platform, manifest, &Toolchain::default()).unwrap()
}

fn mentions(inv: &Invocation, needle: &str) -> bool {
    inv.literal_args().iter().any(|a| a.contains(needle))
        || inv
            .stdin
            .as_ref()
            .and_then(Text::as_literal)
            .is_some_and(|s| s.contains(needle))
}

/// The records appended to `data.asm` when the plan is resolved in `env`.
fn lynx_table(plan: &BuildPlan, env: &SimulatedEnv) -> Vec<String> {
    plan.resolve(env)
        .into_iter()
        .find_map(|(_, command)| match command {
            Command::Append { target, records } if target.ends_with("data.asm") => Some(records),
            _ => None,
        })
        .expect("Lynx plan emits a resource table")
}

fn table_entries(records: &[String], prefix: &str) -> Vec<String> {
    let line = records
        .iter()
        .find(|r| r.starts_with(prefix))
        .unwrap_or_else(|| panic!("missing {prefix}"));
    line[prefix.len()..]
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

// -- scenarios -------------------------------------------------------------

#[test]
fn apple_bitmap_is_converted_and_written_once() {
    let mut m = demo();
    m.add(AssetSlot::Bitmap(Platform::Apple), AssetPath::new("art.png"));
    let plans = plans_for(Platform::Apple, &m);
    let plan = &plans[0];
    assert_eq!(plan.name, "demo-apple64k");

    let conversions: Vec<_> = plan
        .phase(Phase::Convert)
        .filter_map(Step::invocation)
        .filter(|inv| mentions(inv, "art.png"))
        .collect();
    assert_eq!(conversions.len(), 1);
    assert_eq!(
        conversions[0].literal_args(),
        [
            "utils/scripts/apple/AppleBitmap.py",
            "single",
            "art.png",
            "build/apple/art.png.img"
        ]
    );

    let writes: Vec<_> = plan
        .phase(Phase::Pack)
        .filter_map(Step::invocation)
        .filter(|inv| mentions(inv, "art.png.img"))
        .collect();
    assert_eq!(writes.len(), 1);
    // Without the `-apple.png` suffix the whole file name is the stem.
    assert!(writes[0].literal_args().contains(&"ART.PNG.IMG".to_owned()));
    assert_eq!(writes[0].stdin, Some(Text::lit("build/apple/art.png.img")));
}

#[test]
fn apple_double_hires_plan_uses_dhr_everywhere() {
    let mut m = demo();
    m.add(AssetSlot::Bitmap(Platform::Apple), AssetPath::new("art.png"));
    let plans = plans_for(Platform::Apple, &m);
    let plan = &plans[1];
    assert_eq!(plan.image, "build/demo-apple128k.do");

    let bitmap = plan.phase(Phase::Convert).find_map(Step::invocation).unwrap();
    assert_eq!(bitmap.literal_args()[1], "double");
    let link = plan.phase(Phase::Link).find_map(Step::invocation).unwrap();
    assert!(link.literal_args().windows(2).any(|w| w == ["-D", "__DHR__"]));
}

#[test]
fn c64_falls_back_to_original_track() {
    let mut m = demo();
    m.add(AssetSlot::Music(Platform::C64), AssetPath::new("music/tune-c64.sid"));
    let plans = plans_for(Platform::C64, &m);

    let failed = plans[0].resolve(&SimulatedEnv::new());
    let c1541 = failed
        .iter()
        .filter(|(phase, _)| *phase == Phase::Pack)
        .find_map(|(_, c)| match c {
            Command::Run { program, args, .. } if program.ends_with("c1541") => Some(args),
            _ => None,
        })
        .unwrap();
    assert!(c1541
        .windows(3)
        .any(|w| w == ["-write", "music/tune-c64.sid", "tune.mus"]));
    assert!(!failed
        .iter()
        .any(|(_, c)| matches!(c, Command::Run { program, .. } if program.ends_with("psid64"))));

    let relocated = SimulatedEnv::new().with_artifact("build/c64/tune.sid");
    let ok = plans[0].resolve(&relocated);
    assert!(ok
        .iter()
        .any(|(_, c)| matches!(c, Command::Run { program, .. } if program.ends_with("psid64"))));
}

#[test]
fn lynx_tables_have_matching_lengths_and_symbolic_count() {
    let mut m = demo();
    m.add(AssetSlot::Bitmap(Platform::Lynx), AssetPath::new("gfx/a-lynx.png"));
    m.add(AssetSlot::Bitmap(Platform::Lynx), AssetPath::new("gfx/b-lynx.png"));
    m.add(AssetSlot::Shared, AssetPath::new("data/scores.dat"));
    m.add(AssetSlot::Chunks(Platform::Lynx), AssetPath::new("gfx/chunks.txt"));
    let plans = plans_for(Platform::Lynx, &m);

    for chunks in [vec![], vec!["c0.chk"], vec!["c0.chk", "c1.chk", "c2.chk"]] {
        let env = SimulatedEnv::new().with_list("build/lynx/chunks.lst", chunks.clone());
        let records = lynx_table(&plans[0], &env);

        let sizes = table_entries(&records, "_fileSizes: .word ");
        let names = table_entries(&records, "_fileNames: .addr ");
        assert_eq!(sizes.len(), 3 + chunks.len());
        assert_eq!(names.len(), sizes.len());
        assert!(records.contains(&format!("_fileNum: .byte {}", 3 + chunks.len())));
    }
}

#[test]
fn atari_disk_size_and_text_mode_reach_the_tools() {
    let mut m = demo();
    m.set_atari_disk_size(DiskSize::Kb360);
    m.set_atari_no_text(true);
    let plans = plans_for(Platform::Atari, &m);

    let link = plans[0].phase(Phase::Link).find_map(Step::invocation).unwrap();
    assert!(link
        .literal_args()
        .contains(&"-D,__STACKSIZE__=$0400,-D,__CHARGENSIZE__=$0000".to_owned()));

    let dir2atr = plans[0]
        .phase(Phase::Pack)
        .filter_map(Step::invocation)
        .last()
        .unwrap();
    assert_eq!(
        dir2atr.literal_args(),
        [
            "-d",
            "-B",
            "utils/scripts/atari/xboot.obx",
            "1440",
            "build/demo-atari.atr",
            "build/atari"
        ]
    );
}

#[test]
fn invalid_manifests_produce_no_plan() {
    let mut m = Manifest::new();
    m.set_disk_name("demo");
    assert!(matches!(
        compile_all(&m, &Toolchain::default()),
        Err(ValidationError::NoCodeFiles { .. })
    ));

    let mut m = demo();
    m.add(AssetSlot::Sprites(Platform::Oric), AssetPath::new("s-oric.png"));
    m.set_sprite_params(Platform::Oric, SpriteParams::new(1, 8, 0));
    assert!(matches!(
        compile_platform(Platform::Oric, &m, &Toolchain::default()),
        Err(ValidationError::IncompleteSprites {
            platform: Platform::Oric,
            ..
        })
    ));
}

#[test]
fn custom_toolchain_locations_are_used() {
    let toolchain = Toolchain {
        cc65_bin: "/opt/cc65/bin".to_owned(),
        python: "python3".to_owned(),
        ..Toolchain::default()
    };
    let mut m = demo();
    m.add(AssetSlot::Bitmap(Platform::Lynx), AssetPath::new("gfx/a-lynx.png"));
    let plans = compile_platform(Platform::Lynx, &m, &toolchain).unwrap();

    let link = plans[0].phase(Phase::Link).find_map(Step::invocation).unwrap();
    assert_eq!(link.program, "/opt/cc65/bin/cl65");
    assert!(plans[0]
        .phase(Phase::Convert)
        .filter_map(Step::invocation)
        .any(|inv| inv.program == "python3"));
}

// -- properties ------------------------------------------------------------

fn arb_manifest() -> impl Strategy<Value = Manifest> {
    (
        "[A-Za-z][A-Za-z0-9]{0,7}",
        prop::collection::vec("[a-z]{1,6}", 1..4),
        prop::collection::vec((0usize..5, "[a-z]{1,6}"), 0..12),
        prop::bool::ANY,
    )
        .prop_map(|(disk, code, assets, chunks)| {
            let mut m = Manifest::new();
            m.set_disk_name(disk);
            for name in code {
                m.add(AssetSlot::Code, AssetPath::new(format!("src/{name}.c")));
            }
            for (i, name) in assets {
                let platform = Platform::ALL[i];
                let key = platform.key();
                m.add(
                    AssetSlot::Bitmap(platform),
                    AssetPath::new(format!("gfx/{name}-{key}.png")),
                );
                m.add(AssetSlot::Shared, AssetPath::new(format!("data/{name}.bin")));
                if chunks {
                    m.add(AssetSlot::Chunks(platform), AssetPath::new("gfx/chunks.txt"));
                }
            }
            m
        })
}

proptest! {
    #[test]
    fn plans_are_non_empty_ordered_and_deterministic(m in arb_manifest()) {
        let toolchain = Toolchain::default();
        let first = compile_all(&m, &toolchain).unwrap();
        let second = compile_all(&m, &toolchain).unwrap();

        prop_assert_eq!(first.len(), 6);
        for (a, b) in first.iter().zip(&second) {
            prop_assert!(!a.is_empty());
            prop_assert_eq!(a.fingerprint(), b.fingerprint());
            let phases: Vec<_> = a.steps().iter().map(|s| s.phase).collect();
            prop_assert!(phases.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn resource_indices_follow_input_order(m in arb_manifest()) {
        for platform in Platform::ALL {
            let index = ResourceIndex::build(&m, platform, &Toolchain::default());
            for (i, bitmap) in index.bitmaps().iter().enumerate() {
                prop_assert_eq!(bitmap.index, i);
                prop_assert_eq!(bitmap.name(), format!("bmp{i:02}"));
            }
            for (i, file) in index.shared().iter().enumerate() {
                prop_assert_eq!(file.index, i);
            }
        }
    }
}
