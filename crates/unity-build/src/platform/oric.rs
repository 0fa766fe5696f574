//! Oric Atmos: Sedoric disk built with `tap2dsk`.
//!
//! Every file on the disk needs an Oric tape header carrying its load
//! address. The bitmap, charset and chunk converters live next to the
//! `header` tool and run from `utils/scripts/oric`; the rest runs from the
//! project root.

use unity_manifest::{ImageQuality, Manifest, Platform};

use crate::compiler::{require_sprite_params, src, BuildContext, LibraryRecipe, PlatformCompiler};
use crate::plan::{EntryField, Fragment, Invocation, Item, PhaseWriter, Step, Text};
use crate::toolchain::Toolchain;
use crate::BuildResult;

const C_UNITS: &[&str] = &[
    "bitmap.c",
    "charmap.c",
    "chunks.c",
    "geom2d.c",
    "hub.c",
    "joystick.c",
    "mouse.c",
    "music.c",
    "net-base.c",
    "net-url.c",
    "net-tcp.c",
    "net-udp.c",
    "net-web.c",
    "pixel.c",
    "print.c",
    "scaling.c",
    "sfx.c",
    "sprites.c",
    "widgets.c",
    "Oric/directory.c",
    "Oric/files.c",
];

const S_UNITS: &[&str] = &[
    "atan2.s",
    "chars.s",
    "Oric/blit.s",
    "Oric/paseIJK.s",
    "Oric/keyboard.s",
    "Oric/scroll.s",
    "Oric/sedoric.s",
    "Oric/MYM.s",
];

/// Load addresses.
const SCREEN: &str = "$A000";
const SPRITES: &str = "$7800";
const MUSIC: &str = "$8000";
const CHUNK: &str = "$8000";
const PROGRAM: &str = "$0501";

pub struct Oric;

/// Where the converters run.
fn tools_dir(ctx: &BuildContext<'_>) -> String {
    ctx.toolchain.script("oric")
}

/// Rebase a project-relative path for a step running in the tools directory.
fn up(ctx: &BuildContext<'_>, path: &str) -> String {
    Toolchain::from_dir(&tools_dir(ctx), path)
}

/// `header` run from the tools directory.
fn local_header(ctx: &BuildContext<'_>) -> Invocation {
    Invocation::new("./header").in_dir(tools_dir(ctx))
}

/// An interpreter run from the tools directory.
fn local(ctx: &BuildContext<'_>, program: &str) -> Invocation {
    let dir = tools_dir(ctx);
    Invocation::new(Toolchain::program_from(&dir, program)).in_dir(dir)
}

/// `header` run from the project root.
fn header(ctx: &BuildContext<'_>) -> Invocation {
    Invocation::new(ctx.toolchain.script("oric/header"))
}

fn dithering(ctx: &BuildContext<'_>) -> String {
    ctx.manifest.oric_options().dithering.to_string()
}

impl PlatformCompiler for Oric {
    fn platform(&self) -> Platform {
        Platform::Oric
    }

    fn validate(&self, manifest: &Manifest) -> BuildResult<()> {
        require_sprite_params(manifest, Platform::Oric, |p| p.height > 0)
    }

    fn image(&self, ctx: &BuildContext<'_>) -> String {
        ctx.toolchain.build(&format!("{}-oric.dsk", ctx.disk()))
    }

    fn convert(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let index = ctx.index;
        let options = ctx.manifest.oric_options();

        for bitmap in index.bitmaps() {
            let raw = up(ctx, &ctx.out(&format!("{}.dat", bitmap.stem)));
            let converter = match options.quality {
                ImageQuality::Noisy => local(ctx, &tc.luajit)
                    .arg("PictOric.lua")
                    .arg(dithering(ctx)),
                ImageQuality::Clean => local(ctx, &tc.python).arg("OricBitmap.py"),
            };
            out.run(
                converter
                    .arg(up(ctx, bitmap.source.as_str()))
                    .arg(raw.clone()),
            );
            out.run(
                local_header(ctx)
                    .arg("-a0")
                    .arg(raw)
                    .arg(up(ctx, &ctx.out(&format!("{}.img", bitmap.stem))))
                    .arg(SCREEN),
            );
        }
        if let Some(charset) = index.charset() {
            let data = up(ctx, &ctx.out(&format!("{}.dat", charset.stem)));
            out.run(
                local(ctx, &tc.python)
                    .arg("OricCharset.py")
                    .arg(dithering(ctx))
                    .arg(up(ctx, charset.source.as_str()))
                    .arg(data.clone()),
            );
            out.run(local_header(ctx).arg("-a0").arg(data.clone()).arg(data).arg(SCREEN));
        }
        if let Some(chunks) = index.chunks() {
            out.run(
                local(ctx, &tc.python)
                    .arg("ProcessChunks.py")
                    .arg(options.quality.label())
                    .arg(dithering(ctx))
                    .arg(up(ctx, chunks.source.as_str()))
                    .arg(up(ctx, &format!("{}/", ctx.dir()))),
            );
            let entry = Text::lit(up(ctx, "")).push(Fragment::Entry(EntryField::Path));
            out.push(Step::ForEachListed {
                list: chunks.list.clone(),
                step: Box::new(Step::run(
                    local_header(ctx)
                        .arg("-a0")
                        .arg(entry.clone())
                        .arg(entry)
                        .arg(CHUNK),
                )),
            });
        }

        for charmap in index.charmaps() {
            out.run(
                header(ctx)
                    .arg("-a0")
                    .arg(src(&charmap.source))
                    .arg(ctx.out(&charmap.stem))
                    .arg(SCREEN),
            );
        }
        if let Some(sprites) = index.sprites() {
            let data = ctx.out("sprites.dat");
            out.run(
                ctx.python(tc.script("oric/OricSprites.py"))
                    .arg(src(sprites))
                    .arg(data.clone())
                    .arg(index.sprite_params().height.to_string()),
            );
            out.run(header(ctx).arg("-a0").arg(data.clone()).arg(data).arg(SPRITES));
        }
        for track in index.music() {
            let data = ctx.out(&format!("{}.mus", track.stem));
            out.run(
                Invocation::new(tc.script("oric/ym2mym"))
                    .arg(src(&track.source))
                    .arg(data.clone()),
            );
            out.run(
                header(ctx)
                    .args(["-h1", "-a0"])
                    .arg(data.clone())
                    .arg(data)
                    .arg(MUSIC),
            );
        }
        for file in index.shared() {
            out.run(
                header(ctx)
                    .arg("-a0")
                    .arg(src(&file.source))
                    .arg(ctx.out(&file.stem))
                    .arg(SCREEN),
            );
        }
    }

    fn library(&self, _ctx: &BuildContext<'_>) -> LibraryRecipe {
        LibraryRecipe {
            target: "atmos",
            cc_flags: Vec::new(),
            asm_flags: Vec::new(),
            c_units: C_UNITS,
            s_units: S_UNITS,
        }
    }

    fn link(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let program = ctx.out(&format!("{}.bin", ctx.program()));
        let com = ctx.out(&format!("{}.com", ctx.program()));
        let map = tc.build(&format!("{}-oric.map", ctx.program()));

        out.run(
            ctx.cl65(program.clone(), map, "atmos")
                .args(["-C".to_owned(), tc.unity("Oric/oric.cfg"), "-I".to_owned()])
                .arg(tc.unity_dir.clone())
                .args(ctx.code())
                .arg(ctx.out("unity.lib")),
        );
        out.run(header(ctx).arg(program).arg(com.clone()).arg(PROGRAM));
        out.run(
            Invocation::new(&tc.exomizer)
                .args(["sfx", "bin"])
                .arg(com)
                .arg("-o")
                .arg(ctx.out("launch.com")),
        );
    }

    fn pack(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let index = ctx.index;
        let image = self.image(ctx);

        let mut tap2dsk = Invocation::new(ctx.toolchain.script("oric/tap2dsk"))
            .arg("-iLAUNCH.COM")
            .arg(ctx.out("launch.com"));
        if index.sprites().is_some() {
            tap2dsk = tap2dsk.arg(ctx.out("sprites.dat"));
        }
        tap2dsk = tap2dsk
            .args(index.bitmaps().iter().map(|b| ctx.out(&format!("{}.img", b.stem))))
            .args(index.charset().map(|c| ctx.out(&format!("{}.dat", c.stem))))
            .args(index.charmaps().iter().map(|m| ctx.out(&m.stem)))
            .args(index.music().iter().map(|t| ctx.out(&format!("{}.mus", t.stem))))
            .args(index.shared().iter().map(|s| ctx.out(&s.stem)));
        if let Some(chunks) = index.chunks() {
            tap2dsk = tap2dsk.arg(Item::PerEntry {
                list: chunks.list.clone(),
                each: vec![Text::entry(EntryField::Path)],
            });
        }
        out.run(tap2dsk.arg(image.clone()));
        out.run(Invocation::new(ctx.toolchain.script("oric/old2mfm")).arg(image));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_platform;
    use crate::plan::{Command, Phase, SimulatedEnv};
    use unity_manifest::{AssetPath, AssetSlot};

    fn atmos() -> Manifest {
        let mut m = Manifest::new();
        m.set_disk_name("Atmos");
        m.add(AssetSlot::Code, AssetPath::new("src/main.c"));
        m.add(AssetSlot::Bitmap(Platform::Oric), AssetPath::new("gfx/title-oric.png"));
        m
    }

    fn first_convert(m: &Manifest) -> Invocation {
        let plans = compile_platform(Platform::Oric, m, &Toolchain::default()).unwrap();
        let inv = plans[0]
            .phase(Phase::Convert)
            .find_map(Step::invocation)
            .unwrap()
            .clone();
        inv
    }

    #[test]
    fn relative_interpreters_resolve_from_the_tools_dir() {
        let toolchain = Toolchain {
            python: "utils/py27/python".into(),
            luajit: "utils/luajit/luajit".into(),
            ..Toolchain::default()
        };
        let mut m = atmos();
        let convert = |m: &Manifest| {
            compile_platform(Platform::Oric, m, &toolchain).unwrap()[0]
                .phase(Phase::Convert)
                .find_map(Step::invocation)
                .unwrap()
                .clone()
        };

        let bitmap = convert(&m);
        assert_eq!(bitmap.program, "../../../utils/py27/python");
        assert_eq!(bitmap.dir.as_deref(), Some("utils/scripts/oric"));

        m.set_oric_quality(ImageQuality::Noisy);
        let bitmap = convert(&m);
        assert_eq!(bitmap.program, "../../../utils/luajit/luajit");
    }

    #[test]
    fn clean_bitmaps_use_the_python_converter() {
        let inv = first_convert(&atmos());
        assert_eq!(inv.program, "python");
        assert_eq!(inv.dir.as_deref(), Some("utils/scripts/oric"));
        assert_eq!(
            inv.literal_args(),
            [
                "OricBitmap.py",
                "../../../gfx/title-oric.png",
                "../../../build/oric/title.dat"
            ]
        );
    }

    #[test]
    fn noisy_bitmaps_are_dithered() {
        let mut m = atmos();
        m.set_oric_quality(ImageQuality::Noisy);
        m.set_oric_dithering(0.25);
        let inv = first_convert(&m);
        assert_eq!(inv.program, "luajit");
        assert_eq!(inv.literal_args()[..2], ["PictOric.lua", "0.25"]);
    }

    #[test]
    fn chunk_entries_are_headed_in_place() {
        let mut m = atmos();
        m.add(AssetSlot::Chunks(Platform::Oric), AssetPath::new("chunks.txt"));
        let plans = compile_platform(Platform::Oric, &m, &Toolchain::default()).unwrap();
        let env = SimulatedEnv::new().with_list("build/oric/chunks.lst", ["build/oric/c0.chk"]);

        let commands: Vec<_> = plans[0].resolve(&env).into_iter().map(|(_, c)| c).collect();
        assert!(commands.contains(&Command::Run {
            program: "./header".into(),
            args: vec![
                "-a0".into(),
                "../../../build/oric/c0.chk".into(),
                "../../../build/oric/c0.chk".into(),
                "$8000".into()
            ],
            dir: Some("utils/scripts/oric".into()),
            stdin: None,
        }));

        let pack: Vec<_> = plans[0]
            .phase(Phase::Pack)
            .flat_map(|s| s.resolve(&env))
            .collect();
        match &pack[0] {
            Command::Run { args, .. } => assert_eq!(
                args,
                &[
                    "-iLAUNCH.COM",
                    "build/oric/launch.com",
                    "build/oric/title.img",
                    "build/oric/c0.chk",
                    "build/Atmos-oric.dsk"
                ]
            ),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            pack[1],
            Command::run("utils/scripts/oric/old2mfm", ["build/Atmos-oric.dsk"])
        );
    }

    #[test]
    fn program_is_reheaded_then_compressed() {
        let plans = compile_platform(Platform::Oric, &atmos(), &Toolchain::default()).unwrap();
        let link: Vec<_> = plans[0]
            .phase(Phase::Link)
            .filter_map(Step::invocation)
            .map(Invocation::literal_args)
            .collect();
        assert_eq!(link[1], ["build/oric/atmos.bin", "build/oric/atmos.com", "$0501"]);
        assert_eq!(link[2], ["sfx", "bin", "build/oric/atmos.com", "-o", "build/oric/launch.com"]);
    }
}
