//! Commodore 64: exomized loader on a D64 image.
//!
//! Music goes through `sidreloc`, which gives up on some tunes. Whether it
//! produced a relocated `.sid` is only known at build time, so the converted
//! `.prg` and the disk entry for each track are both conditional on that file.

use unity_manifest::Platform;

use crate::compiler::{src, BuildContext, LibraryRecipe, PlatformCompiler};
use crate::index::Resource;
use crate::plan::{EntryField, Invocation, Item, PhaseWriter, Step, Text};

const C_UNITS: &[&str] = &[
    "bitmap.c",
    "charmap.c",
    "chunks.c",
    "geom2d.c",
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
    "C64/directory.c",
    "C64/VIC2.c",
];

const S_UNITS: &[&str] = &[
    "atan2.s",
    "chars.s",
    "C64/joystick.s",
    "C64/ROM.s",
    "C64/SID.s",
];

pub struct C64;

/// The relocated tune, present only if `sidreloc` succeeded.
fn relocated(ctx: &BuildContext<'_>, track: &Resource) -> String {
    ctx.out(&format!("{}.sid", track.stem))
}

impl PlatformCompiler for C64 {
    fn platform(&self) -> Platform {
        Platform::C64
    }

    fn image(&self, ctx: &BuildContext<'_>) -> String {
        ctx.toolchain.build(&format!("{}-c64.d64", ctx.disk()))
    }

    fn convert(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let index = ctx.index;

        for bitmap in index.bitmaps() {
            out.run(
                ctx.python(tc.script("c64/C64Bitmap.py"))
                    .arg(src(&bitmap.source))
                    .arg(ctx.out(&format!("{}.img", bitmap.stem))),
            );
        }
        if let Some(charset) = index.charset() {
            out.run(
                ctx.python(tc.script("c64/C64Charset.py"))
                    .arg(src(&charset.source))
                    .arg(ctx.out(&format!("{}.dat", charset.stem))),
            );
        }
        if let Some(sprites) = index.sprites() {
            out.run(
                ctx.python(tc.script("c64/C64Sprites.py"))
                    .arg(src(sprites))
                    .arg(ctx.out("sprites.dat")),
            );
        }
        if let Some(chunks) = index.chunks() {
            out.run(
                ctx.python(tc.script("ProcessChunks.py"))
                    .arg("c64")
                    .arg(src(&chunks.source))
                    .arg(format!("{}/", ctx.dir())),
            );
        }
        for track in index.music() {
            let sid = relocated(ctx, track);
            out.run(
                Invocation::new(tc.script("c64/sidreloc"))
                    .args(["-v", "-z", "30-ff", "-p", "08"])
                    .arg(src(&track.source))
                    .arg(sid.clone()),
            );
            out.push(Step::IfPresent {
                artifact: sid.clone(),
                then: vec![Step::run(
                    Invocation::new(tc.script("c64/psid64")).arg("-n").arg(sid),
                )],
                otherwise: Vec::new(),
            });
        }
    }

    fn library(&self, _ctx: &BuildContext<'_>) -> LibraryRecipe {
        LibraryRecipe {
            target: "c64",
            cc_flags: Vec::new(),
            asm_flags: Vec::new(),
            c_units: C_UNITS,
            s_units: S_UNITS,
        }
    }

    fn link(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let program = ctx.out(&format!("{}.bin", ctx.program()));
        let map = tc.build(&format!("{}-c64.map", ctx.program()));

        out.run(
            ctx.cl65(program.clone(), map, "c64")
                .args(["-C".to_owned(), tc.unity("C64/c64.cfg"), "-I".to_owned()])
                .arg(tc.unity_dir.clone())
                .args(ctx.code())
                .arg(ctx.out("unity.lib"))
                .arg(tc.unity("IP65/ip65_tcp.lib"))
                .arg(tc.unity("IP65/ip65_c64.lib")),
        );

        // Sprites ride along in the self-extractor.
        let mut compress = Invocation::new(&tc.exomizer).args(["sfx", "$180d"]).arg(program);
        if ctx.index.sprites().is_some() {
            compress = compress.arg(ctx.out("sprites.dat"));
        }
        out.run(compress.arg("-o").arg(ctx.out("loader.prg")));
    }

    fn pack(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let index = ctx.index;
        let image = self.image(ctx);

        let mut c1541 = Invocation::new(ctx.toolchain.script("c64/c1541"))
            .args(["-format", "loader,666", "d64"])
            .arg(image.clone())
            .arg("-attach")
            .arg(image)
            .args(["-write".to_owned(), ctx.out("loader.prg"), "loader.prg".to_owned()]);

        for bitmap in index.bitmaps() {
            let file = format!("{}.img", bitmap.stem);
            c1541 = c1541.args(["-write".to_owned(), ctx.out(&file), file]);
        }
        if let Some(charset) = index.charset() {
            let file = format!("{}.dat", charset.stem);
            c1541 = c1541.args(["-write".to_owned(), ctx.out(&file), file]);
        }
        for charmap in index.charmaps() {
            c1541 = c1541.args(["-write".to_owned(), src(&charmap.source), charmap.stem.clone()]);
        }
        for track in index.music() {
            let name = format!("{}.mus", track.stem);
            c1541 = c1541.arg(Item::IfPresent {
                artifact: relocated(ctx, track),
                then: vec![
                    Text::lit("-write"),
                    Text::lit(ctx.out(&format!("{}.prg", track.stem))),
                    Text::lit(name.clone()),
                ],
                otherwise: vec![
                    Text::lit("-write"),
                    Text::lit(src(&track.source)),
                    Text::lit(name),
                ],
            });
        }
        for file in index.shared() {
            c1541 = c1541.args(["-write".to_owned(), src(&file.source), file.stem.clone()]);
        }
        if let Some(chunks) = index.chunks() {
            c1541 = c1541.arg(Item::PerEntry {
                list: chunks.list.clone(),
                each: vec![
                    Text::lit("-write"),
                    Text::entry(EntryField::Path),
                    Text::entry(EntryField::FileName),
                ],
            });
        }
        out.run(c1541);
    }
}
