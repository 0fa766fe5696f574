//! Apple II: ProDOS disk, single (64k) or double (128k) hires.

use unity_manifest::{Manifest, Platform};

use crate::compiler::{require_sprite_params, src, BuildContext, LibraryRecipe, PlatformCompiler};
use crate::plan::{EntryField, Invocation, PhaseWriter, Step, Text};
use crate::BuildResult;

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
    "Apple/CLOCK.c",
    "Apple/directory.c",
    "Apple/files.c",
    "Apple/hires.c",
    "Apple/pixelDHR.c",
    "Apple/pixelSHR.c",
];

const S_UNITS: &[&str] = &[
    "atan2.s",
    "chars.s",
    "Apple/blitDHR.s",
    "Apple/blitSHR.s",
    "Apple/DUET.s",
    "Apple/hiresLines.s",
    "Apple/joystick.s",
    "Apple/MOCKING.s",
    "Apple/PADDLE.s",
    "Apple/prodos.s",
];

const LINK_SYMBOLS: &str = "-D,__STACKSIZE__=$0400,-D,__HIMEM__=$A800,-D,__LCADDR__=$D000,-D,__LCSIZE__=$1000";

pub struct Apple;

fn is_double(ctx: &BuildContext<'_>) -> bool {
    ctx.variant == "128k"
}

/// Graphics mode handed to the converters.
fn graphics(ctx: &BuildContext<'_>) -> &'static str {
    if is_double(ctx) {
        "double"
    } else {
        "single"
    }
}

impl Apple {
    /// One AppleCommander call against the image.
    fn commander(&self, ctx: &BuildContext<'_>) -> Invocation {
        Invocation::new(&ctx.toolchain.java)
            .arg("-jar")
            .arg(ctx.toolchain.script("apple/AppleCommander-1.6.0.jar"))
    }

    /// Put a binary file on the image under `name`, reading it from `file`.
    fn put(&self, ctx: &BuildContext<'_>, name: String, file: String) -> Step {
        Step::run(
            self.commander(ctx)
                .arg("-p")
                .arg(self.image(ctx))
                .arg(name)
                .arg("bin")
                .stdin(file),
        )
    }
}

impl PlatformCompiler for Apple {
    fn platform(&self) -> Platform {
        Platform::Apple
    }

    fn variants(&self) -> &'static [&'static str] {
        &["64k", "128k"]
    }

    fn validate(&self, manifest: &Manifest) -> BuildResult<()> {
        require_sprite_params(manifest, Platform::Apple, |p| p.height > 0)
    }

    fn image(&self, ctx: &BuildContext<'_>) -> String {
        ctx.toolchain
            .build(&format!("{}-apple{}.do", ctx.disk(), ctx.variant))
    }

    fn convert(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let mode = graphics(ctx);
        let index = ctx.index;

        for bitmap in index.bitmaps() {
            out.run(
                ctx.python(tc.script("apple/AppleBitmap.py"))
                    .arg(mode)
                    .arg(src(&bitmap.source))
                    .arg(ctx.out(&format!("{}.img", bitmap.stem))),
            );
        }
        if let Some(charset) = index.charset() {
            out.run(
                ctx.python(tc.script("apple/AppleCharset.py"))
                    .arg(mode)
                    .arg(src(&charset.source))
                    .arg(ctx.out(&format!("{}.dat", charset.stem))),
            );
        }
        if let Some(sprites) = index.sprites() {
            out.run(
                ctx.python(tc.script("apple/AppleSprites.py"))
                    .arg(mode)
                    .arg(src(sprites))
                    .arg(ctx.out("sprites.dat"))
                    .arg(index.sprite_params().height.to_string()),
            );
        }
        if let Some(chunks) = index.chunks() {
            out.run(
                ctx.python(tc.script("ProcessChunks.py"))
                    .arg(format!("apple-{mode}"))
                    .arg(src(&chunks.source))
                    .arg(format!("{}/", ctx.dir())),
            );
        }
    }

    fn library(&self, ctx: &BuildContext<'_>) -> LibraryRecipe {
        LibraryRecipe {
            target: "apple2",
            cc_flags: if is_double(ctx) {
                vec!["-D", "__DHR__"]
            } else {
                Vec::new()
            },
            asm_flags: Vec::new(),
            c_units: C_UNITS,
            s_units: S_UNITS,
        }
    }

    fn link(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let program = ctx.out(&format!("{}.bin", ctx.program()));
        let map = tc.build(&format!("{}-apple{}.map", ctx.program(), ctx.variant));

        let mut link = ctx.cl65(program.clone(), map, "apple2");
        if is_double(ctx) {
            link = link.args(["-D", "__DHR__"]);
        }
        out.run(
            link.args(["-Wl", LINK_SYMBOLS, "-C", "apple2-hgr.cfg", "-I"])
                .arg(tc.unity_dir.clone())
                .args(ctx.code())
                .arg(ctx.out("unity.lib"))
                .arg(tc.unity("IP65/ip65_tcp.lib"))
                .arg(tc.unity("IP65/ip65_apple2.lib")),
        );
        out.run(
            Invocation::new(&tc.exomizer)
                .args(["sfx", "bin"])
                .arg(program)
                .arg("-o")
                .arg(ctx.out("loader")),
        );
    }

    fn pack(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let index = ctx.index;
        let image = self.image(ctx);

        out.push(Step::copy(
            ctx.toolchain.script("apple/ProDOS190.dsk"),
            image.clone(),
        ));
        out.run(
            self.commander(ctx)
                .arg("-as")
                .arg(image)
                .args(["LOADER", "bin", "0x0803"])
                .stdin(ctx.out("loader")),
        );
        if index.sprites().is_some() {
            out.push(self.put(ctx, "SPRITES.DAT".to_owned(), ctx.out("sprites.dat")));
        }
        for bitmap in index.bitmaps() {
            let name = format!("{}.IMG", bitmap.stem.to_uppercase());
            out.push(self.put(ctx, name, ctx.out(&format!("{}.img", bitmap.stem))));
        }
        if let Some(charset) = index.charset() {
            let name = format!("{}.DAT", charset.stem.to_uppercase());
            out.push(self.put(ctx, name, ctx.out(&format!("{}.dat", charset.stem))));
        }
        for charmap in index.charmaps() {
            let name = format!("{}.MAP", charmap.stem.to_uppercase());
            out.push(self.put(ctx, name, src(&charmap.source)));
        }
        for track in index.music() {
            let name = format!("{}.MUS", track.stem.to_uppercase());
            out.push(self.put(ctx, name, src(&track.source)));
        }
        for file in index.shared() {
            out.push(self.put(ctx, file.stem.to_uppercase(), src(&file.source)));
        }
        if let Some(chunks) = index.chunks() {
            out.push(Step::ForEachListed {
                list: chunks.list.clone(),
                step: Box::new(Step::run(
                    self.commander(ctx)
                        .arg("-p")
                        .arg(self.image(ctx))
                        .arg(Text::entry(EntryField::FileName))
                        .arg("bin")
                        .stdin(Text::entry(EntryField::Path)),
                )),
            });
        }
    }
}
