//! Atari XL: xBIOS boot disk in ATR format.

use unity_manifest::{Manifest, Platform};

use crate::compiler::{require_sprite_params, src, BuildContext, LibraryRecipe, PlatformCompiler};
use crate::plan::{Invocation, PhaseWriter, Step};
use crate::BuildResult;

const C_UNITS: &[&str] = &[
    "bitmap.c",
    "charmap.c",
    "chunks.c",
    "geom2d.c",
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
    "Atari/directory.c",
    "Atari/files.c",
];

const S_UNITS: &[&str] = &[
    "atan2.s",
    "chars.s",
    "Atari/DLI.s",
    "Atari/ROM.s",
    "Atari/xbios.s",
];

pub struct Atari;

impl PlatformCompiler for Atari {
    fn platform(&self) -> Platform {
        Platform::Atari
    }

    fn validate(&self, manifest: &Manifest) -> BuildResult<()> {
        require_sprite_params(manifest, Platform::Atari, |p| p.height > 0)
    }

    fn image(&self, ctx: &BuildContext<'_>) -> String {
        ctx.toolchain.build(&format!("{}-atari.atr", ctx.disk()))
    }

    fn convert(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let index = ctx.index;

        for bitmap in index.bitmaps() {
            out.run(
                ctx.python(tc.script("atari/AtariBitmap.py"))
                    .arg(src(&bitmap.source))
                    .arg(ctx.out(&format!("{}.img", bitmap.stem))),
            );
        }
        for charmap in index.charmaps() {
            out.push(Step::copy(
                src(&charmap.source),
                ctx.out(charmap.source.file_name()),
            ));
        }
        if let Some(charset) = index.charset() {
            out.run(
                ctx.python(tc.script("atari/AtariCharset.py"))
                    .arg(src(&charset.source))
                    .arg(ctx.out(&format!("{}.dat", charset.stem))),
            );
        }
        if let Some(sprites) = index.sprites() {
            out.run(
                ctx.python(tc.script("atari/AtariSprites.py"))
                    .arg(src(sprites))
                    .arg(ctx.out("sprites.dat"))
                    .arg(index.sprite_params().height.to_string()),
            );
        }
        if let Some(chunks) = index.chunks() {
            out.run(
                ctx.python(tc.script("ProcessChunks.py"))
                    .arg("atari")
                    .arg(src(&chunks.source))
                    .arg(format!("{}/", ctx.dir())),
            );
        }
        for file in index.shared() {
            out.push(Step::copy(src(&file.source), ctx.out(file.source.file_name())));
        }
        for track in index.music() {
            out.push(Step::copy(
                src(&track.source),
                ctx.out(&format!("{}.mus", track.stem)),
            ));
        }
    }

    fn library(&self, _ctx: &BuildContext<'_>) -> LibraryRecipe {
        LibraryRecipe {
            target: "atarixl",
            cc_flags: Vec::new(),
            asm_flags: Vec::new(),
            c_units: C_UNITS,
            s_units: S_UNITS,
        }
    }

    fn link(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let program = ctx.out(&format!("{}.bin", ctx.program()));
        let map = tc.build(&format!("{}-atari.map", ctx.program()));
        let symbols = if ctx.manifest.atari_options().no_text {
            "-D,__STACKSIZE__=$0400,-D,__CHARGENSIZE__=$0000"
        } else {
            "-D,__STACKSIZE__=$0400"
        };

        out.run(
            ctx.cl65(program.clone(), map, "atarixl")
                .args(["-Wl", symbols, "-C", "atarixl-largehimem.cfg", "-I"])
                .arg(tc.unity_dir.clone())
                .args(ctx.code())
                .arg(tc.unity("Atari/POKEY.s"))
                .arg(ctx.out("unity.lib"))
                .arg(tc.unity("IP65/ip65_tcp.lib"))
                .arg(tc.unity("IP65/ip65_atarixl.lib")),
        );
        out.run(
            Invocation::new(tc.cc65("cl65"))
                .args(["-t", "atarixl", "-C", "atari-asm.cfg", "-o"])
                .arg(ctx.out("basicoff.bin"))
                .arg(tc.unity("Atari/BASICOFF.s")),
        );
        out.run(
            Invocation::new(tc.script("atari/mads"))
                .arg(format!("-o:{}", ctx.out("rmt.bin")))
                .arg(tc.unity("Atari/RMT.a65")),
        );
        out.run(
            ctx.python(tc.script("atari/AtariMerge.py"))
                .arg(ctx.out("xautorun"))
                .arg(ctx.out("basicoff.bin"))
                .arg(program)
                .arg(ctx.out("rmt.bin")),
        );
    }

    fn pack(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        for pattern in ["*.bin", "*.lib", "*.lst"] {
            out.push(Step::remove(ctx.out(pattern)));
        }
        out.push(Step::copy(tc.script("atari/xbios.com"), ctx.out("autorun")));
        out.push(Step::copy(tc.script("atari/xbios.cfg"), ctx.out("xbios.cfg")));
        out.run(
            Invocation::new(tc.script("atari/dir2atr"))
                .args(["-d", "-B"])
                .arg(tc.script("atari/xboot.obx"))
                .arg(ctx.manifest.atari_options().disk_size.sectors().to_string())
                .arg(self.image(ctx))
                .arg(ctx.dir()),
        );
    }
}
