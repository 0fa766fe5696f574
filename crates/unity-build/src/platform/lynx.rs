//! Atari Lynx: everything is linked into a single cartridge image.
//!
//! Conversion runs inside `build/lynx`, because the sprite packer writes its
//! output next to its input. Paths handed to those steps are rebased with
//! [`Toolchain::from_dir`]; copies stay project-relative.

use unity_manifest::{Manifest, Platform};

use crate::compiler::{require_sprite_params, src, BuildContext, LibraryRecipe, PlatformCompiler};
use crate::plan::{Fragment, Invocation, PhaseWriter, Step, Text};
use crate::resource_table;
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
    "Lynx/display.c",
    "Lynx/files.c",
];

const S_UNITS: &[&str] = &[
    "atan2.s",
    "chars.s",
    "Lynx/header.s",
    "Lynx/serial.s",
    "Lynx/suzy.s",
];

const SPRPCK: [&str; 3] = ["-t6", "-p2", "-u"];

/// Charset sheets: 4 rows of 32 cells, 4x6 pixels each.
const CHARSET_LAYOUT: [&str; 3] = ["-r032004", "-S004006", "-a000000"];

pub struct Lynx;

/// Rebase a project-relative path for a step running in `build/lynx`.
fn up(ctx: &BuildContext<'_>, path: &str) -> String {
    Toolchain::from_dir(&ctx.dir(), path)
}

/// A program run from inside `build/lynx`.
fn local(ctx: &BuildContext<'_>, program: &str) -> Invocation {
    Invocation::new(Toolchain::program_from(&ctx.dir(), program)).in_dir(ctx.dir())
}

fn local_python(ctx: &BuildContext<'_>, script: &str) -> Invocation {
    local(ctx, &ctx.toolchain.python).arg(up(ctx, &ctx.toolchain.script(script)))
}

/// Copy a PNG into the work directory and pack it as a sprite.
fn pack_sprite(
    ctx: &BuildContext<'_>,
    out: &mut PhaseWriter<'_>,
    from: String,
    name: &str,
    layout: &[String],
) {
    let tc = ctx.toolchain;
    out.push(Step::copy(from, ctx.out(&format!("{name}.png"))));
    out.run(local(ctx, &tc.script("png2bmp")).arg(format!("{name}.png")));
    out.run(
        local(ctx, &tc.script("lynx/sprpck"))
            .args(SPRPCK)
            .args(layout.iter().cloned())
            .arg(format!("{name}.bmp")),
    );
}

/// `-r001FFF -SWWWHHH -aXXXYYY`: one row of frames, anchored at the centre.
fn sprite_layout(frames: u32, width: u32, height: u32) -> Vec<String> {
    vec![
        format!("-r001{frames:03}"),
        format!("-S{width:03}{height:03}"),
        format!("-a{:03}{:03}", width / 2, height / 2),
    ]
}

impl PlatformCompiler for Lynx {
    fn platform(&self) -> Platform {
        Platform::Lynx
    }

    fn validate(&self, manifest: &Manifest) -> BuildResult<()> {
        require_sprite_params(manifest, Platform::Lynx, |p| {
            p.frames > 0 && p.width > 0 && p.height > 0
        })
    }

    fn image(&self, ctx: &BuildContext<'_>) -> String {
        ctx.toolchain.build(&format!("{}-lynx.lnx", ctx.program()))
    }

    fn convert(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let index = ctx.index;

        for widget in ["cursor", "keyboard"] {
            let from = tc.script(&format!("lynx/{widget}.png"));
            pack_sprite(ctx, out, from, widget, &[]);
        }
        for bitmap in index.bitmaps() {
            pack_sprite(ctx, out, src(&bitmap.source), &bitmap.stem, &[]);
        }
        if let Some(charset) = index.charset() {
            let layout = CHARSET_LAYOUT.map(String::from);
            pack_sprite(ctx, out, src(&charset.source), "char", &layout);
            pack_sprite(ctx, out, tc.script("lynx/font.png"), "font", &layout);
            out.run(
                local_python(ctx, "lynx/LynxCharset.py")
                    .arg(up(ctx, charset.source.as_str()))
                    .arg("charset.dat"),
            );
        }
        if let Some(sprites) = index.sprites() {
            let p = index.sprite_params();
            let layout = sprite_layout(p.frames, p.width, p.height);
            pack_sprite(ctx, out, src(sprites), "sprites", &layout);
            if p.frames == 1 {
                out.push(Step::copy(ctx.out("sprites.spr"), ctx.out("sprites000000.spr")));
                out.push(Step::remove(ctx.out("sprites.spr")));
            }
        }
        for charmap in index.charmaps() {
            out.push(Step::copy(src(&charmap.source), ctx.out(&charmap.stem)));
        }
        if let Some(chunks) = index.chunks() {
            out.run(
                local_python(ctx, "ProcessChunks.py")
                    .arg("lynx")
                    .arg(up(ctx, chunks.source.as_str()))
                    .arg(up(ctx, &format!("{}/", ctx.dir()))),
            );
        }

        out.push(Step::copy(tc.unity("Lynx/chipper.s"), ctx.out("soundbs.mac")));
        for track in index.music() {
            out.run(
                local_python(ctx, "lynx/LynxChipper.py")
                    .arg(up(ctx, track.source.as_str()))
                    .arg(format!("music{:02}.asm", track.index))
                    .arg(track.symbol("Data"))
                    .arg(format!("MUS{}DATA", track.index)),
            );
        }
        for pattern in ["*.png", "*.bmp", "*.pal"] {
            out.push(Step::remove(ctx.out(pattern)));
        }
        for file in index.shared() {
            out.push(Step::copy(src(&file.source), ctx.out(&file.stem)));
        }

        let table = ctx.out("data.asm");
        out.push(Step::remove(table.clone()));
        out.push(Step::Emit {
            target: table,
            records: resource_table::records(index, tc),
        });

        // Segment layout and directory depend on the final chunk count.
        let chunk_count = match index.chunks() {
            Some(chunks) => Text::new(vec![chunks.count(0)]),
            None => Text::lit("0"),
        };
        let counts = |inv: Invocation| {
            inv.arg((index.bitmaps().len() + index.charmaps().len()).to_string())
                .arg(index.music().len().to_string())
                .arg(index.shared().len().to_string())
                .arg(chunk_count.clone())
        };
        out.run(counts(
            ctx.python(tc.script("lynx/LynxConfig.py"))
                .arg(tc.unity("Lynx/lynx.cfg"))
                .arg(ctx.out("lynx.cfg")),
        ));
        out.run(counts(
            ctx.python(tc.script("lynx/LynxDirectory.py"))
                .arg(tc.unity("Lynx/directory.s"))
                .arg(ctx.out("directory.asm")),
        ));
    }

    fn library(&self, _ctx: &BuildContext<'_>) -> LibraryRecipe {
        LibraryRecipe {
            target: "lynx",
            cc_flags: Vec::new(),
            asm_flags: vec!["--cpu", "65SC02"],
            c_units: C_UNITS,
            s_units: S_UNITS,
        }
    }

    fn link(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let map = tc.build(&format!("{}-lynx.map", ctx.program()));
        let music = ctx
            .index
            .music()
            .iter()
            .map(|track| ctx.out(&format!("music{:02}.asm", track.index)));

        out.run(
            ctx.cl65(self.image(ctx), map, "lynx")
                .args(["-C".to_owned(), ctx.out("lynx.cfg"), "-I".to_owned()])
                .arg(tc.unity_dir.clone())
                .args(ctx.code())
                .args(music)
                .arg(tc.unity("Lynx/sfx.s"))
                .arg(ctx.out("directory.asm"))
                .arg(ctx.out("data.asm"))
                .arg(ctx.out("unity.lib")),
        );
    }
}
