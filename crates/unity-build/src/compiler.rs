//! The four-phase compile skeleton shared by every platform.
//!
//! A [`PlatformCompiler`] only describes what is specific to its machine:
//! which converters run, the runtime library recipe, the link line and how
//! the disk image is assembled. [`compile`] validates the manifest, indexes
//! the platform's resources and walks the phases in order, so every plan has
//! the same shape and phase tags never decrease.

use unity_manifest::{AssetPath, Manifest, Platform};

use crate::index::ResourceIndex;
use crate::plan::{BuildPlan, Invocation, Phase, PhaseWriter, Step};
use crate::platform::{Apple, Atari, Lynx, Oric, C64};
use crate::toolchain::Toolchain;
use crate::{validate, BuildResult, ValidationError};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a platform compiler reads while filling one plan.
pub struct BuildContext<'a> {
    pub manifest: &'a Manifest,
    pub toolchain: &'a Toolchain,
    pub index: &'a ResourceIndex,
    /// Image variant being compiled, empty for single-image platforms.
    pub variant: &'static str,
}

impl BuildContext<'_> {
    pub fn platform(&self) -> Platform {
        self.index.platform
    }

    /// The disk name as entered. Used for image file names.
    pub fn disk(&self) -> &str {
        self.manifest.disk_name()
    }

    /// The lowercased disk name. Used for program and map file names.
    pub fn program(&self) -> String {
        self.manifest.disk_name().to_lowercase()
    }

    /// `build/<platform>`.
    pub fn dir(&self) -> String {
        self.toolchain.platform_dir(self.platform())
    }

    /// A file in `build/<platform>`.
    pub fn out(&self, file: &str) -> String {
        self.toolchain.platform_file(self.platform(), file)
    }

    /// A python converter invocation.
    pub fn python(&self, script: impl Into<String>) -> Invocation {
        Invocation::new(&self.toolchain.python).arg(script.into())
    }

    /// The C sources, in manifest order.
    pub fn code(&self) -> impl Iterator<Item = String> + '_ {
        self.manifest.code_files().iter().map(|p| p.as_str().to_owned())
    }

    /// `cl65 -o <output> -m <map> -Cl -O -t <target>`, the common head of
    /// every link line.
    pub fn cl65(&self, output: String, map: String, target: &str) -> Invocation {
        Invocation::new(self.toolchain.cc65("cl65"))
            .args(["-o".to_owned(), output, "-m".to_owned(), map])
            .args(["-Cl", "-O", "-t", target])
    }
}

/// Source path of a manifest asset, as a plain argument.
pub(crate) fn src(path: &AssetPath) -> String {
    path.as_str().to_owned()
}

// ---------------------------------------------------------------------------
// Library recipe
// ---------------------------------------------------------------------------

/// How the shared runtime library is built for one platform.
#[derive(Debug, Clone)]
pub struct LibraryRecipe {
    /// cc65 target name.
    pub target: &'static str,
    /// Extra flags for the C compiler, placed after the target.
    pub cc_flags: Vec<&'static str>,
    /// Extra flags for the assembler.
    pub asm_flags: Vec<&'static str>,
    /// C units, relative to the unity directory.
    pub c_units: &'static [&'static str],
    /// Assembly units, relative to the unity directory.
    pub s_units: &'static [&'static str],
}

impl LibraryRecipe {
    fn write(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>) {
        let tc = ctx.toolchain;
        let mut objects = Vec::with_capacity(self.c_units.len() + self.s_units.len());

        for unit in self.c_units {
            let stem = unit.trim_end_matches(".c");
            let asm = tc.unity(&format!("{stem}.s"));
            out.run(
                Invocation::new(tc.cc65("cc65"))
                    .args(["-Cl", "-O", "-t", self.target])
                    .args(self.cc_flags.iter().copied())
                    .args(["-I".to_owned(), tc.unity_dir.clone(), tc.unity(unit)]),
            );
            out.run(
                Invocation::new(tc.cc65("ca65"))
                    .args(self.asm_flags.iter().copied())
                    .arg(asm.clone()),
            );
            out.push(Step::remove(asm));
            objects.push(tc.unity(&format!("{stem}.o")));
        }
        for unit in self.s_units {
            out.run(
                Invocation::new(tc.cc65("ca65"))
                    .args(self.asm_flags.iter().copied())
                    .arg(tc.unity(unit)),
            );
            objects.push(tc.unity(&format!("{}.o", unit.trim_end_matches(".s"))));
        }
        out.run(
            Invocation::new(tc.cc65("ar65"))
                .args(["r".to_owned(), ctx.out("unity.lib")])
                .args(objects),
        );
    }
}

// ---------------------------------------------------------------------------
// PlatformCompiler
// ---------------------------------------------------------------------------

/// The platform-specific part of a build.
pub trait PlatformCompiler {
    fn platform(&self) -> Platform;

    /// Image variants; one plan is produced per variant.
    fn variants(&self) -> &'static [&'static str] {
        &[""]
    }

    /// Check platform-specific preconditions.
    fn validate(&self, _manifest: &Manifest) -> BuildResult<()> {
        Ok(())
    }

    /// Path of the produced image.
    fn image(&self, ctx: &BuildContext<'_>) -> String;

    fn convert(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>);

    fn library(&self, ctx: &BuildContext<'_>) -> LibraryRecipe;

    fn link(&self, ctx: &BuildContext<'_>, out: &mut PhaseWriter<'_>);

    /// Assemble the image. Platforms that link straight to their image leave
    /// this empty.
    fn pack(&self, _ctx: &BuildContext<'_>, _out: &mut PhaseWriter<'_>) {}
}

/// Sprite geometry check for compilers whose converters read `fields`.
pub(crate) fn require_sprite_params(
    manifest: &Manifest,
    platform: Platform,
    fields: impl Fn(unity_manifest::SpriteParams) -> bool,
) -> BuildResult<()> {
    let assets = manifest.assets(platform);
    let params = assets.sprite_params();
    if assets.sprites().is_some() && !fields(params) {
        return Err(ValidationError::IncompleteSprites { platform, params });
    }
    Ok(())
}

/// Compile one platform. Either every plan is produced or none.
pub fn compile(
    compiler: &dyn PlatformCompiler,
    manifest: &Manifest,
    toolchain: &Toolchain,
) -> BuildResult<Vec<BuildPlan>> {
    validate(manifest)?;
    compiler.validate(manifest)?;

    let platform = compiler.platform();
    let index = ResourceIndex::build(manifest, platform, toolchain);

    let plans = compiler
        .variants()
        .iter()
        .map(|&variant| {
            let ctx = BuildContext {
                manifest,
                toolchain,
                index: &index,
                variant,
            };
            let name = format!("{}-{}{variant}", ctx.disk(), platform.key());
            let mut plan = BuildPlan::new(name, platform, compiler.image(&ctx));

            // Stale outputs would satisfy artifact checks and end up on disk.
            let mut convert = plan.writer(Phase::Convert);
            convert.push(Step::remove(ctx.out("*")));
            compiler.convert(&ctx, &mut convert);
            compiler.library(&ctx).write(&ctx, &mut plan.writer(Phase::Library));
            compiler.link(&ctx, &mut plan.writer(Phase::Link));
            compiler.pack(&ctx, &mut plan.writer(Phase::Pack));

            for phase in Phase::ALL {
                tracing::debug!(plan = %plan.name, %phase, steps = plan.phase(phase).count(), "phase compiled");
            }
            tracing::info!(plan = %plan.name, steps = plan.len(), image = %plan.image, "compiled build plan");
            plan
        })
        .collect();
    Ok(plans)
}

/// The compiler for one platform.
pub fn compiler_for(platform: Platform) -> &'static dyn PlatformCompiler {
    match platform {
        Platform::Apple => &Apple,
        Platform::Atari => &Atari,
        Platform::C64 => &C64,
        Platform::Lynx => &Lynx,
        Platform::Oric => &Oric,
    }
}

/// Compile every plan of one platform.
pub fn compile_platform(
    platform: Platform,
    manifest: &Manifest,
    toolchain: &Toolchain,
) -> BuildResult<Vec<BuildPlan>> {
    compile(compiler_for(platform), manifest, toolchain)
}

/// Compile every platform in canonical order. Validation of all platforms
/// happens before any plan is built.
pub fn compile_all(manifest: &Manifest, toolchain: &Toolchain) -> BuildResult<Vec<BuildPlan>> {
    validate(manifest)?;
    for platform in Platform::ALL {
        compiler_for(platform).validate(manifest)?;
    }
    let mut plans = Vec::new();
    for platform in Platform::ALL {
        plans.extend(compile_platform(platform, manifest, toolchain)?);
    }
    Ok(plans)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
