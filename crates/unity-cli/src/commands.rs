//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use unity_build::prelude::*;
use unity_manifest::{codec, AssetFilter, AssetSlot, Manifest, Platform, ProjectRoot};

use crate::{ConfigureArgs, PlanArgs};

fn load(file: &Path) -> Result<Manifest> {
    codec::load(file).with_context(|| format!("Failed to load project: {}", file.display()))
}

fn save(manifest: &Manifest, file: &Path) -> Result<()> {
    codec::save(manifest, file)
        .with_context(|| format!("Failed to save project: {}", file.display()))
}

pub fn new(file: &Path, disk_name: &str, force: bool) -> Result<()> {
    if file.exists() && !force {
        bail!("{} already exists (use --force to replace it)", file.display());
    }
    let mut manifest = Manifest::new();
    manifest.set_disk_name(disk_name);
    save(&manifest, file)?;
    println!("Created {}", file.display());
    Ok(())
}

/// Warn when a given file does not look like what the slot expects.
fn check_extension(path: &Path, filter: &AssetFilter) {
    let expected = filter.pattern.rsplit('.').next().unwrap_or("*");
    let matches = expected == "*"
        || path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(expected));
    if !matches {
        tracing::warn!(
            path = %path.display(),
            expected = filter.pattern,
            "file does not match the slot's filter"
        );
    }
}

pub fn add(file: &Path, slot: AssetSlot, paths: &[PathBuf], root: &Path) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    add_from(&cwd, file, slot, paths, root)
}

/// `add` with relative roots and paths taken from `cwd`, so a root of `.`
/// still strips absolute paths that point inside it.
fn add_from(
    cwd: &Path,
    file: &Path,
    slot: AssetSlot,
    paths: &[PathBuf],
    root: &Path,
) -> Result<()> {
    let mut manifest = load(file)?;
    let root = ProjectRoot::new(cwd.join(root));
    let mut given = paths.iter();
    let mut picker = |filter: &AssetFilter| {
        let path = given.next()?;
        check_extension(path, filter);
        Some(cwd.join(path))
    };
    if slot.is_single() && paths.len() > 1 {
        tracing::warn!(slot = %slot, "slot holds a single file; keeping the last one");
    }
    while let Some(stored) = manifest.pick_into(slot, &mut picker, &root) {
        println!("{slot}: {stored}");
    }
    save(&manifest, file)
}

pub fn remove(file: &Path, slot: AssetSlot, index: usize) -> Result<()> {
    let mut manifest = load(file)?;
    let Some(removed) = manifest.remove(slot, index) else {
        bail!(
            "{slot} has no entry {index} ({} entries)",
            manifest.paths(slot).len()
        );
    };
    save(&manifest, file)?;
    println!("Removed {removed} from {slot}");
    Ok(())
}

pub fn configure(args: ConfigureArgs) -> Result<()> {
    let mut manifest = load(&args.file)?;
    if let Some(name) = args.disk_name {
        manifest.set_disk_name(name);
    }
    if let Some(platform) = args.sprites {
        let mut params = manifest.assets(platform).sprite_params();
        params.frames = args.sprite_frames.unwrap_or(params.frames);
        params.width = args.sprite_width.unwrap_or(params.width);
        params.height = args.sprite_height.unwrap_or(params.height);
        manifest.set_sprite_params(platform, params);
    }
    if let Some(no_text) = args.atari_no_text {
        manifest.set_atari_no_text(no_text);
    }
    if let Some(size) = args.atari_disk_size {
        manifest.set_atari_disk_size(size);
    }
    if let Some(dithering) = args.oric_dithering {
        manifest.set_oric_dithering(dithering);
    }
    if let Some(quality) = args.oric_quality {
        manifest.set_oric_quality(quality);
    }
    save(&manifest, &args.file)
}

fn print_slot(manifest: &Manifest, slot: AssetSlot, indent: &str) {
    let paths = manifest.paths(slot);
    if paths.is_empty() {
        return;
    }
    println!("{indent}{slot}:");
    for (i, path) in paths.iter().enumerate() {
        println!("{indent}  [{i}] {path}");
    }
}

pub fn show(file: &Path, json: bool) -> Result<()> {
    let manifest = load(file)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    println!("Disk: {}", manifest.disk_name());
    for slot in [AssetSlot::Code, AssetSlot::Charmap, AssetSlot::Shared] {
        print_slot(&manifest, slot, "");
    }
    for platform in Platform::ALL {
        println!("{platform}:");
        for slot in [
            AssetSlot::Bitmap(platform),
            AssetSlot::Charset(platform),
            AssetSlot::Sprites(platform),
            AssetSlot::Chunks(platform),
            AssetSlot::Music(platform),
        ] {
            print_slot(&manifest, slot, "  ");
        }
        let p = manifest.assets(platform).sprite_params();
        println!(
            "  sprites: {} frame(s), {}x{}",
            p.frames, p.width, p.height
        );
    }
    let atari = manifest.atari_options();
    println!("Atari: disk {}, no text {}", atari.disk_size.label(), atari.no_text);
    let oric = manifest.oric_options();
    println!("Oric: {}, dithering {}", oric.quality.label(), oric.dithering);
    Ok(())
}

pub fn plan(args: PlanArgs) -> Result<()> {
    let manifest = load(&args.file)?;
    let toolchain = args.toolchain.apply();
    let plans = match args.platform {
        Some(platform) => compile_platform(platform, &manifest, &toolchain),
        None => compile_all(&manifest, &toolchain),
    }
    .with_context(|| format!("Cannot build {}", args.file.display()))?;

    if args.resolve {
        let env = args
            .present
            .into_iter()
            .fold(SimulatedEnv::new(), SimulatedEnv::with_artifact);
        let resolved: Vec<_> = plans
            .iter()
            .map(|plan| (plan.name.as_str(), plan.resolve(&env)))
            .collect();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        } else {
            for (name, commands) in &resolved {
                println!("== {name}");
                for (phase, command) in commands {
                    println!("  [{phase}] {}", describe(command));
                }
            }
        }
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }
    for plan in &plans {
        println!("== {} -> {} ({} steps)", plan.name, plan.image, plan.len());
        for planned in plan.steps() {
            println!("  [{}] {}", planned.phase, planned.step);
        }
    }
    Ok(())
}

fn describe(command: &Command) -> String {
    match command {
        Command::Run {
            program,
            args,
            dir,
            stdin,
        } => {
            let mut line = String::new();
            if let Some(dir) = dir {
                line.push_str(&format!("(in {dir}) "));
            }
            line.push_str(program);
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            if let Some(stdin) = stdin {
                line.push_str(&format!(" < {stdin}"));
            }
            line
        }
        Command::Copy { from, to } => format!("copy {from} {to}"),
        Command::Remove { pattern } => format!("remove {pattern}"),
        Command::Append { target, records } => {
            format!("append {} record(s) >> {target}", records.len())
        }
    }
}
