//! `unity-builder`: edit 8-bit project files and print their build plans.
//!
//! The tool never runs a plan. `plan` prints the steps each platform build
//! would take, either as a listing or as JSON for an external executor.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use unity_build::Toolchain;
use unity_manifest::{AssetSlot, DiskSize, ImageQuality, Platform};

mod commands;

/// Multi-target disk builder for 8-bit projects.
///
/// EXAMPLES:
///     unity-builder new game.builder --disk-name game
///     unity-builder add game.builder code src/main.c
///     unity-builder add game.builder apple.bitmap gfx/title-apple.png
///     unity-builder plan game.builder --platform c64
#[derive(Parser)]
#[command(name = "unity-builder")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, empty project file
    New {
        /// Project file to create
        file: PathBuf,
        /// Disk name used for every output file
        #[arg(long, default_value = "diskname")]
        disk_name: String,
        /// Replace an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Add files to a slot such as `code`, `shared` or `lynx.music`
    Add {
        file: PathBuf,
        slot: AssetSlot,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Directory stored paths are made relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Remove the entry at INDEX from a slot
    Remove {
        file: PathBuf,
        slot: AssetSlot,
        index: usize,
    },

    /// Change disk name and platform options
    Configure(ConfigureArgs),

    /// Print the project
    Show {
        file: PathBuf,
        /// Print the manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the build plans of the project
    Plan(PlanArgs),
}

#[derive(Args)]
struct ConfigureArgs {
    file: PathBuf,
    #[arg(long)]
    disk_name: Option<String>,
    /// Platform whose sprite geometry is set
    #[arg(long)]
    sprites: Option<Platform>,
    #[arg(long, requires = "sprites")]
    sprite_frames: Option<u32>,
    #[arg(long, requires = "sprites")]
    sprite_width: Option<u32>,
    #[arg(long, requires = "sprites")]
    sprite_height: Option<u32>,
    /// Atari: free the character generator memory
    #[arg(long)]
    atari_no_text: Option<bool>,
    /// Atari: 180KB or 360KB
    #[arg(long)]
    atari_disk_size: Option<DiskSize>,
    /// Oric: dithering level of the bitmap converter
    #[arg(long)]
    oric_dithering: Option<f32>,
    /// Oric: Hires(Noisy) or Hires(Clean)
    #[arg(long)]
    oric_quality: Option<ImageQuality>,
}

#[derive(Args)]
struct PlanArgs {
    file: PathBuf,
    /// Only this platform; all platforms if omitted
    #[arg(long)]
    platform: Option<Platform>,
    /// Print plans as JSON
    #[arg(long)]
    json: bool,
    /// Resolve build-time references as if nothing had been produced yet
    #[arg(long)]
    resolve: bool,
    /// With --resolve: treat ARTIFACT as produced by an earlier step
    #[arg(long = "present", value_name = "ARTIFACT", requires = "resolve")]
    present: Vec<String>,
    #[command(flatten)]
    toolchain: ToolchainArgs,
}

/// Overrides for the default tool locations.
#[derive(Args)]
struct ToolchainArgs {
    #[arg(long)]
    build_dir: Option<String>,
    #[arg(long)]
    unity_dir: Option<String>,
    #[arg(long)]
    scripts_dir: Option<String>,
    #[arg(long)]
    cc65_bin: Option<String>,
    #[arg(long)]
    exomizer: Option<String>,
    #[arg(long)]
    python: Option<String>,
    #[arg(long)]
    java: Option<String>,
    #[arg(long)]
    luajit: Option<String>,
}

impl ToolchainArgs {
    fn apply(self) -> Toolchain {
        let mut tc = Toolchain::default();
        let fields = [
            (self.build_dir, &mut tc.build_dir),
            (self.unity_dir, &mut tc.unity_dir),
            (self.scripts_dir, &mut tc.scripts_dir),
            (self.cc65_bin, &mut tc.cc65_bin),
            (self.exomizer, &mut tc.exomizer),
            (self.python, &mut tc.python),
            (self.java, &mut tc.java),
            (self.luajit, &mut tc.luajit),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        tc
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match cli.command {
        Commands::New {
            file,
            disk_name,
            force,
        } => commands::new(&file, &disk_name, force),
        Commands::Add {
            file,
            slot,
            paths,
            root,
        } => commands::add(&file, slot, &paths, &root),
        Commands::Remove { file, slot, index } => commands::remove(&file, slot, index),
        Commands::Configure(args) => commands::configure(args),
        Commands::Show { file, json } => commands::show(&file, json),
        Commands::Plan(args) => commands::plan(args),
    }
}
