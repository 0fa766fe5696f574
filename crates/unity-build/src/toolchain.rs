//! Where the external tools and shared sources live.
//!
//! All paths are relative to the project root unless configured otherwise.
//! Steps that run inside a subdirectory (the Lynx and Oric converters) see
//! them rebased with [`Toolchain::from_dir`].

use serde::{Deserialize, Serialize};
use unity_manifest::Platform;

/// Locations of the toolchain used by generated plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    /// Root of every build output.
    pub build_dir: String,
    /// Shared C and assembly sources of the runtime library.
    pub unity_dir: String,
    /// Converter scripts and native helpers.
    pub scripts_dir: String,
    /// Directory holding `cc65`, `ca65`, `ar65` and `cl65`.
    pub cc65_bin: String,
    pub exomizer: String,
    pub python: String,
    pub java: String,
    pub luajit: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            build_dir: "build".to_owned(),
            unity_dir: "unity".to_owned(),
            scripts_dir: "utils/scripts".to_owned(),
            cc65_bin: "utils/cc65/bin".to_owned(),
            exomizer: "utils/scripts/exomizer-3.0.2".to_owned(),
            python: "python".to_owned(),
            java: "java".to_owned(),
            luajit: "luajit".to_owned(),
        }
    }
}

impl Toolchain {
    /// A program of the cc65 suite, such as `cl65`.
    pub fn cc65(&self, tool: &str) -> String {
        join(&self.cc65_bin, tool)
    }

    /// A file under the scripts directory.
    pub fn script(&self, path: &str) -> String {
        join(&self.scripts_dir, path)
    }

    /// A file under the runtime library directory.
    pub fn unity(&self, path: &str) -> String {
        join(&self.unity_dir, path)
    }

    /// A file directly under the build directory.
    pub fn build(&self, path: &str) -> String {
        join(&self.build_dir, path)
    }

    /// The per-platform output directory, e.g. `build/apple`.
    pub fn platform_dir(&self, platform: Platform) -> String {
        self.build(platform.key())
    }

    /// A file under the per-platform output directory.
    pub fn platform_file(&self, platform: Platform, file: &str) -> String {
        join(&self.platform_dir(platform), file)
    }

    /// Rewrite a project-relative path so it resolves from inside `dir`.
    /// Absolute paths are returned unchanged.
    pub fn from_dir(dir: &str, path: &str) -> String {
        if is_absolute(path) {
            return path.to_owned();
        }
        let depth = dir
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .count();
        format!("{}{path}", "../".repeat(depth))
    }

    /// The inverse of [`Toolchain::from_dir`]: a path written from inside
    /// `dir`, as seen from the project root.
    pub fn resolve_from(dir: &str, path: &str) -> String {
        if is_absolute(path) {
            return path.to_owned();
        }
        let mut parts: Vec<&str> = dir
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();
        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." if parts.last().is_some_and(|p| *p != "..") => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        parts.join("/")
    }

    /// Like [`Toolchain::from_dir`] for a program name. Bare names are looked
    /// up on the search path and are left alone.
    pub fn program_from(dir: &str, program: &str) -> String {
        if program.contains('/') {
            Self::from_dir(dir, program)
        } else {
            program.to_owned()
        }
    }
}

fn join(dir: &str, path: &str) -> String {
    if dir.is_empty() {
        path.to_owned()
    } else {
        format!("{}/{path}", dir.trim_end_matches('/'))
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.as_bytes().get(1) == Some(&b':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_project_layout() {
        let tc = Toolchain::default();
        assert_eq!(tc.cc65("cl65"), "utils/cc65/bin/cl65");
        assert_eq!(tc.script("apple/AppleBitmap.py"), "utils/scripts/apple/AppleBitmap.py");
        assert_eq!(tc.platform_file(Platform::Lynx, "data.asm"), "build/lynx/data.asm");
        assert_eq!(tc.unity("Lynx/sfx.s"), "unity/Lynx/sfx.s");
    }

    #[test]
    fn from_dir_climbs_one_level_per_component() {
        assert_eq!(Toolchain::from_dir("build/lynx", "gfx/title.png"), "../../gfx/title.png");
        assert_eq!(
            Toolchain::from_dir("utils/scripts/oric", "build/oric/"),
            "../../../build/oric/"
        );
        assert_eq!(Toolchain::from_dir("build/lynx", "/opt/art.png"), "/opt/art.png");
        assert_eq!(Toolchain::from_dir("build/lynx", "C:/art.png"), "C:/art.png");
    }

    #[test]
    fn resolve_from_undoes_from_dir() {
        let rebased = Toolchain::from_dir("build/lynx", "build/lynx/c0.chk");
        assert_eq!(Toolchain::resolve_from("build/lynx", &rebased), "build/lynx/c0.chk");
        assert_eq!(Toolchain::resolve_from("build/lynx", "c1.chk"), "build/lynx/c1.chk");
        assert_eq!(Toolchain::resolve_from("build", "../../up.dat"), "../up.dat");
        assert_eq!(Toolchain::resolve_from("build/lynx", "/tmp/c.chk"), "/tmp/c.chk");
    }

    #[test]
    fn bare_programs_stay_on_the_search_path() {
        assert_eq!(Toolchain::program_from("build/lynx", "python"), "python");
        assert_eq!(
            Toolchain::program_from("build/lynx", "utils/scripts/png2bmp"),
            "../../utils/scripts/png2bmp"
        );
    }

    #[test]
    fn trailing_slashes_are_not_doubled() {
        let tc = Toolchain {
            build_dir: "out/".to_owned(),
            ..Toolchain::default()
        };
        assert_eq!(tc.platform_dir(Platform::C64), "out/c64");
    }
}
