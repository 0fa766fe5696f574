//! Build plans: what an external executor has to do to produce one image.
//!
//! A [`BuildPlan`] is an ordered list of [`Step`]s, each tagged with the
//! [`Phase`] it belongs to. Phases never go backwards along a plan.
//!
//! Arguments and emitted records are [`Text`] templates rather than plain
//! strings. Most of them are literal, but some refer to facts that only exist
//! once earlier steps have run: the size of a converted file, the number of
//! entries in a list file written by the chunk preprocessor, or the current
//! entry while repeating a step over such a list. The compiler never tries to
//! guess those values. An executor resolves each step against a [`BuildEnv`]
//! right before running it, which turns it into concrete [`Command`]s.
//!
//! # Example
//!
//! ```
//! use unity_build::plan::*;
//!
//! let step = Step::ForEachListed {
//!     list: "build/c64/chunks.lst".into(),
//!     step: Box::new(Step::Run(
//!         Invocation::new("c1541").arg(Text::entry(EntryField::Path)),
//!     )),
//! };
//!
//! let env = SimulatedEnv::new().with_list("build/c64/chunks.lst", ["a.dat", "b.dat"]);
//! let commands = step.resolve(&env);
//! assert_eq!(commands.len(), 2);
//! assert_eq!(commands[1], Command::run("c1541", ["b.dat"]));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use unity_manifest::Platform;

use crate::toolchain::Toolchain;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The four stages every platform build goes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Turn source assets into platform-native binaries.
    Convert,
    /// Compile and archive the shared runtime library.
    Library,
    /// Link the program, then compress or re-header it.
    Link,
    /// Assemble the disk image.
    Pack,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Convert, Phase::Library, Phase::Link, Phase::Pack];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Convert => "convert",
            Phase::Library => "library",
            Phase::Link => "link",
            Phase::Pack => "pack",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// A property of the list entry currently being expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
    /// The entry as written in the list file.
    Path,
    /// The final path component of the entry.
    FileName,
    /// 0-based position of the entry in the list.
    Index,
    /// Size in bytes of the entry's file.
    Size,
}

/// One piece of a [`Text`] template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fragment {
    Lit(String),
    /// Size in bytes of a file produced earlier in the build.
    SizeOf(String),
    /// Number of entries in a list file plus a statically known offset.
    ListCount { list: String, offset: usize },
    /// A property of the current list entry. Outside a per-entry expansion
    /// this renders as nothing.
    Entry(EntryField),
    /// `each` rendered once per entry of `list` and joined with `separator`.
    /// `leading` is emitted before the first rendered entry, and only when
    /// the list is non-empty. When the list was written from inside a
    /// subdirectory, `base` names it and entry sizes are looked up there.
    EachListed {
        list: String,
        each: Text,
        separator: String,
        leading: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        base: Option<String>,
    },
}

/// A text template: literal text interleaved with build-time references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Text(Vec<Fragment>);

impl Text {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self(fragments)
    }

    pub fn lit(text: impl Into<String>) -> Self {
        Self(vec![Fragment::Lit(text.into())])
    }

    pub fn entry(field: EntryField) -> Self {
        Self(vec![Fragment::Entry(field)])
    }

    /// Append a fragment, merging adjacent literals.
    pub fn push(mut self, fragment: Fragment) -> Self {
        if let (Some(Fragment::Lit(prev)), Fragment::Lit(next)) = (self.0.last_mut(), &fragment) {
            prev.push_str(next);
            return self;
        }
        self.0.push(fragment);
        self
    }

    pub fn push_lit(self, text: impl Into<String>) -> Self {
        self.push(Fragment::Lit(text.into()))
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.0
    }

    /// The text, if it contains no build-time references.
    pub fn as_literal(&self) -> Option<String> {
        let mut out = String::new();
        for fragment in &self.0 {
            match fragment {
                Fragment::Lit(s) => out.push_str(s),
                _ => return None,
            }
        }
        Some(out)
    }

    /// Render against `env` outside any per-entry expansion.
    pub fn resolve<E: BuildEnv + ?Sized>(&self, env: &E) -> String {
        let mut out = String::new();
        self.render(env, None, &mut out);
        out
    }

    fn render<E: BuildEnv + ?Sized>(&self, env: &E, entry: Option<&ListEntry>, out: &mut String) {
        for fragment in &self.0 {
            match fragment {
                Fragment::Lit(s) => out.push_str(s),
                Fragment::SizeOf(path) => out.push_str(&env.size_of(path).to_string()),
                Fragment::ListCount { list, offset } => {
                    out.push_str(&(env.list(list).len() + offset).to_string());
                }
                Fragment::Entry(field) => {
                    if let Some(entry) = entry {
                        entry.render(*field, env, out);
                    }
                }
                Fragment::EachListed {
                    list,
                    each,
                    separator,
                    leading,
                    base,
                } => {
                    for (index, path) in env.list(list).iter().enumerate() {
                        out.push_str(if index == 0 { leading } else { separator });
                        let entry = ListEntry {
                            index,
                            path,
                            base: base.as_deref(),
                        };
                        each.render(env, Some(&entry), out);
                    }
                }
            }
        }
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text::lit(text)
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text::lit(text)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.0 {
            match fragment {
                Fragment::Lit(s) => f.write_str(s)?,
                Fragment::SizeOf(path) => write!(f, "{{size:{path}}}")?,
                Fragment::ListCount { list, offset } => write!(f, "{{count:{list}+{offset}}}")?,
                Fragment::Entry(field) => {
                    let name = match field {
                        EntryField::Path => "path",
                        EntryField::FileName => "file",
                        EntryField::Index => "index",
                        EntryField::Size => "size",
                    };
                    write!(f, "{{{name}}}")?;
                }
                Fragment::EachListed {
                    list,
                    each,
                    separator,
                    ..
                } => write!(f, "{{each:{list}:{each}:'{separator}'}}")?,
            }
        }
        Ok(())
    }
}

struct ListEntry<'a> {
    index: usize,
    path: &'a str,
    /// Directory `path` is relative to, if not the project root.
    base: Option<&'a str>,
}

impl<'a> ListEntry<'a> {
    /// An entry relative to the project root.
    fn at(index: usize, path: &'a str) -> Self {
        Self {
            index,
            path,
            base: None,
        }
    }

    fn render<E: BuildEnv + ?Sized>(&self, field: EntryField, env: &E, out: &mut String) {
        match field {
            EntryField::Path => out.push_str(self.path),
            EntryField::FileName => {
                let name = self.path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(self.path);
                out.push_str(name);
            }
            EntryField::Index => out.push_str(&self.index.to_string()),
            EntryField::Size => {
                let size = match self.base {
                    Some(base) => env.size_of(&Toolchain::resolve_from(base, self.path)),
                    None => env.size_of(self.path),
                };
                out.push_str(&size.to_string());
            }
        }
    }
}

/// An argument or record slot. Most slots hold exactly one text, but some
/// expand to several values or depend on whether an artifact exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    One(Text),
    /// `each` expanded once per entry of `list`, in list order.
    PerEntry { list: String, each: Vec<Text> },
    /// `then` if `artifact` exists when the step runs, otherwise `otherwise`.
    IfPresent {
        artifact: String,
        then: Vec<Text>,
        otherwise: Vec<Text>,
    },
}

impl Item {
    fn resolve_into<E: BuildEnv + ?Sized>(
        &self,
        env: &E,
        entry: Option<&ListEntry>,
        out: &mut Vec<String>,
    ) {
        match self {
            Item::One(text) => render_each(std::slice::from_ref(text), env, entry, out),
            Item::PerEntry { list, each } => {
                for (index, path) in env.list(list).iter().enumerate() {
                    render_each(each, env, Some(&ListEntry::at(index, path)), out);
                }
            }
            Item::IfPresent {
                artifact,
                then,
                otherwise,
            } => {
                let branch = if env.exists(artifact) { then } else { otherwise };
                render_each(branch, env, entry, out);
            }
        }
    }
}

fn render_each<E: BuildEnv + ?Sized>(
    texts: &[Text],
    env: &E,
    entry: Option<&ListEntry>,
    out: &mut Vec<String>,
) {
    for text in texts {
        let mut s = String::new();
        text.render(env, entry, &mut s);
        out.push(s);
    }
}

impl From<Text> for Item {
    fn from(text: Text) -> Self {
        Item::One(text)
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Item::One(Text::lit(text))
    }
}

impl From<String> for Item {
    fn from(text: String) -> Self {
        Item::One(Text::lit(text))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::One(text) => write!(f, "{text}"),
            Item::PerEntry { list, each } => {
                write!(f, "[for each in {list}:")?;
                for text in each {
                    write!(f, " {text}")?;
                }
                f.write_str("]")
            }
            Item::IfPresent {
                artifact,
                then,
                otherwise,
            } => {
                write!(f, "[if {artifact}:")?;
                for text in then {
                    write!(f, " {text}")?;
                }
                f.write_str(" | else:")?;
                for text in otherwise {
                    write!(f, " {text}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<Item>,
    /// Working directory, relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// File fed to the program's standard input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<Text>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<Item>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn stdin(mut self, file: impl Into<Text>) -> Self {
        self.stdin = Some(file.into());
        self
    }

    /// All arguments that are plain literals, in order. Used by listings and
    /// tests that only care about the static part of a command line.
    pub fn literal_args(&self) -> Vec<String> {
        self.args
            .iter()
            .filter_map(|a| match a {
                Item::One(text) => text.as_literal(),
                _ => None,
            })
            .collect()
    }
}

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Run(Invocation),
    Copy { from: String, to: String },
    /// Delete every file matching a glob pattern.
    Remove { pattern: String },
    /// Append records to `target`, creating it if absent.
    Emit { target: String, records: Vec<Item> },
    /// Repeat `step` once per entry of a list file.
    ForEachListed { list: String, step: Box<Step> },
    /// Conditional on an artifact produced (or not) by an earlier step.
    IfPresent {
        artifact: String,
        then: Vec<Step>,
        otherwise: Vec<Step>,
    },
}

impl Step {
    pub fn run(invocation: Invocation) -> Self {
        Step::Run(invocation)
    }

    pub fn copy(from: impl Into<String>, to: impl Into<String>) -> Self {
        Step::Copy {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn remove(pattern: impl Into<String>) -> Self {
        Step::Remove {
            pattern: pattern.into(),
        }
    }

    /// The invocation, if this step is a plain run.
    pub fn invocation(&self) -> Option<&Invocation> {
        match self {
            Step::Run(inv) => Some(inv),
            _ => None,
        }
    }

    /// Turn the step into concrete commands as seen from `env`.
    pub fn resolve<E: BuildEnv + ?Sized>(&self, env: &E) -> Vec<Command> {
        let mut out = Vec::new();
        self.resolve_into(env, None, &mut out);
        out
    }

    fn resolve_into<E: BuildEnv + ?Sized>(
        &self,
        env: &E,
        entry: Option<&ListEntry>,
        out: &mut Vec<Command>,
    ) {
        match self {
            Step::Run(inv) => {
                let mut args = Vec::new();
                for arg in &inv.args {
                    arg.resolve_into(env, entry, &mut args);
                }
                let stdin = inv.stdin.as_ref().map(|t| {
                    let mut s = String::new();
                    t.render(env, entry, &mut s);
                    s
                });
                out.push(Command::Run {
                    program: inv.program.clone(),
                    args,
                    dir: inv.dir.clone(),
                    stdin,
                });
            }
            Step::Copy { from, to } => out.push(Command::Copy {
                from: from.clone(),
                to: to.clone(),
            }),
            Step::Remove { pattern } => out.push(Command::Remove {
                pattern: pattern.clone(),
            }),
            Step::Emit { target, records } => {
                let mut lines = Vec::new();
                for record in records {
                    record.resolve_into(env, entry, &mut lines);
                }
                out.push(Command::Append {
                    target: target.clone(),
                    records: lines,
                });
            }
            Step::ForEachListed { list, step } => {
                for (index, path) in env.list(list).iter().enumerate() {
                    step.resolve_into(env, Some(&ListEntry::at(index, path)), out);
                }
            }
            Step::IfPresent {
                artifact,
                then,
                otherwise,
            } => {
                let branch = if env.exists(artifact) { then } else { otherwise };
                for step in branch {
                    step.resolve_into(env, entry, out);
                }
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Run(inv) => {
                if let Some(dir) = &inv.dir {
                    write!(f, "(in {dir}) ")?;
                }
                f.write_str(&inv.program)?;
                for arg in &inv.args {
                    write!(f, " {arg}")?;
                }
                if let Some(stdin) = &inv.stdin {
                    write!(f, " < {stdin}")?;
                }
                Ok(())
            }
            Step::Copy { from, to } => write!(f, "copy {from} {to}"),
            Step::Remove { pattern } => write!(f, "remove {pattern}"),
            Step::Emit { target, records } => {
                write!(f, "emit {} record(s) >> {target}", records.len())
            }
            Step::ForEachListed { list, step } => write!(f, "for each in {list}: {step}"),
            Step::IfPresent {
                artifact,
                then,
                otherwise,
            } => {
                write!(f, "if exists {artifact}: ")?;
                write_steps(f, then)?;
                f.write_str(" else: ")?;
                write_steps(f, otherwise)
            }
        }
    }
}

fn write_steps(f: &mut fmt::Formatter<'_>, steps: &[Step]) -> fmt::Result {
    if steps.is_empty() {
        return f.write_str("(nothing)");
    }
    for (i, step) in steps.iter().enumerate() {
        if i > 0 {
            f.write_str("; ")?;
        }
        write!(f, "{step}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// What an executor knows about the build tree at the moment a step runs.
pub trait BuildEnv {
    /// Whether a file exists.
    fn exists(&self, artifact: &str) -> bool;
    /// The entries of a list file, one per line. A missing list is empty.
    fn list(&self, list: &str) -> Vec<String>;
    /// Size of a file in bytes. Missing files count as 0.
    fn size_of(&self, path: &str) -> u64;
}

/// A concrete command with every reference resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Run {
        program: String,
        args: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        dir: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stdin: Option<String>,
    },
    Copy {
        from: String,
        to: String,
    },
    Remove {
        pattern: String,
    },
    Append {
        target: String,
        records: Vec<String>,
    },
}

impl Command {
    /// A run without working directory or stdin.
    pub fn run<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::Run {
            program: program.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
            stdin: None,
        }
    }
}

/// An in-memory [`BuildEnv`]: a fixed set of artifacts, list files and file
/// sizes. Handy for previews and for checking how a plan reacts to a given
/// outcome of its external steps.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEnv {
    artifacts: BTreeSet<String>,
    lists: BTreeMap<String, Vec<String>>,
    sizes: BTreeMap<String, u64>,
}

impl SimulatedEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifacts.insert(artifact.into());
        self
    }

    pub fn with_list<I, S>(mut self, list: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .insert(list.into(), entries.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_size(mut self, path: impl Into<String>, size: u64) -> Self {
        self.sizes.insert(path.into(), size);
        self
    }
}

impl BuildEnv for SimulatedEnv {
    fn exists(&self, artifact: &str) -> bool {
        self.artifacts.contains(artifact)
    }

    fn list(&self, list: &str) -> Vec<String> {
        self.lists.get(list).cloned().unwrap_or_default()
    }

    fn size_of(&self, path: &str) -> u64 {
        self.sizes.get(path).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// BuildPlan
// ---------------------------------------------------------------------------

/// A step together with the phase it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub phase: Phase,
    pub step: Step,
}

/// Everything needed to produce one image for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Plan name, e.g. `demo-apple64k`.
    pub name: String,
    pub platform: Platform,
    /// The image file the plan produces.
    pub image: String,
    steps: Vec<PlannedStep>,
}

impl BuildPlan {
    pub fn new(name: impl Into<String>, platform: Platform, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform,
            image: image.into(),
            steps: Vec::new(),
        }
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The steps of one phase, in plan order.
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &Step> + '_ {
        self.steps
            .iter()
            .filter(move |s| s.phase == phase)
            .map(|s| &s.step)
    }

    /// Start writing steps for `phase`. Phases must be opened in order.
    pub(crate) fn writer(&mut self, phase: Phase) -> PhaseWriter<'_> {
        debug_assert!(
            self.steps.last().map_or(true, |s| s.phase <= phase),
            "phase {phase} opened after a later phase"
        );
        PhaseWriter { plan: self, phase }
    }

    /// Resolve every step against `env`, keeping phase tags.
    pub fn resolve<E: BuildEnv + ?Sized>(&self, env: &E) -> Vec<(Phase, Command)> {
        self.steps
            .iter()
            .flat_map(|s| s.step.resolve(env).into_iter().map(move |c| (s.phase, c)))
            .collect()
    }

    /// BLAKE3 hex digest of the plan's canonical JSON form.
    pub fn fingerprint(&self) -> String {
        let json_bytes =
            serde_json::to_vec(self).expect("BuildPlan should always be JSON-serializable");
        blake3::hash(&json_bytes).to_hex().to_string()
    }
}

/// Appends steps to a plan under one phase tag.
pub struct PhaseWriter<'a> {
    plan: &'a mut BuildPlan,
    phase: Phase,
}

impl PhaseWriter<'_> {
    pub fn push(&mut self, step: Step) -> &mut Self {
        self.plan.steps.push(PlannedStep {
            phase: self.phase,
            step,
        });
        self
    }

    pub fn run(&mut self, invocation: Invocation) -> &mut Self {
        self.push(Step::Run(invocation))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "build/lynx/chunks.lst";

    fn chunk_env() -> SimulatedEnv {
        SimulatedEnv::new()
            .with_list(LIST, ["../../build/lynx/chunk00.dat", "../../build/lynx/chunk01.dat"])
            .with_size("../../build/lynx/chunk00.dat", 120)
            .with_size("../../build/lynx/chunk01.dat", 64)
            .with_size("build/lynx/title.spr", 2048)
    }

    #[test]
    fn literal_text_merges_and_renders() {
        let text = Text::lit("_fileNum: ").push_lit(".byte ");
        assert_eq!(text.fragments().len(), 1);
        assert_eq!(text.as_literal().as_deref(), Some("_fileNum: .byte "));
    }

    #[test]
    fn list_count_adds_static_offset() {
        let text = Text::lit(".byte ").push(Fragment::ListCount {
            list: LIST.into(),
            offset: 3,
        });
        assert_eq!(text.as_literal(), None);
        assert_eq!(text.resolve(&chunk_env()), ".byte 5");
        assert_eq!(text.resolve(&SimulatedEnv::new()), ".byte 3");
    }

    #[test]
    fn each_listed_uses_leading_only_when_non_empty() {
        let text = Text::lit(".word ")
            .push(Fragment::SizeOf("build/lynx/title.spr".into()))
            .push(Fragment::EachListed {
                list: LIST.into(),
                each: Text::entry(EntryField::Size),
                separator: ",".into(),
                leading: ",".into(),
                base: None,
            });
        assert_eq!(text.resolve(&chunk_env()), ".word 2048,120,64");
        assert_eq!(text.resolve(&SimulatedEnv::new()), ".word 0");
    }

    #[test]
    fn entry_sizes_are_looked_up_from_the_list_base() {
        let text = Text::new(vec![Fragment::EachListed {
            list: LIST.into(),
            each: Text::entry(EntryField::Size),
            separator: ",".into(),
            leading: String::new(),
            base: Some("build/lynx".into()),
        }]);
        // Entries written from `build/lynx`, sizes known from the project root.
        let env = SimulatedEnv::new()
            .with_list(LIST, ["../../build/lynx/chunk00.dat", "chunk01.dat"])
            .with_size("build/lynx/chunk00.dat", 120)
            .with_size("build/lynx/chunk01.dat", 64);
        assert_eq!(text.resolve(&env), "120,64");
    }

    #[test]
    fn per_entry_items_expand_in_list_order() {
        let step = Step::Emit {
            target: "build/lynx/data.asm".into(),
            records: vec![Item::PerEntry {
                list: LIST.into(),
                each: vec![Text::lit("_shkName")
                    .push(Fragment::Entry(EntryField::Index))
                    .push_lit(": .byte \"")
                    .push(Fragment::Entry(EntryField::FileName))
                    .push_lit("\",0")],
            }],
        };
        let commands = step.resolve(&chunk_env());
        assert_eq!(
            commands,
            [Command::Append {
                target: "build/lynx/data.asm".into(),
                records: vec![
                    "_shkName0: .byte \"chunk00.dat\",0".into(),
                    "_shkName1: .byte \"chunk01.dat\",0".into(),
                ],
            }]
        );
    }

    #[test]
    fn if_present_picks_branch_from_env() {
        let step = Step::IfPresent {
            artifact: "build/c64/theme.sid".into(),
            then: vec![Step::run(Invocation::new("psid64").args(["-n", "build/c64/theme.sid"]))],
            otherwise: vec![],
        };
        assert!(step.resolve(&SimulatedEnv::new()).is_empty());
        let present = SimulatedEnv::new().with_artifact("build/c64/theme.sid");
        assert_eq!(
            step.resolve(&present),
            [Command::run("psid64", ["-n", "build/c64/theme.sid"])]
        );
    }

    #[test]
    fn stdin_and_dir_survive_resolution() {
        let step = Step::ForEachListed {
            list: "build/apple/chunks.lst".into(),
            step: Box::new(Step::run(
                Invocation::new("java")
                    .arg("-p")
                    .arg(Text::entry(EntryField::FileName))
                    .stdin(Text::entry(EntryField::Path))
                    .in_dir("build"),
            )),
        };
        let env = SimulatedEnv::new().with_list("build/apple/chunks.lst", ["build/apple/c0.dat"]);
        assert_eq!(
            step.resolve(&env),
            [Command::Run {
                program: "java".into(),
                args: vec!["-p".into(), "c0.dat".into()],
                dir: Some("build".into()),
                stdin: Some("build/apple/c0.dat".into()),
            }]
        );
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let mut a = BuildPlan::new("demo-c64", Platform::C64, "build/demo-c64.d64");
        a.writer(Phase::Link).run(Invocation::new("cl65").arg("-O"));
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut c = a.clone();
        c.writer(Phase::Pack).push(Step::remove("build/c64/*.bin"));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn display_shows_placeholders() {
        let step = Step::run(
            Invocation::new("tap2dsk")
                .arg("-iLAUNCH.COM")
                .arg(Item::PerEntry {
                    list: "build/oric/chunks.lst".into(),
                    each: vec![Text::entry(EntryField::Path)],
                }),
        );
        assert_eq!(
            step.to_string(),
            "tap2dsk -iLAUNCH.COM [for each in build/oric/chunks.lst: {path}]"
        );
    }
}
