//! Layering lint for the maze dashboard backend.
//!
//! Every file under `backend/src/{domain,inbound,outbound}` is parsed with
//! `syn` and each path it mentions is reduced to a root: either one of the
//! backend's own layers or an external crate. The [`RULES`] table says which
//! roots a layer may not reach.
//!
//! The domain stays free of HTTP, SQL, device and file-watching crates so the
//! activation logic can be exercised with in-memory ports. Adapters may only
//! meet through the domain.
//!
//! Run it with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Name of the backend library as written in absolute paths.
const CRATE_NAME: &str = "maze_dashboard";

const ACTIX: &[&str] = &["actix", "actix_http", "actix_session", "actix_web"];
const DIESEL: &[&str] = &["diesel", "diesel_async", "diesel_migrations"];
const DEVICE_IO: &[&str] = &["notify", "reqwest"];

/// The three linted layers, named after their directory under `backend/src`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Domain,
    Inbound,
    Outbound,
}

impl Layer {
    const ALL: [Self; 3] = [Self::Domain, Self::Inbound, Self::Outbound];

    /// Directory name under `backend/src`.
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    fn from_dir(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layer| layer.dir() == name)
    }

    /// Layer owning a path relative to `backend/src`.
    fn of_file(relative: &Path) -> Option<Self> {
        let first = relative.components().next()?;
        Self::from_dir(first.as_os_str().to_str()?)
    }

    fn rule(self) -> &'static Rule {
        match self {
            Self::Domain => &RULES[0],
            Self::Inbound => &RULES[1],
            Self::Outbound => &RULES[2],
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

/// What one layer must not import.
#[derive(Debug)]
pub struct Rule {
    pub layer: Layer,
    pub forbidden_layers: &'static [Layer],
    pub forbidden_crates: &'static [&'static [&'static str]],
}

/// Boundary rules, one per layer.
pub static RULES: [Rule; 3] = [
    Rule {
        layer: Layer::Domain,
        forbidden_layers: &[Layer::Inbound, Layer::Outbound],
        forbidden_crates: &[ACTIX, DIESEL, DEVICE_IO],
    },
    Rule {
        layer: Layer::Inbound,
        forbidden_layers: &[Layer::Outbound],
        forbidden_crates: &[DIESEL, DEVICE_IO],
    },
    Rule {
        layer: Layer::Outbound,
        forbidden_layers: &[Layer::Inbound],
        forbidden_crates: &[ACTIX],
    },
];

impl Rule {
    fn check(&self, root: &Root) -> Option<Breach> {
        match root {
            Root::Layer(layer) if self.forbidden_layers.contains(layer) => {
                Some(Breach::Layer(*layer))
            }
            Root::Crate(name) => self
                .forbidden_crates
                .iter()
                .flat_map(|group| group.iter())
                .find(|forbidden| **forbidden == name.as_str())
                .map(|forbidden| Breach::Crate(*forbidden)),
            Root::Layer(_) => None,
        }
    }
}

/// The forbidden thing a file reached for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Breach {
    Layer(Layer),
    Crate(&'static str),
}

/// One forbidden dependency found in one file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Violation {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    pub layer: Layer,
    pub breach: Breach,
}

impl Violation {
    pub fn message(&self) -> String {
        match self.breach {
            Breach::Layer(target) => {
                format!("{} module must not depend on crate::{target}", self.layer)
            }
            Breach::Crate(name) => format!(
                "{} module must not depend on external crate `{name}`",
                self.layer
            ),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message())
    }
}

/// Why a lint run did not pass.
#[derive(Debug)]
pub enum ArchitectureLintError {
    Io(io::Error),
    /// A file could not be parsed or does not belong to a layer.
    Parse { file: PathBuf, message: String },
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read backend sources: {err}"),
            Self::Parse { file, message } => {
                write!(f, "cannot lint {}: {message}", file.display())
            }
            Self::Violations(violations) => {
                writeln!(f, "{} layering violation(s):", violations.len())?;
                violations
                    .iter()
                    .try_for_each(|violation| writeln!(f, "  {violation}"))
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Io(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// An in-memory source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    pub contents: String,
}

/// Lint every layer file under `backend_dir/src`.
///
/// # Errors
///
/// I/O and parse failures, or the full list of violations.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), ArchitectureLintError> {
    let sources = read_layer_sources(&backend_dir.join("src"))?;
    lint_sources(&sources)
}

/// Lint sources that are already in memory.
///
/// # Errors
///
/// A file outside the three layers or one `syn` cannot parse is reported as
/// [`ArchitectureLintError::Parse`]; otherwise all violations are returned.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut found = BTreeSet::new();
    for source in sources {
        let layer = Layer::of_file(&source.file).ok_or_else(|| ArchitectureLintError::Parse {
            file: source.file.clone(),
            message: "file is not under domain/, inbound/ or outbound/".to_owned(),
        })?;
        let ast = syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
            file: source.file.clone(),
            message: err.to_string(),
        })?;

        let rule = layer.rule();
        for root in referenced_roots(&ast) {
            if let Some(breach) = rule.check(&root) {
                found.insert(Violation {
                    file: source.file.clone(),
                    layer,
                    breach,
                });
            }
        }
    }

    if found.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(found.into_iter().collect()))
    }
}

/// Where a path leads once relative prefixes are stripped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Root {
    Layer(Layer),
    Crate(String),
}

impl Root {
    fn of(segments: &[String]) -> Option<Self> {
        let first = segments.first()?.as_str();
        if let Some(layer) = Layer::from_dir(first) {
            return Some(Self::Layer(layer));
        }
        let is_relative = |segment: &str| matches!(segment, "crate" | "self" | "super");
        if is_relative(first) {
            let inner = segments.iter().find(|segment| !is_relative(segment))?;
            return Layer::from_dir(inner).map(Self::Layer);
        }
        if first == CRATE_NAME {
            return segments.get(1).and_then(|s| Layer::from_dir(s)).map(Self::Layer);
        }
        Some(Self::Crate(first.to_owned()))
    }
}

fn referenced_roots(ast: &syn::File) -> BTreeSet<Root> {
    let mut collector = RootCollector::default();
    collector.visit_file(ast);
    collector.roots
}

#[derive(Default)]
struct RootCollector {
    roots: BTreeSet<Root>,
}

impl RootCollector {
    fn add(&mut self, segments: &[String]) {
        if let Some(root) = Root::of(segments) {
            self.roots.insert(root);
        }
    }

    /// Only the leading segments matter, so each `use` branch is cut at its
    /// first name, glob or group.
    fn add_use(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.add_use(&path.tree, prefix);
                prefix.pop();
            }
            syn::UseTree::Name(syn::UseName { ident })
            | syn::UseTree::Rename(syn::UseRename { ident, .. }) => {
                prefix.push(ident.to_string());
                self.add(prefix.as_slice());
                prefix.pop();
            }
            syn::UseTree::Glob(_) => self.add(prefix.as_slice()),
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.add_use(item, prefix);
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for RootCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        self.add(&segments);
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.add_use(&node.tree, &mut Vec::new());
    }
}

fn read_layer_sources(src_dir: &Path) -> Result<Vec<LintSource>, ArchitectureLintError> {
    let mut pending: Vec<PathBuf> = Layer::ALL
        .iter()
        .map(|layer| src_dir.join(layer.dir()))
        .filter(|dir| dir.is_dir())
        .collect();
    let mut sources = Vec::new();

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                let file = path
                    .strip_prefix(src_dir)
                    .map(Path::to_path_buf)
                    .map_err(|err| ArchitectureLintError::Parse {
                        file: path.clone(),
                        message: err.to_string(),
                    })?;
                sources.push(LintSource {
                    contents: fs::read_to_string(&path)?,
                    file,
                });
            }
        }
    }

    sources.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(sources)
}

#[cfg(test)]
mod tests;
