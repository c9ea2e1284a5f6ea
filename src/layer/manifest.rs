//! Requirements manifest parsing
//!
//! The manifest is handed to the package manager verbatim; layerkit only
//! parses it to know whether there is anything to install and which
//! package names a finished layer must contain.

use crate::error::{LayerkitError, LayerkitResult};
use crate::layer::runtime::Ecosystem;
use std::path::{Path, PathBuf};

/// One requirement line from the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package name as written. `None` for URLs and local paths, whose
    /// name is only known once the installer has fetched them.
    pub name: Option<String>,

    /// Full requirement specifier (e.g. `requests==2.31.0`)
    pub spec: String,

    /// 1-based line number the requirement starts on
    pub line: usize,
}

impl Requirement {
    /// Name normalized for comparison against installed directories
    pub fn normalized_name(&self) -> Option<String> {
        self.name.as_deref().map(normalize_name)
    }
}

/// Parsed requirements manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Where the manifest was read from
    pub path: PathBuf,

    /// Package requirements in file order
    pub requirements: Vec<Requirement>,

    /// Installer option lines (`-r other.txt`, `--index-url ...`)
    pub options: Vec<String>,
}

impl Manifest {
    /// Read and parse a manifest from disk
    pub async fn from_file(path: &Path, ecosystem: Ecosystem) -> LayerkitResult<Self> {
        if !path.is_file() {
            return Err(LayerkitError::ManifestNotFound(path.to_path_buf()));
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            LayerkitError::io(format!("reading manifest {}", path.display()), e)
        })?;
        Ok(Self::parse(path, &content, ecosystem))
    }

    /// Parse manifest content.
    ///
    /// Never fails on a line the installer might accept: lines without a
    /// recognizable package name are kept as unnamed requirements.
    pub fn parse(path: &Path, content: &str, ecosystem: Ecosystem) -> Self {
        let mut requirements = Vec::new();
        let mut options = Vec::new();

        for (line_no, line) in logical_lines(content) {
            if line.starts_with('-') {
                options.push(line);
                continue;
            }

            let name = match ecosystem {
                Ecosystem::Python => python_name(&line),
                Ecosystem::Node => node_name(&line),
            };

            requirements.push(Requirement {
                name,
                spec: line,
                line: line_no,
            });
        }

        Self {
            path: path.to_path_buf(),
            requirements,
            options,
        }
    }

    /// True when nothing would be installed. Nested `-r` and `-e` lines
    /// pull in packages, so a manifest holding only those is not empty.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && !self.options.iter().any(|o| option_installs(o))
    }

    /// Requirement specifiers in file order
    pub fn specs(&self) -> Vec<&str> {
        self.requirements.iter().map(|r| r.spec.as_str()).collect()
    }

    /// Requirements whose package name is known up front
    pub fn named(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.name.is_some())
    }
}

fn option_installs(option: &str) -> bool {
    let flag = option
        .split(|c: char| c.is_whitespace() || c == '=')
        .next()
        .unwrap_or_default();
    match flag {
        "-r" | "--requirement" | "-e" | "--editable" => true,
        // -rother.txt
        _ => !flag.starts_with("--") && (flag.starts_with("-r") || flag.starts_with("-e")),
    }
}

/// Normalize a package name: lowercase, runs of `-`, `_`, `.` become one `-`
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;

    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }

    out
}

/// Yield non-empty lines with comments stripped and `\` continuations joined.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in content.lines().enumerate() {
        let stripped = strip_comment(raw);
        let (text, continues) = match stripped.trim_end().strip_suffix('\\') {
            Some(head) => (head.trim(), true),
            None => (stripped.trim(), false),
        };

        let entry = pending.get_or_insert_with(|| (idx + 1, String::new()));
        if !text.is_empty() {
            if !entry.1.is_empty() {
                entry.1.push(' ');
            }
            entry.1.push_str(text);
        }

        if !continues {
            if let Some((line_no, text)) = pending.take() {
                if !text.is_empty() {
                    lines.push((line_no, text));
                }
            }
        }
    }

    if let Some((line_no, text)) = pending {
        if !text.is_empty() {
            lines.push((line_no, text));
        }
    }

    lines
}

/// Drop a full-line `#` comment or a trailing ` #` comment.
///
/// A `#` glued to the previous token is kept: URL fragments like
/// `#egg=name` are part of the requirement.
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Archive file names pip installs from a local path or URL
const DISTRIBUTION_SUFFIXES: &[&str] = &[".whl", ".tar.gz", ".tgz", ".tar.bz2", ".zip"];

fn python_name(spec: &str) -> Option<String> {
    if let Some((_, fragment)) = spec.split_once("#egg=") {
        let name: String = fragment
            .chars()
            .take_while(|c| !matches!(c, '&' | ' ' | '['))
            .collect();
        return (!name.is_empty()).then_some(name);
    }

    let name: String = spec
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        return None;
    }

    // `https://...`, `C:\...`, `vendor/pkg`: a URL or path, not a name
    let rest = &spec[name.len()..];
    if rest.starts_with([':', '/', '\\']) {
        return None;
    }
    // `./pkg`, `../pkg`, `requests-2.31.0-py3-none-any.whl`
    if name.starts_with('.') || DISTRIBUTION_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return None;
    }

    Some(name)
}

fn node_name(spec: &str) -> Option<String> {
    // `./lib`, `/opt/pkg.tgz`, `file:../lib`, `github:user/repo`, `https://...`
    if spec.starts_with(['.', '/', '~']) || spec.split('@').next().is_some_and(|h| h.contains(':')) {
        return None;
    }
    if DISTRIBUTION_SUFFIXES.iter().any(|s| spec.ends_with(s)) {
        return None;
    }

    let name = match spec.strip_prefix('@') {
        Some(scoped) => {
            let end = scoped.find('@').unwrap_or(scoped.len());
            format!("@{}", &scoped[..end])
        }
        None => spec.split('@').next().unwrap_or_default().to_string(),
    };
    let name = name.trim().to_string();
    (!name.is_empty() && name != "@").then_some(name)
}
