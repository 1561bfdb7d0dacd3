//! Sprite URL normalization and spritemap URL resolution.

use std::path::{Component, Path, PathBuf};

/// Resolves `url(...)` values of one stylesheet to normalized file paths.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    base_dir: PathBuf,
    root: PathBuf,
}

impl UrlResolver {
    /// Relative URLs resolve against the stylesheet's directory, `/`-absolute URLs
    /// against `root` (the stylesheet's directory when not given).
    pub fn for_stylesheet(css: &Path, root: Option<&Path>) -> Self {
        let base_dir = css.parent().map(Path::to_path_buf).unwrap_or_default();
        let root = root.map(Path::to_path_buf).unwrap_or_else(|| base_dir.clone());
        Self { base_dir, root }
    }

    /// Returns `None` when the URL does not name a local file.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let url = strip_query(url.trim());
        if url.is_empty() || !is_local_url(url) {
            return None;
        }
        let joined = match url.strip_prefix('/') {
            Some(rest) => self.root.join(rest),
            None => self.base_dir.join(url),
        };
        Some(normalize(&joined))
    }
}

/// False for `data:` URIs, protocol-relative and scheme-qualified URLs.
pub fn is_local_url(url: &str) -> bool {
    if url.starts_with("//") {
        return false;
    }
    match url.find(':') {
        // a drive letter (`C:`) is a local path, anything longer is a scheme
        Some(idx) => idx == 1 && url.as_bytes()[0].is_ascii_alphabetic(),
        None => true,
    }
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Lexically folds `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `target` relative to the directory `base_dir`. Both are normalized first.
pub fn relative_path(target: &Path, base_dir: &Path) -> PathBuf {
    let target = normalize(target);
    let base = normalize(base_dir);
    let t: Vec<Component> = target.components().collect();
    let b: Vec<Component> = base.components().collect();
    let common = t.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let mut out = PathBuf::new();
    for _ in common..b.len() {
        out.push("..");
    }
    for c in &t[common..] {
        out.push(c.as_os_str());
    }
    out
}

/// Renders a path for embedding in CSS: forward slashes on every platform.
pub fn to_url(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// URL under which a stylesheet written to `css_out_dir` reaches `spritemap`.
pub fn spritemap_url(spritemap: &Path, css_out_dir: &Path, base_url: Option<&str>) -> String {
    match base_url {
        Some(base) => {
            let name = spritemap
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{}/{}", base.trim_end_matches(['/', '\\']), name).replace('\\', "/")
        }
        None => to_url(&relative_path(spritemap, css_out_dir)),
    }
}
