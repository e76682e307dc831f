use std::path::{Component, Path, PathBuf};

/// Relative link from directory `from` to directory `to`, `/`-separated.
///
/// Purely lexical: relative inputs are anchored at the current directory and
/// `..` is resolved without looking at the filesystem, so symlinks aren't followed.
pub fn relative_link(from: impl AsRef<Path>, to: impl AsRef<Path>) -> std::io::Result<String> {
    let from = normalize(&std::path::absolute(from)?);
    let to = normalize(&std::path::absolute(to)?);

    let from: Vec<_> = from.components().collect();
    let to: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat_n("..".to_owned(), from.len() - common));
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    Ok(parts.join("/"))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
