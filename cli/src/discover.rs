use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use assembler::{BuildConfig, SourceFile};
use quizdoc::DocPath;

/// Read every content file under `root`, sorted by corpus path.
pub fn discover(root: &Path, config: &BuildConfig) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let mut files = Vec::new();
    collect(root, config, &mut files)?;

    let mut sources = files
        .into_iter()
        .map(|path| {
            let bytes =
                std::fs::read(&path).with_context(|| format!("cannot read {}", path.display()))?;
            Ok(SourceFile::from_bytes(relative_path(root, &path), bytes))
        })
        .collect::<Result<Vec<_>>>()?;
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}

fn collect(dir: &Path, config: &BuildConfig, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("cannot list {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("cannot list {}", dir.display()))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            if config.content.ignore.contains(&name) {
                debug!(path = %path.display(), "skipping ignored directory");
                continue;
            }
            collect(&path, config, out)?;
        } else if is_content_file(&path, config) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_content_file(path: &Path, config: &BuildConfig) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| config.content.extensions.iter().any(|wanted| wanted == ext))
}

fn relative_path(root: &Path, path: &Path) -> DocPath {
    let relative = path.strip_prefix(root).unwrap_or(path);
    DocPath::from_segments(
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy()),
    )
}
