use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::AnalysisConfig;
use crate::error::{AuditError, AuditResult};
use crate::model::DirectoryBatch;

/// Lists every directory under `root` (root included, walk sorted by name)
/// together with the matching images directly inside it.
///
/// Only an unreadable root is an error. Subdirectories that cannot be read
/// are skipped and reported through `warnings`.
pub fn enumerate_directories(
    root: &Path,
    config: &AnalysisConfig,
    warnings: &mut Vec<String>,
) -> AuditResult<Vec<DirectoryBatch>> {
    fs::read_dir(root).map_err(|source| AuditError::DirectoryAccess {
        path: root.to_path_buf(),
        source,
    })?;

    let excludes = ExcludeRules::compile(root, &config.excludes, warnings);
    let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth);
    }
    let iter = walker
        .into_iter()
        .filter_entry(|entry| !excludes.skips(entry.path()));

    let mut batches = Vec::new();
    let mut skipped: HashSet<PathBuf> = HashSet::new();
    for item in iter {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let already_reported = err.path().is_some_and(|path| skipped.contains(path));
                if !already_reported {
                    push_warning(
                        warnings,
                        format!("walk error under {}: {}", root.display(), err),
                    );
                }
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let directory = entry.path();
        match list_images(directory, config, &excludes, warnings) {
            Ok(images) => batches.push(DirectoryBatch {
                directory: directory.to_path_buf(),
                images,
            }),
            Err(err) => {
                push_warning(
                    warnings,
                    format!("skipping unreadable directory {}: {}", directory.display(), err),
                );
                skipped.insert(directory.to_path_buf());
            }
        }
    }

    Ok(batches)
}

/// Non-recursive listing of the matching regular files in one directory,
/// sorted by file name.
fn list_images(
    directory: &Path,
    config: &AnalysisConfig,
    excludes: &ExcludeRules,
    warnings: &mut Vec<String>,
) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for item in fs::read_dir(directory)? {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                push_warning(
                    warnings,
                    format!("entry read failed in {}: {}", directory.display(), err),
                );
                continue;
            }
        };
        let path = entry.path();
        if !config.matches_extension(&path) || excludes.skips(&path) {
            continue;
        }
        let is_file = match entry.file_type() {
            Ok(file_type) if file_type.is_symlink() => path.is_file(),
            Ok(file_type) => file_type.is_file(),
            Err(err) => {
                push_warning(
                    warnings,
                    format!("file type read failed for {}: {}", path.display(), err),
                );
                false
            }
        };
        if is_file {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

/// Exclude patterns, evaluated against paths relative to the analysis root
/// so the root's own location never excludes anything.
///
/// A pattern with glob syntax (`*`, `?`, `[`, `{`) is matched, case-insensitively,
/// against both the relative path and the bare file name, so `*.tmp.jpg`
/// works at any depth. Any other pattern is a case-insensitive fragment of the
/// relative path (`@eaDir`, `thumbnails`).
pub(crate) struct ExcludeRules {
    root: PathBuf,
    globs: GlobSet,
    fragments: Vec<String>,
}

impl ExcludeRules {
    pub(crate) fn compile(root: &Path, patterns: &[String], warnings: &mut Vec<String>) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut fragments = Vec::new();
        for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            if !pattern.contains(['*', '?', '[', '{']) {
                fragments.push(pattern.to_lowercase());
                continue;
            }
            match GlobBuilder::new(pattern).case_insensitive(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    push_warning(
                        warnings,
                        format!(
                            "exclude pattern '{pattern}' is not a valid glob ({err}); matching it literally"
                        ),
                    );
                    fragments.push(pattern.to_lowercase());
                }
            }
        }

        let globs = builder.build().unwrap_or_else(|err| {
            push_warning(warnings, format!("exclude globs ignored: {err}"));
            GlobSet::empty()
        });

        Self {
            root: root.to_path_buf(),
            globs,
            fragments,
        }
    }

    pub(crate) fn skips(&self, path: &Path) -> bool {
        let relative = match path.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative,
            _ => return false,
        };

        if !self.globs.is_empty() {
            let name_matches = relative
                .file_name()
                .is_some_and(|name| self.globs.is_match(Path::new(name)));
            if name_matches || self.globs.is_match(relative) {
                return true;
            }
        }

        let lowered = relative.to_string_lossy().to_lowercase();
        self.fragments
            .iter()
            .any(|fragment| lowered.contains(fragment.as_str()))
    }
}
