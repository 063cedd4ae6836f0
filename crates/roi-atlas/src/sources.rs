//! Label and mask file discovery for user-defined atlases.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use roi_core::{ErrorInfo, RoiError};
use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

/// Placeholder replaced by the subject id in subject-level source paths.
pub const SUBJECT_PLACEHOLDER: &str = "$subject";

/// Extensions accepted for surface label sources.
pub const LABEL_EXTENSIONS: &[&str] = &["label"];

/// Extensions accepted for volume mask sources.
pub const MASK_EXTENSIONS: &[&str] = &["nii", "nii.gz", "img", "mgz", "mgh"];

/// Companion files that sit next to images and are never regions themselves.
const COMPANION_EXTENSIONS: &[&str] = &["hdr", "mat"];

/// `sourcefiles` as written in the project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceFiles {
    /// Explicit file names, relative to `sourcedir` unless absolute.
    Listed(Vec<String>),
    /// The keyword `all`.
    Keyword(String),
}

/// Source files after discovery, in region-id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSources {
    /// Resolved paths.
    pub files: Vec<PathBuf>,
    /// Default region names (file stems without the recognised extension).
    pub stems: Vec<String>,
    /// Missing-file warnings.
    pub warnings: Vec<String>,
}

fn glob_error(err: impl ToString) -> RoiError {
    RoiError::Config(ErrorInfo::new("source_glob", err.to_string()))
}

fn extension_set(extensions: &[&str]) -> Result<GlobSet, RoiError> {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        builder.add(Glob::new(&format!("*.{ext}")).map_err(glob_error)?);
    }
    builder.build().map_err(glob_error)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_companion(name: &str) -> bool {
    COMPANION_EXTENSIONS
        .iter()
        .any(|ext| name.to_ascii_lowercase().ends_with(&format!(".{ext}")))
}

fn stem(name: &str, extensions: &[&str]) -> String {
    let mut longest = name;
    for ext in extensions {
        if let Some(stripped) = name.strip_suffix(&format!(".{ext}")) {
            if stripped.len() < longest.len() {
                longest = stripped;
            }
        }
    }
    longest.to_string()
}

/// Resolves `sourcefiles` against `sourcedir`.
///
/// `all` enumerates the directory (non-recursive, name order) for files with
/// a recognised extension and fails when none is found. An explicit list keeps
/// its order; unknown extensions are fatal, missing files only warn, and paths
/// containing [`SUBJECT_PLACEHOLDER`] are not checked.
pub fn resolve_sources(
    sourcedir: &Path,
    files: &SourceFiles,
    extensions: &[&str],
) -> Result<ResolvedSources, RoiError> {
    let known = extension_set(extensions)?;
    let mut resolved = ResolvedSources::default();
    match files {
        SourceFiles::Keyword(word) if word.eq_ignore_ascii_case("all") => {
            if sourcedir.to_string_lossy().contains(SUBJECT_PLACEHOLDER) {
                return Err(RoiError::Config(
                    ErrorInfo::new("source_glob", "cannot enumerate a subject-level directory")
                        .with_context("sourcedir", sourcedir.display().to_string())
                        .with_hint("list the source files explicitly"),
                ));
            }
            for entry in WalkDir::new(sourcedir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = file_name(entry.path());
                if is_companion(&name) || !known.is_match(&name) {
                    continue;
                }
                resolved.stems.push(stem(&name, extensions));
                resolved.files.push(entry.into_path());
            }
            if resolved.files.is_empty() {
                return Err(RoiError::Config(
                    ErrorInfo::new("no_sources", "no source files found")
                        .with_context("sourcedir", sourcedir.display().to_string())
                        .with_context("extensions", extensions.join(",")),
                ));
            }
        }
        SourceFiles::Keyword(word) => {
            return Err(RoiError::Config(
                ErrorInfo::new("sourcefiles", "expected 'all' or a list of files")
                    .with_context("value", word.as_str()),
            ))
        }
        SourceFiles::Listed(listed) => {
            for item in listed {
                let path = sourcedir.join(item);
                let name = file_name(&path);
                if is_companion(&name) {
                    continue;
                }
                if !known.is_match(&name) {
                    return Err(RoiError::Config(
                        ErrorInfo::new("source_type", "unrecognized source file type")
                            .with_context("file", item.as_str())
                            .with_context("extensions", extensions.join(",")),
                    ));
                }
                let templated = path.to_string_lossy().contains(SUBJECT_PLACEHOLDER);
                if !templated && !path.is_file() {
                    warn!(path = %path.display(), "source file does not exist");
                    resolved
                        .warnings
                        .push(format!("source file does not exist: {}", path.display()));
                }
                resolved.stems.push(stem(&name, extensions));
                resolved.files.push(path);
            }
            if resolved.files.is_empty() {
                return Err(RoiError::Config(
                    ErrorInfo::new("no_sources", "no source files found")
                        .with_context("sourcedir", sourcedir.display().to_string()),
                ));
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_drop_the_longest_known_extension() {
        assert_eq!(stem("amygdala.nii.gz", MASK_EXTENSIONS), "amygdala");
        assert_eq!(stem("v1.label", LABEL_EXTENSIONS), "v1");
    }

    #[test]
    fn companions_are_recognised() {
        assert!(is_companion("mask.hdr"));
        assert!(is_companion("reg.MAT"));
        assert!(!is_companion("mask.img"));
    }
}
