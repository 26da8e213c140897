//! PathResolver - composes and probes template/schema candidates

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::PathError;
use crate::types::{DirectiveType, LayerType, TwoParams};

/// Outcome of a resolution, including the candidates probed on the way
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    pub absolute_path: PathBuf,
    pub existed: bool,
    pub attempted_candidates: Vec<PathBuf>,
}

impl ResolvedPath {
    /// A path that was looked for but not found; points at the first candidate
    pub fn missing(attempted: Vec<PathBuf>) -> Self {
        Self {
            absolute_path: attempted.first().cloned().unwrap_or_default(),
            existed: false,
            attempted_candidates: attempted,
        }
    }
}

/// How the final path segment is named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNaming {
    /// `f_{layer}.md` or `f_{layer}_{adaptation}.md`, keyed by the from-layer when set
    Template,
    /// A fixed file name in every directive/layer directory (schemas)
    Fixed(String),
}

/// The tokens and overrides for a single lookup
#[derive(Debug, Clone, Copy)]
pub struct PathRequest<'a> {
    pub directive: &'a DirectiveType,
    pub layer: &'a LayerType,
    /// Layer whose name selects the file, instead of the destination layer
    pub from_layer: Option<&'a LayerType>,
    /// Template variant suffix
    pub adaptation: Option<&'a str>,
}

impl<'a> PathRequest<'a> {
    pub fn new(params: &'a TwoParams) -> Self {
        Self {
            directive: &params.directive,
            layer: &params.layer,
            from_layer: None,
            adaptation: None,
        }
    }

    pub fn with_from_layer(mut self, from_layer: Option<&'a LayerType>) -> Self {
        self.from_layer = from_layer;
        self
    }

    pub fn with_adaptation(mut self, adaptation: Option<&'a str>) -> Self {
        self.adaptation = adaptation;
        self
    }
}

/// Resolves `{base}/{directive}/{layer}/{filename}` under one configured root
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// `cwd/working_dir/base_dir`, lexically normalized
    base: PathBuf,
    naming: FileNaming,
    /// Retry the unsuffixed template when the adaptation template is missing
    adaptation_fallback: bool,
}

impl PathResolver {
    /// Resolver for prompt templates
    ///
    /// `base_dir` is always taken relative to `cwd/working_dir` and must stay inside it.
    pub fn new(cwd: &Path, working_dir: &Path, base_dir: &Path) -> Result<Self, PathError> {
        let root = normalize(&cwd.join(working_dir));
        if base_dir.is_absolute() || base_dir.has_root() {
            return Err(PathError::InvalidPath {
                what: "base dir",
                segment: base_dir.display().to_string(),
                reason: "must be relative to the working dir",
            });
        }

        let base = normalize(&root.join(base_dir));
        if !base.starts_with(&root) {
            return Err(PathError::SecurityViolation { path: base, base: root });
        }

        Ok(Self {
            base,
            naming: FileNaming::Template,
            adaptation_fallback: true,
        })
    }

    /// Resolver for schema files with a fixed file name
    pub fn for_schema(
        cwd: &Path,
        working_dir: &Path,
        base_dir: &Path,
        filename: impl Into<String>,
    ) -> Result<Self, PathError> {
        Ok(Self {
            naming: FileNaming::Fixed(filename.into()),
            ..Self::new(cwd, working_dir, base_dir)?
        })
    }

    pub fn with_adaptation_fallback(mut self, enabled: bool) -> Self {
        self.adaptation_fallback = enabled;
        self
    }

    /// The root every candidate lives under
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Compose the candidates for `request`, in probe order, without touching the filesystem
    pub fn candidates(&self, request: &PathRequest<'_>) -> Result<Vec<PathBuf>, PathError> {
        debug!(?request, base = ?self.base, "PathResolver::candidates: called");
        self.check_segment("directive", request.directive.as_str())?;
        self.check_segment("layer", request.layer.as_str())?;
        if let Some(from_layer) = request.from_layer {
            self.check_segment("from-layer", from_layer.as_str())?;
        }
        if let Some(adaptation) = request.adaptation {
            self.check_segment("adaptation", adaptation)?;
        }

        let dir = self.base.join(request.directive.as_str()).join(request.layer.as_str());

        let names = match &self.naming {
            FileNaming::Template => {
                let effective_layer = request.from_layer.unwrap_or(request.layer);
                let base_name = format!("f_{}.md", effective_layer);
                match request.adaptation {
                    Some(adaptation) => {
                        let adapted = format!("f_{}_{}.md", effective_layer, adaptation);
                        if self.adaptation_fallback {
                            vec![adapted, base_name]
                        } else {
                            vec![adapted]
                        }
                    }
                    None => vec![base_name],
                }
            }
            FileNaming::Fixed(name) => {
                self.check_segment("file name", name)?;
                vec![name.clone()]
            }
        };

        let candidates: Vec<PathBuf> = names.into_iter().map(|name| dir.join(name)).collect();
        for candidate in &candidates {
            if !normalize(candidate).starts_with(&self.base) {
                return Err(PathError::SecurityViolation {
                    path: candidate.clone(),
                    base: self.base.clone(),
                });
            }
        }
        Ok(candidates)
    }

    /// Probe candidates in order and return the first that exists
    pub fn resolve(&self, request: &PathRequest<'_>) -> Result<ResolvedPath, PathError> {
        let candidates = self.candidates(request)?;
        let mut attempted = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let found = probe(&candidate)?;
            attempted.push(candidate.clone());
            if found {
                self.check_contained(&candidate)?;
                info!("Resolved {}", candidate.display());
                return Ok(ResolvedPath {
                    absolute_path: candidate,
                    existed: true,
                    attempted_candidates: attempted,
                });
            }
            debug!(?candidate, "PathResolver::resolve: candidate absent");
        }

        Err(PathError::TemplateNotFound { attempted })
    }

    /// Every token must be one plain path component
    fn check_segment(&self, what: &'static str, segment: &str) -> Result<(), PathError> {
        if segment.is_empty() {
            return Err(PathError::InvalidPath {
                what,
                segment: segment.to_string(),
                reason: "empty",
            });
        }
        if segment.contains('\0') {
            return Err(PathError::InvalidPath {
                what,
                segment: segment.to_string(),
                reason: "contains NUL",
            });
        }

        let mut components = Path::new(segment).components();
        let single_normal = matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none();
        if !single_normal || segment.contains('/') || segment.contains('\\') {
            return Err(PathError::SecurityViolation {
                path: self.base.join(segment),
                base: self.base.clone(),
            });
        }
        Ok(())
    }

    /// Symlinks must not lead an existing candidate out of the base
    fn check_contained(&self, candidate: &Path) -> Result<(), PathError> {
        let canonical = candidate.canonicalize().map_err(|source| PathError::Io {
            path: candidate.to_path_buf(),
            source,
        })?;
        let base = self.base.canonicalize().unwrap_or_else(|_| self.base.clone());

        if canonical.starts_with(&base) {
            Ok(())
        } else {
            Err(PathError::SecurityViolation {
                path: canonical,
                base,
            })
        }
    }
}

fn probe(path: &Path) -> Result<bool, PathError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(false),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(PathError::PermissionDenied {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(PathError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
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
