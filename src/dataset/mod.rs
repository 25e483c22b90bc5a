//! Dataset reshaping for ACRONYM-style grasp annotations.
//!
//! Grasp annotation files are named `<category>_<identifier>_<scale>.h5`
//! while the ShapeNet OBJ dump stores meshes flat as `<identifier>.obj`.
//! [`MeshReshaper`] walks the annotation directory and copies every mesh that
//! has an annotation into `<mesh_dir>/<category>/<identifier>.obj`.
//!
//! Identifiers without a source mesh are reported with a warning and skipped.
//! Running the reshaper twice yields the same destination tree as running it
//! once since every copy overwrites its previous result.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

pub const ANNOTATION_EXTENSION: &str = "h5";
pub const MESH_EXTENSION: &str = "obj";
const SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReshapeError {
    /// The annotation filename does not follow `<category>_<identifier>...`.
    MalformedName(String),
}

impl fmt::Display for ReshapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReshapeError::MalformedName(name) => write!(
                f,
                "annotation file {name:?} does not match <category>_<identifier>_*.{ANNOTATION_EXTENSION}"
            ),
        }
    }
}

impl std::error::Error for ReshapeError {}

/// Category and shape identifier encoded in an annotation filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationName {
    pub category: String,
    pub identifier: String,
}

impl AnnotationName {
    /// Splits `<category>_<identifier>_<rest>.h5` into its parts.
    ///
    /// Names with only two segments (`Mug_1a2b.h5`) are accepted as well, in
    /// which case the extension is stripped from the identifier.
    pub fn parse(file_name: &str) -> Result<Self, ReshapeError> {
        let malformed = || ReshapeError::MalformedName(file_name.to_string());
        let mut segments = file_name.split(SEPARATOR);
        let category = segments.next().filter(|s| !s.is_empty()).ok_or_else(malformed)?;
        let identifier = segments.next().ok_or_else(malformed)?;
        let identifier = if segments.next().is_none() {
            Path::new(identifier)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(identifier)
        } else {
            identifier
        };
        if identifier.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            category: category.to_string(),
            identifier: identifier.to_string(),
        })
    }

    pub fn mesh_file_name(&self) -> String {
        format!("{}.{}", self.identifier, MESH_EXTENSION)
    }
}

/// Outcome of a single [`MeshReshaper::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReshapeReport {
    /// Destination paths written during this run, in processing order.
    pub copied: Vec<PathBuf>,
    /// Identifiers for which no source mesh exists.
    pub missing: Vec<String>,
    /// Entries of the annotation directory that are not annotation files.
    pub ignored: usize,
}

#[derive(Debug, Clone)]
pub struct MeshReshaper {
    pub grasp_dir: PathBuf,
    pub obj_dir: PathBuf,
    pub mesh_dir: PathBuf,
}

impl MeshReshaper {
    pub fn new(
        grasp_dir: impl Into<PathBuf>,
        obj_dir: impl Into<PathBuf>,
        mesh_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            grasp_dir: grasp_dir.into(),
            obj_dir: obj_dir.into(),
            mesh_dir: mesh_dir.into(),
        }
    }

    /// Lists annotation filenames sorted by name and counts everything else.
    fn annotation_files(&self) -> anyhow::Result<(Vec<String>, usize)> {
        let entries = fs::read_dir(&self.grasp_dir).with_context(|| {
            format!("read annotation directory {}", self.grasp_dir.display())
        })?;
        let mut files = Vec::new();
        let mut ignored = 0;
        for entry in entries {
            let entry = entry
                .with_context(|| format!("list {}", self.grasp_dir.display()))?;
            let path = entry.path();
            let is_annotation = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(ANNOTATION_EXTENSION);
            match entry.file_name().into_string() {
                Ok(name) if is_annotation => files.push(name),
                _ => ignored += 1,
            }
        }
        files.sort();
        Ok((files, ignored))
    }

    pub fn run(&self) -> anyhow::Result<ReshapeReport> {
        let (files, ignored) = self.annotation_files()?;
        fs::create_dir_all(&self.mesh_dir)
            .with_context(|| format!("create mesh directory {}", self.mesh_dir.display()))?;

        let mut report = ReshapeReport {
            ignored,
            ..Default::default()
        };
        let total = files.len();
        log::info!(
            "Processing {} annotation files from {}",
            total,
            self.grasp_dir.display()
        );
        // Roughly twenty progress lines per run
        let step = (total / 20).max(1);

        for (idx, file_name) in files.iter().enumerate() {
            let name = AnnotationName::parse(file_name)?;
            match self.copy_mesh(&name)? {
                Some(dest) => report.copied.push(dest),
                None => {
                    log::warn!("OBJ file for {} not found", name.identifier);
                    report.missing.push(name.identifier);
                }
            }
            if (idx + 1) % step == 0 || idx + 1 == total {
                log::info!("Processing files: {}/{}", idx + 1, total);
            }
        }
        Ok(report)
    }

    /// Copies the source mesh for `name` if it exists and returns the destination.
    fn copy_mesh(&self, name: &AnnotationName) -> anyhow::Result<Option<PathBuf>> {
        let source = self.obj_dir.join(name.mesh_file_name());
        if !source.is_file() {
            return Ok(None);
        }
        let dest_dir = self.mesh_dir.join(&name.category);
        fs::create_dir_all(&dest_dir)
            .with_context(|| format!("create category directory {}", dest_dir.display()))?;
        let dest = dest_dir.join(name.mesh_file_name());
        fs::copy(&source, &dest).with_context(|| {
            format!("copy {} to {}", source.display(), dest.display())
        })?;
        log::debug!("{} -> {}", source.display(), dest.display());
        Ok(Some(dest))
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" { Some("") } else { path.strip_prefix("~/") };
    match (rest, std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
