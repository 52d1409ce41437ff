use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use pbx_codec::{Decoder, Encoder, OutputSettings};
use pbx_store::{Document, ObjectKind, PbxObject};
use pbx_types::Dictionary;

use crate::diff::{diff_documents, DocumentDiff};
use crate::error::{SdkError, SdkResult};

/// File name of the object graph inside a project bundle.
pub const PROJECT_FILE_NAME: &str = "project.pbxproj";
/// Extension of a project bundle directory.
pub const BUNDLE_EXTENSION: &str = "xcodeproj";

/// A project file loaded from disk or memory.
///
/// Wraps a [`Document`] with the project name inferred from the bundle
/// directory, which the file itself does not record.
#[derive(Debug)]
pub struct ProjectFile {
    document: Document,
    name: Option<String>,
    path: Option<PathBuf>,
}

impl ProjectFile {
    /// Open a `project.pbxproj` file or the bundle directory containing one.
    pub fn open(path: impl AsRef<Path>) -> SdkResult<Self> {
        Self::open_with(path, &Decoder::default())
    }

    pub fn open_with(path: impl AsRef<Path>, decoder: &Decoder) -> SdkResult<Self> {
        let file = project_file_path(path.as_ref());
        let bytes = fs::read(&file)?;
        let mut project = Self::from_bytes_with(&bytes, decoder)?;
        if let Some(name) = infer_name(&file) {
            project.set_name(name)?;
        }
        info!(path = %file.display(), objects = project.document.objects().len(), "project opened");
        project.path = Some(file);
        Ok(project)
    }

    pub fn from_bytes(bytes: &[u8]) -> SdkResult<Self> {
        Self::from_bytes_with(bytes, &Decoder::default())
    }

    pub fn from_bytes_with(bytes: &[u8], decoder: &Decoder) -> SdkResult<Self> {
        Ok(Self::from_document(decoder.decode_bytes(bytes)?))
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            name: None,
            path: None,
        }
    }

    /// The project name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the project name. It appears in annotation comments only.
    pub fn set_name(&mut self, name: impl Into<String>) -> SdkResult<()> {
        let name = name.into();
        self.document.set_project_name(name.clone())?;
        self.name = Some(name);
        Ok(())
    }

    /// Where the file was read from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Encode with default settings, regenerating pending identifiers.
    pub fn encode_default(&mut self) -> SdkResult<String> {
        self.encode(&OutputSettings::default())
    }

    pub fn encode(&mut self, settings: &OutputSettings) -> SdkResult<String> {
        Ok(Encoder::new(settings.clone()).encode(&mut self.document)?)
    }

    /// Encode and write to `path`.
    ///
    /// A bundle directory path writes `project.pbxproj` inside it, creating
    /// the directory if needed. An existing file is an error unless
    /// `overwrite` is set, in which case it is removed first. Encoding
    /// happens before the existing file is touched, so a failed encode
    /// leaves it in place.
    pub fn write(
        &mut self,
        path: impl AsRef<Path>,
        overwrite: bool,
        settings: &OutputSettings,
    ) -> SdkResult<PathBuf> {
        let target = project_file_path(path.as_ref());
        if target.exists() && !overwrite {
            return Err(SdkError::AlreadyExists(target));
        }
        let text = self.encode(settings)?;
        if target.exists() {
            fs::remove_file(&target)?;
        }
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, text.as_bytes())?;
        debug!(path = %target.display(), bytes = text.len(), "project written");
        Ok(target)
    }

    /// Structural difference from `self` to `other`.
    pub fn diff(&self, other: &ProjectFile) -> DocumentDiff {
        diff_documents(&self.document, &other.document)
    }

    /// Object counts by kind, skipping kinds with no objects.
    pub fn stats(&self) -> Vec<(ObjectKind, usize)> {
        ObjectKind::ALL
            .iter()
            .map(|kind| (*kind, self.document.objects().count_of_kind(*kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// The whole graph as JSON: versions, root and objects in identifier
    /// order.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        let mut objects = self.document.objects().objects();
        objects.sort_by_cached_key(PbxObject::identifier);
        serde_json::to_value(JsonDocument {
            name: self.name.as_deref(),
            archive_version: self.document.archive_version(),
            object_version: self.document.object_version(),
            classes: self.document.classes(),
            root_object: self.document.root().identifier().to_string(),
            objects,
        })
    }
}

impl PartialEq for ProjectFile {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl Eq for ProjectFile {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    archive_version: u32,
    object_version: u32,
    classes: &'a Dictionary,
    root_object: String,
    objects: Vec<PbxObject>,
}

/// Resolve a bundle directory to the object graph file inside it.
fn project_file_path(path: &Path) -> PathBuf {
    let is_bundle = path.extension().is_some_and(|ext| ext == BUNDLE_EXTENSION);
    if path.is_dir() || is_bundle {
        path.join(PROJECT_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// `App.xcodeproj/project.pbxproj` is project "App".
fn infer_name(file: &Path) -> Option<String> {
    let bundle = file.parent()?;
    if bundle.extension()? != BUNDLE_EXTENSION {
        return None;
    }
    bundle
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}
