use serde::Serialize;

use pbx_types::{Dictionary, PlistValue};

use crate::error::StoreResult;
use crate::fields::{AttributeReader, Fields};
use crate::kind::isa;
use crate::reference::Reference;

/// Membership of a file or package product in a build phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuildFile {
    pub file_ref: Option<Reference>,
    pub product_ref: Option<Reference>,
    pub settings: Option<PlistValue>,
    pub extra: Dictionary,
}

impl BuildFile {
    pub fn for_file(file: Reference) -> Self {
        Self {
            file_ref: Some(file),
            ..Self::default()
        }
    }

    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            file_ref: reader.reference("fileRef")?,
            product_ref: reader.reference("productRef")?,
            settings: reader.value("settings"),
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.reference("fileRef", self.file_ref.as_ref());
        fields.reference("productRef", self.product_ref.as_ref());
        fields.value("settings", self.settings.as_ref());
        fields.extra(&self.extra);
    }
}

/// The build phase class, with the attributes specific to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhaseKind {
    Sources,
    Frameworks,
    Resources,
    Headers,
    CopyFiles {
        dst_path: Option<String>,
        dst_subfolder_spec: Option<String>,
    },
    ShellScript {
        shell_path: Option<String>,
        shell_script: Option<String>,
        input_paths: Vec<String>,
        output_paths: Vec<String>,
    },
    Rez,
}

impl BuildPhaseKind {
    pub fn isa(&self) -> &'static str {
        match self {
            Self::Sources => isa::SOURCES_PHASE,
            Self::Frameworks => isa::FRAMEWORKS_PHASE,
            Self::Resources => isa::RESOURCES_PHASE,
            Self::Headers => isa::HEADERS_PHASE,
            Self::CopyFiles { .. } => isa::COPY_FILES_PHASE,
            Self::ShellScript { .. } => isa::SHELL_SCRIPT_PHASE,
            Self::Rez => isa::REZ_PHASE,
        }
    }

    /// Name shown for a phase without an explicit `name`.
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Sources => "Sources",
            Self::Frameworks => "Frameworks",
            Self::Resources => "Resources",
            Self::Headers => "Headers",
            Self::CopyFiles { .. } => "CopyFiles",
            Self::ShellScript { .. } => "ShellScript",
            Self::Rez => "Rez",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildPhase {
    pub kind: BuildPhaseKind,
    pub name: Option<String>,
    pub files: Vec<Reference>,
    pub build_action_mask: Option<String>,
    pub run_only_for_deployment_postprocessing: Option<String>,
    pub extra: Dictionary,
}

impl BuildPhase {
    pub fn new(kind: BuildPhaseKind) -> Self {
        Self {
            kind,
            name: None,
            files: Vec::new(),
            build_action_mask: Some("2147483647".to_string()),
            run_only_for_deployment_postprocessing: Some("0".to_string()),
            extra: Dictionary::new(),
        }
    }

    pub fn isa(&self) -> &'static str {
        self.kind.isa()
    }

    /// Decode a phase whose attribute-free kind is already known.
    pub fn decode(reader: &mut AttributeReader<'_>, kind: BuildPhaseKind) -> StoreResult<Self> {
        Self::decode_with(reader, kind)
    }

    pub fn decode_copy_files(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        let kind = BuildPhaseKind::CopyFiles {
            dst_path: reader.string("dstPath")?,
            dst_subfolder_spec: reader.string("dstSubfolderSpec")?,
        };
        Self::decode_with(reader, kind)
    }

    pub fn decode_shell_script(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        let kind = BuildPhaseKind::ShellScript {
            shell_path: reader.string("shellPath")?,
            shell_script: reader.string("shellScript")?,
            input_paths: reader.strings("inputPaths")?,
            output_paths: reader.strings("outputPaths")?,
        };
        Self::decode_with(reader, kind)
    }

    fn decode_with(reader: &mut AttributeReader<'_>, kind: BuildPhaseKind) -> StoreResult<Self> {
        Ok(Self {
            kind,
            name: reader.string("name")?,
            files: reader.references("files")?,
            build_action_mask: reader.string("buildActionMask")?,
            run_only_for_deployment_postprocessing: reader
                .string("runOnlyForDeploymentPostprocessing")?,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        match &self.kind {
            BuildPhaseKind::CopyFiles {
                dst_path,
                dst_subfolder_spec,
            } => {
                fields.string("dstPath", dst_path.as_ref());
                fields.string("dstSubfolderSpec", dst_subfolder_spec.as_ref());
            }
            BuildPhaseKind::ShellScript {
                shell_path,
                shell_script,
                input_paths,
                output_paths,
            } => {
                fields.strings("inputPaths", input_paths);
                fields.strings("outputPaths", output_paths);
                fields.string("shellPath", shell_path.as_ref());
                fields.string("shellScript", shell_script.as_ref());
            }
            _ => {}
        }
        fields.string("buildActionMask", self.build_action_mask.as_ref());
        fields.references("files", &self.files);
        fields.string("name", self.name.as_ref());
        fields.string(
            "runOnlyForDeploymentPostprocessing",
            self.run_only_for_deployment_postprocessing.as_ref(),
        );
        fields.extra(&self.extra);
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind.default_name())
    }
}

/// A custom rule mapping input files to a compiler or script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuildRule {
    pub name: Option<String>,
    pub compiler_spec: Option<String>,
    pub file_type: Option<String>,
    pub is_editable: Option<String>,
    pub script: Option<String>,
    pub extra: Dictionary,
}

impl BuildRule {
    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            name: reader.string("name")?,
            compiler_spec: reader.string("compilerSpec")?,
            file_type: reader.string("fileType")?,
            is_editable: reader.string("isEditable")?,
            script: reader.string("script")?,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.string("compilerSpec", self.compiler_spec.as_ref());
        fields.string("fileType", self.file_type.as_ref());
        fields.string("isEditable", self.is_editable.as_ref());
        fields.string("name", self.name.as_ref());
        fields.string("script", self.script.as_ref());
        fields.extra(&self.extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names() {
        assert_eq!(BuildPhase::new(BuildPhaseKind::Sources).display_name(), "Sources");
        let mut phase = BuildPhase::new(BuildPhaseKind::ShellScript {
            shell_path: Some("/bin/sh".into()),
            shell_script: Some("exit 0".into()),
            input_paths: vec![],
            output_paths: vec![],
        });
        assert_eq!(phase.display_name(), "ShellScript");
        phase.name = Some("Lint".into());
        assert_eq!(phase.display_name(), "Lint");
        assert_eq!(phase.isa(), "PBXShellScriptBuildPhase");
    }

    #[test]
    fn shell_script_always_writes_path_lists() {
        let phase = BuildPhase::new(BuildPhaseKind::ShellScript {
            shell_path: None,
            shell_script: None,
            input_paths: vec![],
            output_paths: vec!["$(DERIVED_FILE_DIR)/out".into()],
        });
        let mut fields = Fields::new();
        phase.encode(&mut fields);
        assert!(fields.get("inputPaths").is_some());
        assert!(fields.get("outputPaths").is_some());
        assert!(fields.get("shellPath").is_none());
        assert!(fields.get("files").is_some());
    }
}
