use serde::Serialize;

use pbx_types::{Dictionary, PlistValue};

use crate::error::StoreResult;
use crate::fields::{AttributeReader, Fields};
use crate::kind::isa;
use crate::reference::Reference;

/// Where a Swift package comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageLocation {
    Remote {
        repository_url: Option<String>,
        requirement: Option<PlistValue>,
    },
    Local {
        relative_path: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageReference {
    pub location: PackageLocation,
    pub extra: Dictionary,
}

impl PackageReference {
    pub fn isa(&self) -> &'static str {
        match self.location {
            PackageLocation::Remote { .. } => isa::REMOTE_PACKAGE_REFERENCE,
            PackageLocation::Local { .. } => isa::LOCAL_PACKAGE_REFERENCE,
        }
    }

    pub fn decode_remote(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        let location = PackageLocation::Remote {
            repository_url: reader.string("repositoryURL")?,
            requirement: reader.value("requirement"),
        };
        Ok(Self {
            location,
            extra: reader.finish(),
        })
    }

    pub fn decode_local(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        let location = PackageLocation::Local {
            relative_path: reader.string("relativePath")?,
        };
        Ok(Self {
            location,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        match &self.location {
            PackageLocation::Remote {
                repository_url,
                requirement,
            } => {
                fields.string("repositoryURL", repository_url.as_ref());
                fields.value("requirement", requirement.as_ref());
            }
            PackageLocation::Local { relative_path } => {
                fields.string("relativePath", relative_path.as_ref());
            }
        }
        fields.extra(&self.extra);
    }

    /// Short package name: the last URL or path component, minus `.git`.
    pub fn display_name(&self) -> Option<&str> {
        let location = match &self.location {
            PackageLocation::Remote { repository_url, .. } => repository_url.as_deref(),
            PackageLocation::Local { relative_path } => relative_path.as_deref(),
        }?;
        let last = location.trim_end_matches('/').rsplit('/').next()?;
        Some(last.strip_suffix(".git").unwrap_or(last))
    }
}

/// A product of a Swift package that a target links against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageProduct {
    pub package: Option<Reference>,
    pub product_name: String,
    pub extra: Dictionary,
}

impl PackageProduct {
    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            package: reader.reference("package")?,
            product_name: reader.required_string("productName")?,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.reference("package", self.package.as_ref());
        fields.text("productName", self.product_name.as_str());
        fields.extra(&self.extra);
    }
}
