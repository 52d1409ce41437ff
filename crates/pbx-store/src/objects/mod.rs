//! Typed bodies for every object class the graph models.
//!
//! Each type pairs a `decode` constructor reading from an
//! [`AttributeReader`](crate::AttributeReader) with an `encode` method
//! describing its attributes as [`Fields`](crate::Fields). Attributes a type
//! does not model are kept in its `extra` table and written back unchanged.

mod build;
mod configuration;
mod file_element;
mod package;
mod project;
mod target;
mod unknown;

pub use build::{BuildFile, BuildPhase, BuildPhaseKind, BuildRule};
pub use configuration::{BuildConfiguration, ConfigurationList};
pub use file_element::{FileReference, Group, GroupKind, ReferenceProxy};
pub use package::{PackageLocation, PackageProduct, PackageReference};
pub use project::{Project, ProjectReference};
pub use target::{ContainerItemProxy, Target, TargetDependency, TargetKind};
pub use unknown::UnknownObject;
