use serde::Serialize;

use pbx_types::Dictionary;

use crate::error::StoreResult;
use crate::fields::{AttributeReader, Fields};
use crate::reference::Reference;

/// One named set of build settings, such as `Debug` or `Release`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    pub name: String,
    pub base_configuration_reference: Option<Reference>,
    pub build_settings: Dictionary,
    pub extra: Dictionary,
}

impl BuildConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_configuration_reference: None,
            build_settings: Dictionary::new(),
            extra: Dictionary::new(),
        }
    }

    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            name: reader.required_string("name")?,
            base_configuration_reference: reader.reference("baseConfigurationReference")?,
            build_settings: reader.dictionary("buildSettings")?.unwrap_or_default(),
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.reference(
            "baseConfigurationReference",
            self.base_configuration_reference.as_ref(),
        );
        fields.dictionary("buildSettings", &self.build_settings);
        fields.text("name", self.name.as_str());
        fields.extra(&self.extra);
    }
}

/// The configurations available to a project or target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConfigurationList {
    pub build_configurations: Vec<Reference>,
    pub default_configuration_is_visible: Option<String>,
    pub default_configuration_name: Option<String>,
    pub extra: Dictionary,
}

impl ConfigurationList {
    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            build_configurations: reader.references("buildConfigurations")?,
            default_configuration_is_visible: reader.string("defaultConfigurationIsVisible")?,
            default_configuration_name: reader.string("defaultConfigurationName")?,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.references("buildConfigurations", &self.build_configurations);
        fields.string(
            "defaultConfigurationIsVisible",
            self.default_configuration_is_visible.as_ref(),
        );
        fields.string(
            "defaultConfigurationName",
            self.default_configuration_name.as_ref(),
        );
        fields.extra(&self.extra);
    }
}
