use rayon::prelude::*;
use tracing::{debug, warn};

use pbx_store::objects::UnknownObject;
use pbx_store::{
    AttributeReader, Document, ObjectBody, ObjectStore, PbxObject, DEFAULT_ARCHIVE_VERSION,
    DEFAULT_OBJECT_VERSION,
};
use pbx_types::{Dictionary, Identifier, PlistValue};

use crate::config::{DecodeOptions, UnknownObjectPolicy};
use crate::error::{DecodeError, DecodeResult};
use crate::registry::DiscriminatorRegistry;

const TOP_LEVEL_KEYS: [&str; 5] = [
    "archiveVersion",
    "classes",
    "objectVersion",
    "objects",
    "rootObject",
];

/// Turns project-file text into a [`Document`].
///
/// Objects are built in parallel; each entry of the object table is
/// independent once its references are interned, and interning is atomic.
/// The group tree's parent links are computed afterwards in one sequential
/// pass. The result does not depend on the number of workers.
#[derive(Debug, Default)]
pub struct Decoder {
    options: DecodeOptions,
    registry: DiscriminatorRegistry,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            registry: DiscriminatorRegistry::standard(),
        }
    }

    /// Use a custom class registry.
    pub fn with_registry(options: DecodeOptions, registry: DiscriminatorRegistry) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> DecodeResult<Document> {
        self.decode_str(std::str::from_utf8(bytes)?)
    }

    pub fn decode_str(&self, text: &str) -> DecodeResult<Document> {
        self.decode_value(pbx_plist::parse(text)?)
    }

    /// Decode an already-parsed top-level dictionary.
    pub fn decode_value(&self, value: PlistValue) -> DecodeResult<Document> {
        let type_name = value.type_name();
        let Some(mut top) = value.into_dictionary() else {
            return Err(DecodeError::NotADictionary(type_name));
        };

        let archive_version =
            version(&mut top, "archiveVersion")?.unwrap_or(DEFAULT_ARCHIVE_VERSION);
        let object_version =
            version(&mut top, "objectVersion")?.unwrap_or(DEFAULT_OBJECT_VERSION);
        let classes = match top.remove("classes") {
            None => Dictionary::new(),
            Some(PlistValue::Dictionary(classes)) => classes,
            Some(other) => {
                return Err(DecodeError::MalformedKey {
                    key: "classes",
                    reason: format!("expected a dictionary, found {}", other.type_name()),
                })
            }
        };
        let objects = match top.remove("objects") {
            None => return Err(DecodeError::MissingKey("objects")),
            Some(PlistValue::Dictionary(objects)) => objects,
            Some(other) => {
                return Err(DecodeError::MalformedKey {
                    key: "objects",
                    reason: format!("expected a dictionary, found {}", other.type_name()),
                })
            }
        };
        let root_id = match top.remove("rootObject") {
            None => return Err(DecodeError::MissingKey("rootObject")),
            Some(PlistValue::String(text)) => {
                Identifier::new(text).map_err(|e| DecodeError::MalformedKey {
                    key: "rootObject",
                    reason: e.to_string(),
                })?
            }
            Some(other) => {
                return Err(DecodeError::MalformedKey {
                    key: "rootObject",
                    reason: format!("expected an identifier, found {}", other.type_name()),
                })
            }
        };
        for key in top.keys().filter(|k| !TOP_LEVEL_KEYS.contains(&k.as_str())) {
            warn!(%key, "ignoring unexpected top-level key");
        }

        let store = ObjectStore::new();
        let count = objects.len();
        self.build_objects(&store, objects)?;

        let root = store.reference(&root_id);
        let mut document =
            Document::from_parts(archive_version, object_version, classes, root, store)?;
        let tree = document.reconcile_tree()?;
        debug!(
            objects = count,
            workers = self.options.workers,
            groups = tree.groups,
            "project decoded"
        );
        Ok(document)
    }

    fn build_objects(&self, store: &ObjectStore, objects: Dictionary) -> DecodeResult<()> {
        let entries: Vec<(String, PlistValue)> = objects.into_iter().collect();
        let run = || {
            entries
                .into_par_iter()
                .try_for_each(|(key, value)| self.build_object(store, key, value))
        };
        if self.options.workers == 0 {
            return run();
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()
            .map_err(|e| DecodeError::Workers(e.to_string()))?;
        pool.install(run)
    }

    fn build_object(&self, store: &ObjectStore, key: String, value: PlistValue) -> DecodeResult<()> {
        let id = Identifier::new(key.as_str()).map_err(|e| DecodeError::MalformedObject {
            id: key.clone(),
            reason: e.to_string(),
        })?;
        let type_name = value.type_name();
        let Some(mut attributes) = value.into_dictionary() else {
            return Err(DecodeError::MalformedObject {
                id: key,
                reason: format!("expected a dictionary, found {type_name}"),
            });
        };
        let isa = match attributes.remove("isa") {
            Some(PlistValue::String(isa)) => isa,
            Some(other) => {
                return Err(DecodeError::MalformedObject {
                    id: key,
                    reason: format!("`isa` must be a string, found {}", other.type_name()),
                })
            }
            None => {
                return Err(DecodeError::MalformedObject {
                    id: key,
                    reason: "missing `isa`".to_string(),
                })
            }
        };

        let mut reader = AttributeReader::new(&id, &isa, attributes, store.references());
        let body = match self.registry.get(&isa) {
            Some(decode) => decode(&mut reader)?,
            None => match self.options.unknown_objects {
                UnknownObjectPolicy::Preserve => {
                    debug!(%id, %isa, "preserving object of unknown class");
                    ObjectBody::Unknown(UnknownObject::decode(&mut reader))
                }
                UnknownObjectPolicy::Reject => {
                    return Err(DecodeError::UnknownObjectType { id, isa });
                }
            },
        };
        store.add(PbxObject::new(store.reference(&id), body))?;
        Ok(())
    }
}

/// A version number. Absent versions fall back to the current defaults.
fn version(top: &mut Dictionary, key: &'static str) -> DecodeResult<Option<u32>> {
    let Some(value) = top.remove(key) else {
        return Ok(None);
    };
    let text = value.as_text().ok_or_else(|| DecodeError::MalformedKey {
        key,
        reason: format!("expected a number, found {}", value.type_name()),
    })?;
    text.parse().map(Some).map_err(|_| DecodeError::MalformedKey {
        key,
        reason: format!("`{text}` is not a version number"),
    })
}

/// Decode with default options.
pub fn decode(text: &str) -> DecodeResult<Document> {
    Decoder::default().decode_str(text)
}
