use tracing::debug;

use pbx_plist::{DictItem, Node, Writer};
use pbx_store::{
    CommentIndex, Document, Field, FieldKey, ObjectKind, PbxObject, Reference,
};
use pbx_types::PlistValue;

use crate::config::{OutputSettings, OutputStyle, UnknownObjectPolicy};
use crate::error::{EncodeError, EncodeResult};

/// Writes a [`Document`] as project-file text.
///
/// Output is deterministic: objects are grouped into one section per class
/// (sections in class-name order, objects in identifier order), every object
/// starts with `isa`, and the remaining attributes follow in name order.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    settings: OutputSettings,
}

impl Encoder {
    pub fn new(settings: OutputSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    /// Regenerate pending identifiers, then render.
    pub fn encode(&self, document: &mut Document) -> EncodeResult<String> {
        if document.has_pending_identifiers() {
            document.regenerate_identifiers();
        }
        self.render(document)
    }

    /// Render without touching identifiers. Pending identifiers are written
    /// as they are.
    pub fn render(&self, document: &Document) -> EncodeResult<String> {
        let store = document.objects();
        let mut objects = store.objects();
        if self.settings.unknown_objects == UnknownObjectPolicy::Reject {
            if let Some(unknown) = objects.iter().find(|o| o.kind() == ObjectKind::Unknown) {
                return Err(EncodeError::UnknownObjectType {
                    id: unknown.identifier(),
                    isa: unknown.isa().to_string(),
                });
            }
        }
        objects.sort_by_cached_key(|object| (object.isa().to_string(), object.identifier()));

        let comments = if self.settings.comments {
            CommentIndex::build(store)
        } else {
            CommentIndex::default()
        };
        let ctx = Context {
            comments: &comments,
            annotate: self.settings.comments,
        };

        let mut table = Vec::with_capacity(objects.len() + 16);
        let mut current: Option<String> = None;
        for object in &objects {
            if current.as_deref() != Some(object.isa()) {
                if let Some(previous) = current.take() {
                    table.push(DictItem::SectionEnd(previous));
                }
                table.push(DictItem::SectionBegin(object.isa().to_string()));
                current = Some(object.isa().to_string());
            }
            let key = Node::annotated(object.identifier().to_string(), ctx.object_comment(object));
            table.push(DictItem::entry(key, self.object_node(object, &ctx)));
        }
        if let Some(last) = current {
            table.push(DictItem::SectionEnd(last));
        }

        let root = Node::Dictionary {
            items: vec![
                DictItem::entry(
                    Node::text("archiveVersion"),
                    Node::text(document.archive_version().to_string()),
                ),
                DictItem::entry(
                    Node::text("classes"),
                    Node::from_value(&PlistValue::Dictionary(document.classes().clone()), false),
                ),
                DictItem::entry(
                    Node::text("objectVersion"),
                    Node::text(document.object_version().to_string()),
                ),
                DictItem::entry(
                    Node::text("objects"),
                    Node::Dictionary {
                        items: table,
                        inline: false,
                    },
                ),
                DictItem::entry(Node::text("rootObject"), ctx.reference(document.root())),
            ],
            inline: false,
        };
        debug!(objects = objects.len(), style = ?self.settings.style, "document rendered");
        Ok(Writer::new()
            .with_comments(self.settings.comments)
            .write_document(&root))
    }

    fn object_node(&self, object: &PbxObject, ctx: &Context<'_>) -> Node {
        let inline = self.settings.style == OutputStyle::Xcode
            && matches!(object.kind(), ObjectKind::BuildFile | ObjectKind::FileReference);
        let mut items = vec![DictItem::entry(Node::text("isa"), Node::text(object.isa()))];
        for (key, field) in object.body().fields() {
            items.push(DictItem::entry(Node::text(key), ctx.field(&field)));
        }
        Node::Dictionary { items, inline }
    }
}

struct Context<'a> {
    comments: &'a CommentIndex,
    annotate: bool,
}

impl Context<'_> {
    fn object_comment(&self, object: &PbxObject) -> Option<String> {
        if self.annotate {
            self.comments.comment(object)
        } else {
            None
        }
    }

    fn reference(&self, reference: &Reference) -> Node {
        let comment = if self.annotate {
            self.comments.comment_for(reference)
        } else {
            None
        };
        Node::annotated(reference.identifier().to_string(), comment)
    }

    fn field(&self, field: &Field) -> Node {
        match field {
            Field::Value(value) => Node::from_value(value, false),
            Field::Reference(reference) => self.reference(reference),
            Field::Identifier(reference) => Node::text(reference.identifier().to_string()),
            Field::List(items) => Node::Array {
                items: items.iter().map(|item| self.field(item)).collect(),
                inline: false,
            },
            Field::Map(entries) => {
                let mut keyed: Vec<(String, &Field)> = entries
                    .iter()
                    .map(|(key, value)| {
                        let text = match key {
                            FieldKey::Name(name) => name.clone(),
                            FieldKey::Reference(reference) => reference.identifier().to_string(),
                        };
                        (text, value)
                    })
                    .collect();
                keyed.sort_by(|a, b| a.0.cmp(&b.0));
                Node::Dictionary {
                    items: keyed
                        .into_iter()
                        .map(|(key, value)| DictItem::entry(Node::text(key), self.field(value)))
                        .collect(),
                    inline: false,
                }
            }
        }
    }
}

/// Encode with default settings.
pub fn encode(document: &mut Document) -> EncodeResult<String> {
    Encoder::default().encode(document)
}
