use pbx_types::PlistValue;

/// A renderable property-list node.
///
/// Nodes are what the codec hands the [`Writer`](crate::Writer): scalars may
/// carry an annotation comment (rendered as `value /* comment */`), and
/// containers choose between inline and multi-line layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Scalar {
        text: String,
        comment: Option<String>,
    },
    Data(Vec<u8>),
    Array {
        items: Vec<Node>,
        inline: bool,
    },
    Dictionary {
        items: Vec<DictItem>,
        inline: bool,
    },
}

/// One line of a dictionary: a key/value pair or a section marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DictItem {
    Entry { key: Node, value: Node },
    /// `/* Begin <name> section */`, written at column zero after a blank line.
    SectionBegin(String),
    /// `/* End <name> section */`, written at column zero.
    SectionEnd(String),
}

impl Node {
    /// A scalar without a comment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Scalar {
            text: text.into(),
            comment: None,
        }
    }

    /// A scalar followed by `/* comment */`.
    pub fn annotated(text: impl Into<String>, comment: Option<String>) -> Self {
        Self::Scalar {
            text: text.into(),
            comment,
        }
    }

    /// Convert a plain value, laying out containers with `inline`.
    ///
    /// Dictionary entries come out in key order.
    pub fn from_value(value: &PlistValue, inline: bool) -> Self {
        match value {
            PlistValue::Data(bytes) => Self::Data(bytes.clone()),
            PlistValue::Array(items) => Self::Array {
                items: items.iter().map(|v| Self::from_value(v, inline)).collect(),
                inline,
            },
            PlistValue::Dictionary(map) => Self::Dictionary {
                items: map
                    .iter()
                    .map(|(k, v)| DictItem::entry(Self::text(k.as_str()), Self::from_value(v, inline)))
                    .collect(),
                inline,
            },
            scalar => Self::text(scalar.as_text().unwrap_or_default().into_owned()),
        }
    }

    /// Force inline layout on this node and everything below it.
    pub fn into_inline(self) -> Self {
        match self {
            Self::Array { items, .. } => Self::Array {
                items: items.into_iter().map(Self::into_inline).collect(),
                inline: true,
            },
            Self::Dictionary { items, .. } => Self::Dictionary {
                items: items
                    .into_iter()
                    .map(|item| match item {
                        DictItem::Entry { key, value } => DictItem::Entry {
                            key,
                            value: value.into_inline(),
                        },
                        marker => marker,
                    })
                    .collect(),
                inline: true,
            },
            other => other,
        }
    }
}

impl DictItem {
    pub fn entry(key: Node, value: Node) -> Self {
        Self::Entry { key, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbx_types::Dictionary;

    #[test]
    fn from_value_sorts_dictionary_keys() {
        let mut map = Dictionary::new();
        map.insert("b".into(), "2".into());
        map.insert("a".into(), PlistValue::Integer(1));
        let node = Node::from_value(&PlistValue::Dictionary(map), false);
        let Node::Dictionary { items, inline } = node else {
            panic!("expected dictionary");
        };
        assert!(!inline);
        assert_eq!(
            items,
            vec![
                DictItem::entry(Node::text("a"), Node::text("1")),
                DictItem::entry(Node::text("b"), Node::text("2")),
            ]
        );
    }

    #[test]
    fn into_inline_is_recursive() {
        let node = Node::Dictionary {
            items: vec![DictItem::entry(
                Node::text("list"),
                Node::Array {
                    items: vec![Node::text("x")],
                    inline: false,
                },
            )],
            inline: false,
        };
        let Node::Dictionary { items, inline } = node.into_inline() else {
            panic!("expected dictionary");
        };
        assert!(inline);
        assert!(matches!(
            &items[0],
            DictItem::Entry { value: Node::Array { inline: true, .. }, .. }
        ));
    }
}
