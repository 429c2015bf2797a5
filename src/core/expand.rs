//! Dotted-key expansion.
//!
//! Turns a flat `a.b=1,a.c=2,d=3` blob into a tree of [`Node`]s:
//!
//! ```text
//! a:
//!   b: '1'
//!   c: '2'
//! d: '3'
//! ```
//!
//! Entries are separated by `,`. Only the first `=` of an entry splits the
//! key path from the value; the value is kept verbatim.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use tracing::{trace, warn};

use crate::error::ExpandError;

/// Separator between entries.
pub const ENTRY_SEPARATOR: &str = ",";

/// Separator between a key path and its value.
pub const VALUE_SEPARATOR: &str = "=";

/// Separator between key path segments.
pub const PATH_SEPARATOR: &str = ".";

/// A node in the expanded tree.
///
/// Children of an internal node keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(String),
    Internal(Vec<(String, Node)>),
}

/// One `dotted.path=value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub value: String,
}

/// What to do when a path descends through a segment that holds a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail the expansion
    #[default]
    Reject,
    /// Replace the value with nested keys
    Overwrite,
}

impl Node {
    /// An empty internal node.
    pub fn empty() -> Self {
        Node::Internal(Vec::new())
    }

    /// Leaf value, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Node::Leaf(value) => Some(value.as_str()),
            Node::Internal(_) => None,
        }
    }

    /// Children, if this is an internal node.
    pub fn children(&self) -> Option<&[(String, Node)]> {
        match self {
            Node::Leaf(_) => None,
            Node::Internal(children) => Some(children.as_slice()),
        }
    }

    /// Whether this is an internal node with no children.
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Internal(children) if children.is_empty())
    }

    /// Look up a dotted path, e.g. `mysql.ro.password`.
    pub fn get(&self, path: &str) -> Option<&Node> {
        path.split(PATH_SEPARATOR).try_fold(self, |node, segment| {
            node.children()?
                .iter()
                .find(|(key, _)| key == segment)
                .map(|(_, child)| child)
        })
    }

    /// Number of leaves below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal(children) => children.iter().map(|(_, c)| c.leaf_count()).sum(),
        }
    }

    /// Flatten back into entries, depth first, in sibling order.
    pub fn flatten(&self) -> Vec<Entry> {
        let mut entries = Vec::new();
        if let Node::Internal(children) = self {
            let mut prefix = Vec::new();
            flatten_into(children, &mut prefix, &mut entries);
        }
        entries
    }

    /// Flatten into the `a.b=1,c=2` wire form.
    pub fn to_flat_string(&self) -> String {
        self.flatten()
            .iter()
            .map(|e| format!("{}{}{}", e.path, VALUE_SEPARATOR, e.value))
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }
}

fn flatten_into<'a>(
    children: &'a [(String, Node)],
    prefix: &mut Vec<&'a str>,
    out: &mut Vec<Entry>,
) {
    for (key, node) in children {
        prefix.push(key);
        match node {
            Node::Leaf(value) => out.push(Entry {
                path: prefix.join(PATH_SEPARATOR),
                value: value.clone(),
            }),
            Node::Internal(grandchildren) => flatten_into(grandchildren, prefix, out),
        }
        prefix.pop();
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Leaf(value) => serializer.serialize_str(value),
            Node::Internal(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (key, child) in children {
                    map.serialize_entry(key, child)?;
                }
                map.end()
            }
        }
    }
}

/// Split a flat blob into validated entries without building a tree.
///
/// # Errors
///
/// Returns [`ExpandError::MissingSeparator`] for an entry without `=` and
/// [`ExpandError::EmptyPath`] when the key path or one of its segments is
/// empty.
pub fn parse_entries(flat: &str) -> Result<Vec<Entry>, ExpandError> {
    if flat.is_empty() {
        return Ok(Vec::new());
    }

    flat.split(ENTRY_SEPARATOR)
        .enumerate()
        .map(|(i, raw)| parse_entry(i + 1, raw))
        .collect()
}

fn parse_entry(position: usize, raw: &str) -> Result<Entry, ExpandError> {
    let (path, value) =
        raw.split_once(VALUE_SEPARATOR)
            .ok_or_else(|| ExpandError::MissingSeparator {
                position,
                entry: raw.to_string(),
            })?;

    if path.split(PATH_SEPARATOR).any(str::is_empty) {
        return Err(ExpandError::EmptyPath {
            position,
            entry: raw.to_string(),
        });
    }

    Ok(Entry {
        path: path.to_string(),
        value: value.to_string(),
    })
}

/// Expand a flat blob, rejecting conflicts.
///
/// # Errors
///
/// See [`parse_entries`]; additionally [`ExpandError::Conflict`] when a path
/// descends through a segment an earlier entry set to a value.
pub fn expand(flat: &str) -> Result<Node, ExpandError> {
    expand_with(flat, ConflictPolicy::Reject)
}

/// Expand a flat blob with an explicit conflict policy.
pub fn expand_with(flat: &str, policy: ConflictPolicy) -> Result<Node, ExpandError> {
    let entries = parse_entries(flat)?;
    let mut root = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        insert(&mut root, i + 1, entry, policy)?;
    }

    trace!(entries = entries.len(), top_level = root.len(), "expanded");
    Ok(Node::Internal(root))
}

fn insert(
    root: &mut Vec<(String, Node)>,
    position: usize,
    entry: &Entry,
    policy: ConflictPolicy,
) -> Result<(), ExpandError> {
    let segments: Vec<&str> = entry.path.split(PATH_SEPARATOR).collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(ExpandError::EmptyPath {
            position,
            entry: entry.path.clone(),
        });
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        let index = match current.iter().position(|(key, _)| key == segment) {
            Some(index) => index,
            None => {
                current.push((segment.to_string(), Node::empty()));
                current.len() - 1
            }
        };

        let slot = &mut current[index].1;
        if let Node::Leaf(_) = slot {
            let path = segments[..=depth].join(PATH_SEPARATOR);
            match policy {
                ConflictPolicy::Reject => return Err(ExpandError::Conflict { position, path }),
                ConflictPolicy::Overwrite => {
                    warn!(%path, position, "replacing value with nested keys");
                    *slot = Node::empty();
                }
            }
        }

        let Node::Internal(children) = slot else {
            unreachable!("leaf slots are replaced or rejected above");
        };
        current = children;
    }

    let leaf = Node::Leaf(entry.value.clone());
    match current.iter_mut().find(|(key, _)| key == last) {
        Some((_, existing)) => *existing = leaf,
        None => current.push((last.to_string(), leaf)),
    }

    Ok(())
}
