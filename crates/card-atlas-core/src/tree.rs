use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::error::{AtlasError, Result};
use crate::grid::GridLayout;
use crate::model::{GridCoordinate, ImageRecord};

/// A named grid cell, or a group of named variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionNode {
    Leaf(GridCoordinate),
    Branch(PositionTree),
}

impl PositionNode {
    pub fn as_leaf(&self) -> Option<GridCoordinate> {
        match self {
            PositionNode::Leaf(c) => Some(*c),
            PositionNode::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&PositionTree> {
        match self {
            PositionNode::Leaf(_) => None,
            PositionNode::Branch(t) => Some(t),
        }
    }
}

impl Serialize for PositionNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PositionNode::Leaf(c) => c.serialize(serializer),
            PositionNode::Branch(t) => t.serialize(serializer),
        }
    }
}

/// Name-keyed map of positions that iterates in insertion order.
///
/// Atlases hold tens of entries, so lookups are linear scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionTree {
    entries: Vec<(String, PositionNode)>,
}

/// Rejected insert: `name` already holds the other kind of node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindConflict {
    pub name: String,
}

impl PositionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PositionNode> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut PositionNode> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Looks up `item` or `item`/`variant`.
    pub fn lookup(&self, item: &str, variant: Option<&str>) -> Option<GridCoordinate> {
        match (self.get(item)?, variant) {
            (PositionNode::Leaf(c), None) => Some(*c),
            (PositionNode::Branch(t), Some(v)) => t.get(v)?.as_leaf(),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PositionNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sets `name` to a leaf. An existing leaf is overwritten in place and keeps its position.
    /// Returns the replaced coordinate, if any.
    pub fn insert_leaf(
        &mut self,
        name: &str,
        cell: GridCoordinate,
    ) -> std::result::Result<Option<GridCoordinate>, KindConflict> {
        match self.get_mut(name) {
            Some(PositionNode::Leaf(old)) => Ok(Some(std::mem::replace(old, cell))),
            Some(PositionNode::Branch(_)) => Err(KindConflict {
                name: name.to_string(),
            }),
            None => {
                self.entries
                    .push((name.to_string(), PositionNode::Leaf(cell)));
                Ok(None)
            }
        }
    }

    /// Sets `item`/`variant` to a leaf, creating the `item` branch on first use.
    pub fn insert_variant(
        &mut self,
        item: &str,
        variant: &str,
        cell: GridCoordinate,
    ) -> std::result::Result<Option<GridCoordinate>, KindConflict> {
        if self.get(item).is_none() {
            self.entries
                .push((item.to_string(), PositionNode::Branch(PositionTree::new())));
        }
        match self.get_mut(item) {
            Some(PositionNode::Branch(branch)) => {
                branch.insert_leaf(variant, cell).map_err(|mut e| {
                    e.name = format!("{item}/{}", e.name);
                    e
                })
            }
            _ => Err(KindConflict {
                name: item.to_string(),
            }),
        }
    }

    /// Builds the tree for one atlas from records in discovery order.
    ///
    /// Record `i` gets cell `layout.coordinate(i)`. A name used both as a plain image and as a
    /// variant group fails with `TreeConflict`; a repeated leaf is overwritten with a warning.
    pub fn from_records(atlas: &str, records: &[ImageRecord], layout: &GridLayout) -> Result<Self> {
        let mut tree = PositionTree::new();
        for (i, record) in records.iter().enumerate() {
            let Some(cell) = layout.coordinate(i as u32) else {
                break;
            };
            let inserted = match &record.variant_name {
                None => tree.insert_leaf(&record.item_name, cell),
                Some(variant) => tree.insert_variant(&record.item_name, variant, cell),
            };
            match inserted {
                Ok(Some(previous)) => warn!(
                    atlas,
                    key = %record.key(),
                    %previous,
                    %cell,
                    "position assigned twice, keeping the later cell"
                ),
                Ok(None) => {}
                Err(conflict) => {
                    return Err(AtlasError::TreeConflict {
                        atlas: atlas.to_string(),
                        name: conflict.name,
                    });
                }
            }
        }
        Ok(tree)
    }

    /// Depth-first visit: `visit(path, cell)` for every leaf, in order.
    pub fn for_each_leaf<F: FnMut(&[&str], GridCoordinate)>(&self, mut visit: F) {
        fn walk<'a, F: FnMut(&[&str], GridCoordinate)>(
            tree: &'a PositionTree,
            path: &mut Vec<&'a str>,
            visit: &mut F,
        ) {
            for (name, node) in tree.iter() {
                path.push(name);
                match node {
                    PositionNode::Leaf(c) => visit(path, *c),
                    PositionNode::Branch(t) => walk(t, path, visit),
                }
                path.pop();
            }
        }
        let mut path = Vec::new();
        walk(self, &mut path, &mut visit);
    }
}

impl Serialize for PositionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_then_branch_conflicts() {
        let mut t = PositionTree::new();
        t.insert_leaf("Joker", GridCoordinate::new(0, 0)).unwrap();
        let err = t
            .insert_variant("Joker", "red", GridCoordinate::new(1, 0))
            .unwrap_err();
        assert_eq!(err.name, "Joker");
    }

    #[test]
    fn branch_then_leaf_conflicts() {
        let mut t = PositionTree::new();
        t.insert_variant("Wild", "red", GridCoordinate::new(0, 0))
            .unwrap();
        assert!(t.insert_leaf("Wild", GridCoordinate::new(1, 0)).is_err());
    }

    #[test]
    fn overwrite_keeps_first_position() {
        let mut t = PositionTree::new();
        t.insert_leaf("a", GridCoordinate::new(0, 0)).unwrap();
        t.insert_leaf("b", GridCoordinate::new(1, 0)).unwrap();
        let old = t.insert_leaf("a", GridCoordinate::new(2, 0)).unwrap();
        assert_eq!(old, Some(GridCoordinate::new(0, 0)));
        let names: Vec<&str> = t.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(t.lookup("a", None), Some(GridCoordinate::new(2, 0)));
    }
}
