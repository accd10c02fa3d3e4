//! Tidy-tree placement of the visible nodes.
//!
//! Leaves take consecutive slots on the order axis, parents sit at the mean
//! of their visible children, and the rank axis is a pure function of depth.
//! The renderer decides which axis is horizontal.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::{TreeNode, VisibleSet};
use crate::util::mean;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Distance between neighbouring leaves on the order axis.
    pub node_spacing: f32,
    /// Distance between depths on the rank axis.
    pub level_spacing: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            node_spacing: 24.0,
            level_spacing: 180.0,
        }
    }
}

impl LayoutOptions {
    /// Replaces non-finite or non-positive spacings with the defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let pick = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        Self {
            node_spacing: pick(self.node_spacing, defaults.node_spacing),
            level_spacing: pick(self.level_spacing, defaults.level_spacing),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutPoint {
    pub identity: String,
    pub x: f32,
    pub y: f32,
}

impl LayoutPoint {
    pub fn point(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    pub min_x: f32,
    pub max_x: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Layout {
    points: Vec<LayoutPoint>,
    #[serde(skip)]
    index_by_id: HashMap<String, usize>,
    extent: Extent,
}

impl Layout {
    pub fn get(&self, identity: &str) -> Option<&LayoutPoint> {
        self.index_by_id
            .get(identity)
            .and_then(|&index| self.points.get(index))
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.index_by_id.contains_key(identity)
    }

    pub fn points(&self) -> &[LayoutPoint] {
        &self.points
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub struct LayoutEngine {
    options: LayoutOptions,
}

impl LayoutEngine {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options: options.sanitized(),
        }
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    /// Places every node of `root` that is in `visible`. Nodes outside the
    /// set, and their subtrees, take no slot and get no point.
    pub fn layout(&self, root: &TreeNode, visible: &VisibleSet) -> Layout {
        let mut layout = Layout::default();
        if !visible.contains(root.identity()) {
            return layout;
        }

        let mut order = HashMap::new();
        let mut cursor = 0.0f32;
        self.place_order(root, visible, &mut cursor, &mut order);
        self.place_rank(root, visible, &order, &mut layout);

        let (min_x, max_x) = layout
            .points
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), point| {
                (lo.min(point.x), hi.max(point.x))
            });
        layout.extent = Extent { min_x, max_x };

        tracing::debug!(
            points = layout.points.len(),
            min_x,
            max_x,
            "computed layout"
        );
        layout
    }

    // Post-order: leaves take the cursor slot, parents the mean of their
    // visible children.
    fn place_order<'a>(
        &self,
        node: &'a TreeNode,
        visible: &VisibleSet,
        cursor: &mut f32,
        order: &mut HashMap<&'a str, f32>,
    ) -> f32 {
        let children = node
            .children()
            .iter()
            .filter(|child| visible.contains(child.identity()))
            .map(|child| self.place_order(child, visible, cursor, order))
            .collect::<Vec<_>>();

        let x = match mean(&children) {
            Some(x) => x,
            None => {
                let x = *cursor;
                *cursor += self.options.node_spacing;
                x
            }
        };
        order.insert(node.identity(), x);
        x
    }

    // Pre-order: rank comes from depth alone.
    fn place_rank(
        &self,
        node: &TreeNode,
        visible: &VisibleSet,
        order: &HashMap<&str, f32>,
        layout: &mut Layout,
    ) {
        let Some(&x) = order.get(node.identity()) else {
            return;
        };
        layout
            .index_by_id
            .insert(node.identity().to_string(), layout.points.len());
        layout.points.push(LayoutPoint {
            identity: node.identity().to_string(),
            x,
            y: node.depth() as f32 * self.options.level_spacing,
        });

        for child in node.children() {
            if visible.contains(child.identity()) {
                self.place_rank(child, visible, order, layout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::{EdgeKind, Record, RecordKind, RelationshipEdge, RelationshipIndex};
    use crate::tree::{CollapseStateStore, build_from_index};

    fn tree(subs: usize) -> TreeNode {
        let matrix = Record::new("m", RecordKind::Matrix, "Enterprise");
        let mut tactic = Record::new("tac", RecordKind::Tactic, "Execution");
        tactic.short_name = Some("execution".to_string());
        let mut records = vec![matrix, tactic];
        let mut edges = Vec::new();
        for technique in ["t1", "t2"] {
            let mut record = Record::new(technique, RecordKind::Technique, technique);
            record.tactic_short_names.insert("execution".to_string());
            records.push(record);
        }
        for index in 0..subs {
            let id = format!("s{index}");
            records.push(Record::new(&id, RecordKind::SubTechnique, &id));
            edges.push(RelationshipEdge {
                source_id: id,
                target_id: "t1".to_string(),
                kind: EdgeKind::SubTechniqueOf,
            });
        }
        let index = RelationshipIndex::build(records, edges).unwrap();
        build_from_index(&index).unwrap()
    }

    fn engine() -> LayoutEngine {
        LayoutEngine::new(LayoutOptions {
            node_spacing: 10.0,
            level_spacing: 100.0,
        })
    }

    #[test]
    fn root_only_sits_at_origin() {
        let tree = tree(0);
        let mut collapse = CollapseStateStore::new();
        collapse.observe(&tree);
        collapse.toggle("root");
        let visible = VisibleSet::compute(&tree, &collapse, None);

        let layout = engine().layout(&tree, &visible);
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.get("root").map(LayoutPoint::point), Some(Point::default()));
        assert_eq!(layout.extent(), Extent::default());
    }

    #[test]
    fn parents_center_over_children() {
        let tree = tree(3);
        let mut collapse = CollapseStateStore::new();
        collapse.observe(&tree);
        let visible = VisibleSet::compute(&tree, &collapse, None);
        let layout = engine().layout(&tree, &visible);

        assert_eq!(layout.len(), 4);
        assert_eq!(layout.get("root/tac/t1").unwrap().x, 0.0);
        assert_eq!(layout.get("root/tac/t2").unwrap().x, 10.0);
        assert_eq!(layout.get("root/tac").unwrap().x, 5.0);
        assert_eq!(layout.get("root/tac/t1").unwrap().y, 200.0);
        assert!(!layout.contains("root/tac/t1/s0"));

        collapse.toggle("root/tac/t1");
        let visible = VisibleSet::compute(&tree, &collapse, None);
        let layout = engine().layout(&tree, &visible);
        assert_eq!(layout.len(), 7);
        let subs = (0..3)
            .map(|index| layout.get(&format!("root/tac/t1/s{index}")).unwrap().x)
            .collect::<Vec<_>>();
        assert_eq!(subs, [0.0, 10.0, 20.0]);
        assert_eq!(layout.get("root/tac/t1").unwrap().x, 10.0);
        assert_eq!(layout.get("root/tac/t2").unwrap().x, 30.0);
        assert_eq!(layout.get("root/tac/t1/s2").unwrap().y, 300.0);
        assert_eq!(
            layout.extent(),
            Extent {
                min_x: 0.0,
                max_x: 30.0
            }
        );
    }

    #[test]
    fn points_follow_pre_order() {
        let tree = tree(1);
        let mut collapse = CollapseStateStore::new();
        collapse.observe(&tree);
        collapse.set_recursive(&tree, "root", true);
        let visible = VisibleSet::compute(&tree, &collapse, None);
        let layout = engine().layout(&tree, &visible);
        let ids = layout
            .points()
            .iter()
            .map(|point| point.identity.as_str())
            .collect::<Vec<_>>();
        assert_eq!(visible.identities(), ids.as_slice());
    }

    #[test]
    fn sanitized_replaces_bad_spacing() {
        let options = LayoutOptions {
            node_spacing: f32::NAN,
            level_spacing: -3.0,
        }
        .sanitized();
        assert_eq!(options, LayoutOptions::default());
    }

    #[test]
    fn options_deserialize_camel_case() {
        let options: LayoutOptions = serde_json::from_str(r#"{"nodeSpacing": 12.5}"#).unwrap();
        assert_eq!(options.node_spacing, 12.5);
        assert_eq!(options.level_spacing, 180.0);
    }
}
