use std::collections::HashMap;

use log::{debug, trace};

use crate::xml::{Document, XmlNode};

use super::types::*;

pub fn is_diagram_view(node: &XmlNode) -> bool {
    node.is("element") && node.type_annotation() == Some(DIAGRAM_MODEL_TYPE)
}

/// Build one [`Diagram`] per diagram view, in document order.
pub fn build_diagrams(document: &Document) -> Vec<Diagram> {
    document
        .descendants()
        .filter(|n| is_diagram_view(n))
        .map(build_diagram)
        .collect()
}

pub fn build_diagram(view: &XmlNode) -> Diagram {
    let name = view.attr("name").unwrap_or(UNNAMED_VIEW).to_string();

    let tree = extract_tree(view);
    let boxes = flatten(&tree);
    let connectors = collect_connectors(view);
    let segments = resolve_segments(&connectors, &boxes);
    let (canvas_width, canvas_height) = canvas_size(&boxes);

    debug!(
        view = name.as_str(),
        boxes = boxes.len(),
        connectors = connectors.len(),
        segments = segments.len();
        "Built diagram"
    );

    Diagram {
        id: view.attr("id").map(str::to_string),
        name,
        boxes,
        segments,
        canvas_width,
        canvas_height,
    }
}

// ============================================
// Tree extraction
// ============================================

/// Visual children of `parent`, recursively. A `child` without any
/// `bounds` beneath it is dropped together with its whole subtree.
pub fn extract_tree(parent: &XmlNode) -> Vec<VisualNode> {
    parent
        .children_named("child")
        .filter_map(|child| {
            let Some(bounds) = read_bounds(child) else {
                trace!(
                    id = child.attr("id").unwrap_or_default();
                    "Skipping diagram object without bounds"
                );
                return None;
            };
            Some(VisualNode {
                id: child.attr("id").map(str::to_string),
                element_id: child.attr("archimateElement").map(str::to_string),
                name: child.attr("name").map(str::to_string),
                bounds,
                children: extract_tree(child),
            })
        })
        .collect()
}

/// Bounds of a diagram object: the first `bounds` node anywhere beneath it.
pub fn read_bounds(node: &XmlNode) -> Option<Bounds> {
    let bounds = node.find_descendant("bounds")?;
    let defaults = Bounds::default();
    Some(Bounds {
        x: int_attr(bounds, "x").unwrap_or(defaults.x),
        y: int_attr(bounds, "y").unwrap_or(defaults.y),
        width: int_attr(bounds, "width").unwrap_or(defaults.width),
        height: int_attr(bounds, "height").unwrap_or(defaults.height),
    })
}

fn int_attr(node: &XmlNode, name: &str) -> Option<i64> {
    node.attr(name)?.trim().parse().ok()
}

// ============================================
// Flattening
// ============================================

/// Pre-order walk that turns parent-relative positions into absolute ones.
/// Parents are emitted before their children. Offsets saturate at the `i64`
/// range.
pub fn flatten(tree: &[VisualNode]) -> Vec<FlatBox> {
    let mut boxes = Vec::new();
    let mut stack: Vec<(&VisualNode, i64, i64)> =
        tree.iter().rev().map(|node| (node, 0, 0)).collect();

    while let Some((node, ox, oy)) = stack.pop() {
        let x = ox.saturating_add(node.bounds.x);
        let y = oy.saturating_add(node.bounds.y);

        boxes.push(FlatBox {
            id: node.id.clone(),
            element_id: node.element_id.clone(),
            name: node.name.clone(),
            x,
            y,
            width: node.bounds.width,
            height: node.bounds.height,
        });

        stack.extend(node.children.iter().rev().map(|child| (child, x, y)));
    }

    boxes
}

// ============================================
// Connectors
// ============================================

/// Every `sourceConnection` beneath the view, at any depth.
pub fn collect_connectors(view: &XmlNode) -> Vec<Connector> {
    view.descendants()
        .skip(1)
        .filter(|n| n.is("sourceConnection"))
        .map(|n| Connector {
            source: n.attr("source").map(str::to_string),
            target: n.attr("target").map(str::to_string),
        })
        .collect()
}

/// Segments for the connectors whose two endpoints are both known boxes.
pub fn resolve_segments(connectors: &[Connector], boxes: &[FlatBox]) -> Vec<Segment> {
    let by_id: HashMap<&str, &FlatBox> = boxes
        .iter()
        .filter_map(|b| b.id.as_deref().map(|id| (id, b)))
        .collect();

    connectors
        .iter()
        .filter_map(|c| {
            let source = by_id.get(c.source.as_deref()?)?;
            let target = by_id.get(c.target.as_deref()?)?;
            Some(connection_points(source, target))
        })
        .collect()
}

/// Straight segment between the facing edges of two boxes.
///
/// The routing axis is whichever axis separates the box centers more; ties
/// go vertical. On that axis each endpoint sits on the edge that faces the
/// other box, and on the other axis at the box center.
pub fn connection_points(source: &FlatBox, target: &FlatBox) -> Segment {
    let (scx, scy) = source.center();
    let (tcx, tcy) = target.center();

    if (scx - tcx).abs() > (scy - tcy).abs() {
        let x1 = if scx < tcx { source.right() } else { source.x };
        let x2 = if scx > tcx { target.right() } else { target.x };
        Segment {
            x1: x1 as f64,
            y1: scy,
            x2: x2 as f64,
            y2: tcy,
        }
    } else {
        let y1 = if scy < tcy { source.bottom() } else { source.y };
        let y2 = if scy > tcy { target.bottom() } else { target.y };
        Segment {
            x1: scx,
            y1: y1 as f64,
            x2: tcx,
            y2: y2 as f64,
        }
    }
}

// ============================================
// Canvas
// ============================================

pub fn canvas_size(boxes: &[FlatBox]) -> (i64, i64) {
    let width = boxes
        .iter()
        .map(FlatBox::right)
        .max()
        .unwrap_or(DEFAULT_CANVAS_WIDTH);
    let height = boxes
        .iter()
        .map(FlatBox::bottom)
        .max()
        .unwrap_or(DEFAULT_CANVAS_HEIGHT);
    (
        width.saturating_add(CANVAS_MARGIN),
        height.saturating_add(CANVAS_MARGIN),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn flat(id: &str, x: i64, y: i64, width: i64, height: i64) -> FlatBox {
        FlatBox {
            id: Some(id.to_string()),
            element_id: None,
            name: None,
            x,
            y,
            width,
            height,
        }
    }

    fn view(body: &str) -> Document {
        let source = format!(
            r#"<archimate:model xmlns:archimate="http://www.archimatetool.com/archimate" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                 <folder type="diagrams">
                   <element xsi:type="archimate:ArchimateDiagramModel" id="view" name="Main">{body}</element>
                 </folder>
               </archimate:model>"#
        );
        Document::parse(&source).unwrap()
    }

    fn only_diagram(body: &str) -> Diagram {
        let mut diagrams = build_diagrams(&view(body));
        assert_eq!(diagrams.len(), 1);
        diagrams.remove(0)
    }

    #[test]
    fn test_nested_child_is_offset_by_parent() {
        let d = only_diagram(
            r#"<child id="p"><bounds x="10" y="10" width="300" height="200"/>
                 <child id="c"><bounds x="5" y="5"/></child>
               </child>"#,
        );

        assert_eq!(d.boxes.len(), 2);
        assert_eq!(d.boxes[0].id.as_deref(), Some("p"));
        assert_eq!((d.boxes[0].x, d.boxes[0].y), (10, 10));
        assert_eq!(d.boxes[1].id.as_deref(), Some("c"));
        assert_eq!((d.boxes[1].x, d.boxes[1].y), (15, 15));
        assert_eq!((d.boxes[1].width, d.boxes[1].height), (120, 55));
    }

    #[test]
    fn test_deep_nesting_accumulates_offsets_in_preorder() {
        let d = only_diagram(
            r#"<child id="a"><bounds x="100" y="50" width="500" height="400"/>
                 <child id="b"><bounds x="10" y="20" width="300" height="300"/>
                   <child id="c"><bounds x="1" y="2"/></child>
                 </child>
                 <child id="d"><bounds x="200" y="0"/></child>
               </child>
               <child id="e"><bounds x="700" y="700"/></child>"#,
        );

        let got: Vec<_> = d
            .boxes
            .iter()
            .map(|b| (b.id.clone().unwrap(), b.x, b.y))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a".to_string(), 100, 50),
                ("b".to_string(), 110, 70),
                ("c".to_string(), 111, 72),
                ("d".to_string(), 300, 50),
                ("e".to_string(), 700, 700),
            ]
        );
    }

    #[test]
    fn test_child_without_bounds_is_dropped_with_descendants() {
        let d = only_diagram(
            r#"<child id="orphan"><feature name="x"/></child>
               <child id="kept"><bounds x="1" y="1"/></child>"#,
        );
        let ids: Vec<_> = d.boxes.iter().filter_map(|b| b.id.as_deref()).collect();
        assert_eq!(ids, vec!["kept"]);
    }

    #[test]
    fn test_bounds_may_sit_below_a_wrapper() {
        let d = only_diagram(
            r#"<child id="w"><style><bounds x="7" y="8" width="9" height="10"/></style></child>"#,
        );
        assert_eq!(
            (d.boxes[0].x, d.boxes[0].y, d.boxes[0].width, d.boxes[0].height),
            (7, 8, 9, 10)
        );
    }

    #[test]
    fn test_unparsable_numbers_fall_back_to_defaults() {
        let d = only_diagram(
            r#"<child id="n"><bounds x="abc" y="" width="wide" height="1.5"/></child>"#,
        );
        let b = &d.boxes[0];
        assert_eq!((b.x, b.y, b.width, b.height), (0, 0, 120, 55));
    }

    #[test]
    fn test_negative_coordinates_are_kept() {
        let d = only_diagram(r#"<child id="n"><bounds x="-20" y="-5"/></child>"#);
        assert_eq!((d.boxes[0].x, d.boxes[0].y), (-20, -5));
    }

    #[test]
    fn test_huge_coordinates_saturate() {
        let d = only_diagram(
            r#"<child id="p"><bounds x="10" y="-10"/>
                 <child id="c"><bounds x="9223372036854775807" y="-9223372036854775808"/></child>
               </child>
               <child id="s" name="far"><bounds x="9223372036854775700" y="0"/>
                 <sourceConnection source="s" target="p"/>
               </child>"#,
        );

        assert_eq!((d.boxes[1].x, d.boxes[1].y), (i64::MAX, i64::MIN));
        assert_eq!(d.boxes[1].right(), i64::MAX);
        assert_eq!(d.boxes[2].right(), i64::MAX);
        assert_eq!(d.canvas_width, i64::MAX);
        assert_eq!(d.canvas_height, 155);
        assert_eq!(d.segments.len(), 1);
        assert_eq!(d.segments[0].x2, 130.0);
    }

    #[test]
    fn test_visual_node_captures_references() {
        let tree = extract_tree(
            &view(r#"<child id="v1" archimateElement="e1" name="Group"><bounds/></child>"#)
                .root
                .children[0]
                .children[0],
        );
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id.as_deref(), Some("v1"));
        assert_eq!(tree[0].element_id.as_deref(), Some("e1"));
        assert_eq!(tree[0].name.as_deref(), Some("Group"));
        assert_eq!(tree[0].bounds, Bounds::default());
    }

    #[test]
    fn test_connectors_are_resolved_at_any_depth() {
        let d = only_diagram(
            r#"<child id="a"><bounds x="0" y="0" width="100" height="50"/>
                 <sourceConnection id="c1" source="a" target="b"/>
               </child>
               <child id="b"><bounds x="300" y="0" width="100" height="50"/>
                 <child id="inner"><bounds x="10" y="10" width="20" height="20"/>
                   <sourceConnection id="c2" source="inner" target="a"/>
                 </child>
               </child>"#,
        );

        assert_eq!(d.segments.len(), 2);
        assert_eq!(
            d.segments[0],
            Segment { x1: 100.0, y1: 25.0, x2: 300.0, y2: 25.0 }
        );
        // inner is at (310, 10, 20, 20): center (320, 20) lies right of a's center.
        assert_eq!(
            d.segments[1],
            Segment { x1: 310.0, y1: 20.0, x2: 100.0, y2: 25.0 }
        );
    }

    #[test]
    fn test_dangling_connectors_are_dropped() {
        let d = only_diagram(
            r#"<child id="a"><bounds x="0" y="0"/>
                 <sourceConnection source="a" target="missing"/>
                 <sourceConnection source="ghost" target="a"/>
                 <sourceConnection target="a"/>
               </child>
               <child id="b"><bounds x="0" y="300"/>
                 <sourceConnection source="b" target="a"/>
               </child>"#,
        );
        assert_eq!(d.segments.len(), 1);
    }

    #[test]
    fn test_connector_to_bounds_less_child_is_dropped() {
        let d = only_diagram(
            r#"<child id="a"><bounds/><sourceConnection source="a" target="nobounds"/></child>
               <child id="nobounds"/>"#,
        );
        assert!(d.segments.is_empty());
    }

    #[test]
    fn test_horizontal_routing_uses_facing_edges() {
        let left = flat("l", 0, 0, 100, 50);
        let right = flat("r", 200, 30, 100, 50);

        let seg = connection_points(&left, &right);
        assert_eq!(seg, Segment { x1: 100.0, y1: 25.0, x2: 200.0, y2: 55.0 });
    }

    #[test]
    fn test_vertical_routing_uses_facing_edges() {
        let top = flat("t", 0, 0, 100, 50);
        let bottom = flat("b", 20, 200, 100, 50);

        let seg = connection_points(&top, &bottom);
        assert_eq!(seg, Segment { x1: 50.0, y1: 50.0, x2: 70.0, y2: 200.0 });
    }

    #[test]
    fn test_swapping_endpoints_mirrors_segment() {
        let a = flat("a", 0, 0, 120, 55);
        let b = flat("b", 400, 100, 120, 55);

        let forward = connection_points(&a, &b);
        let backward = connection_points(&b, &a);
        assert_eq!(forward, backward.reversed());
    }

    #[test]
    fn test_equal_center_distance_routes_vertically() {
        let a = flat("a", 0, 0, 100, 100);
        let b = flat("b", 200, 200, 100, 100);
        let seg = connection_points(&a, &b);
        assert_eq!(seg, Segment { x1: 50.0, y1: 100.0, x2: 250.0, y2: 200.0 });
    }

    #[test]
    fn test_canvas_defaults_without_boxes() {
        assert_eq!(canvas_size(&[]), (900, 700));
        let d = only_diagram("");
        assert_eq!((d.canvas_width, d.canvas_height), (900, 700));
    }

    #[test]
    fn test_canvas_for_single_default_box() {
        assert_eq!(canvas_size(&[flat("a", 0, 0, 120, 55)]), (220, 155));
    }

    #[test]
    fn test_diagram_names_and_discovery_order() {
        let source = r#"<model xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
            <element xsi:type="archimate:ArchimateDiagramModel" id="v1" name="First"/>
            <element xsi:type="archimate:BusinessActor" id="x"/>
            <folder><element xsi:type="archimate:ArchimateDiagramModel" id="v2"/></folder>
            <element xsi:type="archimate:SketchModel" id="s"/>
        </model>"#;
        let diagrams = build_diagrams(&Document::parse(source).unwrap());
        let names: Vec<_> = diagrams.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["First", UNNAMED_VIEW]);
        assert_eq!(diagrams[1].id.as_deref(), Some("v2"));
    }

    fn arb_box(id: &'static str) -> impl Strategy<Value = FlatBox> {
        (-500i64..500, -500i64..500, 1i64..300, 1i64..300)
            .prop_map(move |(x, y, w, h)| flat(id, x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_swapped_endpoints_mirror(a in arb_box("a"), b in arb_box("b")) {
            prop_assert_eq!(connection_points(&a, &b), connection_points(&b, &a).reversed());
        }

        #[test]
        fn prop_endpoints_lie_on_box_edges(a in arb_box("a"), b in arb_box("b")) {
            let seg = connection_points(&a, &b);
            let on_edge = |bx: &FlatBox, x: f64, y: f64| {
                let (l, t) = (bx.x as f64, bx.y as f64);
                let (r, btm) = (bx.right() as f64, bx.bottom() as f64);
                (x == l || x == r) && y >= t && y <= btm || (y == t || y == btm) && x >= l && x <= r
            };
            prop_assert!(on_edge(&a, seg.x1, seg.y1));
            prop_assert!(on_edge(&b, seg.x2, seg.y2));
        }

        #[test]
        fn prop_canvas_leaves_margin(boxes in proptest::collection::vec(arb_box("x"), 1..8)) {
            let (w, h) = canvas_size(&boxes);
            for b in &boxes {
                prop_assert!(w - b.right() >= CANVAS_MARGIN);
                prop_assert!(h - b.bottom() >= CANVAS_MARGIN);
            }
        }

        #[test]
        fn prop_flatten_adds_parent_offset(
            px in -100i64..100,
            py in -100i64..100,
            cx in -100i64..100,
            cy in -100i64..100,
        ) {
            let child = VisualNode {
                id: Some("c".into()),
                element_id: None,
                name: None,
                bounds: Bounds { x: cx, y: cy, ..Bounds::default() },
                children: Vec::new(),
            };
            let parent = VisualNode {
                id: Some("p".into()),
                element_id: None,
                name: None,
                bounds: Bounds { x: px, y: py, ..Bounds::default() },
                children: vec![child],
            };
            let boxes = flatten(&[parent]);
            prop_assert_eq!(boxes.len(), 2);
            prop_assert_eq!((boxes[0].x, boxes[0].y), (px, py));
            prop_assert_eq!((boxes[1].x, boxes[1].y), (px + cx, py + cy));
        }
    }
}
