//! Integration tests for bom-tools
//!
//! These tests exercise the public API end to end: tree expansion from a
//! store, cycle checks, where-used, comparison, filtering, export and the
//! change-order helpers.

use bom_tools::{
    bom::{apply_variant_rules, build_tree, detect_cycle, where_used, BuildOptions, RuleAction, VariantRule},
    cli::{exit_codes, load_snapshot, run_compare, run_tree, CompareCommand, TreeCommand, TreeInput},
    condition,
    config::{load_config_file, AppConfig, OutputConfig, TraversalConfig, Validatable},
    diff::{
        compare, detect_rebase_conflicts, level1_changes, needs_rebase, ChangeOp, CompareMode,
        CompareOptions, DeltaPreview, DiffFilter, Severity,
    },
    effectivity::{parse_timestamp, Effectivity, EffectivityContext},
    model::{BomTree, ConfigSelection, Edge, Node, TreeEdge},
    reports::{export_csv, ReportFormat},
    store::InMemoryGraphStore,
};
use serde_json::json;

// ============================================================================
// Test Fixtures
// ============================================================================

/// A -> B (qty 2) -> C (qty 3)
fn chain_store() -> InMemoryGraphStore {
    InMemoryGraphStore::new()
        .with_node(Node::new("A").with_property("name", "Bike"))
        .with_node(Node::new("B"))
        .with_node(Node::new("C"))
        .with_edge(Edge::new("r1", "A", "B").with_quantity(2))
        .with_edge(Edge::new("r2", "B", "C").with_quantity(3))
}

/// Single-level tree under `A` from `(relationship, child, qty, find_num)`.
fn flat_tree(lines: &[(&str, &str, i64, &str)]) -> BomTree {
    let mut tree = BomTree::new(Node::new("A"));
    let root = tree.root();
    for (rel, child, qty, find) in lines {
        tree.push_child(
            root,
            TreeEdge::plain(
                Edge::new(*rel, "A", *child)
                    .with_quantity(*qty)
                    .with_property("find_num", *find),
            ),
            Node::new(*child),
        );
    }
    tree
}

// ============================================================================
// Tree Expansion
// ============================================================================

mod tree_tests {
    use super::*;

    #[test]
    fn test_unbounded_chain() {
        let tree = build_tree(&chain_store(), "A", &BuildOptions::with_max_depth(-1)).unwrap();

        let children: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(children.len(), 1);
        let (via_b, b) = children[0];
        assert_eq!(tree.node(b).id, "B");
        assert_eq!(via_b.edge.quantity(), 2.0);

        let grandchildren: Vec<_> = tree.children(b).collect();
        assert_eq!(grandchildren.len(), 1);
        assert_eq!(tree.node(grandchildren[0].1).id, "C");
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_depth_limit() {
        let tree = build_tree(&chain_store(), "A", &BuildOptions::with_max_depth(1)).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.node_count(), 2);

        let root_only = build_tree(&chain_store(), "A", &BuildOptions::with_max_depth(0)).unwrap();
        assert_eq!(root_only.node_count(), 1);
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let err = build_tree(&chain_store(), "NOPE", &BuildOptions::unbounded()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_cyclic_store_terminates() {
        let store = chain_store().with_edge(Edge::new("r3", "C", "A"));
        let options = BuildOptions::unbounded().hard_depth_limit(6);
        let tree = build_tree(&store, "A", &options).unwrap();
        assert_eq!(tree.depth(), 6);
    }

    #[test]
    fn test_variant_filter() {
        let store = InMemoryGraphStore::new()
            .with_node(Node::new("P"))
            .with_node(Node::new("RED-PAINT"))
            .with_node(Node::new("BLUE-PAINT"))
            .with_node(Node::new("FRAME"))
            .with_edge(Edge::new("r1", "P", "RED-PAINT").with_property("config_condition", "Color=Red"))
            .with_edge(Edge::new("r2", "P", "BLUE-PAINT").with_property("config_condition", "Color=Blue"))
            .with_edge(Edge::new("r3", "P", "FRAME"));

        let options = BuildOptions::unbounded()
            .selection(ConfigSelection::from_pairs([("Color", "Red")]));
        let tree = build_tree(&store, "P", &options).unwrap();
        let ids: Vec<_> = tree
            .children(tree.root())
            .map(|(_, idx)| tree.node(idx).id.clone())
            .collect();
        assert_eq!(ids, vec!["RED-PAINT", "FRAME"]);

        let all = build_tree(&store, "P", &BuildOptions::unbounded()).unwrap();
        assert_eq!(all.edge_count(), 3);
    }

    #[test]
    fn test_store_variant_rules() {
        let store = chain_store()
            .with_node(Node::new("B-LIGHT"))
            .with_variant_rule(
                VariantRule::new("light-frame", RuleAction::Substitute)
                    .for_parent("A")
                    .with_condition("Weight=light")
                    .targeting_relationship("r1")
                    .with_param("substitute_with", "B-LIGHT"),
            )
            .with_variant_rule(
                VariantRule::new("more-c", RuleAction::ModifyQty)
                    .targeting_item("C")
                    .with_param("quantity_multiplier", 2),
            );
        let tree = build_tree(&store, "A", &BuildOptions::unbounded()).unwrap();

        let light = ConfigSelection::from_pairs([("Weight", "light")]);
        let configured = apply_variant_rules(&store, &tree, store.variant_rules(), &light).unwrap();
        let ids: Vec<_> = configured.edges().iter().map(|v| v.child.id.clone()).collect();
        assert_eq!(ids, vec!["B-LIGHT"]);

        let standard = apply_variant_rules(&store, &tree, store.variant_rules(), &ConfigSelection::new()).unwrap();
        let c = standard.edges().into_iter().find(|v| v.child.id == "C").unwrap();
        assert_eq!(c.edge.edge.quantity(), 6.0);
    }

    #[test]
    fn test_effectivity_filter() {
        let ts = |s: &str| parse_timestamp(s).unwrap();
        let store = chain_store().with_effectivity(Effectivity::date(
            "r2",
            Some(ts("2024-01-01")),
            Some(ts("2024-12-31")),
        ));

        let inside = BuildOptions::unbounded().effective_at(EffectivityContext::at(ts("2024-06-01")));
        assert_eq!(build_tree(&store, "A", &inside).unwrap().depth(), 2);

        let outside = BuildOptions::unbounded().effective_at(EffectivityContext::at(ts("2025-06-01")));
        assert_eq!(build_tree(&store, "A", &outside).unwrap().depth(), 1);
    }
}

// ============================================================================
// Cycle Detection and Where-Used
// ============================================================================

mod graph_tests {
    use super::*;

    #[test]
    fn test_closing_edge_is_a_cycle() {
        let store = chain_store();
        let result = detect_cycle(&store, "C", "A").unwrap();
        assert!(result.has_cycle);
        assert_eq!(
            result.path.as_deref(),
            Some(&["C".to_string(), "A".to_string(), "B".to_string(), "C".to_string()][..])
        );

        let ok = detect_cycle(&store, "A", "C").unwrap();
        assert!(!ok.has_cycle);
        assert!(ok.path.is_none());
    }

    #[test]
    fn test_self_reference() {
        assert!(detect_cycle(&chain_store(), "B", "B").unwrap().has_cycle);
    }

    #[test]
    fn test_where_used_levels() {
        let store = chain_store();
        let direct = where_used(&store, "C", false, None).unwrap();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].parent.id, "B");

        let all = where_used(&store, "C", true, None).unwrap();
        let parents: Vec<_> = all.iter().map(|e| (e.parent.id.as_str(), e.level)).collect();
        assert_eq!(parents, vec![("B", 1), ("A", 2)]);
    }
}

// ============================================================================
// Comparison
// ============================================================================

mod compare_tests {
    use super::*;

    #[test]
    fn test_find_number_only_matters_by_position() {
        let left = flat_tree(&[("r1", "X", 1, "10")]);
        let right = flat_tree(&[("r1", "X", 1, "20")]);
        let options = CompareOptions::default();

        let product = compare(&left, &right, "only_product", &options).unwrap();
        assert!(!product.has_changes());

        let positional = compare(&left, &right, "by_position", &options).unwrap();
        assert!(positional.added.is_empty());
        assert!(positional.removed.is_empty());
        assert_eq!(positional.changed.len(), 1);
        let changed = &positional.changed[0];
        assert_eq!(changed.changes.len(), 1);
        assert_eq!(changed.changes[0].field, "find_num");
        assert_eq!(changed.severity, Severity::Minor);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let tree = flat_tree(&[]);
        let err = compare(&tree, &tree, "sideways", &CompareOptions::default()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_summarized_aggregates_quantities() {
        let left = flat_tree(&[("r1", "X", 1, "10"), ("r2", "X", 2, "20")]);
        let right = flat_tree(&[("r9", "X", 3, "30")]);
        let report = compare(&left, &right, "summarized", &CompareOptions::default()).unwrap();
        assert!(!report.has_changes());
    }

    #[test]
    fn test_every_mode_is_reflexive() {
        let tree = flat_tree(&[("r1", "X", 1, "10"), ("r2", "Y", 4, "20")]);
        for mode in CompareMode::ALL {
            let report = compare(&tree, &tree, mode.as_str(), &CompareOptions::new(mode)).unwrap();
            assert!(!report.has_changes(), "{mode} reported changes on identical trees");
        }
    }

    #[test]
    fn test_filter_and_delta() {
        let left = flat_tree(&[("r1", "X", 1, "10"), ("r2", "Y", 1, "20"), ("r3", "Z", 1, "30")]);
        let right = flat_tree(&[("r1", "X", 9, "10"), ("r2", "Y", 2, "25"), ("r4", "W", 1, "40")]);
        let report = compare(&left, &right, "by_reference", &CompareOptions::default()).unwrap();
        assert_eq!(report.changed.len(), 2);

        let big = DiffFilter::new()
            .with_quantity_range(Some(5.0), None)
            .apply(report.clone())
            .unwrap();
        assert_eq!(big.changed.len(), 1);
        assert_eq!(big.changed[0].quantity_delta, Some(8.0));
        assert_eq!(big.summary.changed, 1);

        let preview = DeltaPreview::from_report(&report);
        let ops: Vec<_> = preview.operations.iter().map(|o| (o.op, o.child_id.as_str())).collect();
        assert_eq!(
            ops,
            vec![
                (ChangeOp::Remove, "Z"),
                (ChangeOp::Update, "X"),
                (ChangeOp::Update, "Y"),
                (ChangeOp::Add, "W"),
            ]
        );
    }

    #[test]
    fn test_csv_export() {
        let left = flat_tree(&[("r1", "X", 1, "10"), ("r2", "Z", 1, "30")]);
        let right = flat_tree(&[("r1", "X", 2, "10"), ("r3", "Y", 4, "20")]);
        let report = compare(&left, &right, "by_position", &CompareOptions::default()).unwrap();

        insta::assert_snapshot!(export_csv(&report, ",").unwrap(), @r#"
        op,line_key,parent_id,child_id,relationship_id,severity,field,before,after
        remove,ROOT::Z::30,A,Z,r2,,,"{""find_num"":""30"",""quantity"":1}",
        update,ROOT::X::10,A,X,r1,major,quantity,1,2
        add,ROOT::Y::20,A,Y,r3,,,,"{""find_num"":""20"",""quantity"":4}"
        "#);
    }
}

// ============================================================================
// Change Orders
// ============================================================================

mod rebase_tests {
    use super::*;

    #[test]
    fn test_concurrent_quantity_edits_conflict() {
        let base = flat_tree(&[("r1", "X", 1, "10")]);
        let mine = flat_tree(&[("r1", "X", 5, "10")]);
        let theirs = flat_tree(&[("r1", "X", 7, "10")]);

        assert!(needs_rebase(&base, &theirs));
        let conflicts = detect_rebase_conflicts(&base, &mine, &theirs);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].child_item_id, "X");
        assert_eq!(conflicts[0].my_value.as_ref().unwrap()["quantity"], json!(5));
        assert_eq!(conflicts[0].their_value.as_ref().unwrap()["quantity"], json!(7));

        let changes = level1_changes(&base, &mine);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].op, ChangeOp::Update);
    }

    #[test]
    fn test_untouched_structure_needs_no_rebase() {
        let base = flat_tree(&[("r1", "X", 1, "10")]);
        assert!(!needs_rebase(&base, &base.clone()));
        assert!(detect_rebase_conflicts(&base, &base, &base).is_empty());
    }
}

// ============================================================================
// Conditions, Snapshots and Config
// ============================================================================

mod io_tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_condition_shorthand() {
        let red = ConfigSelection::from_pairs([("Color", "Red")]);
        let blue = ConfigSelection::from_pairs([("Color", "Blue")]);
        let cond = json!("Color=Red");
        assert!(condition::matches(Some(&cond), &red).unwrap());
        assert!(!condition::matches(Some(&cond), &blue).unwrap());
        assert!(condition::matches(None, &ConfigSelection::new()).unwrap());
    }

    #[test]
    fn test_snapshot_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        let tree = build_tree(&chain_store(), "A", &BuildOptions::unbounded()).unwrap();
        fs::write(&path, serde_json::to_string_pretty(&tree).unwrap()).unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom-tools.yaml");
        fs::write(
            &path,
            "compare:\n  mode: by_position\n  quantity_tolerance: 0.01\noutput:\n  format: csv\n  delimiter: \";\"\n",
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.compare.mode, CompareMode::ByPosition);
        assert_eq!(config.output.format, ReportFormat::Csv);
        assert_eq!(config.output.delimiter, ";");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_tree_command_applies_store_rules() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("plm.yaml");
        let out = dir.path().join("tree.json");
        fs::write(
            &store_path,
            r#"
nodes:
  - { id: A }
  - { id: B }
  - { id: C }
edges:
  - { id: r1, source_id: A, related_id: B, properties: { quantity: 2 } }
  - { id: r2, source_id: A, related_id: C, properties: { quantity: 1 } }
variant_rules:
  - { name: no-c, parent_item_id: A, condition: "Trim=base", action_type: exclude, target_item_id: C }
"#,
        )
        .unwrap();

        let command = TreeCommand {
            store: store_path,
            root: "A".into(),
            traversal: TraversalConfig::default(),
            selection: Some(ConfigSelection::from_pairs([("Trim", "base")])),
            effectivity: None,
            output: OutputConfig {
                format: ReportFormat::Json,
                file: Some(out.clone()),
                ..OutputConfig::default()
            },
            quiet: true,
        };
        assert_eq!(run_tree(command).unwrap(), exit_codes::SUCCESS);

        let tree = load_snapshot(&out).unwrap();
        let ids: Vec<_> = tree.edges().iter().map(|v| v.child.id.clone()).collect();
        assert_eq!(ids, vec!["B"]);
    }

    #[test]
    fn test_compare_command_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("left.json");
        let right = dir.path().join("right.json");
        let out = dir.path().join("diff.csv");
        fs::write(&left, serde_json::to_string(&flat_tree(&[("r1", "X", 1, "10")])).unwrap()).unwrap();
        fs::write(&right, serde_json::to_string(&flat_tree(&[("r1", "X", 2, "10")])).unwrap()).unwrap();

        let mut config = AppConfig::default();
        config.compare.mode = CompareMode::ByPosition;
        config.output.format = ReportFormat::Csv;
        config.output.file = Some(out.clone());

        let code = run_compare(CompareCommand {
            left: TreeInput::Snapshot(left.clone()),
            right: TreeInput::Snapshot(right),
            config: config.clone(),
            delta: false,
            no_fail_on_change: false,
            quiet: true,
        })
        .unwrap();
        assert_eq!(code, exit_codes::CHANGES_DETECTED);
        assert!(fs::read_to_string(&out).unwrap().contains("update,ROOT::X::10"));

        let same = run_compare(CompareCommand {
            left: TreeInput::Snapshot(left.clone()),
            right: TreeInput::Snapshot(left),
            config,
            delta: false,
            no_fail_on_change: false,
            quiet: true,
        })
        .unwrap();
        assert_eq!(same, exit_codes::SUCCESS);
    }
}
