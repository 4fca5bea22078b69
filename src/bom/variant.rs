//! Variant rules: product-level include, exclude, substitute and quantity
//! adjustments applied to an expanded tree for one configuration selection.

use crate::condition;
use crate::error::{ErrorContext, Result};
use crate::model::{parse_quantity, BomTree, ConfigSelection, Node, NodeIndex, Properties, TreeEdge};
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Priority given to rules that do not set one
pub const DEFAULT_RULE_PRIORITY: i64 = 100;

/// Edge property naming the item a substituted line originally used
pub const SUBSTITUTED_FROM: &str = "substituted_from";

/// Edge property keeping the quantity before a `modify_qty` rule
pub const ORIGINAL_QUANTITY: &str = "original_quantity";

const fn default_priority() -> i64 {
    DEFAULT_RULE_PRIORITY
}

const fn default_true() -> bool {
    true
}

/// What a matching rule does to the lines it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Keep the line only when at least one targeting include rule matches
    Include,
    Exclude,
    /// Swap the child for the item named by the `substitute_with` parameter
    Substitute,
    /// Multiply the line quantity by the `quantity_multiplier` parameter
    ModifyQty,
}

/// A variant rule scoped to a product item or an item type.
///
/// ```yaml
/// - name: no-light-on-base
///   parent_item_id: BIKE
///   condition: "Trim=base"
///   action_type: exclude
///   target_item_id: LIGHT
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRule {
    pub name: String,
    /// Same forms as a line's `config_condition`; `null` always matches
    #[serde(default)]
    pub condition: Value,
    #[serde(rename = "action_type", alias = "action")]
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_relationship_id: Option<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub action_params: Properties,
    /// Lower runs first; ties are broken by name
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_item_type_id: Option<String>,
}

impl VariantRule {
    pub fn new(name: impl Into<String>, action: RuleAction) -> Self {
        Self {
            name: name.into(),
            condition: Value::Null,
            action,
            target_item_id: None,
            target_relationship_id: None,
            action_params: Properties::new(),
            priority: DEFAULT_RULE_PRIORITY,
            is_active: true,
            parent_item_id: None,
            parent_item_type_id: None,
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<Value>) -> Self {
        self.condition = condition.into();
        self
    }

    #[must_use]
    pub fn targeting_item(mut self, item_id: impl Into<String>) -> Self {
        self.target_item_id = Some(item_id.into());
        self
    }

    #[must_use]
    pub fn targeting_relationship(mut self, relationship_id: impl Into<String>) -> Self {
        self.target_relationship_id = Some(relationship_id.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.action_params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn for_parent(mut self, item_id: impl Into<String>) -> Self {
        self.parent_item_id = Some(item_id.into());
        self
    }

    /// Whether the rule is attached to the product `root`.
    ///
    /// A rule naming a parent item applies to that item only. Otherwise a
    /// rule naming an item type applies to roots of that type, and a rule
    /// naming neither applies everywhere.
    pub fn applies_to(&self, root: &Node) -> bool {
        match (&self.parent_item_id, &self.parent_item_type_id) {
            (Some(parent), _) => *parent == root.id,
            (None, Some(item_type)) => root.item_type.as_deref() == Some(item_type.as_str()),
            (None, None) => true,
        }
    }

    /// Whether the rule addresses the line `relationship_id -> child_id`.
    ///
    /// A rule without targets addresses every line.
    pub fn targets(&self, relationship_id: &str, child_id: &str) -> bool {
        match (&self.target_item_id, &self.target_relationship_id) {
            (None, None) => true,
            (item, rel) => {
                item.as_deref() == Some(child_id) || rel.as_deref() == Some(relationship_id)
            }
        }
    }

    fn matches(&self, selection: &ConfigSelection) -> Result<bool> {
        condition::matches(Some(&self.condition), selection)
            .with_context(|| format!("condition of variant rule {}", self.name))
    }

    fn param(&self, key: &str) -> Option<&Value> {
        self.action_params.get(key).filter(|v| !v.is_null())
    }
}

/// Outcome of the rules for one line.
#[derive(Debug, Default)]
struct LineVerdict {
    substitute_with: Option<String>,
    multiplier: Option<f64>,
}

/// Apply `rules` to `tree` for `selection`, returning the configured tree.
///
/// Only active rules attached to the tree's root take part, ordered by
/// priority then name. For every line, top-down:
///
/// - a line whose `config_condition` does not match is dropped;
/// - the first matching `exclude` rule drops the line;
/// - when include rules target the line, at least one must match;
/// - the last matching `substitute` rule swaps the child for the named item
///   (when the store knows it) and drops the old child's subtree;
/// - the last matching `modify_qty` rule scales the quantity, keeping the
///   previous value under `original_quantity`.
pub fn apply_variant_rules(
    store: &dyn GraphStore,
    tree: &BomTree,
    rules: &[VariantRule],
    selection: &ConfigSelection,
) -> Result<BomTree> {
    let root = tree.root_node();
    let mut active: Vec<&VariantRule> = rules
        .iter()
        .filter(|rule| rule.is_active && rule.applies_to(root))
        .collect();
    active.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

    let mut configured = BomTree::new(root.clone());
    let target = configured.root();
    copy_configured(store, tree, tree.root(), &mut configured, target, &active, selection)?;

    tracing::debug!(
        root = %root.id,
        rules = active.len(),
        before = tree.edge_count(),
        after = configured.edge_count(),
        "applied variant rules"
    );
    Ok(configured)
}

fn copy_configured(
    store: &dyn GraphStore,
    source: &BomTree,
    from: NodeIndex,
    out: &mut BomTree,
    into: NodeIndex,
    rules: &[&VariantRule],
    selection: &ConfigSelection,
) -> Result<()> {
    for (via, child) in source.children(from) {
        let child_node = source.node(child);
        let Some(verdict) = judge(rules, via, &child_node.id, selection)? else {
            continue;
        };

        let mut via = via.clone();
        let mut node = child_node.clone();
        let mut substituted = false;
        if let Some(sub_id) = &verdict.substitute_with {
            if let Some(sub) = store.get_node(sub_id)? {
                via.edge
                    .properties
                    .insert(SUBSTITUTED_FROM.to_string(), Value::String(node.id.clone()));
                node = sub;
                substituted = true;
            } else {
                tracing::warn!(line = %via.edge.id, item = %sub_id, "substitute item not found");
            }
        }
        if let Some(multiplier) = verdict.multiplier {
            scale_quantity(&mut via, multiplier);
        }

        let index = out.push_child(into, via, node);
        if !substituted {
            copy_configured(store, source, child, out, index, rules, selection)?;
        }
    }
    Ok(())
}

/// `None` when the line is dropped.
fn judge(
    rules: &[&VariantRule],
    via: &TreeEdge,
    child_id: &str,
    selection: &ConfigSelection,
) -> Result<Option<LineVerdict>> {
    let edge = &via.edge;
    let mut include = condition::matches(edge.config_condition(), selection)
        .with_context(|| format!("condition of line {}", edge.id))?;
    let mut include_rule_present = false;
    let mut include_rule_matched = false;
    let mut verdict = LineVerdict::default();

    for rule in rules.iter().filter(|r| r.targets(&edge.id, child_id)) {
        if rule.action == RuleAction::Include {
            include_rule_present = true;
        }
        if !rule.matches(selection)? {
            continue;
        }
        match rule.action {
            RuleAction::Exclude => {
                include = false;
                break;
            }
            RuleAction::Include => include_rule_matched = true,
            RuleAction::Substitute => {
                if let Some(Value::String(id)) = rule.param("substitute_with") {
                    verdict.substitute_with = Some(id.clone());
                }
            }
            RuleAction::ModifyQty => {
                match rule.param("quantity_multiplier").map(parse_quantity) {
                    Some(Some(m)) => verdict.multiplier = Some(m),
                    Some(None) => tracing::warn!(
                        rule = %rule.name,
                        "quantity_multiplier is not a number, ignored"
                    ),
                    None => {}
                }
            }
        }
    }

    if include_rule_present && !include_rule_matched {
        include = false;
    }
    Ok(include.then_some(verdict))
}

#[allow(clippy::float_cmp)]
fn scale_quantity(via: &mut TreeEdge, multiplier: f64) {
    if multiplier == 1.0 {
        return;
    }
    let props = &mut via.edge.properties;
    let original = props.get("quantity").cloned().unwrap_or_else(|| Value::from(1));
    let scaled = parse_quantity(&original).map(|q| q * multiplier);
    if let Some(quantity) = scaled.and_then(serde_json::Number::from_f64) {
        props.insert("quantity".to_string(), Value::Number(quantity));
    }
    props.insert(ORIGINAL_QUANTITY.to_string(), original);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Edge;
    use crate::store::InMemoryGraphStore;
    use serde_json::json;

    fn store() -> InMemoryGraphStore {
        InMemoryGraphStore::new()
            .with_node(Node::new("LIGHT-LED").with_property("name", "LED light"))
    }

    /// BIKE -> FRAME(r1, 1) -> BOLT(r3, 4); BIKE -> LIGHT(r2, 2)
    fn bike() -> BomTree {
        let mut tree = BomTree::new(Node::new("BIKE"));
        let root = tree.root();
        let frame = tree.push_child(
            root,
            TreeEdge::plain(Edge::new("r1", "BIKE", "FRAME").with_quantity(1)),
            Node::new("FRAME"),
        );
        tree.push_child(
            frame,
            TreeEdge::plain(Edge::new("r3", "FRAME", "BOLT").with_quantity(4)),
            Node::new("BOLT"),
        );
        let light = tree.push_child(
            root,
            TreeEdge::plain(Edge::new("r2", "BIKE", "LIGHT").with_quantity(2)),
            Node::new("LIGHT"),
        );
        tree.push_child(
            light,
            TreeEdge::plain(Edge::new("r4", "LIGHT", "BULB")),
            Node::new("BULB"),
        );
        tree
    }

    fn child_ids(tree: &BomTree) -> Vec<String> {
        tree.edges().iter().map(|v| v.child.id.clone()).collect()
    }

    fn apply(rules: &[VariantRule], selection: &ConfigSelection) -> BomTree {
        apply_variant_rules(&store(), &bike(), rules, selection).unwrap()
    }

    #[test]
    fn test_no_rules_keeps_tree() {
        let tree = apply(&[], &ConfigSelection::new());
        assert_eq!(tree, bike());
    }

    #[test]
    fn test_exclude_drops_line_and_subtree() {
        let rules = [VariantRule::new("no-light", RuleAction::Exclude)
            .with_condition("Trim=base")
            .targeting_item("LIGHT")];
        let base = apply(&rules, &ConfigSelection::from_pairs([("Trim", "base")]));
        assert_eq!(child_ids(&base), vec!["FRAME", "BOLT"]);
        let sport = apply(&rules, &ConfigSelection::from_pairs([("Trim", "sport")]));
        assert_eq!(child_ids(&sport), child_ids(&bike()));
    }

    #[test]
    fn test_include_requires_a_match() {
        let rules = [VariantRule::new("light-on-sport", RuleAction::Include)
            .with_condition("Trim=sport")
            .targeting_relationship("r2")];
        let sport = apply(&rules, &ConfigSelection::from_pairs([("Trim", "sport")]));
        assert!(child_ids(&sport).contains(&"LIGHT".to_string()));
        let base = apply(&rules, &ConfigSelection::from_pairs([("Trim", "base")]));
        assert_eq!(child_ids(&base), vec!["FRAME", "BOLT"]);
    }

    #[test]
    fn test_exclude_beats_include() {
        let rules = [
            VariantRule::new("a-include", RuleAction::Include).targeting_item("LIGHT"),
            VariantRule::new("b-exclude", RuleAction::Exclude).targeting_item("LIGHT"),
        ];
        let tree = apply(&rules, &ConfigSelection::new());
        assert!(!child_ids(&tree).contains(&"LIGHT".to_string()));
    }

    #[test]
    fn test_substitute_swaps_child() {
        let rules = [VariantRule::new("led", RuleAction::Substitute)
            .targeting_item("LIGHT")
            .with_param("substitute_with", "LIGHT-LED")];
        let tree = apply(&rules, &ConfigSelection::new());
        assert_eq!(child_ids(&tree), vec!["FRAME", "BOLT", "LIGHT-LED"]);
        let line = tree.edges().into_iter().find(|v| v.child.id == "LIGHT-LED").unwrap();
        assert_eq!(line.edge.edge.id, "r2");
        assert_eq!(line.edge.edge.properties[SUBSTITUTED_FROM], json!("LIGHT"));
        assert_eq!(line.child.name(), Some("LED light"));
    }

    #[test]
    fn test_unknown_substitute_keeps_child() {
        let rules = [VariantRule::new("missing", RuleAction::Substitute)
            .targeting_item("LIGHT")
            .with_param("substitute_with", "NOPE")];
        let tree = apply(&rules, &ConfigSelection::new());
        assert_eq!(child_ids(&tree), child_ids(&bike()));
    }

    #[test]
    fn test_modify_qty_scales_and_keeps_original() {
        let rules = [VariantRule::new("double-bolts", RuleAction::ModifyQty)
            .with_condition(json!({"option": "Heavy", "exists": true}))
            .targeting_item("BOLT")
            .with_param("quantity_multiplier", "2.5")];
        let tree = apply(&rules, &ConfigSelection::from_pairs([("Heavy", "yes")]));
        let bolt = tree.edges().into_iter().find(|v| v.child.id == "BOLT").unwrap();
        assert_eq!(bolt.edge.edge.quantity(), 10.0);
        assert_eq!(bolt.edge.edge.properties[ORIGINAL_QUANTITY], json!(4));

        let untouched = apply(&rules, &ConfigSelection::new());
        assert_eq!(untouched, bike());
    }

    #[test]
    fn test_modify_qty_without_quantity_starts_from_one() {
        let rules = [VariantRule::new("bulbs", RuleAction::ModifyQty)
            .targeting_item("BULB")
            .with_param("quantity_multiplier", 3)];
        let tree = apply(&rules, &ConfigSelection::new());
        let bulb = tree.edges().into_iter().find(|v| v.child.id == "BULB").unwrap();
        assert_eq!(bulb.edge.edge.quantity(), 3.0);
        assert_eq!(bulb.edge.edge.properties[ORIGINAL_QUANTITY], json!(1));
    }

    #[test]
    fn test_priority_orders_rules_before_name() {
        let rules = [
            VariantRule::new("a-triple", RuleAction::ModifyQty)
                .targeting_item("BOLT")
                .with_param("quantity_multiplier", 3)
                .with_priority(200),
            VariantRule::new("z-double", RuleAction::ModifyQty)
                .targeting_item("BOLT")
                .with_param("quantity_multiplier", 2)
                .with_priority(1),
        ];
        let tree = apply(&rules, &ConfigSelection::new());
        let bolt = tree.edges().into_iter().find(|v| v.child.id == "BOLT").unwrap();
        assert_eq!(bolt.edge.edge.quantity(), 12.0);
    }

    #[test]
    fn test_rule_scope_and_activity() {
        let mut inactive = VariantRule::new("off", RuleAction::Exclude).targeting_item("LIGHT");
        inactive.is_active = false;
        let other_product = VariantRule::new("other", RuleAction::Exclude)
            .targeting_item("LIGHT")
            .for_parent("CAR");
        let tree = apply(&[inactive, other_product], &ConfigSelection::new());
        assert_eq!(tree, bike());

        let mut typed = VariantRule::new("typed", RuleAction::Exclude).targeting_item("LIGHT");
        typed.parent_item_type_id = Some("Product".into());
        assert!(!typed.applies_to(&Node::new("BIKE")));
        let mut product = Node::new("BIKE");
        product.item_type = Some("Product".into());
        assert!(typed.applies_to(&product));
    }

    #[test]
    fn test_line_condition_still_filters() {
        let mut tree = bike();
        let root = tree.root();
        tree.push_child(
            root,
            TreeEdge::plain(Edge::new("r5", "BIKE", "BELL").with_property("config_condition", "Bell=yes")),
            Node::new("BELL"),
        );
        let out = apply_variant_rules(&store(), &tree, &[], &ConfigSelection::new()).unwrap();
        assert!(!child_ids(&out).contains(&"BELL".to_string()));
    }

    #[test]
    fn test_malformed_rule_condition_is_invalid() {
        let rules = [VariantRule::new("bad", RuleAction::Exclude).with_condition("Trim")];
        let err = apply_variant_rules(&store(), &bike(), &rules, &ConfigSelection::new()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_rule_deserializes_from_yaml() {
        let rule: VariantRule = serde_yaml::from_str(
            "name: led\naction_type: substitute\ntarget_item_id: LIGHT\naction_params: { substitute_with: LIGHT-LED }\n",
        )
        .unwrap();
        assert_eq!(rule.action, RuleAction::Substitute);
        assert_eq!(rule.priority, DEFAULT_RULE_PRIORITY);
        assert!(rule.is_active);
        assert!(rule.condition.is_null());
    }
}
