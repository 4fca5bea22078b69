//! Bounded-depth expansion of a root item into a [`BomTree`].

use super::memo::TraversalMemo;
use crate::condition;
use crate::effectivity::EffectivityContext;
use crate::error::{BomError, ErrorContext, OptionContext, Result};
use crate::model::{BomTree, ConfigSelection, Edge, NodeIndex, TreeEdge};
use crate::store::{EffectivityOracle, GraphStore, SubstituteProvider};

/// Default depth when none is configured
pub const DEFAULT_MAX_DEPTH: i32 = 10;

/// Ceiling applied to every traversal, including unbounded ones
pub const DEFAULT_HARD_DEPTH_LIMIT: usize = 10_000;

/// Filters and enrichment switches for one [`TreeBuilder::build`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// `-1` for unbounded; children of nodes at this level are not expanded
    pub max_depth: i32,
    /// Edges whose `config_condition` does not match are skipped
    pub config_selection: Option<ConfigSelection>,
    /// Edges not effective in this context are skipped
    pub effectivity_context: Option<EffectivityContext>,
    /// Empty admits every relationship type
    pub relationship_types: Vec<String>,
    pub include_substitutes: bool,
    pub include_effectivity: bool,
    pub hard_depth_limit: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl BuildOptions {
    #[must_use]
    pub fn with_max_depth(max_depth: i32) -> Self {
        Self {
            max_depth,
            config_selection: None,
            effectivity_context: None,
            relationship_types: Vec::new(),
            include_substitutes: false,
            include_effectivity: false,
            hard_depth_limit: DEFAULT_HARD_DEPTH_LIMIT,
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self::with_max_depth(-1)
    }

    #[must_use]
    pub fn selection(mut self, selection: ConfigSelection) -> Self {
        self.config_selection = Some(selection);
        self
    }

    #[must_use]
    pub fn effective_at(mut self, ctx: EffectivityContext) -> Self {
        self.effectivity_context = Some(ctx);
        self
    }

    #[must_use]
    pub fn relationship_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationship_types = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn include_substitutes(mut self, include: bool) -> Self {
        self.include_substitutes = include;
        self
    }

    #[must_use]
    pub const fn include_effectivity(mut self, include: bool) -> Self {
        self.include_effectivity = include;
        self
    }

    #[must_use]
    pub const fn hard_depth_limit(mut self, limit: usize) -> Self {
        self.hard_depth_limit = limit;
        self
    }

    /// Effective level limit, or an error for depths below -1.
    fn level_limit(&self) -> Result<usize> {
        match self.max_depth {
            -1 => Ok(self.hard_depth_limit),
            d if d < -1 => Err(BomError::invalid(format!(
                "max_depth must be -1 (unbounded) or >= 0, got {d}"
            ))),
            d => Ok(usize::try_from(d).unwrap_or(usize::MAX).min(self.hard_depth_limit)),
        }
    }
}

/// Expands a root item into a depth-bounded tree.
///
/// Without an oracle, effectivity is not checked and no records are
/// attached; without a substitute provider, no substitutes are attached.
pub struct TreeBuilder<'a> {
    store: &'a dyn GraphStore,
    oracle: Option<&'a dyn EffectivityOracle>,
    substitutes: Option<&'a dyn SubstituteProvider>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self {
            store,
            oracle: None,
            substitutes: None,
        }
    }

    /// Use one object for all three collaborator roles.
    pub fn with_collaborators<S>(store: &'a S) -> Self
    where
        S: GraphStore + EffectivityOracle + SubstituteProvider,
    {
        Self {
            store,
            oracle: Some(store),
            substitutes: Some(store),
        }
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: &'a dyn EffectivityOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    #[must_use]
    pub fn with_substitute_provider(mut self, provider: &'a dyn SubstituteProvider) -> Self {
        self.substitutes = Some(provider);
        self
    }

    /// Build the tree rooted at `root_id`.
    ///
    /// Fails with `NotFound` when the root is missing or not current, and
    /// with `InvalidArgument` for a malformed depth or edge condition.
    pub fn build(&self, root_id: &str, options: &BuildOptions) -> Result<BomTree> {
        let limit = options.level_limit()?;
        let bounded_by_ceiling = options.max_depth < 0
            || usize::try_from(options.max_depth).map_or(true, |d| d > options.hard_depth_limit);

        let mut memo = TraversalMemo::default();
        let root = memo
            .node(self.store, root_id)
            .with_context(|| format!("resolving root {root_id}"))?
            .filter(|node| node.is_current)
            .or_not_found("item", root_id)?;

        let mut tree = BomTree::new(root);
        let mut stack = vec![tree.root()];
        let mut truncated = false;

        while let Some(current) = stack.pop() {
            let level = tree.entry(current).level;
            if level >= limit {
                if bounded_by_ceiling && !truncated {
                    let id = &tree.node(current).id;
                    if !self.store.get_outgoing_edges(id)?.is_empty() {
                        truncated = true;
                        tracing::warn!(
                            root = root_id,
                            node = %id,
                            limit,
                            "depth ceiling reached, traversal truncated (cyclic data?)"
                        );
                    }
                }
                continue;
            }

            let added = self.expand(&mut tree, current, options, &mut memo)?;
            stack.extend(added.into_iter().rev());
        }

        tracing::debug!(
            root = root_id,
            nodes = tree.node_count(),
            depth = tree.depth(),
            memo_hits = memo.hits,
            "built BOM tree"
        );
        Ok(tree)
    }

    /// Admit the children of `parent`, returning their indices in order.
    fn expand(
        &self,
        tree: &mut BomTree,
        parent: NodeIndex,
        options: &BuildOptions,
        memo: &mut TraversalMemo,
    ) -> Result<Vec<NodeIndex>> {
        let parent_id = tree.node(parent).id.clone();
        let edges = self
            .store
            .get_outgoing_edges(&parent_id)
            .with_context(|| format!("expanding {parent_id}"))?;

        let mut added = Vec::with_capacity(edges.len());
        for edge in edges {
            if edge.related_id.is_empty() || !self.type_admitted(&edge, options) {
                continue;
            }
            let Some(child) = memo
                .node(self.store, &edge.related_id)?
                .filter(|node| node.is_current)
            else {
                continue;
            };
            if let Some(selection) = &options.config_selection {
                if !condition::matches(edge.config_condition(), selection)? {
                    continue;
                }
            }
            if let (Some(ctx), Some(oracle)) = (&options.effectivity_context, self.oracle) {
                if !memo.is_effective(oracle, &edge.id, ctx)? {
                    continue;
                }
            }

            let via = self.enrich(edge, options, memo)?;
            added.push(tree.push_child(parent, via, child));
        }
        Ok(added)
    }

    fn type_admitted(&self, edge: &Edge, options: &BuildOptions) -> bool {
        options.relationship_types.is_empty()
            || options
                .relationship_types
                .iter()
                .any(|t| t == &edge.relationship_type)
    }

    fn enrich(&self, edge: Edge, options: &BuildOptions, memo: &mut TraversalMemo) -> Result<TreeEdge> {
        let mut via = TreeEdge::plain(edge);
        if options.include_substitutes {
            if let Some(provider) = self.substitutes {
                via.substitutes = Some(memo.substitutes(provider, &via.edge.id)?);
            }
        }
        if options.include_effectivity {
            if let Some(oracle) = self.oracle {
                via.effectivities = Some(memo.effectivities(oracle, &via.edge.id)?);
            }
        }
        Ok(via)
    }
}

/// Build a tree with one object serving every collaborator role.
pub fn build_tree<S>(store: &S, root_id: &str, options: &BuildOptions) -> Result<BomTree>
where
    S: GraphStore + EffectivityOracle + SubstituteProvider,
{
    TreeBuilder::with_collaborators(store).build(root_id, options)
}
