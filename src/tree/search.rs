use std::collections::{BTreeMap, BTreeSet};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::Serialize;

use crate::util::fold_case;

use super::build::TreeNode;

/// Byte range into a node's display label.
pub type Span = (usize, usize);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub visible_identities: BTreeSet<String>,
    /// Nodes that matched directly, as opposed to ancestors pulled in.
    pub matches: BTreeSet<String>,
    pub highlights: BTreeMap<String, Vec<Span>>,
}

impl SearchResult {
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.visible_identities.contains(identity)
    }

    pub fn is_match(&self, identity: &str) -> bool {
        self.matches.contains(identity)
    }
}

/// Filters `root` by a case-insensitive substring query. Matches, their
/// ancestors and the root stay visible. Whitespace around the query is
/// ignored; a blank query keeps every node.
pub fn apply(root: &TreeNode, query: &str) -> SearchResult {
    let query = query.trim();
    let mut result = SearchResult {
        query: query.to_string(),
        ..SearchResult::default()
    };

    if query.is_empty() {
        result.visible_identities = root.iter().map(|node| node.identity().to_string()).collect();
        return result;
    }

    let folded_query = fold_case(query);
    visit(root, folded_query.as_str(), &mut result);
    result.visible_identities.insert(root.identity().to_string());

    tracing::debug!(
        query,
        matches = result.matches.len(),
        visible = result.visible_identities.len(),
        "applied search filter"
    );
    result
}

fn visit(node: &TreeNode, folded_query: &str, result: &mut SearchResult) -> bool {
    let spans = node.folded_label().spans(folded_query);
    let code_match = node.kind().matches_code()
        && node
            .record()
            .external_code
            .as_deref()
            .is_some_and(|code| fold_case(code).as_str().contains(folded_query));

    let direct = !spans.is_empty() || code_match;
    if direct {
        result.matches.insert(node.identity().to_string());
        if !spans.is_empty() {
            result.highlights.insert(node.identity().to_string(), spans);
        }
    }

    let mut subtree_match = direct;
    for child in node.children() {
        subtree_match |= visit(child, folded_query, result);
    }

    if subtree_match {
        result.visible_identities.insert(node.identity().to_string());
    }
    subtree_match
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub identity: String,
    pub label: String,
    pub score: i64,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Fuzzy-ranked labels for a search box, best first.
pub fn suggest(root: &TreeNode, query: &str, limit: usize) -> Vec<Suggestion> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut ranked = root
        .iter()
        .filter_map(|node| {
            fuzzy_match_score(&matcher, node.label(), query).map(|score| Suggestion {
                identity: node.identity().to_string(),
                label: node.label().to_string(),
                score,
            })
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.identity.cmp(&b.identity)));
    ranked.truncate(limit);
    ranked
}
