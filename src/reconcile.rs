//! Keyed enter/update/exit diff between two layouts.

use serde::Serialize;

use crate::layout::{Layout, LayoutPoint, Point};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transition {
    pub identity: String,
    pub start: Point,
    pub end: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExitTransition {
    pub identity: String,
    pub start: Point,
    /// Where the node collapses to.
    pub target: Point,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diff {
    pub entering: Vec<Transition>,
    pub updating: Vec<Transition>,
    pub exiting: Vec<ExitTransition>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.entering.is_empty() && self.updating.is_empty() && self.exiting.is_empty()
    }

    pub fn selectable(&self) -> impl Iterator<Item = &str> {
        self.entering
            .iter()
            .chain(&self.updating)
            .map(|transition| transition.identity.as_str())
    }
}

/// Matches `previous` against `next` by identity. Entering nodes start at
/// the trigger's new position, exiting nodes collapse toward it; both fall
/// back to `previous_root` when there is no trigger or it is gone.
pub fn diff(
    previous: &Layout,
    next: &Layout,
    previous_root: &LayoutPoint,
    trigger: Option<&str>,
) -> Diff {
    let anchor = trigger
        .and_then(|identity| next.get(identity))
        .map(LayoutPoint::point)
        .unwrap_or_else(|| previous_root.point());

    let mut out = Diff::default();

    for point in next.points() {
        match previous.get(&point.identity) {
            Some(before) => out.updating.push(Transition {
                identity: point.identity.clone(),
                start: before.point(),
                end: point.point(),
            }),
            None => out.entering.push(Transition {
                identity: point.identity.clone(),
                start: anchor,
                end: point.point(),
            }),
        }
    }

    out.exiting = previous
        .points()
        .iter()
        .filter(|point| !next.contains(&point.identity))
        .map(|point| ExitTransition {
            identity: point.identity.clone(),
            start: point.point(),
            target: anchor,
        })
        .collect();

    tracing::debug!(
        entering = out.entering.len(),
        updating = out.updating.len(),
        exiting = out.exiting.len(),
        "reconciled layouts"
    );
    out
}
