//! Discovery of confirmed chains from a node down to its descendants.

use std::collections::HashSet;

use arbor_ledger::Address;

use crate::error::{Error, Result};
use crate::links::NodeIndex;
use crate::registry::Registry;

impl Registry {
    /// Depth-first search over confirmed children, first-confirmed first.
    ///
    /// Returns the nodes after `from` up to and including `to`, or an empty
    /// route when `from == to`.
    pub(crate) fn find_route(&self, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
        if from == to {
            return Some(Vec::new());
        }

        let mut visited = HashSet::from([from]);
        // (node, position of the next child to explore)
        let mut stack: Vec<(NodeIndex, usize)> = vec![(from, 0)];

        while let Some(&(node, next)) = stack.last() {
            let top = stack.len() - 1;
            let Some(&child) = self.node_at(node).children.get(next) else {
                stack.pop();
                continue;
            };
            stack[top].1 += 1;

            if !visited.insert(child) {
                continue;
            }
            if child == to {
                let mut route: Vec<NodeIndex> = stack[1..].iter().map(|(n, _)| *n).collect();
                route.push(child);
                return Some(route);
            }
            stack.push((child, 0));
        }

        None
    }

    /// Confirmed routes from `origin` down to each target, in target order.
    ///
    /// Every target is searched from `origin` on its own. Each route excludes
    /// `origin` and ends with its target; the routes are concatenated.
    pub fn resolve_to_descendant(
        &self,
        origin: &Address,
        targets: &[Address],
    ) -> Result<Vec<Address>> {
        let from = self.node_index(origin)?;
        let mut resolved = Vec::new();

        for target in targets {
            let not_found = || Error::NoPathFound {
                from: *origin,
                to: *target,
            };
            let to = self.index.get(target).copied().ok_or_else(not_found)?;
            let route = self.find_route(from, to).ok_or_else(not_found)?;
            resolved.extend(route.into_iter().map(|i| self.address_of(i)));
        }

        tracing::debug!(
            "Resolved {} node(s) below {} for {} target(s)",
            resolved.len(),
            origin,
            targets.len()
        );
        Ok(resolved)
    }

    /// `[member, origin, ..route to target]`, ready for share queries and transfers.
    pub fn resolve_member_path(
        &self,
        member: &Address,
        origin: &Address,
        target: &Address,
    ) -> Result<Vec<Address>> {
        let route = self.resolve_to_descendant(origin, std::slice::from_ref(target))?;
        let mut path = Vec::with_capacity(route.len() + 2);
        path.push(*member);
        path.push(*origin);
        path.extend(route);
        Ok(path)
    }
}
