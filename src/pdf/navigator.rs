//! Page index bookkeeping for a single display

use log::debug;
use serde::{Deserialize, Serialize};

use super::document::{Document, PageSize};

/// What a navigator does with a request that lands outside the document
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Snap to the first or last page
    #[default]
    Clamp,
    /// Ignore the request and stay on the current page
    Reject,
}

impl BoundaryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryPolicy::Clamp => "clamp",
            BoundaryPolicy::Reject => "reject",
        }
    }
}

/// Current page of one display.
///
/// The index is always inside `[0, page_count)`; every movement goes through
/// the boundary policy, so an out-of-range index can never reach the cache or
/// the renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageNavigator {
    current: usize,
    page_count: usize,
    policy: BoundaryPolicy,
}

impl PageNavigator {
    /// Navigator at page 0. Returns `None` for an empty document.
    #[must_use]
    pub fn new(page_count: usize, policy: BoundaryPolicy) -> Option<Self> {
        (page_count > 0).then_some(Self {
            current: 0,
            page_count,
            policy,
        })
    }

    /// Start at `index`, snapped into range. Construction is not a step, so
    /// this clamps under either policy.
    #[must_use]
    pub fn starting_at(mut self, index: usize) -> Self {
        self.current = index.min(self.last_index());
        self
    }

    /// Move `pages` forward. Returns true if the current page changed.
    pub fn forward(&mut self, pages: usize) -> bool {
        let resolved = match self.current.checked_add(pages) {
            Some(target) => self.resolve(target),
            None => self.resolve_out_of_range(self.last_index()),
        };
        self.move_to(resolved)
    }

    /// Move `pages` back. Returns true if the current page changed.
    pub fn back(&mut self, pages: usize) -> bool {
        let resolved = match self.current.checked_sub(pages) {
            Some(target) => target,
            None => self.resolve_out_of_range(0),
        };
        self.move_to(resolved)
    }

    /// Jump to `index`. Returns true if the current page changed.
    pub fn set_page(&mut self, index: usize) -> bool {
        let resolved = self.resolve(index);
        self.move_to(resolved)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Intrinsic size of the current page. Does not render.
    #[must_use]
    pub fn current_page(&self, document: &dyn Document) -> PageSize {
        document.page_size(self.current)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    #[must_use]
    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    fn last_index(&self) -> usize {
        self.page_count - 1
    }

    fn resolve(&self, index: usize) -> usize {
        if index < self.page_count {
            index
        } else {
            self.resolve_out_of_range(self.last_index())
        }
    }

    fn resolve_out_of_range(&self, boundary: usize) -> usize {
        match self.policy {
            BoundaryPolicy::Clamp => boundary,
            BoundaryPolicy::Reject => self.current,
        }
    }

    fn move_to(&mut self, index: usize) -> bool {
        if index == self.current {
            return false;
        }
        debug!("page {} -> {index}", self.current);
        self.current = index;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator(pages: usize, policy: BoundaryPolicy) -> PageNavigator {
        PageNavigator::new(pages, policy).unwrap()
    }

    #[test]
    fn empty_document_has_no_navigator() {
        assert!(PageNavigator::new(0, BoundaryPolicy::Clamp).is_none());
    }

    #[test]
    fn clamp_holds_at_first_page() {
        let mut nav = navigator(5, BoundaryPolicy::Clamp);

        assert!(!nav.back(2));
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn clamp_walks_forward_and_stops_on_last_page() {
        let mut nav = navigator(5, BoundaryPolicy::Clamp);
        let mut visited = vec![nav.current_index()];

        for _ in 0..3 {
            nav.forward(2);
            visited.push(nav.current_index());
        }

        assert_eq!(visited, vec![0, 2, 4, 4]);
    }

    #[test]
    fn clamp_snaps_overshoot_to_last_page() {
        let mut nav = navigator(6, BoundaryPolicy::Clamp).starting_at(4);

        assert!(nav.forward(2));
        assert_eq!(nav.current_index(), 5);
    }

    #[test]
    fn reject_leaves_index_unchanged() {
        let mut nav = navigator(5, BoundaryPolicy::Reject).starting_at(4);
        assert!(!nav.forward(2));
        assert_eq!(nav.current_index(), 4);

        // Where clamping would snap to 5, rejecting stays put
        let mut nav = navigator(6, BoundaryPolicy::Reject).starting_at(4);
        assert!(!nav.forward(2));
        assert_eq!(nav.current_index(), 4);

        let mut nav = navigator(6, BoundaryPolicy::Reject).starting_at(1);
        assert!(!nav.back(2));
        assert_eq!(nav.current_index(), 1);
    }

    #[test]
    fn huge_steps_hit_the_boundary_instead_of_wrapping() {
        let mut clamp = navigator(6, BoundaryPolicy::Clamp).starting_at(1);
        assert!(clamp.forward(usize::MAX));
        assert_eq!(clamp.current_index(), 5);
        assert!(clamp.back(usize::MAX));
        assert_eq!(clamp.current_index(), 0);

        let mut reject = navigator(6, BoundaryPolicy::Reject).starting_at(1);
        assert!(!reject.forward(usize::MAX));
        assert!(!reject.forward(isize::MAX as usize));
        assert!(!reject.back(isize::MAX as usize + 1));
        assert_eq!(reject.current_index(), 1);
    }

    #[test]
    fn set_page_follows_policy() {
        let mut clamp = navigator(10, BoundaryPolicy::Clamp);
        assert!(clamp.set_page(42));
        assert_eq!(clamp.current_index(), 9);

        let mut reject = navigator(10, BoundaryPolicy::Reject).starting_at(3);
        assert!(!reject.set_page(42));
        assert_eq!(reject.current_index(), 3);
        assert!(reject.set_page(7));
        assert_eq!(reject.current_index(), 7);
    }

    #[test]
    fn starting_index_is_snapped_into_range() {
        let nav = navigator(1, BoundaryPolicy::Reject).starting_at(1);
        assert_eq!(nav.current_index(), 0);
    }
}
