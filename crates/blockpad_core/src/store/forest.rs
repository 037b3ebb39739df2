//! Forest navigation over a flat page list.
//!
//! # Responsibility
//! - Answer hierarchy queries (roots, children, ancestors, descendants).
//! - Detect would-be cycles before a re-parent is applied.
//!
//! # Invariants
//! - Every walk terminates, even over corrupted data where `parentId`
//!   links form a cycle or point at missing pages.
//! - Sibling order is the order of the underlying slice.

use crate::model::page::{Page, PageId};
use std::collections::{HashMap, HashSet, VecDeque};

pub fn find<'a>(pages: &'a [Page], page_id: &str) -> Option<&'a Page> {
    pages.iter().find(|page| page.id == page_id)
}

/// Pages without a parent, in store order.
pub fn root_pages(pages: &[Page]) -> Vec<&Page> {
    pages.iter().filter(|page| page.is_root()).collect()
}

/// Direct children of `page_id`, in store order.
pub fn children_of<'a>(pages: &'a [Page], page_id: &str) -> Vec<&'a Page> {
    pages
        .iter()
        .filter(|page| page.parent_id.as_deref() == Some(page_id))
        .collect()
}

/// Ancestors of `page_id`, parent first and root last.
///
/// The page itself is not included. The walk stops at a missing parent or
/// at the first revisited id.
pub fn ancestor_chain<'a>(pages: &'a [Page], page_id: &str) -> Vec<&'a Page> {
    let by_id: HashMap<&str, &Page> = pages.iter().map(|page| (page.id.as_str(), page)).collect();
    let mut chain = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(page_id);

    let mut cursor = by_id.get(page_id).and_then(|page| page.parent_id.as_deref());
    while let Some(current) = cursor {
        if !visited.insert(current) {
            break;
        }
        let Some(page) = by_id.get(current) else {
            break;
        };
        chain.push(*page);
        cursor = page.parent_id.as_deref();
    }
    chain
}

/// Root-to-page path including the page itself. Empty when `page_id` is unknown.
pub fn breadcrumbs<'a>(pages: &'a [Page], page_id: &str) -> Vec<&'a Page> {
    let Some(page) = find(pages, page_id) else {
        return Vec::new();
    };
    let mut path = ancestor_chain(pages, page_id);
    path.reverse();
    path.push(page);
    path
}

/// `page_id` plus every transitive child, breadth-first.
///
/// Empty when `page_id` is unknown.
pub fn descendant_closure(pages: &[Page], page_id: &str) -> Vec<PageId> {
    if find(pages, page_id).is_none() {
        return Vec::new();
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for page in pages {
        if let Some(parent_id) = page.parent_id.as_deref() {
            children.entry(parent_id).or_default().push(page.id.as_str());
        }
    }

    let mut closure = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue = VecDeque::from([page_id]);
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        closure.push(current.to_string());
        if let Some(kids) = children.get(current) {
            queue.extend(kids.iter().copied());
        }
    }
    closure
}

/// Whether parenting `page_id` under `candidate_parent` would close a loop.
///
/// A revisited id on the candidate's ancestor walk also counts as a cycle.
pub fn would_create_cycle(pages: &[Page], page_id: &str, candidate_parent: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut cursor = Some(candidate_parent);
    while let Some(current) = cursor {
        if current == page_id {
            return true;
        }
        if !visited.insert(current) {
            return true;
        }
        cursor = find(pages, current).and_then(|page| page.parent_id.as_deref());
    }
    false
}

/// Ids of pages whose `parentId` is dangling or sits on a parent cycle.
///
/// Detaching every returned page turns the list back into a forest.
pub fn broken_parent_links(pages: &[Page]) -> Vec<PageId> {
    let known: HashSet<&str> = pages.iter().map(|page| page.id.as_str()).collect();
    let mut broken: Vec<PageId> = pages
        .iter()
        .filter(|page| {
            page.parent_id
                .as_deref()
                .is_some_and(|parent_id| !known.contains(parent_id))
        })
        .map(|page| page.id.clone())
        .collect();

    for page in pages {
        let Some(parent_id) = page.parent_id.as_deref() else {
            continue;
        };
        if would_create_cycle(pages, &page.id, parent_id) && !broken.contains(&page.id) {
            broken.push(page.id.clone());
        }
    }
    broken
}

#[cfg(test)]
mod tests {
    use super::{ancestor_chain, breadcrumbs, descendant_closure, would_create_cycle};
    use crate::model::page::Page;

    fn page(id: &str, parent: Option<&str>) -> Page {
        let mut page = Page::new(id, parent.map(str::to_string));
        page.id = id.to_string();
        page
    }

    #[test]
    fn ancestor_chain_is_innermost_first() {
        let pages = vec![page("a", None), page("b", Some("a")), page("c", Some("b"))];
        let chain: Vec<&str> = ancestor_chain(&pages, "c")
            .iter()
            .map(|page| page.id.as_str())
            .collect();
        assert_eq!(chain, vec!["b", "a"]);

        let path: Vec<&str> = breadcrumbs(&pages, "c")
            .iter()
            .map(|page| page.id.as_str())
            .collect();
        assert_eq!(path, vec!["a", "b", "c"]);
    }

    #[test]
    fn ancestor_chain_terminates_on_corrupted_cycle() {
        let pages = vec![page("a", Some("c")), page("b", Some("a")), page("c", Some("b"))];
        let chain = ancestor_chain(&pages, "a");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn descendant_closure_includes_root_and_all_levels() {
        let pages = vec![
            page("a", None),
            page("b", Some("a")),
            page("c", Some("b")),
            page("d", None),
        ];
        let mut closure = descendant_closure(&pages, "a");
        closure.sort();
        assert_eq!(closure, vec!["a", "b", "c"]);
        assert!(descendant_closure(&pages, "missing").is_empty());
    }

    #[test]
    fn would_create_cycle_detects_descendant_parent() {
        let pages = vec![page("a", None), page("b", Some("a"))];
        assert!(would_create_cycle(&pages, "a", "b"));
        assert!(would_create_cycle(&pages, "a", "a"));
        assert!(!would_create_cycle(&pages, "b", "a"));
    }
}
