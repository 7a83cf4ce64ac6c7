use std::sync::Arc;

/// Character starting at byte `index`, if `index` is a char boundary.
pub(crate) fn char_at(input: &str, index: usize) -> Option<char> {
    input.get(index..)?.chars().next()
}

/// Character ending right before byte `index`.
pub(crate) fn char_before(input: &str, index: usize) -> Option<char> {
    input.get(..index)?.chars().next_back()
}

pub(crate) fn is_sep(input: &str, index: usize, seps: &str) -> bool {
    !seps.is_empty() && char_at(input, index).is_some_and(|c| seps.contains(c))
}

/// Byte offset of the character following the one at `index`.
pub(crate) fn next_boundary(input: &str, index: usize) -> usize {
    char_at(input, index).map_or(index + 1, |c| index + c.len_utf8())
}

pub(crate) fn contains_ptr<T>(items: &[Arc<T>], item: &Arc<T>) -> bool {
    items.iter().any(|x| Arc::ptr_eq(x, item))
}

pub(crate) fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
