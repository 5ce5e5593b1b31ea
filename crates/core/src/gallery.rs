//! Gallery grouping for A/B and variant comparison.
//!
//! Projects that share a group id are shown together; projects without
//! one form a singleton group keyed by their own operation id. Groups keep
//! the order in which their first member appeared, and members keep the
//! backend's order.

use indexmap::IndexMap;

/// Something that can be placed in a gallery group.
pub trait GalleryItem {
    /// Operation (job) id of the item.
    fn operation_id(&self) -> &str;

    /// Shared group id linking variants, if any.
    fn group_id(&self) -> Option<&str>;
}

/// Group id of an item, treating an empty string as absent.
fn explicit_group<T: GalleryItem>(item: &T) -> Option<&str> {
    item.group_id().filter(|g| !g.is_empty())
}

/// Key under which an item is grouped.
pub fn group_key<T: GalleryItem>(item: &T) -> &str {
    explicit_group(item).unwrap_or_else(|| item.operation_id())
}

/// Group items by their group key, preserving first-appearance order.
pub fn group<T, I>(items: I) -> IndexMap<String, Vec<T>>
where
    T: GalleryItem,
    I: IntoIterator<Item = T>,
{
    let mut groups: IndexMap<String, Vec<T>> = IndexMap::new();
    for item in items {
        let key = group_key(&item).to_string();
        groups.entry(key).or_default().push(item);
    }
    groups
}

/// Whether a group came from an explicit group id (and so gets a header).
pub fn is_explicit_group<T: GalleryItem>(members: &[T]) -> bool {
    members.first().is_some_and(|m| explicit_group(m).is_some())
}

/// Items sharing `group_id`, in backend order. Used by the compare view.
pub fn group_members<'a, T: GalleryItem>(items: &'a [T], group_id: &str) -> Vec<&'a T> {
    if group_id.is_empty() {
        return Vec::new();
    }
    items
        .iter()
        .filter(|item| explicit_group(*item) == Some(group_id))
        .collect()
}
