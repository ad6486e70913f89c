//! Content Store
//!
//! Owns the page model tree and answers path-based reads and structural
//! mutations over it.
//!
//! # Addressing
//!
//! A full path is split at the first content delimiter into a page path and an
//! item path (see [`crate::utils::path`]). The page path resolves to the root
//! node or to an entry of the root's `children` map; the item path is walked
//! through nested `items` maps. A nested page's own content is entered again
//! through the delimiter, e.g. `xf/jcr:content/root/text` inside a page.
//!
//! # Copy-on-read
//!
//! [`ModelStore::get_data`] always returns a deep copy. Callers that need to
//! mutate in place use [`ModelStore::get_data_mut`]; nothing else hands out a
//! reference into the tree.
//!
//! # Failures
//!
//! Lookups return `None` for unknown paths. Mutations return
//! [`StoreError`]s and log a warning; none of them panic.

use crate::db::StoreError;
use crate::models::{
    deep_copy, is_empty_model, ItemData, ModelNodeExt, StructuralKeys, CONTENT_DELIMITER,
};
use crate::utils::path::{
    content_path, is_item, join, leading_strings, node_name, parent_node_path,
    split_page_content_paths, strip_content_suffix, subpath, trim_strings, PageContentPaths,
};
use serde_json::{Map, Value};

/// Page node a path resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageRef {
    /// The root node itself
    Root,
    /// An entry of the root's children map
    Child(String),
}

/// Result of an item traversal, as an address rather than a reference
///
/// `parent_keys` is the chain of `items` keys from the page node down to the
/// parent of the target; an empty chain means the page node is the parent.
/// `key` is set only when the target exists. `remaining` is the part of the
/// item path that was not consumed when the search stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ItemLocation {
    parent_keys: Vec<String>,
    parent_path: String,
    key: Option<String>,
    remaining: String,
}

/// Fully resolved node address
#[derive(Debug, Clone, PartialEq, Eq)]
enum Address {
    Whole,
    Page(PageRef),
    Item {
        page: PageRef,
        parent_keys: Vec<String>,
        key: String,
    },
}

/// In-memory page model tree
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    data: Option<Value>,
    root_path: Option<String>,
    keys: StructuralKeys,
}

impl ModelStore {
    /// Create a store using the namespaced structural keys
    pub fn new(root_path: Option<&str>, data: Option<Value>) -> Self {
        Self::with_keys(StructuralKeys::default(), root_path, data)
    }

    /// Create a store for the given structural key convention
    pub fn with_keys(keys: StructuralKeys, root_path: Option<&str>, data: Option<Value>) -> Self {
        let mut store = Self {
            data: None,
            root_path: None,
            keys,
        };
        store.initialize(root_path, data);
        store
    }

    /// Set the root path and, when `data` is a non-empty model, replace the tree
    ///
    /// Passing `None` or an empty object keeps the current tree.
    pub fn initialize(&mut self, root_path: Option<&str>, data: Option<Value>) {
        if let Some(data) = data.filter(|data| !is_empty_model(data)) {
            self.data = Some(data);
        }
        self.root_path = root_path.map(str::to_string);

        tracing::debug!(
            "Model store initialized (root: {:?}, has data: {})",
            self.root_path,
            self.data.is_some()
        );
    }

    /// Root path of the model
    pub fn root_path(&self) -> Option<&str> {
        self.root_path.as_deref()
    }

    /// Structural key convention of the tree
    pub fn keys(&self) -> &StructuralKeys {
        &self.keys
    }

    /// Whether a tree is loaded
    pub fn is_initialized(&self) -> bool {
        self.data.is_some()
    }

    /// Deep copy of the node at `path`
    ///
    /// `None`, `""`, the root path and `<root>/jcr:content` all return the
    /// whole tree.
    pub fn get_data(&self, path: Option<&str>) -> Option<Value> {
        self.get_data_ref(path).map(deep_copy)
    }

    /// Borrow the node at `path` without copying
    pub fn get_data_ref(&self, path: Option<&str>) -> Option<&Value> {
        let address = self.address_of(path)?;
        let data = self.data.as_ref()?;
        node_at(data, &self.keys, &address)
    }

    /// Mutable access to the node at `path`
    ///
    /// Changes made through the returned reference are visible to every
    /// subsequent read.
    pub fn get_data_mut(&mut self, path: Option<&str>) -> Option<&mut Value> {
        let address = self.address_of(path)?;
        let data = self.data.as_mut()?;
        node_at_mut(data, &self.keys, &address)
    }

    /// Replace the item at `path` with `data.value`
    ///
    /// The item name comes from `path`; `data.key` is ignored. The parent must
    /// already exist and carry an items map. A missing items map is reported,
    /// not created.
    pub fn set_data(&mut self, path: &str, data: &ItemData) -> Result<(), StoreError> {
        if path.is_empty() {
            tracing::warn!("set_data called without a path");
            return Err(StoreError::missing_path("set_data"));
        }
        if self.data.is_none() {
            return Err(StoreError::Uninitialized);
        }

        let (parent_path, name) = parent_node_path(path)
            .zip(node_name(path))
            .ok_or_else(|| StoreError::invalid_path(path))?;

        let keys = self.keys.clone();
        let parent = self
            .get_data_mut(Some(parent_path))
            .ok_or_else(|| StoreError::parent_not_found(path))?;

        let Some(items) = parent.items_mut(&keys) else {
            tracing::warn!("Cannot replace {}: parent has no items map", path);
            return Err(StoreError::missing_items_map(path));
        };

        items.insert(name.to_string(), deep_copy(&data.value));
        Ok(())
    }

    /// Insert a deep copy of `data` at `path`
    ///
    /// Page paths (no `<page>/jcr:content/<item>` form) are stored in the root's
    /// children map. Item paths are added to the parent's items map; when the
    /// parent has an order list, the name is placed after `sibling` (before it
    /// when `insert_before`), or appended if the sibling is absent or unknown.
    /// Inserting an existing name replaces the item and moves it in the order.
    /// When intermediate items are missing, the new item goes into the deepest
    /// parent that exists (the page node if none does), named after the last
    /// segment of `path`.
    pub fn insert_data(
        &mut self,
        path: &str,
        data: &Value,
        sibling: Option<&str>,
        insert_before: bool,
    ) -> Result<(), StoreError> {
        if path.is_empty() {
            tracing::warn!("insert_data called without a path");
            return Err(StoreError::missing_path("insert_data"));
        }

        let data = deep_copy(data);

        if !is_item(path) {
            return self.insert_page(path, data);
        }

        let PageContentPaths {
            page_path,
            item_path,
        } = split_page_content_paths(path);
        let item_path = item_path.ok_or_else(|| StoreError::invalid_path(path))?;

        let root = self.data.as_ref().ok_or(StoreError::Uninitialized)?;
        let page = self.page_ref(&page_path).unwrap_or(PageRef::Root);
        let page_node = page_node(root, &self.keys, &page).unwrap_or(root);

        let location = self.find_item(page_node, &item_path, ItemLocation::default());
        let name = match location.key {
            Some(ref key) => key.clone(),
            None => node_name(&item_path)
                .ok_or_else(|| StoreError::invalid_path(path))?
                .to_string(),
        };
        if location.key.is_none() && location.remaining.contains('/') {
            tracing::debug!(
                "Inserting {} under the deepest existing parent ({:?})",
                path,
                location.parent_path
            );
        }

        let keys = &self.keys;
        let root = self.data.as_mut().ok_or(StoreError::Uninitialized)?;
        let parent = page_node_mut(root, keys, &page)
            .and_then(|page_node| descend_mut(page_node, keys, &location.parent_keys))
            .ok_or_else(|| StoreError::parent_not_found(path))?;

        let Some(items) = parent.items_mut(keys) else {
            tracing::warn!("Cannot insert {}: parent has no items map", path);
            return Err(StoreError::missing_items_map(path));
        };
        items.insert(name.clone(), data);

        if let Some(order) = parent.items_order_mut(keys) {
            place_in_order(order, &name, sibling, insert_before);
        }

        tracing::debug!("Inserted {} (sibling: {:?}, before: {})", path, sibling, insert_before);
        Ok(())
    }

    /// Remove the node at `path`
    ///
    /// For a page path the entry is dropped from the children map and `None`
    /// is returned. For an item path the item leaves both the items map and the
    /// order list of its parent, and the parent's full path is returned.
    pub fn remove_data(&mut self, path: &str) -> Result<Option<String>, StoreError> {
        if path.is_empty() {
            tracing::warn!("remove_data called without a path");
            return Err(StoreError::missing_path("remove_data"));
        }

        if !is_item(path) {
            let keys = &self.keys;
            let root = self.data.as_mut().ok_or(StoreError::Uninitialized)?;
            let removed = root
                .children_mut(keys)
                .and_then(|children| children.remove(path));

            if removed.is_none() {
                tracing::debug!("No child page at {} to remove", path);
            }
            return Ok(None);
        }

        let PageContentPaths {
            page_path,
            item_path,
        } = split_page_content_paths(path);
        let item_path = item_path.ok_or_else(|| StoreError::invalid_path(path))?;

        let root = self.data.as_ref().ok_or(StoreError::Uninitialized)?;
        let Some(page) = self.page_ref(&page_path) else {
            tracing::warn!("Cannot remove {}: page {} not found", path, page_path);
            return Err(StoreError::page_not_found(page_path));
        };
        let page_node = page_node(root, &self.keys, &page)
            .ok_or_else(|| StoreError::page_not_found(&page_path))?;

        let location = self.find_item(page_node, &item_path, ItemLocation::default());
        let Some(key) = location.key else {
            tracing::warn!("Cannot remove {}: item not found", path);
            return Err(StoreError::item_not_found(path));
        };

        let keys = &self.keys;
        let root = self.data.as_mut().ok_or(StoreError::Uninitialized)?;
        let parent = page_node_mut(root, keys, &page)
            .and_then(|page_node| descend_mut(page_node, keys, &location.parent_keys))
            .ok_or_else(|| StoreError::item_not_found(path))?;

        if let Some(items) = parent.items_mut(keys) {
            items.remove(&key);
        }
        if let Some(order) = parent.items_order_mut(keys) {
            if let Some(index) = order.iter().position(|entry| entry.as_str() == Some(key.as_str())) {
                order.remove(index);
            }
        }

        let parent_item_path = trim_strings(&location.parent_path, &[CONTENT_DELIMITER]);
        Ok(Some(content_path(&page_path, &parent_item_path)))
    }

    /// Drop the tree and root path
    pub fn destroy(&mut self) {
        self.data = None;
        self.root_path = None;
    }

    /// Map a page path to the root or a child page
    fn page_ref(&self, page_path: &str) -> Option<PageRef> {
        let data = self.data.as_ref()?;
        let page_path = strip_content_suffix(page_path);

        if page_path.is_empty()
            || self.root_path.as_deref() == Some(page_path)
            || data.node_path(&self.keys) == Some(page_path)
        {
            return Some(PageRef::Root);
        }

        data.children(&self.keys)?
            .contains_key(page_path)
            .then(|| PageRef::Child(page_path.to_string()))
    }

    fn address_of(&self, path: Option<&str>) -> Option<Address> {
        self.data.as_ref()?;

        let path = match path {
            Some(path) if !path.is_empty() => path,
            _ => return Some(Address::Whole),
        };

        let PageContentPaths {
            page_path,
            item_path,
        } = split_page_content_paths(path);
        let page = self.page_ref(&page_path)?;

        let Some(item_path) = item_path else {
            return Some(match page {
                PageRef::Root => Address::Whole,
                page => Address::Page(page),
            });
        };

        let page_node = page_node(self.data.as_ref()?, &self.keys, &page)?;
        let location = self.find_item(page_node, &item_path, ItemLocation::default());

        Some(Address::Item {
            page,
            parent_keys: location.parent_keys,
            key: location.key?,
        })
    }

    /// Depth-first search for the single node at `item_path` below `node`
    ///
    /// Once a key consumes a leading segment the search commits to that branch;
    /// a miss below it reports that branch's node as the deepest parent.
    fn find_item(&self, node: &Value, item_path: &str, location: ItemLocation) -> ItemLocation {
        let Some(items) = node.items(&self.keys) else {
            return ItemLocation {
                remaining: item_path.to_string(),
                ..location
            };
        };

        for (key, child) in items {
            if key == item_path {
                return ItemLocation {
                    key: Some(key.clone()),
                    remaining: String::new(),
                    ..location
                };
            }

            let sub = subpath(item_path, key);
            let delimiter = leading_strings(&sub, &[CONTENT_DELIMITER]);
            let sub = trim_strings(&sub, &[CONTENT_DELIMITER]);

            if sub != item_path {
                let mut parent_keys = location.parent_keys.clone();
                parent_keys.push(key.clone());

                let descended = ItemLocation {
                    parent_keys,
                    parent_path: join(&[location.parent_path.as_str(), key.as_str(), delimiter.as_str()]),
                    key: None,
                    remaining: String::new(),
                };
                return self.find_item(child, &sub, descended);
            }
        }

        ItemLocation {
            remaining: item_path.to_string(),
            ..location
        }
    }

    fn insert_page(&mut self, path: &str, data: Value) -> Result<(), StoreError> {
        let children_key = self.keys.children_key.clone();
        let root = self.data.as_mut().ok_or(StoreError::Uninitialized)?;

        let children = root
            .as_object_mut()
            .map(|root| {
                root.entry(children_key)
                    .or_insert_with(|| Value::Object(Map::new()))
            })
            .and_then(Value::as_object_mut)
            .ok_or_else(|| StoreError::invalid_path(path))?;

        children.insert(path.to_string(), data);
        tracing::debug!("Stored page {}", path);
        Ok(())
    }
}

fn page_node<'a>(root: &'a Value, keys: &StructuralKeys, page: &PageRef) -> Option<&'a Value> {
    match page {
        PageRef::Root => Some(root),
        PageRef::Child(path) => root.children(keys)?.get(path),
    }
}

fn page_node_mut<'a>(
    root: &'a mut Value,
    keys: &StructuralKeys,
    page: &PageRef,
) -> Option<&'a mut Value> {
    match page {
        PageRef::Root => Some(root),
        PageRef::Child(path) => root.children_mut(keys)?.get_mut(path),
    }
}

fn descend<'a>(node: &'a Value, keys: &StructuralKeys, item_keys: &[String]) -> Option<&'a Value> {
    item_keys
        .iter()
        .try_fold(node, |node, key| node.items(keys)?.get(key))
}

fn descend_mut<'a>(
    node: &'a mut Value,
    keys: &StructuralKeys,
    item_keys: &[String],
) -> Option<&'a mut Value> {
    item_keys
        .iter()
        .try_fold(node, |node, key| node.items_mut(keys)?.get_mut(key))
}

fn node_at<'a>(root: &'a Value, keys: &StructuralKeys, address: &Address) -> Option<&'a Value> {
    match address {
        Address::Whole => Some(root),
        Address::Page(page) => page_node(root, keys, page),
        Address::Item {
            page,
            parent_keys,
            key,
        } => {
            let parent = descend(page_node(root, keys, page)?, keys, parent_keys)?;
            parent.items(keys)?.get(key)
        }
    }
}

fn node_at_mut<'a>(
    root: &'a mut Value,
    keys: &StructuralKeys,
    address: &Address,
) -> Option<&'a mut Value> {
    match address {
        Address::Whole => Some(root),
        Address::Page(page) => page_node_mut(root, keys, page),
        Address::Item {
            page,
            parent_keys,
            key,
        } => {
            let parent = descend_mut(page_node_mut(root, keys, page)?, keys, parent_keys)?;
            parent.items_mut(keys)?.get_mut(key)
        }
    }
}

/// Move `name` next to `sibling` in an order list, or to the end
fn place_in_order(order: &mut Vec<Value>, name: &str, sibling: Option<&str>, insert_before: bool) {
    order.retain(|entry| entry.as_str() != Some(name));

    let sibling_index = sibling.and_then(|sibling| {
        order
            .iter()
            .position(|entry| entry.as_str() == Some(sibling))
    });
    let entry = Value::String(name.to_string());

    match sibling_index {
        Some(index) if insert_before => order.insert(index, entry),
        Some(index) => order.insert(index + 1, entry),
        None => order.push(entry),
    }
}

#[cfg(test)]
#[path = "model_store_test.rs"]
mod model_store_test;
