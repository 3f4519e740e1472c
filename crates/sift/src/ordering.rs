//! Ordering, grouping and windowing.
//!
//! Provides [`Dir`] for sort direction and the collection operations that
//! reorder, re-key or cut a collection: `sort_by`, `group_by`, `key_by` and
//! the `skip_*`/`take_*` windows.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::collection::Collection;
use crate::compare::loose_cmp;
use crate::error::{Result, SiftError};
use crate::key::Key;
use crate::predicate::{identical_to, Retriever};
use crate::value::{Map, Value};

/// Sort direction for [`Collection::sort_by_dir`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    #[default]
    Asc,
    Desc,
}

impl Dir {
    /// `Desc` when `descending` is set, the shape of a `descending` flag
    /// argument.
    pub fn from_descending(descending: bool) -> Dir {
        if descending {
            Dir::Desc
        } else {
            Dir::Asc
        }
    }

    /// Orients an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }
}

/// Which end of a window a `skip_*`/`take_*` operation keeps.
#[derive(Clone, Copy)]
enum Window {
    SkipUntil,
    SkipWhile,
    TakeUntil,
    TakeWhile,
}

impl Collection {
    /// Sorts by the values, ascending. Keys are preserved.
    pub fn sort(&self) -> Collection {
        self.sort_by_dir(Retriever::Identity, Dir::Asc)
    }

    /// Sorts by the values, descending. Keys are preserved.
    pub fn sort_desc(&self) -> Collection {
        self.sort_by_dir(Retriever::Identity, Dir::Desc)
    }

    /// Sorts by the resolved values, ascending, under loose comparison.
    /// The sort is stable; values that cannot be compared keep their order.
    pub fn sort_by(&self, retriever: impl Into<Retriever>) -> Collection {
        self.sort_by_dir(retriever, Dir::Asc)
    }

    /// Sorts by the resolved values, descending.
    pub fn sort_by_desc(&self, retriever: impl Into<Retriever>) -> Collection {
        self.sort_by_dir(retriever, Dir::Desc)
    }

    /// Sorts by the resolved values in the given direction.
    pub fn sort_by_dir(&self, retriever: impl Into<Retriever>, dir: Dir) -> Collection {
        let retriever = retriever.into();
        let mut entries: Vec<(Value, &Key, &Value)> = self
            .iter()
            .map(|(k, v)| (retriever.resolve(v, k), k, v))
            .collect();
        entries.sort_by(|a, b| dir.apply(loose_cmp(&a.0, &b.0).unwrap_or(Ordering::Equal)));
        self.derive(
            entries
                .into_iter()
                .map(|(_, k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Groups items by their resolved value.
    ///
    /// A resolved array puts the item into every group it lists. Groups are
    /// collections; with `preserve_keys` they keep the original keys,
    /// otherwise they are lists.
    ///
    /// # Errors
    ///
    /// [`SiftError::IllegalOffset`] when a resolved value cannot be a key.
    pub fn group_by(&self, retriever: impl Into<Retriever>, preserve_keys: bool) -> Result<Collection> {
        let retriever = retriever.into();
        let mut groups: IndexMap<Key, Map> = IndexMap::new();
        for (k, v) in self.iter() {
            let group_keys = match retriever.resolve(v, k) {
                Value::Array(m) => m.into_values().collect(),
                Value::Collection(c) => c.into_map().into_values().collect(),
                other => vec![other],
            };
            for group_key in group_keys {
                let group = groups.entry(offset(&group_key)?).or_default();
                let key = if preserve_keys {
                    k.clone()
                } else {
                    Key::from(group.len())
                };
                group.insert(key, v.clone());
            }
        }
        Ok(self.derive(
            groups
                .into_iter()
                .map(|(k, items)| (k, Value::Collection(self.derive(items))))
                .collect(),
        ))
    }

    /// Re-keys the items by their resolved value. Later items win.
    ///
    /// # Errors
    ///
    /// [`SiftError::IllegalOffset`] when a resolved value cannot be a key.
    pub fn key_by(&self, retriever: impl Into<Retriever>) -> Result<Collection> {
        let retriever = retriever.into();
        let mut items = Map::new();
        for (k, v) in self.iter() {
            items.insert(offset(&retriever.resolve(v, k))?, v.clone());
        }
        Ok(self.derive(items))
    }

    fn window<F>(&self, mut f: F, window: Window) -> Collection
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        let entries = self.iter().map(|(k, v)| (k.clone(), v.clone()));
        let items: Map = match window {
            Window::SkipUntil => entries.skip_while(|(k, v)| !f(v, k)).collect(),
            Window::SkipWhile => entries.skip_while(|(k, v)| f(v, k)).collect(),
            Window::TakeUntil => entries.take_while(|(k, v)| !f(v, k)).collect(),
            Window::TakeWhile => entries.take_while(|(k, v)| f(v, k)).collect(),
        };
        self.derive(items)
    }

    /// Drops entries until the test passes, keeping the rest.
    pub fn skip_until<F>(&self, f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.window(f, Window::SkipUntil)
    }

    /// Drops entries until one is identical to `value`.
    pub fn skip_until_value(&self, value: impl Into<Value>) -> Collection {
        self.skip_until(identical_to(value.into()))
    }

    /// Drops entries while the test passes, keeping the rest.
    pub fn skip_while<F>(&self, f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.window(f, Window::SkipWhile)
    }

    /// Drops entries while they are identical to `value`.
    pub fn skip_while_value(&self, value: impl Into<Value>) -> Collection {
        self.skip_while(identical_to(value.into()))
    }

    /// Keeps entries until the test passes.
    pub fn take_until<F>(&self, f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.window(f, Window::TakeUntil)
    }

    /// Keeps entries until one is identical to `value`.
    pub fn take_until_value(&self, value: impl Into<Value>) -> Collection {
        self.take_until(identical_to(value.into()))
    }

    /// Keeps entries while the test passes.
    pub fn take_while<F>(&self, f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.window(f, Window::TakeWhile)
    }

    /// Keeps entries while they are identical to `value`.
    pub fn take_while_value(&self, value: impl Into<Value>) -> Collection {
        self.take_while(identical_to(value.into()))
    }

    /// Alias of [`Collection::take_until`].
    pub fn until<F>(&self, f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.take_until(f)
    }

    /// Alias of [`Collection::take_until_value`].
    pub fn until_value(&self, value: impl Into<Value>) -> Collection {
        self.take_until_value(value)
    }
}

fn offset(value: &Value) -> Result<Key> {
    Key::from_value(value).ok_or_else(|| SiftError::IllegalOffset {
        found: value.debug_type(),
    })
}
