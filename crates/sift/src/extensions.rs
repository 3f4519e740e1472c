//! Injectable extension registries.
//!
//! An [`Extensions`] value bundles everything a collection consults at
//! runtime:
//!
//! - the macro registry for `Collection` methods,
//! - the allow-list of operations usable through element proxies,
//! - the class table used when a proxied call lands on a string element
//!   (a static call on the class of that name).
//!
//! Collections built without an explicit registry share a per-thread
//! default, see [`Extensions::shared`]. Tests and embedders that need
//! isolation build their own with [`Extensions::new`] and attach it with
//! [`Collection::with_extensions`](crate::Collection::with_extensions).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::collection::Collection;
use crate::error::{Result, SiftError};
use crate::mixin::{Mixin, MixinRegistry};
use crate::value::Value;

/// Static methods of a named type, reachable through the class table.
pub trait StaticDispatch {
    /// Calls a static method.
    fn call_static(&self, method: &str, args: &[Value]) -> Result<Value>;
}

impl<F> StaticDispatch for F
where
    F: Fn(&str, &[Value]) -> Result<Value>,
{
    fn call_static(&self, method: &str, args: &[Value]) -> Result<Value> {
        self(method, args)
    }
}

struct Registries {
    macros: MixinRegistry<Collection>,
    proxies: RefCell<IndexSet<String>>,
    classes: RefCell<IndexMap<String, Rc<dyn StaticDispatch>>>,
}

/// Shared handle to the macro registry, proxy allow-list and class table.
///
/// Cloning the handle shares the registries.
#[derive(Clone)]
pub struct Extensions {
    inner: Rc<Registries>,
}

thread_local! {
    static SHARED: Extensions = Extensions::new();
}

impl Extensions {
    /// Operations usable through element proxies out of the box.
    pub const DEFAULT_PROXIES: &'static [&'static str] = &[
        "average",
        "avg",
        "contains",
        "doesntContain",
        "each",
        "every",
        "filter",
        "first",
        "flatMap",
        "groupBy",
        "keyBy",
        "last",
        "map",
        "max",
        "min",
        "partition",
        "percentage",
        "reject",
        "skipUntil",
        "skipWhile",
        "some",
        "sortBy",
        "sortByDesc",
        "sum",
        "takeUntil",
        "takeWhile",
        "unique",
        "unless",
        "until",
        "when",
    ];

    /// Creates fresh registries: no macros, the default proxy allow-list and
    /// an empty class table.
    pub fn new() -> Self {
        Extensions {
            inner: Rc::new(Registries {
                macros: MixinRegistry::new(),
                proxies: RefCell::new(
                    Self::DEFAULT_PROXIES.iter().map(|s| s.to_string()).collect(),
                ),
                classes: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// The per-thread default registries.
    pub fn shared() -> Self {
        SHARED.with(Clone::clone)
    }

    /// The `Collection` macro registry.
    pub fn macros(&self) -> &MixinRegistry<Collection> {
        &self.inner.macros
    }

    /// Registers a `Collection` macro.
    pub fn register_macro<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Option<&Collection>, &[Value]) -> Result<Value> + 'static,
    {
        self.inner.macros.register(name, f);
    }

    /// Imports every method of a mixin as `Collection` macros.
    pub fn mixin(&self, mixin: &dyn Mixin<Collection>, overwrite: bool) {
        self.inner.macros.import_all(mixin, overwrite);
    }

    /// Adds an operation to the proxy allow-list.
    pub fn proxy(&self, method: impl Into<String>) {
        let method = method.into();
        debug!(method = %method, "allowing proxy operation");
        self.inner.proxies.borrow_mut().insert(method);
    }

    /// Returns `true` if the operation may be used through an element proxy.
    pub fn is_proxy(&self, method: &str) -> bool {
        self.inner.proxies.borrow().contains(method)
    }

    /// The proxy allow-list in insertion order.
    pub fn proxies(&self) -> Vec<String> {
        self.inner.proxies.borrow().iter().cloned().collect()
    }

    /// Registers the static methods of a named type.
    pub fn register_class<S>(&self, name: impl Into<String>, class: S)
    where
        S: StaticDispatch + 'static,
    {
        let name = name.into();
        debug!(class = %name, "registering class");
        self.inner
            .classes
            .borrow_mut()
            .insert(name, Rc::new(class));
    }

    /// Returns `true` if the named type resolves to static methods.
    ///
    /// `Collection` always resolves.
    pub fn has_class(&self, name: &str) -> bool {
        name == Collection::TYPE_NAME || self.inner.classes.borrow().contains_key(name)
    }

    /// Calls a static method on a named type.
    ///
    /// `Collection` resolves to the collection's own static operations,
    /// bound to these registries. Other names are looked up in the class
    /// table; unknown names fail with [`SiftError::UnknownOperation`].
    pub fn call_static(&self, class: &str, method: &str, args: &[Value]) -> Result<Value> {
        if class == Collection::TYPE_NAME {
            return Collection::call_static_with(self, method, args);
        }
        let target = self.inner.classes.borrow().get(class).cloned();
        match target {
            Some(target) => target.call_static(method, args),
            None => Err(SiftError::unknown_operation(class, method)),
        }
    }

    /// Returns `true` if both handles share the same registries.
    pub fn ptr_eq(&self, other: &Extensions) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Extensions::new()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("macros", &self.inner.macros.names())
            .field("proxies", &self.inner.proxies.borrow().len())
            .field(
                "classes",
                &self.inner.classes.borrow().keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
