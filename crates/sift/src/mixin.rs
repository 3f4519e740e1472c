//! Runtime method registries.
//!
//! A [`MixinRegistry`] maps method names to callables for one receiver
//! type. Types opt in by implementing [`Macroable`], which gives them
//! `call_macro`/`has_macro` over their registry. Batches of methods can be
//! imported at once from any [`Mixin`] source.
//!
//! ```
//! use sift::{Collection, Value};
//!
//! let ext = sift::Extensions::new();
//! ext.macros().register("double", |this: Option<&Collection>, _args: &[Value]| {
//!     let this = this.cloned().unwrap_or_default();
//!     Ok(this.map(|v, _| Value::from(v.as_i64().unwrap_or(0) * 2)).into())
//! });
//!
//! let doubled = Collection::from_values(vec![1, 2])
//!     .with_extensions(ext)
//!     .call("double", &[])
//!     .unwrap();
//! assert_eq!(doubled, Value::Collection(Collection::from_values(vec![2, 4])));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, SiftError};
use crate::value::Value;

/// A registered method. Instance calls receive `Some(receiver)`, static
/// calls receive `None`.
pub type MacroFn<T> = Rc<dyn Fn(Option<&T>, &[Value]) -> Result<Value>>;

/// Per-type registry of runtime methods.
///
/// Registration is last-writer-wins. The registry uses interior mutability
/// so it can be shared and extended through `&self`; it is single-threaded.
pub struct MixinRegistry<T> {
    macros: RefCell<IndexMap<String, MacroFn<T>>>,
}

impl<T> MixinRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        MixinRegistry {
            macros: RefCell::new(IndexMap::new()),
        }
    }

    /// Registers a method, replacing any method of the same name.
    pub fn register<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Option<&T>, &[Value]) -> Result<Value> + 'static,
    {
        self.register_fn(name, Rc::new(f));
    }

    /// Registers an already shared method.
    pub fn register_fn(&self, name: impl Into<String>, f: MacroFn<T>) {
        let name = name.into();
        debug!(method = %name, "registering macro");
        self.macros.borrow_mut().insert(name, f);
    }

    /// Registers every method the mixin exposes under its own name.
    ///
    /// With `overwrite == false`, names that are already registered are
    /// left untouched.
    pub fn import_all(&self, mixin: &dyn Mixin<T>, overwrite: bool) {
        let mut imported = 0usize;
        for (name, f) in mixin.methods() {
            if overwrite || !self.has(&name) {
                self.macros.borrow_mut().insert(name, f);
                imported += 1;
            }
        }
        debug!(imported, overwrite, "imported mixin");
    }

    /// Returns `true` if a method of that name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.macros.borrow().contains_key(name)
    }

    /// Returns the method registered under `name`.
    pub fn get(&self, name: &str) -> Option<MacroFn<T>> {
        self.macros.borrow().get(name).cloned()
    }

    /// Registered method names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.macros.borrow().keys().cloned().collect()
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.macros.borrow().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.macros.borrow().is_empty()
    }

    /// Removes every registered method.
    pub fn flush(&self) {
        debug!(count = self.len(), "flushing macros");
        self.macros.borrow_mut().clear();
    }

    /// Invokes a registered method.
    ///
    /// Fails with [`SiftError::UnknownOperation`] naming `type_name` when
    /// nothing is registered under `method`. The registry is not borrowed
    /// while the method runs, so methods may register further methods.
    pub fn call(
        &self,
        type_name: &str,
        receiver: Option<&T>,
        method: &str,
        args: &[Value],
    ) -> Result<Value> {
        let f = self
            .get(method)
            .ok_or_else(|| SiftError::unknown_operation(type_name, method))?;
        f(receiver, args)
    }
}

impl<T> Default for MixinRegistry<T> {
    fn default() -> Self {
        MixinRegistry::new()
    }
}

impl<T> fmt::Debug for MixinRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinRegistry")
            .field("macros", &self.names())
            .finish()
    }
}

/// A source of methods to import in one go.
pub trait Mixin<T> {
    /// The methods to import, by name.
    fn methods(&self) -> Vec<(String, MacroFn<T>)>;
}

impl<T> Mixin<T> for IndexMap<String, MacroFn<T>> {
    fn methods(&self) -> Vec<(String, MacroFn<T>)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Types whose unresolved calls fall through to a [`MixinRegistry`].
pub trait Macroable: Sized {
    /// Type name used in unknown-operation errors.
    fn class_name() -> &'static str;

    /// The registry consulted for this receiver.
    fn registry(&self) -> &MixinRegistry<Self>;

    /// Calls a registered method with this receiver bound.
    fn call_macro(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.registry().call(Self::class_name(), Some(self), method, args)
    }

    /// Returns `true` if a method of that name is registered.
    fn has_macro(&self, method: &str) -> bool {
        self.registry().has(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Greeter {
        registry: MixinRegistry<Greeter>,
        name: String,
    }

    impl Macroable for Greeter {
        fn class_name() -> &'static str {
            "Greeter"
        }

        fn registry(&self) -> &MixinRegistry<Self> {
            &self.registry
        }
    }

    struct Politeness;

    impl Mixin<Greeter> for Politeness {
        fn methods(&self) -> Vec<(String, MacroFn<Greeter>)> {
            let hello: MacroFn<Greeter> = Rc::new(|this, _| {
                let name = this.map(|g| g.name.clone()).unwrap_or_default();
                Ok(Value::from(format!("hello {name}")))
            });
            let bye: MacroFn<Greeter> = Rc::new(|_, _| Ok(Value::from("bye")));
            vec![("hello".to_string(), hello), ("bye".to_string(), bye)]
        }
    }

    #[test]
    fn registered_macro_sees_receiver_and_args() {
        let g = Greeter {
            name: "Ada".into(),
            ..Default::default()
        };
        g.registry.register("shout", |this, args| {
            let name = this.map(|g| g.name.to_uppercase()).unwrap_or_default();
            Ok(Value::from(format!("{name}{}", args.len())))
        });
        assert_eq!(
            g.call_macro("shout", &[Value::Null, Value::Null]).unwrap(),
            Value::from("ADA2")
        );
    }

    #[test]
    fn last_writer_wins() {
        let g = Greeter::default();
        g.registry.register("v", |_, _| Ok(Value::from(1)));
        g.registry.register("v", |_, _| Ok(Value::from(2)));
        assert_eq!(g.call_macro("v", &[]).unwrap(), Value::from(2));
        assert_eq!(g.registry.len(), 1);
    }

    #[test]
    fn import_respects_overwrite_flag() {
        let g = Greeter::default();
        g.registry.register("bye", |_, _| Ok(Value::from("ciao")));

        g.registry.import_all(&Politeness, false);
        assert_eq!(g.call_macro("bye", &[]).unwrap(), Value::from("ciao"));
        assert!(g.has_macro("hello"));

        g.registry.import_all(&Politeness, true);
        assert_eq!(g.call_macro("bye", &[]).unwrap(), Value::from("bye"));
    }

    #[test]
    fn flush_clears_and_is_idempotent() {
        let g = Greeter::default();
        g.registry.import_all(&Politeness, true);
        g.registry.flush();
        g.registry.flush();
        assert!(g.registry.is_empty());
        let err = g.call_macro("hello", &[]).unwrap_err();
        assert!(err.is_unknown_operation("Greeter", "hello"));
    }

    #[test]
    fn static_calls_have_no_receiver() {
        let registry: MixinRegistry<Greeter> = MixinRegistry::new();
        registry.register("is_static", |this, _| Ok(Value::from(this.is_none())));
        assert_eq!(
            registry.call("Greeter", None, "is_static", &[]).unwrap(),
            Value::from(true)
        );
    }

    #[test]
    fn macros_may_register_while_running() {
        let registry = Rc::new(MixinRegistry::<Greeter>::new());
        let inner = Rc::clone(&registry);
        registry.register("install", move |_, _| {
            inner.register("installed", |_, _| Ok(Value::Null));
            Ok(Value::Null)
        });
        registry.call("Greeter", None, "install", &[]).unwrap();
        assert!(registry.has("installed"));
    }
}
