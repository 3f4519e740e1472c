//! Sift - Enumerable collections over dynamic values.
//!
//! Sift provides an ordered key/value [`Collection`] with a functional
//! pipeline API and two extension mechanisms. It supports:
//!
//! - Transformations: map, filter, reduce, grouping, uniqueness, windows
//! - A comparison-operator DSL for declarative `where` filtering
//! - Runtime macros: new collection methods registered after the fact
//! - Element proxies: apply an operation through a member of every element
//! - Conditional application with `when`/`unless`
//! - Nested path access over arrays, collections and objects
//!
//! # Quick Start
//!
//! ```rust
//! use sift::{Collection, Value};
//!
//! let tasks = Collection::from_values(vec![
//!     Value::map([("name", Value::from("Write docs")), ("priority", Value::from(3))]),
//!     Value::map([("name", Value::from("Fix bug")), ("priority", Value::from(5))]),
//!     Value::map([("name", Value::from("Old task")), ("priority", Value::from(1))]),
//! ]);
//!
//! let urgent = tasks
//!     .filter_where(("priority", ">=", 3))
//!     .sort_by_desc("priority");
//!
//! assert_eq!(urgent.count(), 2);
//! assert_eq!(sift::data_get(&urgent.values().into(), "0.name"), Value::from("Fix bug"));
//! assert_eq!(tasks.sum_by("priority").to_f64(), 9.0);
//! ```
//!
//! # Comparison Semantics
//!
//! Values compare loosely unless an identity operator is used:
//!
//! | Operator | Meaning |
//! |----------|---------|
//! | `=`, `==` | loose equality (`"1" == 1`) |
//! | `!=`, `<>` | loose inequality |
//! | `<`, `>`, `<=`, `>=` | loose ordering |
//! | `===`, `!==` | identity (same type and value) |
//! | `<=>` | true when the sides differ |
//!
//! Unknown operator tokens behave as `=`. When exactly one side of a
//! comparison is an object and the other is not a string, only the
//! negated operators match.
//!
//! # Dynamic Calls
//!
//! Every builtin operation is also reachable by name through
//! [`Collection::call`], with callbacks passed as [`Func`] values. Names
//! that are not builtins fall through to macros registered in the
//! collection's [`Extensions`]. Reading an allow-listed operation as a
//! property ([`Collection::get_attr`]) yields an [`ElementProxy`].

mod access;
mod aggregate;
mod collection;
mod compare;
mod conditional;
mod dispatch;
mod error;
mod extensions;
mod json;
mod key;
mod mixin;
mod object;
mod op;
mod ordering;
mod pipeline;
mod predicate;
mod proxy;
mod query;
mod value;

// Re-export public API
pub use access::{data_get, data_get_or, data_has, data_set, segments};
pub use collection::Collection;
pub use compare::{loose_cmp, loose_eq, strict_eq};
pub use conditional::ConditionalProxy;
pub use dispatch::{Builtin, Capability, Member};
pub use error::{Result, SiftError};
pub use extensions::{Extensions, StaticDispatch};
pub use json::{escape_html, JsonFlags, DEFAULT_DEPTH};
pub use key::Key;
pub use mixin::{MacroFn, Macroable, Mixin, MixinRegistry};
pub use object::Object;
pub use op::Operator;
pub use ordering::Dir;
pub use predicate::{Clause, Predicate, Retriever, Where};
pub use proxy::ElementProxy;
pub use value::{is_list, list, Backing, EnumCase, EnumLike, Func, Map, Number, Value};
