//! Dynamic member resolution.
//!
//! Collections answer calls by name, with arguments as [`Value`]s. A name
//! resolves to a [`Capability`]:
//!
//! - a builtin operation ([`Builtin`]),
//! - a macro registered in the collection's [`Extensions`],
//! - for property reads, an allow-listed operation to forward through an
//!   [`ElementProxy`].
//!
//! Callbacks arrive as [`Func`] values and are called with `(value, key)`.
//! Errors raised inside a callback abort the operation and are returned
//! from the call.

use std::cell::RefCell;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;

use tracing::trace;

use crate::aggregate::MAX_PRECISION;
use crate::collection::Collection;
use crate::conditional::ConditionalProxy;
use crate::error::{Result, SiftError};
use crate::extensions::Extensions;
use crate::json::{self, JsonFlags, DEFAULT_DEPTH};
use crate::key::Key;
use crate::mixin::MacroFn;
use crate::op::Operator;
use crate::ordering::Dir;
use crate::predicate::{Retriever, Where};
use crate::proxy::ElementProxy;
use crate::value::{list, Func, Number, Value};

/// The kind of member being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Method,
    Property,
}

/// What a member name resolves to.
pub enum Capability {
    /// A builtin operation.
    Direct(Builtin),
    /// A registered macro.
    Registered(MacroFn<Collection>),
    /// An operation to apply through each element.
    Forward(String),
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Direct(b) => f.debug_tuple("Direct").field(b).finish(),
            Capability::Registered(_) => f.write_str("Registered(..)"),
            Capability::Forward(m) => f.debug_tuple("Forward").field(m).finish(),
        }
    }
}

macro_rules! builtins {
    ($($variant:ident => $name:literal,)*) => {
        /// Operations reachable through [`Collection::call`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Builtin {
            $($variant,)*
        }

        impl Builtin {
            /// Every builtin, in name order.
            pub const ALL: &'static [Builtin] = &[$(Builtin::$variant,)*];

            /// Looks up a builtin by its call name.
            pub fn parse(name: &str) -> Option<Builtin> {
                match name {
                    $($name => Some(Builtin::$variant),)*
                    _ => None,
                }
            }

            /// The call name.
            pub fn name(self) -> &'static str {
                match self {
                    $(Builtin::$variant => $name,)*
                }
            }
        }
    };
}

builtins! {
    All => "all",
    Any => "some",
    Average => "average",
    Avg => "avg",
    Collapse => "collapse",
    Contains => "contains",
    ContainsStrict => "containsStrict",
    Count => "count",
    DoesntContain => "doesntContain",
    Each => "each",
    EachSpread => "eachSpread",
    Ensure => "ensure",
    EscapeWhenCastingToString => "escapeWhenCastingToString",
    Every => "every",
    Filter => "filter",
    First => "first",
    FirstWhere => "firstWhere",
    FlatMap => "flatMap",
    ForPage => "forPage",
    Get => "get",
    GroupBy => "groupBy",
    Has => "has",
    IsEmpty => "isEmpty",
    IsNotEmpty => "isNotEmpty",
    JsonSerialize => "jsonSerialize",
    KeyBy => "keyBy",
    Keys => "keys",
    Last => "last",
    Map => "map",
    MapSpread => "mapSpread",
    MapToDictionary => "mapToDictionary",
    MapToGroups => "mapToGroups",
    Max => "max",
    Min => "min",
    Partition => "partition",
    Percentage => "percentage",
    Pipe => "pipe",
    PipeThrough => "pipeThrough",
    Reduce => "reduce",
    ReduceSpread => "reduceSpread",
    ReduceWithKeys => "reduceWithKeys",
    Reject => "reject",
    SkipUntil => "skipUntil",
    SkipWhile => "skipWhile",
    Slice => "slice",
    Sort => "sort",
    SortBy => "sortBy",
    SortByDesc => "sortByDesc",
    SortDesc => "sortDesc",
    Sum => "sum",
    TakeUntil => "takeUntil",
    TakeWhile => "takeWhile",
    Tap => "tap",
    ToArray => "toArray",
    ToJson => "toJson",
    ToPrettyJson => "toPrettyJson",
    Unique => "unique",
    UniqueStrict => "uniqueStrict",
    Unless => "unless",
    UnlessEmpty => "unlessEmpty",
    UnlessNotEmpty => "unlessNotEmpty",
    Until => "until",
    ValueAt => "value",
    Values => "values",
    When => "when",
    WhenEmpty => "whenEmpty",
    WhenNotEmpty => "whenNotEmpty",
    Where => "where",
    WhereBetween => "whereBetween",
    WhereIn => "whereIn",
    WhereInStrict => "whereInStrict",
    WhereInstanceOf => "whereInstanceOf",
    WhereNotBetween => "whereNotBetween",
    WhereNotIn => "whereNotIn",
    WhereNotInStrict => "whereNotInStrict",
    WhereNotNull => "whereNotNull",
    WhereNull => "whereNull",
    WhereStrict => "whereStrict",
}

/// Holds the first error raised by a callback while an operation runs.
///
/// Once an error is held, further callbacks are skipped and yield `null`.
#[derive(Clone, Default)]
struct Trap(Rc<RefCell<Option<SiftError>>>);

impl Trap {
    fn invoke(&self, f: &Func, args: &[Value]) -> Value {
        if self.0.borrow().is_some() {
            return Value::Null;
        }
        match f.call(args) {
            Ok(v) => v,
            Err(err) => {
                *self.0.borrow_mut() = Some(err);
                Value::Null
            }
        }
    }

    fn mapper(&self, f: &Func) -> impl Fn(&Value, &Key) -> Value + 'static {
        let (trap, f) = (self.clone(), f.clone());
        move |v, k| trap.invoke(&f, &[v.clone(), k.to_value()])
    }

    fn tester(&self, f: &Func) -> impl Fn(&Value, &Key) -> bool + 'static {
        let map = self.mapper(f);
        move |v, k| map(v, k).is_truthy()
    }

    fn check(&self) -> Result<()> {
        match self.0.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Positional arguments of a dynamic call.
struct Args<'a> {
    method: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn invalid(&self, reason: &str) -> SiftError {
        SiftError::invalid_argument(self.method, reason)
    }

    fn arg(&self, i: usize) -> Value {
        self.values.get(i).cloned().unwrap_or_default()
    }

    fn func(&self, i: usize) -> Result<Func> {
        match self.values.get(i) {
            Some(Value::Func(f)) => Ok(f.clone()),
            _ => Err(self.invalid(&format!("argument {} must be a callback", i + 1))),
        }
    }

    fn opt_func(&self, i: usize) -> Option<Func> {
        self.values.get(i).and_then(Value::as_func).cloned()
    }

    fn text(&self, i: usize) -> Result<String> {
        self.arg(i)
            .coerce_string()
            .ok_or_else(|| self.invalid(&format!("argument {} must be a string", i + 1)))
    }

    fn int(&self, i: usize) -> Result<i64> {
        match self.arg(i).to_number() {
            Some(Number::Int(n)) => Ok(n),
            Some(Number::Float(f)) if f.is_finite() => Ok(f.trunc() as i64),
            _ => Err(self.invalid(&format!("argument {} must be an integer", i + 1))),
        }
    }

    fn opt_int(&self, i: usize) -> Result<Option<i64>> {
        match self.values.get(i) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.int(i).map(Some),
        }
    }

    fn flag(&self, i: usize, default: bool) -> bool {
        self.values.get(i).map_or(default, Value::is_truthy)
    }

    fn key(&self, i: usize) -> Result<Key> {
        let value = self.arg(i);
        Key::from_value(&value).ok_or_else(|| SiftError::IllegalOffset {
            found: value.debug_type(),
        })
    }

    fn json_flags(&self, i: usize) -> Result<JsonFlags> {
        Ok(JsonFlags::from_bits_truncate(self.opt_int(i)?.unwrap_or(0) as u32))
    }

    /// A string, or an array of strings.
    fn names(&self, i: usize) -> Result<Vec<String>> {
        match self.arg(i) {
            Value::Array(m) => m.values().map(|v| self.name(v)).collect(),
            Value::Collection(c) => c.iter().map(|(_, v)| self.name(v)).collect(),
            other => Ok(vec![self.name(&other)?]),
        }
    }

    fn name(&self, v: &Value) -> Result<String> {
        v.coerce_string()
            .ok_or_else(|| self.invalid("expected a type name"))
    }

    /// A default value: callbacks are called, anything else is used as is.
    fn fallback(&self, i: usize) -> Result<Value> {
        match self.values.get(i) {
            Some(Value::Func(f)) => f.call(&[]),
            Some(v) => Ok(v.clone()),
            None => Ok(Value::Null),
        }
    }

    fn where_arg(&self, trap: &Trap) -> Result<Where> {
        match self.values {
            [Value::Func(f)] => Ok(Where::Callback(Rc::new(trap.tester(f)))),
            [_] => Ok(Where::Key(self.text(0)?)),
            [_, value] => Ok(Where::Eq(self.text(0)?, value.clone())),
            [_, _, value, ..] => Ok(Where::Compare(
                self.text(0)?,
                Operator::parse(&self.text(1)?),
                value.clone(),
            )),
            [] => Err(self.invalid("expected a callback or a key")),
        }
    }

    fn retriever(&self, i: usize, trap: &Trap) -> Result<Retriever> {
        match self.values.get(i) {
            None | Some(Value::Null) => Ok(Retriever::Identity),
            Some(Value::Func(f)) => Ok(Retriever::Callback(Rc::new(trap.mapper(f)))),
            Some(_) => self.text(i).map(Retriever::Path),
        }
    }
}

fn with_key(values: &[Value], key: &Key) -> Vec<Value> {
    let mut args = values.to_vec();
    args.push(key.to_value());
    args
}

impl Collection {
    /// Resolves a member name.
    ///
    /// Methods resolve to builtins first, then to registered macros.
    /// Properties resolve only for operations on the proxy allow-list.
    pub fn resolve(&self, name: &str, member: Member) -> Option<Capability> {
        let capability = match member {
            Member::Method => Builtin::parse(name)
                .map(Capability::Direct)
                .or_else(|| self.extensions().macros().get(name).map(Capability::Registered)),
            Member::Property => self
                .extensions()
                .is_proxy(name)
                .then(|| Capability::Forward(name.to_string())),
        };
        trace!(name, ?member, ?capability, "resolved collection member");
        capability
    }

    /// Calls an operation by name.
    ///
    /// # Errors
    ///
    /// [`SiftError::UnknownOperation`] when the name is neither a builtin
    /// nor a registered macro, plus whatever the operation or its callbacks
    /// raise.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.resolve(name, Member::Method) {
            Some(Capability::Direct(builtin)) => self.call_builtin(builtin, args),
            Some(Capability::Registered(f)) => f(Some(self), args),
            _ => Err(SiftError::unknown_operation(Collection::TYPE_NAME, name)),
        }
    }

    /// Reads a property: an allow-listed operation name yields an element
    /// proxy for that operation.
    ///
    /// # Errors
    ///
    /// [`SiftError::UndeclaredProxyProperty`] for any other name.
    pub fn get_attr(&self, name: &str) -> Result<Value> {
        self.element_proxy(name).map(Value::object)
    }

    /// The element proxy for an allow-listed operation.
    pub fn element_proxy(&self, method: &str) -> Result<ElementProxy> {
        match self.resolve(method, Member::Property) {
            Some(Capability::Forward(method)) => Ok(ElementProxy::new(self.clone(), method)),
            _ => Err(SiftError::UndeclaredProxyProperty {
                property: method.to_string(),
            }),
        }
    }

    /// Calls a static operation with the per-thread shared registries.
    pub fn call_static(method: &str, args: &[Value]) -> Result<Value> {
        Collection::call_static_with(&Extensions::shared(), method, args)
    }

    /// Calls a static operation: `make`, `wrap`, `unwrap`, `empty`,
    /// `times`, `range` or `fromJson`, then static macros. Collections
    /// built here carry `extensions`.
    pub fn call_static_with(extensions: &Extensions, method: &str, args: &[Value]) -> Result<Value> {
        let args = Args {
            method,
            values: args,
        };
        let trap = Trap::default();
        let attach = |c: Collection| Value::Collection(c.with_extensions(extensions.clone()));
        let out = match method {
            "make" => attach(Collection::make(args.arg(0))),
            "wrap" => attach(Collection::wrap(args.arg(0))),
            "unwrap" => Collection::unwrap(args.arg(0)),
            "empty" => attach(Collection::empty()),
            "times" => {
                let n = args.int(0)?;
                match args.opt_func(1) {
                    Some(f) => attach(Collection::times_with(n, |i| trap.invoke(&f, &[Value::from(i)]))),
                    None => attach(Collection::times(n)),
                }
            }
            "range" => attach(Collection::range(args.int(0)?, args.int(1)?)),
            "fromJson" => {
                let depth = args.opt_int(1)?.unwrap_or(DEFAULT_DEPTH as i64).max(0) as usize;
                attach(Collection::from_json(&args.text(0)?, depth, args.json_flags(2)?)?)
            }
            _ => {
                return extensions
                    .macros()
                    .call(Collection::TYPE_NAME, None, method, args.values)
            }
        };
        trap.check()?;
        Ok(out)
    }

    fn call_builtin(&self, builtin: Builtin, values: &[Value]) -> Result<Value> {
        let args = Args {
            method: builtin.name(),
            values,
        };
        let trap = Trap::default();
        let out: Value = match builtin {
            Builtin::All => Value::Array(self.all().clone()),
            Builtin::Average | Builtin::Avg => self.avg_by(args.retriever(0, &trap)?).into(),
            Builtin::Collapse => self.collapse().into(),
            Builtin::Contains | Builtin::Any => self.contains_dynamic(&args, &trap)?.into(),
            Builtin::DoesntContain => (!self.contains_dynamic(&args, &trap)?).into(),
            Builtin::ContainsStrict => self.contains_strict(args.arg(0)).into(),
            Builtin::Count => self.count().into(),
            Builtin::Each => {
                let f = args.func(0)?;
                self.each(|v, k| {
                    if matches!(trap.invoke(&f, &[v.clone(), k.to_value()]), Value::Bool(false)) {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                });
                self.clone().into()
            }
            Builtin::EachSpread => {
                let f = args.func(0)?;
                self.each_spread(|vs, k| {
                    if matches!(trap.invoke(&f, &with_key(vs, k)), Value::Bool(false)) {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                });
                self.clone().into()
            }
            Builtin::Ensure => {
                let names = args.names(0)?;
                let types: Vec<&str> = names.iter().map(String::as_str).collect();
                self.ensure(&types)?.clone().into()
            }
            Builtin::EscapeWhenCastingToString => self
                .clone()
                .escape_when_casting_to_string(args.flag(0, true))
                .into(),
            Builtin::Every => self.every(args.where_arg(&trap)?).into(),
            Builtin::Filter => match args.opt_func(0) {
                Some(f) => self.filter(trap.tester(&f)),
                None => self.filter_truthy(),
            }
            .into(),
            Builtin::First => match args.opt_func(0) {
                Some(f) => self.first_by(trap.tester(&f)).cloned(),
                None => self.first().cloned(),
            }
            .map_or_else(|| args.fallback(1), Ok)?,
            Builtin::FirstWhere => self
                .first_where(args.where_arg(&trap)?)
                .cloned()
                .unwrap_or_default(),
            Builtin::FlatMap => self.flat_map(trap.mapper(&args.func(0)?)).into(),
            Builtin::ForPage => self.for_page(args.int(0)?, args.int(1)?).into(),
            Builtin::Get => self.get(args.key(0)?).cloned().map_or_else(|| args.fallback(1), Ok)?,
            Builtin::GroupBy => self
                .group_by(args.retriever(0, &trap)?, args.flag(1, false))?
                .into(),
            Builtin::Has => self.has(args.key(0)?).into(),
            Builtin::IsEmpty => self.is_empty().into(),
            Builtin::IsNotEmpty => self.is_not_empty().into(),
            Builtin::JsonSerialize => json::from_serde(self.json_serialize()),
            Builtin::KeyBy => self.key_by(args.retriever(0, &trap)?)?.into(),
            Builtin::Keys => self.keys().into(),
            Builtin::Last => match args.opt_func(0) {
                Some(f) => self.last_by(trap.tester(&f)).cloned(),
                None => self.last().cloned(),
            }
            .map_or_else(|| args.fallback(1), Ok)?,
            Builtin::Map => self.map(trap.mapper(&args.func(0)?)).into(),
            Builtin::MapSpread => {
                let f = args.func(0)?;
                self.map_spread(|vs, k| trap.invoke(&f, &with_key(vs, k))).into()
            }
            Builtin::MapToDictionary => {
                let grouped = self.try_map_to_dictionary(trap.mapper(&args.func(0)?));
                trap.check()?;
                grouped?.into()
            }
            Builtin::MapToGroups => {
                let grouped = self.try_map_to_groups(trap.mapper(&args.func(0)?));
                trap.check()?;
                grouped?.into()
            }
            Builtin::Max => self.max_by(args.retriever(0, &trap)?).into(),
            Builtin::Min => self.min_by(args.retriever(0, &trap)?).into(),
            Builtin::Partition => {
                let (passed, failed) = self.partition(args.where_arg(&trap)?);
                self.derive_values([passed, failed]).into()
            }
            Builtin::Percentage => {
                let precision = args
                    .opt_int(1)?
                    .unwrap_or(2)
                    .clamp(-i64::from(MAX_PRECISION), i64::from(MAX_PRECISION)) as i32;
                self.percentage(trap.tester(&args.func(0)?), precision).into()
            }
            Builtin::Pipe => args.func(0)?.call(&[self.clone().into()])?,
            Builtin::PipeThrough => {
                let fns = args.arg(0);
                let fns = match &fns {
                    Value::Array(m) => m.values().cloned().collect(),
                    Value::Collection(c) => c.all().values().cloned().collect(),
                    Value::Func(_) => vec![fns.clone()],
                    _ => return Err(args.invalid("expected an array of callbacks")),
                };
                let mut carry = Value::Collection(self.clone());
                for f in fns {
                    let f = f
                        .as_func()
                        .cloned()
                        .ok_or_else(|| args.invalid("expected an array of callbacks"))?;
                    carry = f.call(&[carry])?;
                }
                carry
            }
            Builtin::Reduce | Builtin::ReduceWithKeys => {
                let f = args.func(0)?;
                self.reduce(
                    |acc, v, k| trap.invoke(&f, &[acc, v.clone(), k.to_value()]),
                    args.arg(1),
                )
            }
            Builtin::ReduceSpread => {
                let f = args.func(0)?;
                let initial = values.get(1..).unwrap_or_default().to_vec();
                let reduced = self.reduce_spread(
                    |accs, v, k| {
                        let mut call = accs.to_vec();
                        call.push(v.clone());
                        call.push(k.to_value());
                        trap.invoke(&f, &call)
                    },
                    initial,
                );
                trap.check()?;
                Value::Array(list(reduced?))
            }
            Builtin::Reject => match values.first() {
                Some(Value::Func(f)) => self.reject(trap.tester(f)),
                Some(value) => self.reject_value(value.clone()),
                None => self.reject_value(true),
            }
            .into(),
            Builtin::SkipUntil => match values.first() {
                Some(Value::Func(f)) => self.skip_until(trap.tester(f)),
                _ => self.skip_until_value(args.arg(0)),
            }
            .into(),
            Builtin::SkipWhile => match values.first() {
                Some(Value::Func(f)) => self.skip_while(trap.tester(f)),
                _ => self.skip_while_value(args.arg(0)),
            }
            .into(),
            Builtin::TakeUntil | Builtin::Until => match values.first() {
                Some(Value::Func(f)) => self.take_until(trap.tester(f)),
                _ => self.take_until_value(args.arg(0)),
            }
            .into(),
            Builtin::TakeWhile => match values.first() {
                Some(Value::Func(f)) => self.take_while(trap.tester(f)),
                _ => self.take_while_value(args.arg(0)),
            }
            .into(),
            Builtin::Slice => self.slice(args.int(0)?, args.opt_int(1)?).into(),
            Builtin::Sort => self.sort().into(),
            Builtin::SortDesc => self.sort_desc().into(),
            Builtin::SortBy => {
                let dir = Dir::from_descending(args.flag(2, false));
                self.sort_by_dir(args.retriever(0, &trap)?, dir).into()
            }
            Builtin::SortByDesc => self.sort_by_desc(args.retriever(0, &trap)?).into(),
            Builtin::Sum => self.sum_by(args.retriever(0, &trap)?).into(),
            Builtin::Tap => {
                args.func(0)?.call(&[self.clone().into()])?;
                self.clone().into()
            }
            Builtin::ToArray => Value::Array(self.to_array()),
            Builtin::ToJson => Value::String(self.to_json_with(args.json_flags(0)?)?),
            Builtin::ToPrettyJson => {
                Value::String(self.to_json_with(args.json_flags(0)? | JsonFlags::PRETTY_PRINT)?)
            }
            Builtin::Unique => {
                let retriever = args.retriever(0, &trap)?;
                if args.flag(1, false) {
                    self.unique_strict_by(retriever)
                } else {
                    self.unique_by(retriever)
                }
                .into()
            }
            Builtin::UniqueStrict => self.unique_strict_by(args.retriever(0, &trap)?).into(),
            Builtin::When => self.conditional(&args, false)?,
            Builtin::Unless => self.conditional(&args, true)?,
            Builtin::WhenEmpty => self.conditional_on(self.is_empty(), &args)?,
            Builtin::WhenNotEmpty | Builtin::UnlessEmpty => self.conditional_on(self.is_not_empty(), &args)?,
            Builtin::UnlessNotEmpty => self.conditional_on(self.is_empty(), &args)?,
            Builtin::ValueAt => self.value(&args.text(0)?, args.arg(1)),
            Builtin::Values => self.values().into(),
            Builtin::Where => self.filter_where(args.where_arg(&trap)?).into(),
            Builtin::WhereBetween => self.where_between(&args.text(0)?, args.arg(1)).into(),
            Builtin::WhereIn => self.where_in(&args.text(0)?, args.arg(1)).into(),
            Builtin::WhereInStrict => self.where_in_strict(&args.text(0)?, args.arg(1)).into(),
            Builtin::WhereInstanceOf => {
                let names = args.names(0)?;
                let types: Vec<&str> = names.iter().map(String::as_str).collect();
                self.where_instance_of(&types).into()
            }
            Builtin::WhereNotBetween => self.where_not_between(&args.text(0)?, args.arg(1)).into(),
            Builtin::WhereNotIn => self.where_not_in(&args.text(0)?, args.arg(1)).into(),
            Builtin::WhereNotInStrict => self.where_not_in_strict(&args.text(0)?, args.arg(1)).into(),
            Builtin::WhereNotNull => self.where_not_null(Some(&args.text(0)?)).into(),
            Builtin::WhereNull => self.where_null(Some(&args.text(0)?)).into(),
            Builtin::WhereStrict => self.where_strict(&args.text(0)?, args.arg(1)).into(),
        };
        trap.check()?;
        Ok(out)
    }

    /// `contains`: a lone non-callback argument is a loose membership test,
    /// anything else is a `where` argument.
    fn contains_dynamic(&self, args: &Args<'_>, trap: &Trap) -> Result<bool> {
        match args.values {
            [value] if !matches!(value, Value::Func(_)) => Ok(self.contains(value.clone())),
            _ => Ok(self.contains_where(args.where_arg(trap)?)),
        }
    }

    /// `when`/`unless` with `(condition, callback, default)` arguments.
    ///
    /// No arguments yield a proxy capturing its condition, a lone
    /// condition a proxy with that condition. A callback condition is
    /// called with the collection first.
    fn conditional(&self, args: &Args<'_>, negate: bool) -> Result<Value> {
        let Some(first) = args.values.first() else {
            let proxy = ConditionalProxy::new(self.clone());
            let proxy = if negate {
                proxy.negate_condition_on_capture()
            } else {
                proxy
            };
            return Ok(Value::object(proxy));
        };
        let value = match first {
            Value::Func(f) => f.call(&[self.clone().into()])?,
            other => other.clone(),
        };
        let holds = value.is_truthy() != negate;
        if args.values.len() == 1 {
            return Ok(Value::object(ConditionalProxy::new(self.clone()).with_condition(holds)));
        }
        let branch = if holds {
            args.values.get(1)
        } else {
            args.values.get(2)
        };
        match branch {
            Some(Value::Func(f)) => {
                let out = f.call(&[self.clone().into(), value])?;
                Ok(if out.is_null() { self.clone().into() } else { out })
            }
            None | Some(Value::Null) => Ok(self.clone().into()),
            Some(_) => Err(args.invalid("expected a callback")),
        }
    }

    fn conditional_on(&self, condition: bool, args: &Args<'_>) -> Result<Value> {
        let mut forwarded = vec![Value::from(condition)];
        forwarded.extend(args.values.iter().cloned());
        self.conditional(
            &Args {
                method: args.method,
                values: &forwarded,
            },
            false,
        )
    }
}
