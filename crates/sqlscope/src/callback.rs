//! Processor registry.
//!
//! Each terminal operation dispatches one [`CallbackKind`]: every processor
//! registered for that kind runs, in order, against the same [`Scope`].
//! Processors are named; names are unique within a kind and are what the
//! placement hints of [`CallbackProcessor`] refer to.
//!
//! ```ignore
//! let mut registry = CallbackRegistry::with_defaults();
//! registry
//!     .create()
//!     .before("sqlscope:insert")
//!     .register("app:audit", |scope| {
//!         tracing::info!(table = scope.table_name(), "insert");
//!     });
//! let session = Session::builder().callbacks(Arc::new(registry)).build(conn);
//! ```

use crate::processors;
use crate::scope::Scope;
use std::fmt;
use std::sync::Arc;

/// A processor function.
pub type ProcessorFn = Arc<dyn Fn(&mut Scope<'_>) + Send + Sync>;

/// The operation kinds a registry dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Create,
    Update,
    Delete,
    Query,
    RowQuery,
}

impl CallbackKind {
    pub const ALL: [CallbackKind; 5] = [
        CallbackKind::Create,
        CallbackKind::Update,
        CallbackKind::Delete,
        CallbackKind::Query,
        CallbackKind::RowQuery,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CallbackKind::Create => "create",
            CallbackKind::Update => "update",
            CallbackKind::Delete => "delete",
            CallbackKind::Query => "query",
            CallbackKind::RowQuery => "row_query",
        }
    }
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named processor entry.
#[derive(Clone)]
pub struct Processor {
    name: String,
    func: ProcessorFn,
}

impl Processor {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor").field("name", &self.name).finish()
    }
}

/// Ordered processors for every operation kind.
///
/// Built and configured once, then shared between sessions behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct CallbackRegistry {
    creates: Vec<Processor>,
    updates: Vec<Processor>,
    deletes: Vec<Processor>,
    queries: Vec<Processor>,
    row_queries: Vec<Processor>,
}

impl CallbackRegistry {
    /// An empty registry: every kind dispatches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the default query, insert, update and delete
    /// processors. The row-query kind starts empty.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .query()
            .register(processors::QUERY, processors::query);
        registry
            .create()
            .register(processors::INSERT, processors::insert);
        registry
            .update()
            .register(processors::UPDATE, processors::update);
        registry
            .delete()
            .register(processors::DELETE, processors::delete);
        registry
    }

    pub fn create(&mut self) -> CallbackProcessor<'_> {
        self.processor(CallbackKind::Create)
    }

    pub fn update(&mut self) -> CallbackProcessor<'_> {
        self.processor(CallbackKind::Update)
    }

    pub fn delete(&mut self) -> CallbackProcessor<'_> {
        self.processor(CallbackKind::Delete)
    }

    pub fn query(&mut self) -> CallbackProcessor<'_> {
        self.processor(CallbackKind::Query)
    }

    pub fn row_query(&mut self) -> CallbackProcessor<'_> {
        self.processor(CallbackKind::RowQuery)
    }

    /// A registration builder for `kind`.
    pub fn processor(&mut self, kind: CallbackKind) -> CallbackProcessor<'_> {
        CallbackProcessor {
            registry: self,
            kind,
            before: None,
            after: None,
        }
    }

    /// Processor names of `kind`, in dispatch order.
    pub fn processor_names(&self, kind: CallbackKind) -> Vec<&str> {
        self.list(kind).iter().map(Processor::name).collect()
    }

    pub fn len(&self, kind: CallbackKind) -> usize {
        self.list(kind).len()
    }

    pub fn is_empty(&self, kind: CallbackKind) -> bool {
        self.list(kind).is_empty()
    }

    /// Run every processor of `kind` against `scope`.
    ///
    /// Dispatch never stops early; processors see earlier errors through
    /// [`Scope::has_error`].
    pub fn dispatch(&self, kind: CallbackKind, scope: &mut Scope<'_>) {
        let list = self.list(kind);
        tracing::debug!(kind = kind.as_str(), processors = list.len(), "dispatch");
        for processor in list {
            (processor.func)(scope);
        }
    }

    fn list(&self, kind: CallbackKind) -> &[Processor] {
        match kind {
            CallbackKind::Create => &self.creates,
            CallbackKind::Update => &self.updates,
            CallbackKind::Delete => &self.deletes,
            CallbackKind::Query => &self.queries,
            CallbackKind::RowQuery => &self.row_queries,
        }
    }

    fn list_mut(&mut self, kind: CallbackKind) -> &mut Vec<Processor> {
        match kind {
            CallbackKind::Create => &mut self.creates,
            CallbackKind::Update => &mut self.updates,
            CallbackKind::Delete => &mut self.deletes,
            CallbackKind::Query => &mut self.queries,
            CallbackKind::RowQuery => &mut self.row_queries,
        }
    }
}

/// Registration builder for one kind of a [`CallbackRegistry`].
///
/// Placement hints name an existing processor. A hint naming a processor
/// that is not registered is ignored and the new processor is appended.
pub struct CallbackProcessor<'r> {
    registry: &'r mut CallbackRegistry,
    kind: CallbackKind,
    before: Option<String>,
    after: Option<String>,
}

impl CallbackProcessor<'_> {
    /// Place the next registration before the named processor.
    #[must_use]
    pub fn before(mut self, name: impl Into<String>) -> Self {
        self.before = Some(name.into());
        self
    }

    /// Place the next registration after the named processor.
    #[must_use]
    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.after = Some(name.into());
        self
    }

    /// Register a processor.
    ///
    /// Registering a name that already exists replaces that entry in place.
    pub fn register<F>(self, name: impl Into<String>, func: F)
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        let name = name.into();
        let kind = self.kind;
        let list = self.registry.list_mut(kind);

        if let Some(existing) = list.iter_mut().find(|p| p.name == name) {
            tracing::warn!(kind = kind.as_str(), name = %name, "processor already registered, replacing");
            existing.func = Arc::new(func);
            return;
        }

        let position = match (&self.before, &self.after) {
            (Some(anchor), _) => position_of(list, anchor).or_else(|| {
                tracing::warn!(kind = kind.as_str(), name = %name, before = %anchor, "placement target not registered, appending");
                None
            }),
            (None, Some(anchor)) => position_of(list, anchor).map(|i| i + 1).or_else(|| {
                tracing::warn!(kind = kind.as_str(), name = %name, after = %anchor, "placement target not registered, appending");
                None
            }),
            (None, None) => None,
        };

        let processor = Processor {
            name,
            func: Arc::new(func),
        };
        match position {
            Some(index) => list.insert(index, processor),
            None => list.push(processor),
        }
    }

    /// Swap the function of a named processor. A missing name is a no-op.
    pub fn replace<F>(self, name: &str, func: F)
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        let kind = self.kind;
        match self
            .registry
            .list_mut(kind)
            .iter_mut()
            .find(|p| p.name == name)
        {
            Some(existing) => existing.func = Arc::new(func),
            None => tracing::debug!(kind = kind.as_str(), name, "no processor to replace"),
        }
    }

    /// Drop a named processor. A missing name is a no-op.
    pub fn remove(self, name: &str) {
        let list = self.registry.list_mut(self.kind);
        list.retain(|p| p.name != name);
    }
}

fn position_of(list: &[Processor], name: &str) -> Option<usize> {
    list.iter().position(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConnection, Widget};
    use crate::Session;
    use std::sync::Mutex;

    fn noop(_: &mut Scope<'_>) {}

    #[test]
    fn defaults_register_one_processor_per_kind() {
        let registry = CallbackRegistry::with_defaults();
        assert_eq!(registry.processor_names(CallbackKind::Query), ["sqlscope:query"]);
        assert_eq!(registry.processor_names(CallbackKind::Create), ["sqlscope:insert"]);
        assert_eq!(registry.processor_names(CallbackKind::Update), ["sqlscope:update"]);
        assert_eq!(registry.processor_names(CallbackKind::Delete), ["sqlscope:delete"]);
        assert!(registry.is_empty(CallbackKind::RowQuery));
    }

    #[test]
    fn before_and_after_place_relative_to_name() {
        let mut registry = CallbackRegistry::new();
        registry.create().register("b", noop);
        registry.create().before("b").register("a", noop);
        registry.create().after("b").register("c", noop);
        registry.create().after("a").register("a2", noop);
        assert_eq!(
            registry.processor_names(CallbackKind::Create),
            ["a", "a2", "b", "c"]
        );
    }

    #[test]
    fn missing_placement_target_appends() {
        let mut registry = CallbackRegistry::new();
        registry.update().register("first", noop);
        registry.update().before("ghost").register("second", noop);
        registry.update().after("ghost").register("third", noop);
        assert_eq!(
            registry.processor_names(CallbackKind::Update),
            ["first", "second", "third"]
        );
    }

    #[test]
    fn duplicate_name_replaces_in_place() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.query().register("one", noop);
        registry.query().register("two", noop);
        let seen = Arc::clone(&calls);
        registry.query().before("two").register("one", move |_| {
            seen.lock().unwrap().push("replaced");
        });
        assert_eq!(registry.processor_names(CallbackKind::Query), ["one", "two"]);

        let session = Session::new(MockConnection::new());
        let mut scope = Scope::new(session, None);
        registry.dispatch(CallbackKind::Query, &mut scope);
        assert_eq!(*calls.lock().unwrap(), ["replaced"]);
    }

    #[test]
    fn replace_and_remove() {
        let calls = Arc::new(Mutex::new(0));
        let mut registry = CallbackRegistry::new();
        registry.delete().register("x", noop);
        registry.delete().register("y", noop);

        let counter = Arc::clone(&calls);
        registry.delete().replace("x", move |_| {
            *counter.lock().unwrap() += 1;
        });
        registry.delete().replace("missing", noop);
        registry.delete().remove("y");
        registry.delete().remove("missing");
        assert_eq!(registry.processor_names(CallbackKind::Delete), ["x"]);

        let mut scope = Scope::new(Session::new(MockConnection::new()), None);
        registry.dispatch(CallbackKind::Delete, &mut scope);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn dispatch_runs_every_processor_after_an_error() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let log = Arc::clone(&order);
        registry.create().register("fail", move |scope| {
            log.lock().unwrap().push("fail");
            scope.err(sqlscope_core::Error::Custom("boom".into()));
        });
        let log = Arc::clone(&order);
        registry.create().register("observe", move |scope| {
            log.lock().unwrap().push(if scope.has_error() { "saw error" } else { "clean" });
        });

        let mut widget = Widget::default();
        let mut scope = Scope::new(Session::new(MockConnection::new()), Some(&mut widget));
        registry.dispatch(CallbackKind::Create, &mut scope);
        assert_eq!(*order.lock().unwrap(), ["fail", "saw error"]);
        assert_eq!(scope.into_db().errors().len(), 1);
    }

    #[test]
    fn empty_kind_dispatch_does_no_io_and_keeps_row_count() {
        let conn = MockConnection::new();
        let registry = Arc::new(CallbackRegistry::new());
        let session = Session::builder()
            .callbacks(registry)
            .build(conn.clone())
            .with_rows_affected(4);
        let mut widget = Widget::default();
        let result = session.insert(&mut widget);
        assert_eq!(result.rows_affected(), 4);
        assert!(!result.has_error());
        assert!(conn.executed().is_empty());
        assert!(conn.queried().is_empty());
    }
}
