use sqlscope::prelude::*;
use sqlscope::processors;
use sqlscope_sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone, PartialEq, Model)]
struct Account {
    id: i64,
    owner: String,
    balance: i64,
    updated_at: Option<i64>,
}

fn open() -> SqliteConnection {
    let conn = SqliteConnection::open_memory().expect("open sqlite memory db");
    conn.execute_raw(
        "CREATE TABLE accounts (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             owner TEXT NOT NULL UNIQUE,
             balance INTEGER NOT NULL,
             updated_at INTEGER
         )",
    )
    .expect("create schema");
    conn
}

fn account(owner: &str, balance: i64) -> Account {
    Account {
        owner: owner.to_string(),
        balance,
        ..Account::default()
    }
}

#[test]
fn audit_processor_runs_before_insert() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut registry = CallbackRegistry::with_defaults();

    let log = Arc::clone(&events);
    registry
        .create()
        .before(processors::INSERT)
        .register("app:audit", move |scope| {
            let owner = scope
                .field_by_name("owner")
                .and_then(|f| f.value.as_str().map(str::to_string));
            log.lock().unwrap().push(format!(
                "audit {} error={} owner={}",
                scope.table_name(),
                scope.has_error(),
                owner.unwrap_or_default()
            ));
        });
    let log = Arc::clone(&events);
    registry
        .create()
        .after(processors::INSERT)
        .register("app:after", move |scope| {
            log.lock()
                .unwrap()
                .push(format!("after rows={}", scope.rows_affected()));
        });
    assert_eq!(
        registry.processor_names(CallbackKind::Create),
        ["app:audit", "sqlscope:insert", "app:after"]
    );

    let db = Session::builder()
        .callbacks(Arc::new(registry))
        .build(open());
    let mut ann = account("ann", 10);
    let result = db.insert(&mut ann);

    assert!(!result.has_error());
    assert_eq!(
        *events.lock().unwrap(),
        ["audit accounts error=false owner=ann", "after rows=1"]
    );
}

#[test]
fn processors_can_veto_an_operation() {
    let mut registry = CallbackRegistry::with_defaults();
    registry
        .update()
        .before(processors::UPDATE)
        .register("app:no_negative", |scope| {
            let negative = scope
                .field_by_name("balance")
                .and_then(|f| f.value.as_i64())
                .is_some_and(|b| b < 0);
            if negative {
                scope.err(Error::Custom("balance cannot go negative".into()));
            }
        });
    let db = Session::builder()
        .callbacks(Arc::new(registry))
        .build(open());

    let mut ann = account("ann", 10);
    db.insert(&mut ann);
    ann.balance = -5;
    let result = db.update(&mut ann);
    assert!(matches!(result.error(), Some(Error::Custom(_))));

    let mut stored = Account::default();
    db.first(&mut stored);
    assert_eq!(stored.balance, 10);
}

#[test]
fn replaced_delete_processor_changes_behavior() {
    let mut registry = CallbackRegistry::with_defaults();
    registry
        .delete()
        .replace(processors::DELETE, |scope| {
            scope.err(Error::Custom("deletes are disabled".into()));
        });
    let db = Session::builder()
        .callbacks(Arc::new(registry))
        .build(open());

    let mut ann = account("ann", 10);
    db.insert(&mut ann);
    let result = db.delete(&mut ann);
    assert!(result.has_error());
    assert_eq!(db.model::<Account>().count().unwrap(), 1);
}

#[test]
fn removed_query_processor_leaves_destination_alone() {
    let mut registry = CallbackRegistry::with_defaults();
    registry.query().remove(processors::QUERY);
    let db = Session::builder()
        .callbacks(Arc::new(registry))
        .build(open());

    let mut accounts = vec![account("kept", 1)];
    let result = db.find(&mut accounts);
    assert!(!result.has_error());
    assert_eq!(accounts.len(), 1);
}

#[test]
fn rollback_discards_and_commit_keeps() {
    let db = Session::new(open());

    let tx = db.begin();
    assert!(tx.in_transaction());
    let mut ann = account("ann", 10);
    tx.insert(&mut ann);
    assert_eq!(tx.model::<Account>().count().unwrap(), 1);
    let done = tx.rollback();
    assert!(!done.has_error());
    assert!(!done.in_transaction());
    assert_eq!(db.model::<Account>().count().unwrap(), 0);

    let tx = db.begin();
    let mut bob = account("bob", 20);
    tx.insert(&mut bob);
    let done = tx.commit();
    assert!(!done.has_error());
    assert_eq!(db.model::<Account>().count().unwrap(), 1);
}

#[test]
fn nested_begin_is_recorded_as_an_error() {
    let db = Session::new(open());
    let tx = db.begin();
    let nested = tx.begin();
    assert!(matches!(nested.error(), Some(Error::Transaction(_))));
    tx.rollback();
}

#[test]
fn transaction_helper_commits_or_rolls_back() {
    let db = Session::new(open());

    let moved: Result<i64> = db.transaction(|tx| {
        let mut ann = account("ann", 10);
        let inserted = tx.insert(&mut ann);
        if let Some(err) = inserted.error() {
            return Err(err.clone());
        }
        Ok(ann.id)
    });
    assert_eq!(moved.unwrap(), 1);

    let failed: Result<()> = db.transaction(|tx| {
        let mut bob = account("bob", 5);
        tx.insert(&mut bob);
        // Unique owner: the second insert fails and the whole block rolls back.
        let mut dup = account("bob", 6);
        let result = tx.insert(&mut dup);
        match result.error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    });
    assert!(matches!(failed, Err(Error::Query(ref q)) if q.is_constraint_violation()));

    let mut owners: Vec<Account> = Vec::new();
    db.order("id").find(&mut owners);
    let names: Vec<_> = owners.iter().map(|a| a.owner.as_str()).collect();
    assert_eq!(names, ["ann"]);
}

#[test]
fn commit_outside_transaction_is_a_no_op() {
    let db = Session::new(open());
    let done = db.commit().rollback();
    assert!(!done.has_error());
    assert!(!done.in_transaction());
}

#[test]
fn session_values_reach_processors() {
    let seen = Arc::new(Mutex::new(None));
    let mut registry = CallbackRegistry::with_defaults();
    let slot = Arc::clone(&seen);
    registry
        .query()
        .before(processors::QUERY)
        .register("app:tenant", move |scope| {
            *slot.lock().unwrap() = scope.get::<String>("app:tenant").map(|t| (*t).clone());
        });
    let db = Session::builder()
        .callbacks(Arc::new(registry))
        .build(open());

    let mut accounts: Vec<Account> = Vec::new();
    db.set("app:tenant", "acme".to_string()).find(&mut accounts);
    assert_eq!(seen.lock().unwrap().as_deref(), Some("acme"));
}

#[test]
fn sessions_can_cross_threads() {
    let db = Session::new(open());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let db = db.clone();
            std::thread::spawn(move || {
                let mut record = account(&format!("owner{i}"), i);
                db.insert(&mut record).has_error()
            })
        })
        .collect();
    for handle in handles {
        assert!(!handle.join().unwrap());
    }
    assert_eq!(db.model::<Account>().count().unwrap(), 4);
}

#[test]
fn log_modes_do_not_change_results() {
    let conn = open();
    for mode in [LogMode::Silent, LogMode::Default, LogMode::Verbose] {
        let db = Session::builder()
            .config(SessionConfig::new().log_mode(mode))
            .build(conn.clone());
        let mut record = account(mode.as_str(), 1);
        assert_eq!(db.insert(&mut record).rows_affected(), 1);
    }
    assert_eq!(Session::new(conn).model::<Account>().count().unwrap(), 3);
}
