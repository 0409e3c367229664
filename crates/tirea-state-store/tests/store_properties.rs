//! Behavioural guarantees of the store.
//!
//! These tests verify that:
//! 1. mutators never modify a tree captured before the call
//! 2. untouched subtrees are shared between versions
//! 3. export/import round-trips and dirty tracking report what was written

use serde_json::{json, Value};
use tirea_state_store::{
    path, DirtyPaths, Emitter, EventBus, EventKind, Path, Seg, StateModel, StateStore, StateTree,
    StoreEvent, StoreResult,
};
use std::sync::{Arc, Mutex};

fn sample() -> Value {
    json!({
        "user": {"name": "Alice", "roles": ["admin"]},
        "todos": [
            {"id": 1, "title": "a", "done": false},
            {"id": 2, "title": "b", "done": true},
            {"id": 3, "title": "c", "done": false}
        ],
        "settings": {"theme": "dark", "nested": {"deep": [1, 2, 3]}}
    })
}

fn bound(initial: Value) -> (EventBus, StateStore, Arc<Mutex<Vec<DirtyPaths>>>) {
    let mut bus = EventBus::new();
    let flushes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&flushes);
    bus.subscribe(EventKind::Flush, move |event, _| {
        if let StoreEvent::Flush(dirty) = event {
            sink.lock().unwrap().push(dirty.clone());
        }
        Ok(())
    });
    let store = StateModel::new(initial).bind(&mut bus);
    (bus, store, flushes)
}

type Mutation = Box<dyn Fn(&StateStore) -> StoreResult<()>>;

fn case<F>(name: &'static str, f: F) -> (&'static str, Mutation)
where
    F: Fn(&StateStore) -> StoreResult<()> + 'static,
{
    (name, Box::new(f))
}

// ============================================================================
// Immutability
// ============================================================================

#[test]
fn test_every_mutator_leaves_previous_tree_untouched() {
    let mutations = vec![
        case("set", |s| s.mutators().set(&path!("user", "name"), "Bob")),
        case("unset", |s| s.mutators().unset(&path!("settings"), None)),
        case("unset keys", |s| {
            s.mutators().unset(&path!("user"), Some(&[Seg::key("name")]))
        }),
        case("push", |s| s.mutators().push(&path!("user", "roles"), "dev")),
        case("pop", |s| s.mutators().pop(&path!("todos"))),
        case("shift", |s| s.mutators().shift(&path!("todos"))),
        case("unshift", |s| {
            s.mutators().unshift(&path!("todos"), vec![json!({"id": 0})])
        }),
        case("splice", |s| {
            s.mutators()
                .splice(&path!("settings", "nested", "deep"), 0, 2, vec![json!(9)])
        }),
        case("concat", |s| {
            s.mutators().concat(&path!("user", "roles"), vec![json!(["x"])])
        }),
        case("merge", |s| s.mutators().merge(json!({"user": {"age": 3}}))),
        case("import", |s| {
            s.mutators().import(json!({"settings": {"theme": "light"}}))
        }),
    ];

    for (name, mutate) in mutations {
        let store = StateModel::new(sample()).instantiate();
        let before = store.snapshot();
        let before_plain = before.to_value();

        mutate(&store).unwrap();

        assert_eq!(before.to_value(), before_plain, "{name} modified the old tree");
        assert_ne!(store.snapshot(), before, "{name} did not produce a new tree");
    }
}

#[test]
fn test_returned_subtrees_survive_later_writes() {
    let store = StateModel::new(sample()).instantiate();
    let user = store.accessors().get(&path!("user")).unwrap();

    store.mutators().set(&path!("user", "name"), "Zed").unwrap();
    store.mutators().unset(&path!("user"), None).unwrap();

    assert_eq!(user, json!({"name": "Alice", "roles": ["admin"]}));
    assert!(store.accessors().get(&path!("user")).is_none());
}

// ============================================================================
// Structural sharing
// ============================================================================

#[test]
fn test_set_shares_siblings_off_the_path() {
    let store = StateModel::new(json!({"a": {"b": 1, "side": {"x": 1}}, "other": {"y": [1]}}))
        .instantiate();
    let before = store.snapshot();

    store.mutators().set(&path!("a", "b"), 5).unwrap();
    let after = store.snapshot();

    for sibling in [path!("other"), path!("other", "y"), path!("a", "side")] {
        assert!(
            StateTree::ptr_eq(before.get_in(&sibling).unwrap(), after.get_in(&sibling).unwrap()),
            "{sibling} was copied"
        );
    }
    assert_eq!(after.get_in(&path!("a", "b")).unwrap(), &json!(5));
}

#[test]
fn test_list_write_shares_other_elements() {
    let store = StateModel::new(sample()).instantiate();
    let before = store.snapshot();

    store.mutators().set(&path!("todos", 1, "done"), false).unwrap();
    let after = store.snapshot();

    for index in [0, 2] {
        let p = path!("todos", index);
        assert!(StateTree::ptr_eq(before.get_in(&p).unwrap(), after.get_in(&p).unwrap()));
    }
    assert!(!StateTree::ptr_eq(
        before.get_in(&path!("todos", 1)).unwrap(),
        after.get_in(&path!("todos", 1)).unwrap()
    ));
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_export_round_trip() {
    let store = StateModel::new(sample()).instantiate();
    store.mutators().push(&path!("todos"), json!({"id": 4})).unwrap();
    let exported = store.accessors().export();

    let copy = StateModel::new(exported.clone()).instantiate();
    assert_eq!(copy.accessors().export(), exported);
    assert_eq!(copy.log_model(), store.log_model());
}

// ============================================================================
// Dirty tracking and flush
// ============================================================================

#[test]
fn test_flush_reports_top_level_siblings() {
    let (bus, store, flushes) = bound(json!({}));
    store.mutators().set(&path!("x"), 1).unwrap();
    store.mutators().set(&path!("y"), 2).unwrap();
    bus.emit(&StoreEvent::Change).unwrap();

    let flushes = flushes.lock().unwrap();
    assert_eq!(flushes.len(), 1);
    assert_eq!(flushes[0].to_marker_tree(), json!({"x": true, "y": true}));
}

#[test]
fn test_flush_keeps_shared_prefix_branches() {
    let (bus, store, flushes) = bound(sample());
    store.mutators().set(&path!("settings", "theme"), "light").unwrap();
    store.mutators().push(&path!("settings", "nested", "deep"), 4).unwrap();
    store.mutators().set(&path!("user", "name"), "Bob").unwrap();
    bus.emit(&StoreEvent::Change).unwrap();

    let flushes = flushes.lock().unwrap();
    assert_eq!(
        flushes[0].to_marker_tree(),
        json!({
            "settings": {"theme": true, "nested": {"deep": true}},
            "user": {"name": true}
        })
    );
}

#[test]
fn test_consecutive_flushes_without_writes() {
    let (bus, store, flushes) = bound(json!({}));
    store.mutators().set(&path!("x"), 1).unwrap();
    bus.emit(&StoreEvent::Change).unwrap();
    bus.emit(&StoreEvent::Change).unwrap();

    let flushes = flushes.lock().unwrap();
    assert_eq!(flushes.len(), 2);
    assert!(flushes[1].is_empty());
    assert_eq!(flushes[1].to_marker_tree(), json!({}));
}

#[test]
fn test_flush_paths_are_exactly_the_written_paths() {
    let (bus, store, flushes) = bound(sample());
    let m = store.mutators();
    m.shift(&path!("todos")).unwrap();
    m.unset(&path!("user"), Some(&[Seg::key("roles")])).unwrap();
    m.merge(json!({"fresh": 1})).unwrap();
    bus.emit(&StoreEvent::Change).unwrap();

    let flushes = flushes.lock().unwrap();
    let paths: Vec<&Path> = flushes[0].paths().collect();
    assert_eq!(paths, vec![&path!("fresh"), &path!("todos"), &path!("user", "roles")]);
}

// ============================================================================
// Reset and seek
// ============================================================================

#[test]
fn test_reset_restores_initial_values() {
    let (bus, store, _) = bound(json!({"a": 0}));
    store.mutators().set(&path!("a"), 1).unwrap();
    store.mutators().set(&path!("b"), 1).unwrap();

    bus.emit(&StoreEvent::Reset).unwrap();

    assert_eq!(store.accessors().get(&path!("a")).unwrap(), json!(0));
    assert!(store.accessors().get(&path!("b")).is_none());
}

#[test]
fn test_seek_last_write_wins() {
    let (bus, store, _) = bound(json!({}));
    let recording = json!({"initialState": [
        {"path": ["a"], "value": 1},
        {"path": ["a"], "value": 2}
    ]});

    bus.emit(&StoreEvent::seek(recording)).unwrap();

    assert_eq!(store.accessors().get(&path!("a")).unwrap(), json!(2));
}

#[test]
fn test_seek_then_reset_round_trip() {
    let (bus, store, _) = bound(sample());
    let recording = json!({"initialState": [
        {"path": ["todos", 0, "done"], "value": true},
        {"path": ["user", "roles", 1], "value": "dev"}
    ]});

    bus.emit(&StoreEvent::seek(recording)).unwrap();
    assert_eq!(store.accessors().get(&path!("todos", 0, "done")).unwrap(), json!(true));
    assert_eq!(
        store.accessors().to_value(&path!("user", "roles")).unwrap(),
        json!(["admin", "dev"])
    );

    bus.emit(&StoreEvent::Reset).unwrap();
    assert_eq!(store.accessors().export(), sample());
}

#[test]
fn test_set_and_seek_create_nodes_for_index_segments() {
    let (bus, store, flushes) = bound(json!({"byId": {}}));

    store.mutators().set(&path!("rows", 3), 7).unwrap();
    assert_eq!(store.accessors().get(&path!("rows", 3)).unwrap(), json!(7));

    let recording = json!({"initialState": [
        {"path": ["byId", 5], "value": "x"},
        {"path": ["byId", "6"], "value": "y"}
    ]});
    bus.emit(&StoreEvent::seek(recording)).unwrap();

    assert_eq!(
        store.accessors().export(),
        json!({"byId": {"5": "x", "6": "y"}, "rows": {"3": 7}})
    );
    assert_eq!(store.accessors().keys(&path!("byId")).unwrap(), vec!["5", "6"]);

    bus.emit(&StoreEvent::Change).unwrap();
    assert_eq!(
        flushes.lock().unwrap()[0].to_marker_tree(),
        json!({"rows": {"3": true}})
    );
}

// ============================================================================
// findWhere
// ============================================================================

#[test]
fn test_find_where_returns_the_matching_item() {
    let store = StateModel::new(sample()).instantiate();
    let predicate = json!({"id": 2});
    let found = store
        .accessors()
        .find_where(&path!("todos"), predicate.as_object().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(found, json!({"id": 2, "title": "b", "done": true}));
}
