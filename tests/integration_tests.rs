//! End-to-end tests: coalesced reducers driven through a store, with and
//! without a runner attached.

use funks::builder::{persistent_store, record_store};
use funks::coalesce::{Record, StateMap};
use funks::core::{arg, declare, has_channel, open_channels, Funk, Operation};
use funks::effects::{
    funk_middleware, funk_middleware_persistent, run_funks, run_funks_persistent,
};
use funks::store::{MemoryStore, Store};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use stillwater::prelude::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Action {
    First,
    Second { payload: String },
    Foo { payload: String },
    Bar,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Doc {
    text: String,
    #[serde(rename = "funksHaveRun", skip_serializing_if = "std::ops::Not::not")]
    funks_have_run: bool,
}

impl Default for Doc {
    fn default() -> Self {
        Self {
            text: "initial".into(),
            funks_have_run: false,
        }
    }
}

fn async_action() -> Operation<Action> {
    Operation::new("async_action", |args| match arg::<String>(args, 0) {
        Ok(payload) => pure(Some(Action::Second { payload })).boxed(),
        Err(e) => fail(e).boxed(),
    })
}

/// Operation that records its arguments and resolves to `BAR`.
fn recording_mock(calls: Arc<Mutex<Vec<Value>>>) -> Operation<Action> {
    Operation::new("mock", move |args| {
        calls.lock().extend(args.iter().cloned());
        pure(Some(Action::Bar)).boxed()
    })
}

fn doc_store(op: Operation<Action>) -> Arc<MemoryStore<Record<Doc, Action>, Action>> {
    Arc::new(record_store(move |doc: Doc, action: &Action| {
        Ok::<_, Infallible>(match action {
            Action::First => {
                declare(action, Funk::new(op.clone(), vec![json!("payload")]));
                Doc {
                    text: "foo".into(),
                    ..doc
                }
            }
            Action::Second { payload } => Doc {
                text: payload.clone(),
                funks_have_run: false,
            },
            Action::Foo { payload } => {
                declare(action, Funk::new(op.clone(), vec![json!(payload)]));
                doc
            }
            Action::Bar => Doc {
                funks_have_run: true,
                ..doc
            },
        })
    }))
}

fn map_store(op: Operation<Action>) -> Arc<MemoryStore<StateMap<Action>, Action>> {
    Arc::new(persistent_store(move |map: StateMap<Action>, action: &Action| {
        Ok::<_, Infallible>(match action {
            Action::First => {
                declare(action, Funk::new(op.clone(), vec![json!("payload")]));
                map.set("text", "foo")
            }
            Action::Second { payload } => map.set("text", payload.as_str()),
            Action::Foo { payload } => {
                declare(action, Funk::new(op.clone(), vec![json!(payload)]));
                map
            }
            Action::Bar => map.set("funksHaveRun", true),
        })
    }))
}

async fn wait_for<F: Fn() -> bool>(ready: F) {
    for _ in 0..200 {
        if ready() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[test]
fn record_store_collects_then_resets_funks() {
    let op = async_action();
    let store = doc_store(op.clone());

    let action = Action::First;
    let serialized = serde_json::to_value(&action).unwrap();
    store.dispatch(action.clone()).unwrap();

    let state = store.get_state();
    assert_eq!(state.pending_effects(), &[Funk::new(op, vec![json!("payload")])]);
    assert_eq!(state.text, "foo");
    assert!(!has_channel(&action));
    assert_eq!(serde_json::to_value(&action).unwrap(), serialized);

    store
        .dispatch(Action::Second {
            payload: "new payload".into(),
        })
        .unwrap();

    assert_eq!(
        store.get_state().to_plain().unwrap(),
        json!({"pendingEffects": [], "text": "new payload"})
    );
    assert_eq!(open_channels(), 0);
}

#[test]
fn persistent_store_collects_then_resets_funks() {
    let op = async_action();
    let store = map_store(op.clone());

    store.dispatch(Action::First).unwrap();

    let state = store.get_state();
    assert_eq!(state.pending_effects(), &[Funk::new(op, vec![json!("payload")])]);
    assert_eq!(state.get_in(&["text"]), Some(&json!("foo")));
    assert_eq!(
        state.to_plain()["pendingEffects"],
        json!([{"operation": "async_action", "args": ["payload"]}])
    );

    store
        .dispatch(Action::Second {
            payload: "new payload".into(),
        })
        .unwrap();

    assert_eq!(
        store.get_state().to_plain(),
        json!({"pendingEffects": [], "text": "new payload"})
    );
    assert_eq!(open_channels(), 0);
}

#[tokio::test]
async fn record_runner_calls_funks_and_dispatches_results() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = doc_store(recording_mock(Arc::clone(&calls)));
    let _runner = run_funks(&store, ()).unwrap();

    store
        .dispatch(Action::Foo {
            payload: "hi".into(),
        })
        .unwrap();
    assert_eq!(*calls.lock(), vec![json!("hi")]);

    let probe = Arc::clone(&store);
    wait_for(move || probe.get_state().funks_have_run).await;
    assert!(store.get_state().pending_effects().is_empty());
}

#[tokio::test]
async fn persistent_runner_calls_funks_and_dispatches_results() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = map_store(recording_mock(Arc::clone(&calls)));
    let _runner = run_funks_persistent(&store, ()).unwrap();

    store
        .dispatch(Action::Foo {
            payload: "hi".into(),
        })
        .unwrap();
    assert_eq!(*calls.lock(), vec![json!("hi")]);

    let probe = Arc::clone(&store);
    wait_for(move || probe.get_state().get("funksHaveRun") == Some(&json!(true))).await;
    assert!(store.get_state().pending_effects().is_empty());
}

#[tokio::test]
async fn runner_chains_follow_up_funks() {
    let store = doc_store(async_action());
    let _runner = run_funks(&store, ()).unwrap();

    store.dispatch(Action::First).unwrap();

    let probe = Arc::clone(&store);
    wait_for(move || probe.get_state().text == "payload").await;
    assert!(store.get_state().pending_effects().is_empty());
}

#[tokio::test]
async fn record_middleware_chains_follow_up_funks() {
    let store = funk_middleware(doc_store(async_action()), ()).unwrap();

    store.dispatch(Action::First).unwrap();

    let probe = Arc::clone(&store);
    wait_for(move || probe.get_state().text == "payload").await;
    assert!(store.get_state().pending_effects().is_empty());
}

#[tokio::test]
async fn persistent_middleware_calls_funks_and_dispatches_results() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let store =
        funk_middleware_persistent(map_store(recording_mock(Arc::clone(&calls))), ()).unwrap();

    store
        .dispatch(Action::Foo {
            payload: "hi".into(),
        })
        .unwrap();
    assert_eq!(*calls.lock(), vec![json!("hi")]);

    let probe = Arc::clone(&store);
    wait_for(move || probe.get_state().get("funksHaveRun") == Some(&json!(true))).await;
}
