//! Deletion through the engine: subject walks, expression walks and explicit
//! link removal.

use std::sync::Arc;

use hpce_loader::config::EngineConfig;
use hpce_loader::engine::Engine;
use hpce_loader::error::{DeleteError, EngineError, LoaderError};
use hpce_loader::op::{Link, Operation};
use hpce_loader::remote::{MockStore, Receiver, ReceiversQuery, ReceiversReply, StoreCall};

fn open(store: Arc<MockStore>) -> Engine {
    let engine = Engine::new(
        EngineConfig {
            retry_interval_ms: 1,
            ..Default::default()
        },
        store,
    )
    .unwrap();
    engine.open("localhost", 3000).unwrap();
    engine
}

fn receivers_queries(store: &MockStore) -> Vec<(ReceiversQuery, String)> {
    store
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            StoreCall::Receivers { query, body } => Some((query, body)),
            _ => None,
        })
        .collect()
}

#[test]
fn subject_with_two_objects_then_none() {
    let store = Arc::new(MockStore::new(2));
    store.push_receivers(
        ReceiversQuery::Objects,
        ReceiversReply::page(vec![Receiver::object(2, 20), Receiver::object(3, 31)]),
    );
    let engine = open(store.clone());

    let summary = engine.delete_subject(1, 10).unwrap();
    assert_eq!(summary.pairs, 2);
    assert_eq!(summary.queries, 2);
    assert_eq!(engine.stats().pending, 0);

    let ops: String = store.loads().into_iter().map(|(_, body)| body).collect();
    for term in [
        "triple(subject(1,10),object(2,20))",
        "triple(object(2,20), subject(1,10))",
        "triple(subject(1,10),object(3,31))",
        "triple(object(3,31), subject(1,10))",
    ] {
        assert!(ops.contains(term), "missing {term} in {ops}");
    }
    assert_eq!(
        receivers_queries(&store),
        vec![
            (ReceiversQuery::Objects, "subject(1,10)".to_string()),
            (ReceiversQuery::Objects, "subject(1,10)".to_string()),
        ]
    );
}

#[test]
fn subject_without_objects_sends_nothing() {
    let store = Arc::new(MockStore::new(2));
    let engine = open(store.clone());
    let summary = engine.delete_subject(4, 44).unwrap();
    assert_eq!(summary.pairs, 0);
    assert_eq!(summary.queries, 1);
    assert!(store.loads().is_empty());
}

#[test]
fn expression_deletes_every_selected_subject() {
    let store = Arc::new(MockStore::new(2));
    store.push_receivers(
        ReceiversQuery::Subjects,
        ReceiversReply::page(vec![Receiver::subject(1, 10), Receiver::subject(1, 11)]),
    );
    store.push_receivers(
        ReceiversQuery::Objects,
        ReceiversReply::page(vec![Receiver::object(2, 20)]),
    );
    store.push_receivers(
        ReceiversQuery::Objects,
        ReceiversReply::page(Vec::new()),
    );
    store.push_receivers(
        ReceiversQuery::Objects,
        ReceiversReply::page(vec![Receiver::object(2, 21)]),
    );
    let engine = open(store.clone());

    let summary = engine.delete_expression("type(1)").unwrap();
    assert_eq!(summary.subjects, 2);
    assert_eq!(summary.pairs, 2);

    let queries = receivers_queries(&store);
    assert_eq!(queries.first().unwrap().1, "type(1)");
    assert_eq!(queries.last().unwrap(), &(ReceiversQuery::Subjects, "type(1)".to_string()));
    assert!(queries.iter().any(|(_, b)| b == "subject(1,11)"));
}

#[test]
fn failed_receivers_query_aborts() {
    let store = Arc::new(MockStore::new(1));
    store.push_receivers(ReceiversQuery::Subjects, ReceiversReply::failed(3));
    let engine = open(store);
    let err = engine.delete_expression("type(9)").unwrap_err();
    assert!(matches!(
        err,
        LoaderError::Delete(DeleteError::StoreUnavailable { status: 3 })
    ));
}

#[test]
fn explicit_link_removal_is_buffered() {
    let store = Arc::new(MockStore::new(2));
    let engine = open(store.clone());
    let link = Link {
        subject_type: 1,
        subject_item: 3,
        object_type: 2,
        object_item: 4,
    };
    engine.delete_link(link).unwrap();

    assert_eq!(engine.pending_operations(0), vec![Operation::DeleteSubject(link)]);
    assert_eq!(engine.pending_operations(1), vec![Operation::DeleteObject(link)]);
    assert!(store.loads().is_empty());
}

#[test]
fn deletion_needs_a_session() {
    let engine = Engine::new(EngineConfig::default(), Arc::new(MockStore::new(1))).unwrap();
    assert!(matches!(
        engine.delete_subject(1, 1).unwrap_err(),
        LoaderError::Engine(EngineError::NotOpen)
    ));
}
