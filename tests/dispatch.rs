//! End-to-end dispatch behaviour through the framework context.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

use partial::events::{Event, EventKind};
use partial::navigation::{Callback, DispatchPhase, Navigation, QueryValue};

mod common;

#[test]
fn test_table_sorted_by_priority_with_stable_ties() {
    let fw = common::framework();
    for pattern in ["/", "/a/{x}", "/a/b", "/c/d", "/*", "/{p}"] {
        fw.route(pattern, |_, _| Ok(())).unwrap();
    }

    let order: Vec<(String, i32)> = fw
        .routes()
        .iter()
        .map(|r| (r.pattern().to_string(), r.priority()))
        .collect();

    assert_eq!(
        order,
        vec![
            ("/*".to_string(), 11),
            ("/a/b".to_string(), 2),
            ("/c/d".to_string(), 2),
            ("/".to_string(), 1),
            ("/a/{x}".to_string(), 1),
            ("/{p}".to_string(), 0),
        ]
    );
}

#[test]
fn test_literal_route_runs_before_parameter_route() {
    let fw = common::framework();
    let log = common::call_log();

    let l = log.clone();
    fw.route("/users/{id}", move |_, params| {
        l.lock().push(format!("param:{}", params[0]));
        Ok(())
    })
    .unwrap();
    let l = log.clone();
    fw.route("/users/new", move |_, _| {
        l.lock().push("literal".into());
        Ok(())
    })
    .unwrap();

    let nav = fw.location("/Users/NEW/");
    let report = nav.report().unwrap();
    assert_eq!(report.matched, vec!["/users/new", "/users/{id}"]);
    assert_eq!(*log.lock(), vec!["literal", "param:new"]);
    assert_eq!(fw.current_url(), "/Users/NEW");
}

#[test]
fn test_partials_run_before_handler_in_declared_order() {
    let fw = common::framework();
    let log = common::call_log();

    for name in ["header", "menu"] {
        let l = log.clone();
        fw.partial(name, move |_| {
            l.lock().push(name.to_string());
            Ok(())
        });
    }
    let l = log.clone();
    fw.route_with(
        "/home",
        move |_, _| {
            l.lock().push("handler".into());
            Ok(())
        },
        &["header", "menu"],
        false,
    )
    .unwrap();

    fw.location("/home");
    assert_eq!(*log.lock(), vec!["header", "menu", "handler"]);
}

#[test]
fn test_invoke_once_route_runs_only_first_time() {
    let fw = common::framework();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let route = fw
        .route_with(
            "/intro",
            move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            &[],
            true,
        )
        .unwrap();

    fw.location("/intro");
    let second = fw.location("/intro");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(route.invocations(), 1);
    assert!(second.report().unwrap().not_found);
}

#[test]
fn test_failing_handler_does_not_stop_later_routes() {
    let fw = common::framework();
    let events = common::record(&fw, &[EventKind::Error, EventKind::Status]);
    let reached = Arc::new(AtomicUsize::new(0));

    fw.route("/shop/cart", |_, _| Err("cart exploded".into())).unwrap();
    fw.route("/shop/{page}", |_, _| panic!("page exploded")).unwrap();
    let r = reached.clone();
    fw.route("/*", move |_, _| {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    let nav = fw.location("/shop/cart");
    let report = nav.report().unwrap();

    assert_eq!(reached.load(Ordering::SeqCst), 1);
    assert_eq!(report.faults.len(), 2);
    assert_eq!(report.faults[0].route, "/shop/cart");
    assert_eq!(report.faults[0].callback, Callback::Handler);
    assert_eq!(report.faults[0].message, "cart exploded");
    assert!(report.faults[1].message.contains("page exploded"));
    assert!(!report.not_found);

    let events = events.lock();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Error { url, message } if url == "/shop/cart" && message.contains("cart exploded")));
    assert!(matches!(&events[1], Event::Status { code: 500, .. }));
    assert_eq!(fw.errors().len(), 1);
}

#[test]
fn test_unknown_partial_is_reported() {
    let fw = common::framework();
    fw.route_with("/x", |_, _| Ok(()), &["ghost"], false).unwrap();

    let nav = fw.location("/x");
    let fault = &nav.report().unwrap().faults[0];
    assert_eq!(fault.callback, Callback::Partial("ghost".into()));
}

#[test]
fn test_catch_all_alone_reports_not_found() {
    let fw = common::framework();
    let events = common::record(&fw, &[EventKind::Status]);
    let ran = Arc::new(AtomicUsize::new(0));
    let r = ran.clone();
    fw.route("/*", move |_, _| {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    let nav = fw.location("/missing/page");
    assert!(nav.report().unwrap().not_found);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(
        *events.lock(),
        vec![Event::Status { code: 404, message: "/missing/page".into() }]
    );
}

#[test]
fn test_state_is_set_before_handlers_run() {
    let fw = common::framework();
    let events = common::record(&fw, &[EventKind::Location]);
    let seen = common::call_log();

    let s = seen.clone();
    fw.route("/search", move |fw, _| {
        let query = fw.query();
        s.lock().push(fw.current_url());
        s.lock().push(query.get("q").map(QueryValue::first).unwrap_or_default().to_string());
        assert_eq!(fw.phase(), DispatchPhase::Invoking);
        Ok(())
    })
    .unwrap();

    fw.location("/search/?q=rust+lang&tag=a&tag=b#results");

    assert_eq!(*seen.lock(), vec!["/search", "rust lang"]);
    assert_eq!(*events.lock(), vec![Event::Location { url: "/search".into() }]);
    assert_eq!(
        fw.query().get("tag"),
        Some(&QueryValue::Multiple(vec!["a".into(), "b".into()]))
    );
    assert_eq!(fw.phase(), DispatchPhase::Settled);
}

#[test]
fn test_reentrant_navigation_is_queued() {
    let fw = common::framework();
    let log = common::call_log();

    let l = log.clone();
    fw.route("/a", move |fw, _| {
        l.lock().push("a:start".into());
        let nested = fw.location("/b");
        assert_eq!(nested, Navigation::Queued);
        l.lock().push("a:end".into());
        Ok(())
    })
    .unwrap();
    let l = log.clone();
    fw.route("/b", move |fw, _| {
        l.lock().push(format!("b:{}", fw.current_url()));
        Ok(())
    })
    .unwrap();

    let nav = fw.location("/a");
    assert_eq!(nav.report().unwrap().url, "/a");
    assert_eq!(*log.lock(), vec!["a:start", "a:end", "b:/b"]);
    assert_eq!(fw.current_url(), "/b");
    assert_eq!(fw.history(), vec!["/a"]);
}

#[test]
fn test_history_back_and_refresh() {
    let fw = common::framework();
    let hits = common::call_log();
    for pattern in ["/one", "/two", "/three"] {
        let h = hits.clone();
        fw.route(pattern, move |fw, _| {
            h.lock().push(fw.current_url());
            Ok(())
        })
        .unwrap();
    }

    assert!(fw.back().is_none());

    fw.location("/one");
    fw.location("/two");
    fw.location("/two");
    fw.location("/three");
    assert_eq!(fw.history(), vec!["/one", "/two"]);

    fw.back().unwrap();
    assert_eq!(fw.current_url(), "/two");
    assert_eq!(fw.history(), vec!["/one"]);

    fw.refresh();
    assert_eq!(fw.history(), vec!["/one"]);
    assert_eq!(hits.lock().last().map(String::as_str), Some("/two"));
}

#[test]
fn test_history_is_bounded() {
    let mut config = partial::FrameworkConfig::default();
    config.navigation.history_capacity = 2;
    let fw = partial::Framework::with_transport(config, Arc::new(common::MockTransport::new())).unwrap();

    for url in ["/1", "/2", "/3", "/4"] {
        fw.location(url);
    }
    assert_eq!(fw.history(), vec!["/2", "/3"]);
}

#[test]
fn test_redirect_hands_repository_to_next_dispatch() {
    let fw = common::framework();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let s = seen.clone();
    fw.route("/done", move |fw, _| {
        s.lock().push(fw.repository());
        Ok(())
    })
    .unwrap();

    fw.redirect("/done", json!({"order": 7}));
    fw.location("/done");

    assert_eq!(*seen.lock(), vec![json!({"order": 7}), json!({})]);
}

#[test]
fn test_root_and_params() {
    let fw = common::framework();
    let log = common::call_log();

    let l = log.clone();
    fw.route("/", move |_, params| {
        l.lock().push(format!("root:{}", params.len()));
        Ok(())
    })
    .unwrap();
    let l = log.clone();
    fw.route("/{page}", move |_, params| {
        l.lock().push(format!("page:{}", params[0]));
        Ok(())
    })
    .unwrap();

    assert!(!fw.location("").report().unwrap().not_found);
    fw.location("/About");
    assert_eq!(*log.lock(), vec!["root:0", "page:about"]);
}

#[test]
fn test_panicking_listener_does_not_block_later_navigation() {
    let fw = common::framework();
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    fw.route("/ok", move |_, _| {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    let sub = fw.on(EventKind::Status, |_| panic!("status listener failed"));
    let first = fw.location("/missing");
    assert!(first.report().unwrap().not_found);
    fw.off(&sub);

    let second = fw.location("/ok");
    assert!(second.report().unwrap().is_ok());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}
