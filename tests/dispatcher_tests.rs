use sengoku::{
    App, AppBuilder, DispatchError, Operations, PathParams, Request, Resource, Response,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct BookResource;

impl BookResource {
    fn get(&mut self, _req: &Request, res: &mut Response, _p: &PathParams) -> anyhow::Result<()> {
        res.set_text("this is a get request");
        Ok(())
    }

    fn post(&mut self, _req: &Request, res: &mut Response, _p: &PathParams) -> anyhow::Result<()> {
        res.set_text("this is a post request");
        Ok(())
    }
}

impl Resource for BookResource {
    fn operations() -> Operations<Self> {
        Operations::new().get(Self::get).post(Self::post)
    }
}

#[derive(Default)]
struct PostOnlyResource;

impl PostOnlyResource {
    fn post(&mut self, _req: &Request, res: &mut Response, _p: &PathParams) -> anyhow::Result<()> {
        res.set_text("only post request allowed");
        Ok(())
    }
}

impl Resource for PostOnlyResource {
    fn operations() -> Operations<Self> {
        Operations::new().post(Self::post)
    }
}

/// Exception handler that writes the error text as the body.
fn echo_errors(builder: &mut AppBuilder) {
    builder.exception_handler(|_req, res, err| {
        res.set_text(err.to_string());
    });
}

#[test]
fn test_client_can_send_requests() {
    let mut builder = App::builder();
    builder
        .route("/hey", |_req, res, _p| {
            res.set_text("this is a response text");
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    let res = app.handle(Request::get("/hey")).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.text(), "this is a response text");
}

#[test]
fn test_parameterized_route() {
    let mut builder = App::builder();
    builder
        .route("/{name}", |_req, res, p| {
            res.set_text(format!("hey {}", p.get_str("name").unwrap_or_default()));
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    assert_eq!(app.handle(Request::get("/xavier")).unwrap().text(), "hey xavier");
    assert_eq!(app.handle(Request::get("/nguyen")).unwrap().text(), "hey nguyen");
}

#[test]
fn test_percent_encoded_paths_are_routed_decoded() {
    let mut builder = App::builder();
    builder
        .route("/sub/{a:d}/{b:d}", |_req, res, p| {
            let a = p.get_int("a").unwrap_or_default();
            let b = p.get_int("b").unwrap_or_default();
            res.set_text((a - b).to_string());
            Ok(())
        })
        .unwrap()
        .route("/{name}", |_req, res, p| {
            res.set_text(format!("hey {}", p.get_str("name").unwrap_or_default()));
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    let res = app.handle(Request::get("/xavier%20nguyen")).unwrap();
    assert_eq!(res.text(), "hey xavier nguyen");
    assert_eq!(app.handle(Request::get("/sub/%31%30/3")).unwrap().text(), "7");

    // An encoded slash separates segments, so one `{name}` no longer fits.
    assert_eq!(app.handle(Request::get("/a%2Fb")).unwrap().status, 404);
}

#[test]
fn test_typed_params_reach_the_handler_as_integers() {
    let mut builder = App::builder();
    builder
        .route("/sub/{a:d}/{b:d}", |_req, res, p| {
            let a = p.get_int("a").ok_or_else(|| anyhow::anyhow!("a missing"))?;
            let b = p.get_int("b").ok_or_else(|| anyhow::anyhow!("b missing"))?;
            res.set_text((a - b).to_string());
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    assert_eq!(app.handle(Request::get("/sub/10/3")).unwrap().text(), "7");

    let res = app.handle(Request::get("/sub/x/3")).unwrap();
    assert_eq!(res.status, 404);
    assert_eq!(res.text(), "Not found.");
}

#[test]
fn test_default_404_response_invokes_no_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut builder = App::builder();
    builder
        .route("/home", move |_req, res, _p| {
            counter.fetch_add(1, Ordering::SeqCst);
            res.set_text("home");
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    for path in ["/doesnotexist", "/home/extra", "/"] {
        let res = app.handle(Request::get(path)).unwrap();
        assert_eq!(res.status, 404);
        assert_eq!(res.text(), "Not found.");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    app.handle(Request::get("/home")).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_app_is_all_404() {
    let app = App::builder().build();
    let res = app.handle(Request::post("/anything")).unwrap();
    assert_eq!(res.status, 404);
    assert_eq!(res.text(), "Not found.");
}

#[test]
fn test_class_based_handler_get_and_post() {
    let mut builder = App::builder();
    builder.resource::<BookResource>("/book").unwrap();
    let app = builder.build();

    assert_eq!(
        app.handle(Request::get("/book")).unwrap().text(),
        "this is a get request"
    );
    assert_eq!(
        app.handle(Request::post("/book")).unwrap().text(),
        "this is a post request"
    );
}

#[test]
fn test_class_based_handler_not_allowed_method_propagates() {
    let mut builder = App::builder();
    builder.resource::<PostOnlyResource>("/book").unwrap();
    let app = builder.build();

    let err = app.handle(Request::get("/book")).unwrap_err();
    match err {
        DispatchError::MethodNotAllowed { method, .. } => assert_eq!(method, "get"),
        other => panic!("expected MethodNotAllowed, got {other:?}"),
    }

    assert_eq!(
        app.handle(Request::post("/book")).unwrap().text(),
        "only post request allowed"
    );
}

#[test]
fn test_class_based_handler_not_allowed_method_with_exception_handler() {
    let mut builder = App::builder();
    builder.resource::<PostOnlyResource>("/book").unwrap();
    builder.exception_handler(|_req, res, err| {
        if err.is_method_not_allowed() {
            res.set_status(405);
            res.set_text("nope");
        }
    });
    let app = builder.build();

    let res = app.handle(Request::get("/book")).unwrap();
    assert_eq!(res.status, 405);
    assert_eq!(res.text(), "nope");
}

#[test]
fn test_allowed_methods_for_function_based_handlers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut builder = App::builder();
    builder
        .route_with_methods("/home", &["post"], move |_req, res, _p| {
            counter.fetch_add(1, Ordering::SeqCst);
            res.set_text("Hello from the HOME page");
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    let err = app.handle(Request::get("/home")).unwrap_err();
    assert!(err.is_method_not_allowed());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let res = app.handle(Request::post("/home")).unwrap();
    assert_eq!(res.text(), "Hello from the HOME page");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_alternative_route() {
    let mut builder = App::builder();
    builder
        .add_route("/alternative", |_req, res, _p| {
            res.set_text("Alternative way to add a route");
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    assert_eq!(
        app.handle(Request::get("/alternative")).unwrap().text(),
        "Alternative way to add a route"
    );
}

#[test]
fn test_route_overlap_is_rejected() {
    let mut builder = App::builder();
    builder
        .route("/home", |_req, res, _p| {
            res.set_text("the HOME page");
            Ok(())
        })
        .unwrap();
    let err = builder
        .route("/home", |_req, res, _p| {
            res.set_text("the HOME2 page");
            Ok(())
        })
        .err()
        .unwrap();
    assert!(err.to_string().contains("already exists"));

    let app = builder.build();
    assert_eq!(app.handle(Request::get("/home")).unwrap().text(), "the HOME page");
}

#[test]
fn test_custom_exception_handler() {
    let mut builder = App::builder();
    builder
        .route("/", |_req, _res, _p| Err(anyhow::anyhow!("AttributeErrorHappened")))
        .unwrap();
    echo_errors(&mut builder);
    let app = builder.build();

    let res = app.handle(Request::get("/")).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.text(), "AttributeErrorHappened");
}

#[test]
fn test_handler_error_without_exception_handler_propagates() {
    let mut builder = App::builder();
    builder
        .route("/", |_req, _res, _p| Err(anyhow::anyhow!("boom")))
        .unwrap();
    let app = builder.build();

    let err = app.handle(Request::get("/")).unwrap_err();
    assert!(matches!(err, DispatchError::Handler(_)));
    assert_eq!(err.to_string(), "boom");
}

#[test]
fn test_exception_handler_that_does_nothing_keeps_handler_writes() {
    let mut builder = App::builder();
    builder
        .route("/", |_req, res, _p| {
            res.set_text("partial");
            Err(anyhow::anyhow!("late failure"))
        })
        .unwrap();
    builder.exception_handler(|_req, _res, _err| {});
    let app = builder.build();

    let res = app.handle(Request::get("/")).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.text(), "partial");
}

#[test]
fn test_last_exception_handler_wins() {
    let mut builder = App::builder();
    builder
        .route("/", |_req, _res, _p| Err(anyhow::anyhow!("x")))
        .unwrap();
    builder.exception_handler(|_req, res, _err| res.set_text("first"));
    builder.exception_handler(|_req, res, _err| res.set_text("second"));
    let app = builder.build();

    assert_eq!(app.handle(Request::get("/")).unwrap().text(), "second");
}

#[test]
fn test_handler_panic_becomes_handler_error() {
    let mut builder = App::builder();
    builder
        .route("/panic", |_req, _res, _p| panic!("handler exploded"))
        .unwrap();
    builder.exception_handler(|_req, res, err| {
        res.set_status(500);
        res.set_text(err.to_string());
    });
    let app = builder.build();

    let res = app.handle(Request::get("/panic")).unwrap();
    assert_eq!(res.status, 500);
    assert!(res.text().contains("handler exploded"));
}

#[test]
fn test_json_and_manual_body_helpers() {
    let mut builder = App::builder();
    builder
        .route("/json", |_req, res, _p| {
            res.set_json(&serde_json::json!({ "name": "sengoku" }))?;
            Ok(())
        })
        .unwrap()
        .route("/body", |_req, res, _p| {
            res.set_body(b"Byte Body".to_vec());
            res.set_content_type("text/plain");
            Ok(())
        })
        .unwrap();
    let app = builder.build();

    let res = app.handle(Request::get("/json")).unwrap();
    assert_eq!(res.header("Content-Type"), Some("application/json"));
    assert_eq!(res.json().unwrap()["name"], "sengoku");

    let res = app.handle(Request::get("/body")).unwrap();
    assert!(res.header("Content-Type").unwrap().contains("text/plain"));
    assert_eq!(res.text(), "Byte Body");
}

#[test]
fn test_app_is_shareable_across_threads() {
    let mut builder = App::builder();
    builder
        .route("/n/{n:d}", |_req, res, p| {
            res.set_text((p.get_int("n").unwrap_or_default() * 2).to_string());
            Ok(())
        })
        .unwrap();
    let app = Arc::new(builder.build());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let app = Arc::clone(&app);
            std::thread::spawn(move || {
                app.handle(Request::get(&format!("/n/{i}")))
                    .unwrap()
                    .text()
            })
        })
        .collect();

    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec!["0", "2", "4", "6"]);
}
