//! Builds the demo application and dispatches a single request against it.
//!
//! ```text
//! sengoku-probe --path /home
//! sengoku-probe --method post --path /book
//! sengoku-probe --path /sub/10/3
//! sengoku-probe --routes
//! ```

use clap::Parser;
use http::Method;
use sengoku::logging::{init_logging, LogConfig, LogWriter};
use sengoku::{
    App, AppBuilder, AppConfig, MetricsMiddleware, Middleware, Operations, PathParams, Request,
    Resource, Response, TracingMiddleware,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sengoku-probe")]
#[command(version, about = "Dispatch one request through the sengoku demo app", long_about = None)]
struct Cli {
    /// HTTP method
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Request path, optionally with a query string
    #[arg(short, long, default_value = "/home")]
    path: String,

    /// Request body
    #[arg(short, long)]
    body: Option<String>,

    /// TOML configuration file; environment variables are used otherwise
    #[arg(short, long, env = "SENGOKU_CONFIG")]
    config: Option<PathBuf>,

    /// Print the routing table and exit
    #[arg(long, default_value_t = false)]
    routes: bool,

    /// Print the request metrics as JSON after the response
    #[arg(long, default_value_t = false)]
    metrics: bool,
}

#[derive(Default)]
struct BookResource;

impl BookResource {
    fn get(&mut self, _req: &Request, res: &mut Response, _p: &PathParams) -> anyhow::Result<()> {
        res.set_json(&serde_json::json!({ "title": "Shogun", "author": "James Clavell" }))?;
        Ok(())
    }

    fn post(&mut self, req: &Request, res: &mut Response, _p: &PathParams) -> anyhow::Result<()> {
        res.set_status(201);
        res.set_text(format!("created: {}", String::from_utf8_lossy(&req.body)));
        Ok(())
    }
}

impl Resource for BookResource {
    fn operations() -> Operations<Self> {
        Operations::new().get(Self::get).post(Self::post)
    }
}

fn build_demo_app(config: &AppConfig) -> anyhow::Result<(App, Arc<MetricsMiddleware>)> {
    let mut builder = AppBuilder::from_config(config);
    let templates = builder.templates();

    builder
        .route("/home", |_req, res, _p| {
            res.set_text("Hello from the HOME page");
            Ok(())
        })?
        .route("/about", |_req, res, _p| {
            res.set_text("Hello from the ABOUT page");
            Ok(())
        })?
        .route("/sub/{a:d}/{b:d}", |_req, res, p| {
            let a = p.get_int("a").unwrap_or_default();
            let b = p.get_int("b").unwrap_or_default();
            res.set_text(format!("{a} - {b} = {}", a - b));
            Ok(())
        })?
        .route("/html", move |_req, res, _p| {
            let html = templates.render(
                "index.html",
                &serde_json::json!({ "title": "sengoku", "name": "probe" }),
            )?;
            res.set_html(html);
            Ok(())
        })?
        .route_with_methods("/echo", &["post"], |req, res, _p| {
            res.set_body(req.body.clone());
            res.set_content_type("application/octet-stream");
            Ok(())
        })?
        .resource::<BookResource>("/book")?;

    let metrics = Arc::new(MetricsMiddleware::new());
    builder
        .exception_handler(|_req, res, err| {
            let status = if err.is_method_not_allowed() { 405 } else { 500 };
            res.set_status(status);
            res.set_text(err.to_string());
        })
        .add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>)
        .add_middleware(Arc::new(TracingMiddleware));

    Ok((builder.build(), metrics))
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };
    let (app, metrics) = build_demo_app(&config)?;

    if cli.routes {
        app.router().dump_routes();
        return Ok(ExitCode::SUCCESS);
    }

    let method = Method::from_bytes(cli.method.to_ascii_uppercase().as_bytes())?;
    let mut req = Request::new(method, &cli.path);
    if let Some(body) = cli.body {
        req = req.with_body(body);
    }

    let res = app.handle(req)?;
    println!("{} {}", res.status, res.status_reason());
    for (name, value) in &res.headers {
        println!("{name}: {value}");
    }
    println!();
    println!("{}", res.text());
    if cli.metrics {
        println!("{}", serde_json::to_string(&metrics.snapshot())?);
    }

    Ok(if res.status < 400 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // stdout carries the response.
    let log_config = LogConfig {
        writer: LogWriter::Stderr,
        ..LogConfig::from_env()
    };
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("logging disabled: {e:#}");
            None
        }
    };

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
