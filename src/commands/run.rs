use anyhow::{Context as _, Result};
use composition::{Request, Response};
use grafanakit::{ClientFactory, HttpClientFactory};
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::Context;
use crate::cli::RunArgs;
use crate::function::Function;

pub fn run(ctx: &Context, args: RunArgs) -> Result<()> {
    execute(ctx, &args, Arc::new(HttpClientFactory::new()))
}

/// Read the request, run one invocation against `factory` and write the
/// response.
///
/// A fatal result is part of the response, not a process failure; only
/// I/O and malformed requests fail the command.
pub fn execute(ctx: &Context, args: &RunArgs, factory: Arc<dyn ClientFactory>) -> Result<()> {
    let req = read_request(args.request.as_deref())?;
    debug!(
        "Request {:?} with {} desired resource(s)",
        req.meta.tag,
        req.desired.resources.len()
    );

    let rsp = Function::new(factory)
        .with_max_pages(args.max_pages)
        .run(&req);
    if !ctx.quiet {
        info!(
            "Responding with {} result(s), {} requirement(s)",
            rsp.results.len(),
            rsp.requirements.resources.len()
        );
    }

    write_response(&rsp, args.output.as_deref())
}

fn read_request(path: Option<&Path>) -> Result<Request> {
    let raw = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read request from {}", path.display()))?,
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read request from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("Failed to parse request")
}

fn write_response(rsp: &Response, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(rsp).context("Failed to serialize response")?;
    match path {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write response to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("Failed to write response to stdout")
        }
    }
}
