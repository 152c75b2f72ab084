//! Hostway - serve one content repository under many hostnames

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::{error, info, warn};

use hostway::{
    config::{Args, Command},
    db::SiteFixture,
    logging,
    pipeline::{Pipeline, PipelineConfig, Resolution},
    query::ContentQuery,
    request::RequestContext,
};

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_json)?;

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let fixture = SiteFixture::load(&args.store)
        .with_context(|| format!("failed to load site file {}", args.store.display()))?;
    let base_url = args.base_url.clone().unwrap_or_else(|| fixture.base_url.clone());
    info!(
        store = %args.store.display(),
        base_url = %base_url,
        mappings = fixture.store.mapping_count(),
        "Site loaded"
    );

    let config = PipelineConfig::new(&base_url)?.with_backend_paths(args.backend_paths.clone());
    let request = RequestContext::from_url(args.command.url(), config.base.clone())?;
    let pipeline = Pipeline::new(fixture.store, Arc::new(fixture.content), config);

    let mut query = ContentQuery::unresolved(&request);
    let resolution = pipeline.handle(&request, &mut query);

    match &args.command {
        Command::Resolve { .. } => {
            let outcome = resolution
                .resolved()
                .map(|resolved| pipeline.finish(&request, resolved, &query));
            let report = json!({
                "request": request.url(),
                "resolution": resolution,
                "query": query,
                "outcome": outcome,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Rewrite { markup, links, .. } => {
            let rewriter = match &resolution {
                Resolution::Resolved(resolved) => pipeline.rewriter(&request, resolved),
                _ => None,
            };
            if rewriter.is_none() {
                warn!(url = %request.url(), "Request is not mapped, output left unchanged");
            }

            if !links.is_empty() {
                for link in links {
                    match &rewriter {
                        Some(r) => println!("{}", r.rewrite_link(link)),
                        None => println!("{}", link),
                    }
                }
                return Ok(());
            }

            let mut html = String::new();
            match markup {
                Some(path) => {
                    html = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read markup {}", path.display()))?;
                }
                None => {
                    std::io::stdin().read_to_string(&mut html)?;
                }
            }

            if let (Some(r), Some(resolved)) = (&rewriter, resolution.resolved()) {
                html = r.rewrite_head_section(&r.rewrite_markup(&html));
                html = pipeline.head_customizer(resolved, Some(r)).apply(&html);
            }
            print!("{}", html);
        }
    }

    Ok(())
}
