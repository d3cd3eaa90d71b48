mod cli;
mod commands;
mod format;
mod output;

use bkmtree::config::Config;
use bkmtree::db::TreeStore;
use bkmtree::enrich::IconEnricher;
use bkmtree::error::Result;
use bkmtree::fetch::HttpIconProvider;
use bkmtree::operations::BookmarkApi;
use bkmtree::utils;
use clap::Parser;
use std::sync::Arc;

fn init_logger(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_logger(args.debug);

    if args.version {
        println!("bkmtree {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let db_path = args.db.clone().unwrap_or_else(utils::get_default_db_path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store = Arc::new(TreeStore::init(&db_path)?);

    if args.debug {
        let subscription = store.events().subscribe();
        log::debug!("Tracing store events as session {}", subscription.session_id);
        std::thread::spawn(move || {
            for event in subscription.events {
                log::debug!("Store event: {:?}", event);
            }
        });
    }

    // Load configuration
    let cfg = if let Some(config_path) = &args.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load()
    };

    let api = if args.offline {
        BookmarkApi::new(store)
    } else {
        let provider = Arc::new(HttpIconProvider::new(
            &cfg.icon_provider_url,
            &cfg.user_agent,
        )?);
        let enricher = IconEnricher::start(
            Arc::clone(&store),
            provider,
            cfg.enrich_workers,
            cfg.favicon_mode,
        );
        BookmarkApi::with_enricher(store, enricher)
    };

    if cfg.enrich_on_startup {
        api.enrich_missing()?;
    }

    let result = cli::handle_args(args, &api, &cfg);

    let report = api.shutdown();
    if report.updated + report.failed > 0 {
        eprintln!(
            "Icons: {} fetched, {} failed",
            report.updated, report.failed
        );
    }

    result
}
