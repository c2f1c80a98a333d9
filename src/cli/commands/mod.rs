//! Command handlers: one function per `Commands` variant, each doing its
//! own index load/save and printing either human or `--json` output.

mod output;

use crate::cli::Commands;
use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::indexing::callgraph::CallGraph;
use crate::indexing::IndexBuilder;
use crate::model::ProjectIndex;
use crate::persistence;
use crate::query::QueryEngine;
use crate::semantic::cache::{doc_entries, semantic_search, DocCache};
use output::{human_or_json, now_rfc3339};
use std::path::Path;

pub fn run(command: Commands, root: &Path) -> IndexResult<()> {
    match command {
        Commands::Index => cmd_index(root),
        Commands::Update { files } => cmd_update(root, &files),
        Commands::Watch { daemon } => cmd_watch(root, daemon),
        Commands::Status { json } => cmd_status(root, json),
        Commands::Search { query, exact, json } => cmd_search(root, &query, exact, json),
        Commands::Semsearch { query, k, model, profile, json } => cmd_semsearch(root, &query, k, model, profile, json),
        Commands::Suggest { context, json } => cmd_suggest(root, &context, json),
        Commands::Deps { file, reverse, orphans, json } => cmd_deps(root, &file, reverse, orphans, json),
        Commands::Impact { file, depth, json } => cmd_impact(root, &file, depth, json),
        Commands::Calls { symbol, json } => cmd_calls(root, &symbol, json),
        Commands::CalledBy { symbol, json } => cmd_called_by(root, &symbol, json),
        Commands::CallChain { from, to, depth, json } => cmd_call_chain(root, &from, &to, depth, json),
        Commands::DeadCode { include_private, json } => cmd_dead_code(root, include_private, json),
    }
}

fn settings_for(root: &Path) -> IndexResult<Settings> {
    Settings::load(root).map_err(|e| IndexError::ConfigError { reason: e.to_string() })
}

fn load_index(root: &Path) -> IndexResult<(Settings, ProjectIndex)> {
    let settings = settings_for(root)?;
    let path = settings.index_path();
    if !path.is_file() {
        return Err(IndexError::IndexMissing { path });
    }
    let index = persistence::load_index(&path)?;
    Ok((settings, index))
}

fn cmd_index(root: &Path) -> IndexResult<()> {
    let settings = settings_for(root)?;
    let builder = IndexBuilder::new(&settings.indexing);
    let now = now_rfc3339();
    let index = builder.build_full(&settings.project_root, &now);
    persistence::save_index(&settings.index_path(), &index)?;
    println!("Indexed {} files -> {}", index.files.len(), settings.index_path().display());
    Ok(())
}

fn cmd_update(root: &Path, files: &[String]) -> IndexResult<()> {
    let (settings, mut index) = load_index(root)?;
    let builder = IndexBuilder::new(&settings.indexing);
    let now = now_rfc3339();
    builder.update(&mut index, &settings.project_root, files, &now);
    persistence::save_index(&settings.index_path(), &index)?;
    println!("Updated {} file(s); index now has {} files", if files.is_empty() { index.files.len() } else { files.len() }, index.files.len());
    Ok(())
}

fn cmd_watch(root: &Path, daemon: bool) -> IndexResult<()> {
    let (settings, mut index) = load_index(root)?;
    let builder = IndexBuilder::new(&settings.indexing);
    let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

    let serve_http = daemon || Settings::server_forced_from_env();
    if serve_http {
        let settings_clone = settings.clone();
        let index_snapshot = index.clone();
        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!(error = %e, "failed to start HTTP server runtime");
                    return;
                }
            };
            runtime.block_on(async move {
                let app = crate::server::router(settings_clone.clone(), index_snapshot);
                let addr = format!("{}:{}", settings_clone.server.host, settings_clone.server.port);
                match tokio::net::TcpListener::bind(&addr).await {
                    Ok(listener) => {
                        tracing::info!(addr, "serving HTTP API");
                        let _ = axum::serve(listener, app).await;
                    }
                    Err(e) => tracing::error!(addr, error = %e, "failed to bind HTTP server"),
                }
            });
        });
    }

    println!("Watching {} for changes (ctrl-c to stop)...", settings.project_root.display());
    crate::watcher::watch(&settings, &mut index, &builder, now_rfc3339, shutdown_rx)
}

fn cmd_status(root: &Path, json: bool) -> IndexResult<()> {
    let (settings, index) = load_index(root)?;
    let edges: usize = index.dependency_graph.values().map(|e| e.imports.len()).sum();

    let entries = doc_entries(&index);
    let cache = DocCache::load(&settings.vectors_path());
    let cache_present = !cache.model_id.is_empty();
    let cache_fresh = cache_present && cache.is_reusable_for(&cache.model_id, &entries);

    human_or_json(
        json,
        || {
            println!("Project root:   {}", index.project_root);
            println!("Schema version: {}", index.schema_version);
            println!("Files indexed:  {}", index.files.len());
            println!("Symbols:        {}", index.symbol_index.len());
            println!("Dependency edges: {edges}");
            println!("Created at:     {}", index.created_at);
            println!("Updated at:     {}", index.updated_at);
            println!("Index path:     {}", settings.index_path().display());
            println!(
                "Semantic cache: {}",
                if !cache_present {
                    "absent".to_string()
                } else if cache_fresh {
                    format!("fresh ({})", cache.model_id)
                } else {
                    format!("stale ({})", cache.model_id)
                }
            );
        },
        || {
            serde_json::json!({
                "project_root": index.project_root,
                "schema_version": index.schema_version,
                "files_indexed": index.files.len(),
                "symbols": index.symbol_index.len(),
                "dependency_edges": edges,
                "created_at": index.created_at,
                "updated_at": index.updated_at,
                "doc_cache_present": cache_present,
                "doc_cache_fresh": cache_fresh,
            })
        },
    );
    Ok(())
}

fn cmd_search(root: &Path, query: &str, exact: bool, json: bool) -> IndexResult<()> {
    let (_settings, index) = load_index(root)?;
    let engine = QueryEngine::new(&index);
    let hits = engine.search(query, exact);

    human_or_json(
        json,
        || {
            for hit in &hits {
                println!("{}:{} {} [{}]", hit.path, hit.line, hit.name, hit.kind);
            }
            if hits.is_empty() {
                println!("No matches for '{query}'");
            }
        },
        || serde_json::to_value(&hits).unwrap_or(serde_json::json!([])),
    );
    Ok(())
}

fn cmd_semsearch(root: &Path, query: &str, k: usize, model: Option<String>, _profile: Option<String>, json: bool) -> IndexResult<()> {
    let (settings, index) = load_index(root)?;
    let model_id = model.unwrap_or(settings.semantic.model.clone());
    let entries = doc_entries(&index);

    let mut cache = DocCache::load(&settings.vectors_path());
    if !cache.is_reusable_for(&model_id, &entries) {
        println!("Semantic cache is stale for model '{model_id}'; rebuilding ({} entries)...", entries.len());
        cache = DocCache::rebuild(&model_id, entries)?;
        cache.save(&settings.vectors_path())?;
    }

    let hits = semantic_search(query, &cache, k)?;

    human_or_json(
        json,
        || {
            for (entry, score) in &hits {
                println!("{:.4} {} ({})", score, entry.id, entry.file);
            }
        },
        || {
            let payload: Vec<_> = hits
                .iter()
                .map(|(entry, score)| serde_json::json!({ "id": entry.id, "file": entry.file, "line": entry.line, "score": score }))
                .collect();
            serde_json::Value::Array(payload)
        },
    );
    Ok(())
}

fn cmd_suggest(root: &Path, context: &str, json: bool) -> IndexResult<()> {
    let (_settings, index) = load_index(root)?;
    let engine = QueryEngine::new(&index);
    let hits = engine.suggest(context);
    let primary: Vec<_> = hits.iter().take(3).collect();
    let related: Vec<_> = hits.iter().skip(3).take(5).collect();

    human_or_json(
        json,
        || {
            println!("Primary:");
            for hit in &primary {
                println!("  {} ({}) confidence={:.2}", hit.name, hit.path, hit.confidence);
            }
            println!("Related:");
            for hit in &related {
                println!("  {} ({}) confidence={:.2}", hit.name, hit.path, hit.confidence);
            }
        },
        || serde_json::json!({ "primary": primary, "related": related }),
    );
    Ok(())
}

fn cmd_deps(root: &Path, file: &str, reverse: bool, orphans: bool, json: bool) -> IndexResult<()> {
    let (_settings, index) = load_index(root)?;
    let engine = QueryEngine::new(&index);

    if orphans {
        let files = engine.orphans();
        human_or_json(
            json,
            || {
                for f in &files {
                    println!("{f}");
                }
            },
            || serde_json::json!(files),
        );
        return Ok(());
    }

    let deps = engine.dependencies(file, reverse)?;
    human_or_json(
        json,
        || {
            for d in &deps {
                println!("{d}");
            }
        },
        || serde_json::json!(deps),
    );
    Ok(())
}

fn cmd_impact(root: &Path, file: &str, depth: u32, json: bool) -> IndexResult<()> {
    let (_settings, index) = load_index(root)?;
    let engine = QueryEngine::new(&index);
    let impacted = engine.impact(file, depth)?;

    human_or_json(
        json,
        || {
            for entry in &impacted {
                println!("{} depth={} severity={:?} test={}", entry.path, entry.depth, entry.severity, entry.is_test);
            }
        },
        || serde_json::to_value(&impacted).unwrap_or(serde_json::json!([])),
    );
    Ok(())
}

fn cmd_calls(root: &Path, symbol: &str, json: bool) -> IndexResult<()> {
    let (_settings, index) = load_index(root)?;
    let graph = CallGraph::new(&index);
    let calls = graph.outgoing(symbol);

    human_or_json(
        json,
        || {
            for c in &calls {
                println!("{c}");
            }
        },
        || serde_json::json!(calls),
    );
    Ok(())
}

fn cmd_called_by(root: &Path, symbol: &str, json: bool) -> IndexResult<()> {
    let (_settings, index) = load_index(root)?;
    let graph = CallGraph::new(&index);
    let callers = graph.incoming(symbol);

    human_or_json(
        json,
        || {
            for c in &callers {
                println!("{c}");
            }
        },
        || serde_json::json!(callers),
    );
    Ok(())
}

fn cmd_call_chain(root: &Path, from: &str, to: &str, depth: u32, json: bool) -> IndexResult<()> {
    let (_settings, index) = load_index(root)?;
    let graph = CallGraph::new(&index);
    let chain = graph.call_chain(from, to, depth);

    human_or_json(
        json,
        || match &chain {
            Some(path) => println!("{}", path.join(" -> ")),
            None => println!("No call chain found from '{from}' to '{to}' within depth {depth}"),
        },
        || serde_json::json!(chain),
    );
    Ok(())
}

fn cmd_dead_code(root: &Path, include_private: bool, json: bool) -> IndexResult<()> {
    let (_settings, index) = load_index(root)?;
    let engine = QueryEngine::new(&index);
    let dead = engine.dead_code(include_private);

    human_or_json(
        json,
        || {
            for hit in &dead {
                println!("{}:{} {}", hit.path, hit.line, hit.name);
            }
        },
        || serde_json::to_value(&dead).unwrap_or(serde_json::json!([])),
    );
    Ok(())
}
