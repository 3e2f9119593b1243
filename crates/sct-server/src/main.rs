//! SNOMED CT terminology server and command line tool.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sct_rf2::ImportOptions;
use sct_search::SearchService;
use sct_server::proto::snomed_ct_server::SnomedCtServer;
use sct_server::{http, TerminologyServer};
use sct_store::EntityStore;
use sct_terminology::{SvcOptions, TerminologySvc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "sct",
    version,
    about = "A SNOMED-CT terminology server and command line tool"
)]
struct Cli {
    /// Write a CPU profile (flamegraph) to the file specified.
    #[arg(long, global = true, value_name = "FILE")]
    profile_cpu: Option<PathBuf>,

    /// Use the specified directory for the search index instead of
    /// defaulting to the data directory.
    #[arg(long, global = true, value_name = "DIRECTORY")]
    index: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import SNOMED-CT RF2 release files from the directories specified.
    Import {
        /// Path of the datastore to open or create.
        data_dir: PathBuf,
        /// One or more release directories to walk for importable files.
        #[arg(required = true)]
        release_dirs: Vec<PathBuf>,
    },
    /// Rebuild derived views and the search index.
    Precompute {
        /// Path of the datastore.
        data_dir: PathBuf,
    },
    /// Clear derived views and the search index.
    Reset {
        /// Path of the datastore.
        data_dir: PathBuf,
    },
    /// Build the search index without touching entity data.
    Index {
        /// Path of the datastore.
        data_dir: PathBuf,
    },
    /// Run the terminology server.
    Server {
        /// Path of the datastore.
        data_dir: PathBuf,
        /// Port to listen on.
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Interface address to bind.
        #[arg(long, default_value = "0.0.0.0")]
        interface: String,
    },
    /// Print statistics for the datastore.
    Info {
        /// Path of the datastore.
        data_dir: PathBuf,
    },
    /// Export extended descriptions in length-delimited protobuf format.
    Export {
        /// Path of the datastore.
        data_dir: PathBuf,
    },
    /// Show version information.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let profiler = match &cli.profile_cpu {
        Some(_) => Some(
            pprof::ProfilerGuardBuilder::default()
                .frequency(100)
                .build()
                .context("unable to start CPU profiler")?,
        ),
        None => None,
    };

    let result = run(&cli).await;

    if let (Some(guard), Some(path)) = (profiler, &cli.profile_cpu) {
        let report = guard.report().build().context("unable to build profile")?;
        let file = File::create(path)
            .with_context(|| format!("unable to create profile at {}", path.display()))?;
        report
            .flamegraph(file)
            .context("unable to write CPU profile")?;
        info!(path = %path.display(), "CPU profile written");
    }

    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Import {
            data_dir,
            release_dirs,
        } => {
            let store = EntityStore::open(data_dir, false)
                .with_context(|| format!("couldn't open datastore {}", data_dir.display()))?;
            for release in release_dirs {
                let summary = sct_rf2::import(&store, release, &ImportOptions::default())
                    .with_context(|| format!("import of {} failed", release.display()))?;
                println!(
                    "Imported {} components from {} ({} concepts, {} descriptions, {} relationships, {} refset items)",
                    summary.total(),
                    release.display(),
                    summary.concepts,
                    summary.descriptions,
                    summary.relationships,
                    summary.refset_items,
                );
            }
            store.close()?;
            Ok(())
        }

        Command::Precompute { data_dir } => {
            let svc = open_svc(cli, data_dir, false, false)?;
            let indexed = svc.precompute()?;
            println!("Indexed {indexed} descriptions");
            svc.close()?;
            Ok(())
        }

        Command::Reset { data_dir } => {
            let index_dir = cli.index.clone().unwrap_or_else(|| data_dir.clone());
            SearchService::reset(&index_dir)?;
            println!("Cleared precomputations in {}", index_dir.display());
            Ok(())
        }

        Command::Index { data_dir } => {
            // Entity data stays read-only; only the index is writable.
            let svc = open_svc(cli, data_dir, true, false)?;
            let indexed = svc.build_index()?;
            println!("Indexed {indexed} descriptions");
            svc.close()?;
            Ok(())
        }

        Command::Server {
            data_dir,
            port,
            interface,
        } => {
            let svc = Arc::new(open_svc(cli, data_dir, true, true)?);
            serve(svc, interface, *port).await
        }

        Command::Info { data_dir } => {
            let store = EntityStore::open(data_dir, true)
                .with_context(|| format!("couldn't open datastore {}", data_dir.display()))?;
            print!("{}", store.statistics()?);
            Ok(())
        }

        Command::Export { data_dir } => {
            let svc = open_svc(cli, data_dir, true, true)?;
            let stdout = std::io::stdout();
            let mut writer = std::io::BufWriter::new(stdout.lock());
            let frames = svc.export(&mut writer)?;
            writer.flush()?;
            info!(frames, "export finished");
            Ok(())
        }

        Command::Version => {
            println!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_svc(
    cli: &Cli,
    data_dir: &PathBuf,
    read_only: bool,
    index_read_only: bool,
) -> anyhow::Result<TerminologySvc> {
    TerminologySvc::open(
        data_dir,
        read_only,
        SvcOptions {
            index_dir: cli.index.clone(),
            index_read_only,
            ..SvcOptions::default()
        },
    )
    .with_context(|| format!("couldn't open terminology datastore {}", data_dir.display()))
}

/// Serves gRPC and the HTTP gateway on one listener. HTTP/2
/// `application/grpc` traffic lands on the tonic routes, everything else on
/// the gateway.
async fn serve(svc: Arc<TerminologySvc>, interface: &str, port: u16) -> anyhow::Result<()> {
    let grpc = TerminologyServer::new(Arc::clone(&svc));
    let app = tonic::service::Routes::new(SnomedCtServer::new(grpc))
        .into_axum_router()
        .merge(http::router(svc));

    let addr = format!("{interface}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("unable to listen on {addr}"))?;
    info!(%addr, "gRPC and HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("unable to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("unable to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
