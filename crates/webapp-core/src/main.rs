use webapp_core::{run, setup_logging, ServerConfig};

fn main() -> webapp_core::Result<()> {
    setup_logging("webapp_core=info");

    let config = ServerConfig::default();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(run(config)).inspect_err(|e| {
        tracing::error!(error = %e, "server failed to start");
    })
}
