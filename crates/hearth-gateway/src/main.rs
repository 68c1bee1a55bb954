use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};

mod app;
mod http;
mod plugins;

use hearth_auth::IngressGate;
use hearth_core::config::HubConfig;
use hearth_runtime::{
    CronScheduler, Daemon, InitSequencer, PluginRegistry, Supervisor, TargetBarrier,
    ThrottledFailurePolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth_gateway=info,hearth_runtime=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path > HEARTH_CONFIG env > ~/.hearth/hearth.toml
    let config_path = std::env::var("HEARTH_CONFIG").ok();
    let config = HubConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        HubConfig::default()
    });

    // assemble plugins — integrations register here
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(plugins::HousekeepingPlugin));
    info!(plugins = registry.len(), "plugin registry assembled");

    // ingress gate — owns the replay cache, consulted by the transport layer
    // independently of daemon execution
    let credentials = Arc::new(app::ConfigCredentialStore::new(&config.bridges));
    let gate = Arc::new(IngressGate::new(credentials, &config.auth));

    // startup phases: sequencer posts init-complete, supervisor waits on it
    let barrier = Arc::new(TargetBarrier::new());
    let policy = Arc::new(ThrottledFailurePolicy::from_config(&config.supervisor));
    let supervisor = Supervisor::new(Arc::clone(&barrier), policy);
    let root = supervisor.cancellation_token();

    let mut daemons = registry.daemons();
    daemons.push(Arc::new(CronScheduler::new(registry.cron_jobs())) as Arc<dyn Daemon>);

    let sequencer = InitSequencer::new(Arc::clone(&barrier));
    let routines = registry.init_routines();
    {
        let root = root.clone();
        tokio::spawn(async move {
            if let Err(e) = sequencer.run(routines).await {
                // The runtime leaves dependents stalled when init fails (the
                // ready target is never posted); the binary instead turns
                // that stall into an explicit non-zero exit.
                error!(error = %e, "initialization failed — exiting instead of stalling");
                root.cancel();
            }
        });
    }
    let supervisor_task = tokio::spawn(supervisor.run(daemons));

    // ctrl-c cancels the whole task tree cooperatively
    let graceful = Arc::new(std::sync::atomic::AtomicBool::new(false));
    {
        let root = root.clone();
        let graceful = Arc::clone(&graceful);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                graceful.store(true, std::sync::atomic::Ordering::SeqCst);
                root.cancel();
            }
        });
    }

    let state = Arc::new(app::AppState::new(config.clone(), gate));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "hearth gateway listening");

    let shutdown = root.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    let _ = supervisor_task.await;

    // The root token is only cancelled by the signal handler, an init
    // failure, or a supervisor panic; the latter two are fatal.
    if root.is_cancelled() && !graceful.load(std::sync::atomic::Ordering::SeqCst) {
        anyhow::bail!("hub shut down after a fatal runtime failure");
    }
    info!("hearth gateway stopped");
    Ok(())
}
