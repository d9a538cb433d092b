use anyhow::{Context, Result};
use searchgrid::api::create_app;
use searchgrid::config;
use searchgrid::notify::{run_detection_alerts, ChannelNotifier};
use searchgrid::state::{SwarmSettings, SwarmState};
use searchgrid::world::WorldModel;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "searchgrid=info".into()),
        )
        .init();

    info!("searchgrid starting...");

    let config = config::load_from_env().context("Failed to load configuration")?;

    let world = WorldModel::initialize(
        config.world.world_size,
        config.world.regions.clone(),
        config.world.targets_per_region,
        config.world.spawn_margin,
        &mut rand::thread_rng(),
    )
    .context("Failed to initialize world")?;

    for target in world.targets() {
        info!(
            target_id = %target.id,
            name = %target.name,
            region = %target.region,
            x = target.position.x(),
            z = target.position.z(),
            "Target placed"
        );
    }

    // Detection alerts are drained by a background task
    let (notifier, alerts_rx) = ChannelNotifier::new();
    tokio::spawn(run_detection_alerts(alerts_rx));

    let swarm = Arc::new(SwarmState::new(
        world,
        SwarmSettings::from_config(&config),
        Arc::new(notifier),
    ));

    let app = create_app(swarm, &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!(
        addr = %config.server.bind_addr,
        ws_path = %config.server.ws_path,
        regions = config.world.regions.len(),
        "Listening for agents and observers"
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
