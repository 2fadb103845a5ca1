//! greenroute HTTP service.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use greenroute::charging::{NoChargingStations, OpenChargeMapClient};
use greenroute::config::AppConfig;
use greenroute::engine::RouteEngine;
use greenroute::haversine::HaversineDirections;
use greenroute::osrm::OsrmClient;
use greenroute::server::{self, ApiState};
use greenroute::store::SqliteStore;
use greenroute::traits::{ChargingStationLocator, DirectionsProvider};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env();

    // Blocking HTTP clients are built before the async runtime starts.
    let directions: Box<dyn DirectionsProvider> = match &cfg.osrm {
        Some(osrm) => {
            info!(url = %osrm.base_url, "routing with OSRM");
            Box::new(OsrmClient::new(osrm.clone()).context("building OSRM client")?)
        }
        None => {
            warn!("OSRM_URL not set, falling back to straight-line routing");
            Box::new(HaversineDirections::default())
        }
    };

    let charging: Box<dyn ChargingStationLocator> = match &cfg.charging {
        Some(ocm) => Box::new(OpenChargeMapClient::new(ocm.clone()).context("building OpenChargeMap client")?),
        None => {
            warn!("OPENCHARGE_API_KEY not set, charging station search disabled");
            Box::new(NoChargingStations)
        }
    };

    let store = Arc::new(
        SqliteStore::open(&cfg.database_path)
            .with_context(|| format!("opening database {}", cfg.database_path))?,
    );

    let engine = Arc::new(RouteEngine::new(
        directions,
        Box::new(store.clone()),
        Box::new(store),
        charging,
        cfg.engine.clone(),
    ));

    let app = server::router(ApiState {
        engine: engine.clone(),
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;

    let served = runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&cfg.bind)
            .await
            .with_context(|| format!("binding {}", cfg.bind))?;
        info!("listening on http://{}", cfg.bind);

        let serve = axum::serve(listener, app);
        tokio::select! {
            r = serve => { r?; },
            _ = signal::ctrl_c() => { info!("shutdown signal received"); }
        }
        Ok::<_, anyhow::Error>(())
    });

    // Blocking clients must be released outside the async runtime.
    drop(engine);
    served
}
