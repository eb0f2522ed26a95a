use crate::cli::ServeArgs;
use crate::infra::{build_generator, load_snapshot, AppState, InMemoryWellbeingStore};
use crate::routes::with_wellbeing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mindpulse::config::AppConfig;
use mindpulse::error::AppError;
use mindpulse::telemetry;
use mindpulse::wellbeing::WellbeingService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = match args.data.take() {
        Some(path) => {
            let snapshot = load_snapshot(&path)?;
            info!(
                path = %path.display(),
                profiles = snapshot.profiles.len(),
                "seeded store from snapshot"
            );
            InMemoryWellbeingStore::from_snapshot(snapshot)
        }
        None => InMemoryWellbeingStore::default(),
    };
    let generator = build_generator(&config.generator);
    let service = Arc::new(WellbeingService::new(
        Arc::new(store),
        generator,
        config.nudges,
    ));

    let app = with_wellbeing_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "mindpulse wellbeing service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
