//! HTTP exporter: runs collectors on demand and serves the result in the
//! Prometheus text format.
//!
//! `GET /metrics?target=<host>&module=<name>` performs one scrape of `target`
//! (the local BMC when omitted) with the collectors of `module`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use ipmiscope_core::{
    CollectorStats, CommandRunner, DescriptorError, Descriptors, ExporterConfig, ModuleConfig,
    Scraper, Target, all_collectors, collectors_by_name, encode_text,
};

/// Shared server state: one scraper per configured module.
pub struct AppState {
    descriptors: Arc<Descriptors>,
    scrapers: BTreeMap<String, Arc<Scraper>>,
}

impl AppState {
    /// Build state running the FreeIPMI tools configured in `config`.
    pub fn new(config: &ExporterConfig) -> Result<Self, DescriptorError> {
        Self::with_runner(config, |module| {
            Arc::new(config.runner_for(module)) as Arc<dyn CommandRunner>
        })
    }

    /// Build state with a caller-supplied runner per module.
    pub fn with_runner<F>(config: &ExporterConfig, runner_for: F) -> Result<Self, DescriptorError>
    where
        F: Fn(&ModuleConfig) -> Arc<dyn CommandRunner>,
    {
        let descriptors = Arc::new(Descriptors::new()?);
        let mut scrapers = BTreeMap::new();
        for name in config.module_names() {
            let Some(module) = config.module(Some(&name)) else {
                continue;
            };
            let scraper = Scraper::new(
                collectors_by_name(&module.collectors, &descriptors),
                runner_for(&module),
                Arc::clone(&descriptors),
            )
            .with_max_concurrency(config.max_concurrency);
            scrapers.insert(name, Arc::new(scraper));
        }
        Ok(Self {
            descriptors,
            scrapers,
        })
    }

    /// Scraper for `module`; `None` selects the default module.
    pub fn scraper(&self, module: Option<&str>) -> Option<Arc<Scraper>> {
        self.scrapers
            .get(module.unwrap_or(ipmiscope_core::DEFAULT_MODULE))
            .cloned()
    }

    pub fn module_names(&self) -> Vec<String> {
        self.scrapers.keys().cloned().collect()
    }
}

/// Scrape `target` and render the samples plus the cumulative failure
/// counters in the Prometheus text format. Blocks on the collector commands.
pub fn render_metrics(scraper: &Scraper, target: &Target) -> Result<String, prometheus::Error> {
    let report = scraper.scrape(std::slice::from_ref(target));
    log::debug!(
        "scrape of {target}: {} ok, {} failed",
        report.successes(),
        report.failures()
    );
    let mut samples = report.samples;
    samples.extend(scraper.failure_samples());
    encode_text(&samples)
}

#[derive(Deserialize)]
struct MetricsParams {
    target: Option<String>,
    module: Option<String>,
}

#[derive(Serialize)]
struct CollectorEntry {
    name: String,
    description: String,
    command: String,
}

#[derive(Serialize)]
struct CollectorsResponse {
    collectors: Vec<CollectorEntry>,
    total: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    modules: BTreeMap<String, Vec<CollectorStats>>,
}

async fn handle_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsParams>,
) -> Response {
    let module = params.module.as_deref().filter(|m| !m.trim().is_empty());
    let Some(scraper) = state.scraper(module) else {
        let msg = format!(
            "unknown module {:?}; available: {}\n",
            module.unwrap_or_default(),
            state.module_names().join(", ")
        );
        log::warn!("{}", msg.trim_end());
        return (StatusCode::BAD_REQUEST, msg).into_response();
    };
    let target = Target::from_param(params.target.as_deref());

    match tokio::task::spawn_blocking(move || render_metrics(&scraper, &target)).await {
        Ok(Ok(body)) => (
            [(header::CONTENT_TYPE, ipmiscope_core::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Ok(Err(e)) => {
            log::error!("failed to encode metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n")).into_response()
        }
        Err(e) => {
            log::error!("scrape task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n")).into_response()
        }
    }
}

async fn handle_collectors(State(state): State<Arc<AppState>>) -> Json<CollectorsResponse> {
    let collectors: Vec<CollectorEntry> = all_collectors(&state.descriptors)
        .iter()
        .map(|c| CollectorEntry {
            name: c.name().to_string(),
            description: c.info().description.to_string(),
            command: c.command().to_string(),
        })
        .collect();
    let total = collectors.len();
    Json(CollectorsResponse { collectors, total })
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        modules: state
            .scrapers
            .iter()
            .map(|(name, scraper)| (name.clone(), scraper.stats()))
            .collect(),
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let collectors: Vec<String> = all_collectors(&state.descriptors)
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let modules = state.module_names();

    Json(serde_json::json!({
        "name": "ipmiscope exporter",
        "version": ipmiscope_core::VERSION,
        "collectors": collectors,
        "modules": modules,
        "endpoints": {
            "/": "This API index",
            "/metrics": {
                "method": "GET",
                "description": "Scrape one BMC and return Prometheus text",
                "params": {
                    "target": "BMC host name or address (default: local BMC)",
                    "module": format!("Collector module. Available: {}", modules.join(", ")),
                }
            },
            "/collectors": "List all collectors and their commands",
            "/health": "Per-collector success and failure totals",
        },
    }))
}

/// Build the axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/metrics", get(handle_metrics))
        .route("/collectors", get(handle_collectors))
        .route("/health", get(handle_health))
        .with_state(Arc::new(state))
}

/// Run the HTTP exporter until Ctrl-C.
pub async fn run_server(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("received Ctrl-C, shutting down"),
        Err(e) => {
            log::error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use ipmiscope_core::{CollectError, CommandSpec, RawResult};

    /// Answers every collector with a fixed, valid response.
    struct FixtureRunner;

    impl CommandRunner for FixtureRunner {
        fn run(&self, command: &CommandSpec, target: &Target) -> Result<RawResult, CollectError> {
            let out = match command.args {
                ["0x0", "0x30", "0x70", "0x0c", "0"] => "rcvd: 0C 00 02",
                ["0x0", "0x30", "0x45", "0x00"] => "rcvd: 45 00 00",
                ["0x0", "0x00", "0x01"] => "rcvd: 01 00 00 00 08",
                ["0x0", "0x00", "0x0f"] => "rcvd: 0F 00 01 05 00 00 00",
                _ => {
                    return Err(CollectError::Execution {
                        program: command.program.to_string(),
                        target: target.name().to_string(),
                        reason: "unsupported".to_string(),
                    });
                }
            };
            Ok(RawResult::from(out))
        }
    }

    fn state() -> Arc<AppState> {
        let config = ExporterConfig::from_json(
            r#"{ "modules": { "oem": { "collectors": ["sm-lan-mode", "sm-fan-mode"] } } }"#,
        )
        .unwrap();
        let state = AppState::with_runner(&config, |_| {
            Arc::new(FixtureRunner) as Arc<dyn CommandRunner>
        })
        .unwrap();
        Arc::new(state)
    }

    fn params(target: Option<&str>, module: Option<&str>) -> Query<MetricsParams> {
        Query(MetricsParams {
            target: target.map(str::to_string),
            module: module.map(str::to_string),
        })
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn metrics_uses_default_module() {
        let response = handle_metrics(State(state()), params(Some("bmc-1"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            ipmiscope_core::CONTENT_TYPE
        );
        let text = body_text(response).await;
        assert!(text.contains("ipmi_config_lan_mode 2\n"));
        assert!(text.contains("ipmi_chassis_cooling_fault 1\n"));
        assert!(text.contains("ipmi_chassis_power_on_seconds_total 300\n"));
        assert!(text.contains("ipmi_up{collector=\"bmc-self-test\"} 0\n"));
        assert!(text.contains(
            "ipmi_exporter_collector_failures_total{collector=\"bmc-self-test\"} 1\n"
        ));
    }

    #[tokio::test]
    async fn metrics_honours_module() {
        let response = handle_metrics(State(state()), params(None, Some("oem"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("ipmi_config_fan_mode 0\n"));
        assert!(!text.contains("ipmi_chassis_power_state"));
        assert_eq!(text.matches("ipmi_up{").count(), 2);
    }

    #[tokio::test]
    async fn unknown_module_is_bad_request() {
        let response = handle_metrics(State(state()), params(None, Some("nope"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let text = body_text(response).await;
        assert!(text.contains("nope"));
        assert!(text.contains("default, oem"));
    }

    #[tokio::test]
    async fn health_reports_per_module_stats() {
        let state = state();
        handle_metrics(State(Arc::clone(&state)), params(None, Some("oem"))).await;
        let Json(health) = handle_health(State(state)).await;
        assert_eq!(health.status, "ok");
        let oem = &health.modules["oem"];
        assert_eq!(oem.len(), 2);
        assert!(oem.iter().all(|s| s.successes == 1 && s.failures == 0));
        assert!(health.modules["default"].iter().all(|s| s.successes == 0));
    }

    #[tokio::test]
    async fn collectors_lists_commands() {
        let Json(list) = handle_collectors(State(state())).await;
        assert_eq!(list.total, 5);
        let lan = list
            .collectors
            .iter()
            .find(|c| c.name == "sm-lan-mode")
            .unwrap();
        assert_eq!(lan.command, "ipmi-raw 0x0 0x30 0x70 0x0c 0");
    }

    #[tokio::test]
    async fn index_lists_modules() {
        let Json(index) = handle_index(State(state())).await;
        assert_eq!(index["version"], ipmiscope_core::VERSION);
        assert_eq!(index["modules"], serde_json::json!(["default", "oem"]));
    }
}
