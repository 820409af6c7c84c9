use ipmiscope_server::AppState;

pub fn run(host: &str, port: u16, config_path: Option<&str>) {
    let config = super::load_config(config_path);
    let state = match AppState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let base = format!("http://{host}:{port}");
    let modules = state.module_names();

    println!("ipmiscope exporter v{}", ipmiscope_core::VERSION);
    println!("   {base}");
    println!("   modules: {}", modules.join(", "));
    println!();
    println!("   Endpoints:");
    println!("     GET /                 API index");
    println!("     GET /metrics          Scrape a BMC (Prometheus text)");
    println!("     GET /collectors       List collectors and their commands");
    println!("     GET /health           Per-collector success/failure totals");
    println!();
    println!("   Query params for /metrics:");
    println!("     target=<host>         BMC to scrape (default: local BMC)");
    println!("     module=<name>         Collector module (default: default)");
    println!();
    println!("   Examples:");
    println!("     curl {base}/metrics");
    println!(
        "     curl '{base}/metrics?target=10.0.0.17&module={}'",
        modules.first().map(String::as_str).unwrap_or(ipmiscope_core::DEFAULT_MODULE)
    );
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: cannot start runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(ipmiscope_server::run_server(state, host, port)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
