use std::sync::Arc;

use ipmiscope_core::{Scraper, Target, collectors_by_name, encode_text};

pub struct ScrapeCommandConfig<'a> {
    pub target: Option<&'a str>,
    pub module: Option<&'a str>,
    pub collectors: Option<&'a str>,
    pub config_path: Option<&'a str>,
    pub format: &'a str,
}

pub fn run(cfg: ScrapeCommandConfig<'_>) {
    let config = super::load_config(cfg.config_path);
    let Some(module) = config.module(cfg.module) else {
        eprintln!(
            "Unknown module '{}'. Available: {}",
            cfg.module.unwrap_or_default(),
            config.module_names().join(", ")
        );
        std::process::exit(1);
    };

    let names: Vec<String> = match cfg.collectors {
        Some(list) => match super::parse_collector_list(list) {
            Ok(names) => names.iter().map(|n| n.to_string()).collect(),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => module.collectors.clone(),
    };

    let descriptors = super::make_descriptors();
    let scraper = Scraper::new(
        collectors_by_name(&names, &descriptors),
        Arc::new(config.runner_for(&module)),
        descriptors,
    )
    .with_max_concurrency(config.max_concurrency);

    let target = Target::from_param(cfg.target);
    log::info!("scraping {target} with {} collector(s)", scraper.collector_count());
    let report = scraper.scrape(std::slice::from_ref(&target));

    if cfg.format == "prometheus" {
        match encode_text(&report.samples) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("Target: {target}\n");
        println!(
            "  {:<4} {:<16} {:>9} {:>8}  Error",
            "", "Collector", "Time", "Samples"
        );
        println!("  {}", "-".repeat(60));
        for o in &report.outcomes {
            let mark = if o.is_success() { "ok" } else { "FAIL" };
            let error = o
                .error
                .as_ref()
                .map(|e| format!("[{}] {e}", e.kind()))
                .unwrap_or_default();
            println!(
                "  {:<4} {:<16} {:>7.1}ms {:>8}  {}",
                mark,
                o.collector,
                o.duration.as_secs_f64() * 1000.0,
                o.emitted,
                error
            );
        }

        println!("\nSamples:\n");
        for s in report
            .samples
            .iter()
            .filter(|s| s.fq_name() != "ipmi_collector_duration_seconds")
        {
            let labels: Vec<String> = s.labels().map(|(k, v)| format!("{k}=\"{v}\"")).collect();
            let name = if labels.is_empty() {
                s.fq_name().to_string()
            } else {
                format!("{}{{{}}}", s.fq_name(), labels.join(","))
            };
            println!("  {name:<56} {}", s.value());
        }
        println!(
            "\n{} ok, {} failed",
            report.successes(),
            report.failures()
        );
    }

    if report.failures() > 0 {
        std::process::exit(1);
    }
}
