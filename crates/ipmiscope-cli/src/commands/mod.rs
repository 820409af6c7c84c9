pub mod decode;
pub mod list;
pub mod scrape;
pub mod server;

use std::path::Path;
use std::sync::Arc;

use ipmiscope_core::{
    CollectorName, Descriptors, ExporterConfig, load_config_from_path, lookup_name,
};

/// Load the exporter config, or the built-in default when no path is given.
/// Exits on error.
pub fn load_config(path: Option<&str>) -> ExporterConfig {
    let Some(path) = path else {
        return ExporterConfig::default();
    };
    match load_config_from_path(Path::new(path)) {
        Ok(config) => {
            log::debug!("loaded config from {path}");
            config
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Build the metric descriptor registry. Exits on error.
pub fn make_descriptors() -> Arc<Descriptors> {
    match Descriptors::new() {
        Ok(d) => Arc::new(d),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Parse a comma-separated collector list, rejecting unknown names.
pub fn parse_collector_list(list: &str) -> Result<Vec<CollectorName>, String> {
    let mut names = Vec::new();
    for raw in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match lookup_name(raw) {
            Some(name) if !names.contains(&name) => names.push(name),
            Some(_) => {}
            None => return Err(format!("Unknown collector '{raw}'. Run `ipmiscope list`.")),
        }
    }
    if names.is_empty() {
        return Err("No collectors given".to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_list_keeps_order_and_dedups() {
        let names = parse_collector_list(" poh-counter,sm-lan-mode , poh-counter").unwrap();
        let names: Vec<_> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["poh-counter", "sm-lan-mode"]);
    }

    #[test]
    fn collector_list_rejects_unknown() {
        let err = parse_collector_list("sm-lan-mode,dcmi").unwrap_err();
        assert!(err.contains("dcmi"));
        assert!(parse_collector_list(" , ").is_err());
    }

    #[test]
    fn missing_config_path_gives_default() {
        let config = load_config(None);
        assert_eq!(config, ExporterConfig::default());
    }
}
