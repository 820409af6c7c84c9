//! CLI for ipmiscope: inspect, scrape and export IPMI collectors.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ipmiscope")]
#[command(about = "ipmiscope: BMC metrics through FreeIPMI raw commands")]
#[command(version = ipmiscope_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all collectors with their commands and the metrics they emit
    List,

    /// Run one scrape against a BMC and print the samples and failures
    Scrape {
        /// BMC host name or address (default: local BMC via the in-band driver)
        #[arg(long)]
        target: Option<String>,

        /// Module from the config file (default: "default")
        #[arg(long)]
        module: Option<String>,

        /// Comma-separated collector names, overriding the module's list
        #[arg(long)]
        collectors: Option<String>,

        /// Path to a JSON exporter config
        #[arg(long)]
        config: Option<String>,

        /// Output format
        #[arg(long, default_value = "table", value_parser = ["table", "prometheus"])]
        format: String,
    },

    /// Decode a captured ipmi-raw response offline and run one collector on it
    Decode {
        /// Collector to run (see `ipmiscope list`)
        #[arg(long)]
        collector: String,

        /// Raw response, e.g. `rcvd: 0C 00 01`
        #[arg(required = true, num_args = 1..)]
        raw: Vec<String>,
    },

    /// Start the HTTP exporter
    Server {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "9290")]
        port: u16,

        /// Path to a JSON exporter config
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => commands::list::run(),
        Commands::Scrape {
            target,
            module,
            collectors,
            config,
            format,
        } => commands::scrape::run(commands::scrape::ScrapeCommandConfig {
            target: target.as_deref(),
            module: module.as_deref(),
            collectors: collectors.as_deref(),
            config_path: config.as_deref(),
            format: &format,
        }),
        Commands::Decode { collector, raw } => commands::decode::run(&collector, &raw),
        Commands::Server { host, port, config } => {
            commands::server::run(&host, port, config.as_deref())
        }
    }
}
