use anyhow::Result;
use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = argo_sub::config::Cli::parse();
    let cmd = cli.command.clone().unwrap_or(argo_sub::config::Command::Run);

    match cmd {
        argo_sub::config::Command::Run => {
            init_tracing();
            run_server(cli.config).await
        }
        argo_sub::config::Command::PrintConfig => print_config(&cli.config),
        argo_sub::config::Command::PrintLinks(args) => {
            print_links(&cli.config, args.raw);
            Ok(())
        }
    }
}

fn print_config(config: &argo_sub::config::Config) -> Result<()> {
    let doc = argo_sub::xray::builder::build_server_config(config);
    println!("{}", doc.to_json_pretty()?);
    Ok(())
}

fn print_links(config: &argo_sub::config::Config, raw: bool) {
    if raw {
        print!("{}", argo_sub::subscription::build_raw_text(config));
    } else {
        println!("{}", argo_sub::subscription::build_base64(config));
    }
}

async fn run_server(config: argo_sub::config::Config) -> Result<()> {
    let config = Arc::new(config);
    if !config.uuid_is_well_formed() {
        warn!(uuid = %config.uuid, "UUID is not UUID-formatted; vless/vmess clients will reject it");
    }

    let server_doc = argo_sub::xray::builder::build_server_config(&config);
    debug!(config = %server_doc.to_json_pretty()?, "xray server config");

    let app = argo_sub::http::build_router(config.clone()).layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        bind = %addr,
        sub_path = %config.sub_route(),
        "starting argo-sub"
    );

    // Detached: a slow or hung notification must never hold up serving.
    let client = argo_sub::notify::build_client()?;
    let _notify = argo_sub::notify::spawn_startup_tasks(config.clone(), client);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).compact().init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
