use anyhow::{Context, Result};
use hibo::{Dashboard, server};
use log::{error, info};
use std::path::PathBuf;
use structopt::StructOpt;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, StructOpt)]
#[structopt(name = "hibo", about = "Serve a dashboard of boxes from a JSON or YAML file")]
struct Opt {
    /// Address to bind, as host or host:port (default: localhost:8000)
    #[structopt(long)]
    bind: Option<String>,

    /// Dashboard configuration file (.json, .yaml or .yml)
    #[structopt(long, parse(from_os_str))]
    conf: PathBuf,
}

fn split_bind(bind: Option<&str>) -> Result<(String, u16)> {
    let address = bind.unwrap_or(DEFAULT_HOST);
    match address.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .with_context(|| format!("Invalid port in bind address '{}'", address))?;
            Ok((host.to_string(), port))
        }
        None => Ok((address.to_string(), DEFAULT_PORT)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = Opt::from_args();
    let (host, port) = split_bind(opt.bind.as_deref())?;

    let dashboard = match Dashboard::load(&opt.conf) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("Refusing to start: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "Dashboard from {} has {} boxes",
        opt.conf.display(),
        dashboard.boxes().len()
    );

    let app = server::build_router(server::AppState::new(dashboard));
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Cannot bind {}:{}", host, port))?;
    info!("hibo listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
