use health_server::{Server, shutdown_signal};

#[derive(clap::Args)]
pub struct ServeArgs {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn handle_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = healthhub_config::Config::new(args.config)?;
    let server = Server::new(config, args.port);
    let port = server.run_with_shutdown(shutdown_signal()).await?;
    tracing::info!(port, "server_stopped");
    Ok(())
}
