use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(version, name = "HealthHub", bin_name = "health-server")]
struct Args {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print out the resolved config")]
    Config(commands::ConfigArgs),
    #[command(about = "Start the server")]
    Serve(commands::ServeArgs),
}

#[tokio::main]
async fn main() {
    health_server::set_logger();

    let args = Args::parse();

    let result = match args.cmd {
        Commands::Config(args) => commands::handle_config(args).await,
        Commands::Serve(args) => commands::handle_serve(args).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
