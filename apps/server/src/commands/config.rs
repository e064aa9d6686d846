#[derive(clap::Args)]
pub struct ConfigArgs {
    #[arg(short, long)]
    pub config: Option<String>,
    /// Print the JSON schema instead of the resolved values.
    #[arg(long)]
    pub schema: bool,
}

pub async fn handle_config(args: ConfigArgs) -> anyhow::Result<()> {
    let rendered = if args.schema {
        serde_json::to_string_pretty(&healthhub_config::Config::schema())?
    } else {
        let config = healthhub_config::Config::new(args.config)?;
        serde_json::to_string_pretty(&config)?
    };

    println!("{}", rendered);
    Ok(())
}
