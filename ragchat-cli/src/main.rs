use clap::Parser;
use ragchat_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; variables may come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    ragchat_telemetry::init_telemetry("ragchat", cli.log_format)?;
    ragchat_cli::run(cli).await
}
