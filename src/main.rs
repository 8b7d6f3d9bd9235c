use clap::Parser;
use notion_sync::{
    cmd::{Cmd, Result},
    settings::Settings,
};
use std::{path::PathBuf, process};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(name = env!("CARGO_BIN_NAME"))]
pub struct Cli {
    #[command(subcommand)]
    cmd: Option<Cmd>,

    /// Configuration file to use
    #[arg(short = 'c', global = true, default_value = "settings.toml")]
    config: PathBuf,
}

impl Cli {
    async fn run(self) -> Result {
        dotenvy::dotenv().ok();
        let settings = Settings::new(&self.config)?;

        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(&settings.log))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();

        self.cmd.unwrap_or_default().run(&settings).await
    }
}

#[tokio::main]
async fn main() -> Result {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("error: {:?}", e);
        process::exit(1);
    }

    Ok(())
}
