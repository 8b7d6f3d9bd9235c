use crate::settings::Settings;

pub mod check;
pub mod sync;
pub mod validate;

pub type Result<T = ()> = anyhow::Result<T>;

#[derive(Debug, clap::Subcommand)]
pub enum Cmd {
    Sync(sync::Cmd),
    Validate(validate::Cmd),
    Check(check::Cmd),
}

impl Default for Cmd {
    fn default() -> Self {
        Self::Sync(sync::Cmd::default())
    }
}

impl Cmd {
    pub async fn run(&self, settings: &Settings) -> Result {
        match self {
            Self::Sync(cmd) => cmd.run(settings).await,
            Self::Validate(cmd) => cmd.run(settings).await,
            Self::Check(cmd) => cmd.run(settings),
        }
    }
}

pub fn print_json<T: ?Sized + serde::Serialize>(value: &T) -> Result {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn rule(width: usize) {
    println!("{}", "=".repeat(width));
}
