pub mod init;
pub mod task;

use crate::libs::config::{Config, UserConfig, USER_ENV_VAR};
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_print};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Create, edit, list and delete tasks")]
    Task(task::TaskArgs),
    #[command(about = "Show the active user")]
    Whoami,
}

/// Options shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Act as this user instead of the configured one
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Keep tasks in memory only; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

impl GlobalArgs {
    /// The active user, or an error telling how to set one.
    pub fn current_user(&self, config: &Config) -> Result<UserConfig> {
        let env = std::env::var(USER_ENV_VAR).ok();
        match config.resolve_user(self.user.as_deref(), env.as_deref()) {
            Some(user) => Ok(user),
            None => msg_bail_anyhow!(Message::UserNotConfigured),
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Task(args) => task::cmd(args, &cli.global),
            Commands::Whoami => {
                let user = cli.global.current_user(&Config::read()?)?;
                msg_print!(Message::Welcome(user.display_name().to_string()));
                Ok(())
            }
        }
    }
}
