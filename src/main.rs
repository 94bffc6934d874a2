use anyhow::Result;
use taskdesk::commands::Cli;
use taskdesk::libs::messages::macros::init_tracing;

fn main() -> Result<()> {
    init_tracing();
    Cli::menu()
}
