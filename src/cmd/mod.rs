//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`validate`], or [`health`]. Each handler
//! lives in its own submodule.

pub mod health;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::SignpostError;

pub async fn dispatch(cli: Cli) -> Result<(), SignpostError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  signpost v{version} \u{2014} service hostname redirector\n\n  \
         No command provided. To get started:\n\n    \
         signpost run                          Start redirecting on port 80\n    \
         signpost run -p 8080 --pretty         Start on another port with readable logs\n    \
         signpost validate routes.json         Check a custom routes file\n    \
         signpost --help                       See all commands and options\n"
    );
}
