//! Command dispatch: bridges CLI args -> engine calls -> output formatting.

pub mod apply;
pub mod catalog;
pub mod config_cmd;
pub mod links;
pub mod nodes;
pub mod ping;
pub mod plan;
pub mod topology;
pub mod util;

use std::path::PathBuf;

use labmend_api::ControllerClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &ControllerClient,
    catalog_path: Option<PathBuf>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Plan => plan::handle(client, catalog_path, global).await,
        Command::Apply => apply::handle(client, catalog_path, global).await,
        Command::Topology(args) => topology::handle(client, args, global).await,
        Command::Nodes(args) => nodes::handle(client, args, global).await,
        Command::Links(args) => links::handle(client, args, global).await,
        Command::Ping => ping::handle(client, global).await,
        // Config, Catalog, and Completions are handled before dispatch
        Command::Config(_) | Command::Catalog(_) | Command::Completions(_) => unreachable!(),
    }
}
