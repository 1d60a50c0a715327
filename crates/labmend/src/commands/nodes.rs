//! `nodes` — start and stop lab devices by name.

use labmend_api::ControllerClient;

use crate::cli::{GlobalOpts, NodesArgs, NodesCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    client: &ControllerClient,
    args: NodesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NodesCommand::Start { name } => {
            let id = util::resolve_node(client, &name).await?;
            client.start_node(id.as_str()).await?;
            if !global.quiet {
                eprintln!("✓ start requested for '{name}'");
            }
        }
        NodesCommand::Stop { name } => {
            let id = util::resolve_node(client, &name).await?;
            client.stop_node(id.as_str()).await?;
            if !global.quiet {
                eprintln!("✓ stop requested for '{name}'");
            }
        }
        NodesCommand::StartAll => {
            client.start_all_nodes().await?;
            if !global.quiet {
                eprintln!("✓ start requested for every node in the project");
            }
        }
        NodesCommand::StopAll => {
            client.stop_all_nodes().await?;
            if !global.quiet {
                eprintln!("✓ stop requested for every node in the project");
            }
        }
    }
    Ok(())
}
