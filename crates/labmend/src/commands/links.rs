//! `links` — list links and delete strays by id.

use labmend_api::ControllerClient;

use crate::cli::{GlobalOpts, LinksArgs, LinksCommand, TopologyArgs};
use crate::error::CliError;

use super::{topology, util};

pub async fn handle(
    client: &ControllerClient,
    args: LinksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LinksCommand::List => topology::handle(client, TopologyArgs { links: true }, global).await,
        LinksCommand::Delete { link_id } => {
            let prompt = format!("Delete link '{link_id}'?");
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            client.delete_link(&link_id).await?;
            if !global.quiet {
                eprintln!("✓ link {link_id} deleted");
            }
            Ok(())
        }
    }
}
