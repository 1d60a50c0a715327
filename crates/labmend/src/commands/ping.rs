//! `ping` — verify controller reachability and report its version.

use labmend_api::ControllerClient;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(client: &ControllerClient, global: &GlobalOpts) -> Result<(), CliError> {
    let info = client.version().await?;

    let out = output::render_single(
        &global.output,
        &info,
        |v| {
            format!(
                "controller {} ({}) at {}, project {}",
                v.version,
                if v.local { "local" } else { "remote" },
                client.base_url(),
                client.project_id()
            )
        },
        |v| v.version.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
