//! `topology` — render the live lab snapshot as nodes or links.

use std::collections::HashSet;

use serde::Serialize;
use tabled::Tabled;

use labmend_api::ControllerClient;
use labmend_core::{LinkEndpoint, NodeId, TopologyModel};

use crate::cli::{GlobalOpts, TopologyArgs};
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Tabled)]
struct NodeView {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Links")]
    links: usize,
    #[tabled(rename = "Isolated")]
    isolated: String,
}

#[derive(Clone, Serialize, Tabled)]
struct LinkView {
    #[tabled(rename = "Link")]
    id: String,
    #[tabled(rename = "Endpoint A")]
    a: String,
    #[tabled(rename = "Endpoint B")]
    b: String,
}

/// `"SW-LAN 0/1"`, falling back to the raw node id when the endpoint
/// references a node the snapshot does not know (mid-change races).
fn endpoint_label(model: &TopologyModel, ep: &LinkEndpoint) -> String {
    let name = model
        .node(&ep.node)
        .map_or_else(|| ep.node.as_str().to_owned(), |n| n.name.clone());
    format!("{name} {}", ep.addr)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &ControllerClient,
    args: TopologyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let model = labmend_core::observe(client).await?;

    if args.links {
        let views: Vec<LinkView> = model
            .links()
            .iter()
            .map(|l| LinkView {
                id: l.id.as_str().to_owned(),
                a: endpoint_label(&model, &l.a),
                b: endpoint_label(&model, &l.b),
            })
            .collect();
        let out = output::render_list(&global.output, &views, Clone::clone, |v| v.id.clone());
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let isolated: HashSet<&NodeId> = model.isolated_nodes().iter().map(|n| &n.id).collect();
    let mut views: Vec<NodeView> = model
        .nodes()
        .map(|n| NodeView {
            name: n.name.clone(),
            kind: n.kind.to_string(),
            status: n.status.to_string(),
            links: model.degree(&n.id),
            isolated: if isolated.contains(&n.id) { "yes" } else { "" }.to_owned(),
        })
        .collect();
    views.sort_by(|x, y| x.name.cmp(&y.name));

    let out = output::render_list(&global.output, &views, Clone::clone, |v| v.name.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
