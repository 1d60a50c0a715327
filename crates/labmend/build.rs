use std::fs;
use std::path::Path;

use clap::CommandFactory;

// The CLI definition compiles standalone: cli.rs only needs clap and
// clap_complete, both present as build-dependencies.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("Cargo sets OUT_DIR");
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir).expect("create man output directory");

    render_tree(&cli::Cli::command(), &man_dir);
}

/// Write `<name>.1` for a command, then recurse into its visible
/// subcommands as `<parent>-<sub>`.
fn render_tree(cmd: &clap::Command, dir: &Path) {
    let name = cmd.get_name().to_owned();

    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut page)
        .unwrap_or_else(|e| panic!("man page for `{name}`: {e}"));
    let path = dir.join(format!("{name}.1"));
    fs::write(&path, page).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        render_tree(&sub.clone().name(format!("{name}-{}", sub.get_name())), dir);
    }
}
