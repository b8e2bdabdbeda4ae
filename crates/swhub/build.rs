use std::fs;
use std::path::Path;

use clap::CommandFactory;

// Pull in cli.rs directly -- it only depends on clap + clap_complete, so the
// man pages can be rendered without building the rest of the binary.
#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn main() {
    // Re-run if the CLI definitions change.
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("OUT_DIR not set by Cargo");
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir).expect("failed to create man output directory");

    for page in man_pages(cli::Cli::command()) {
        let name = page.get_name().to_owned();
        let path = man_dir.join(format!("{name}.1"));

        let mut buf = Vec::new();
        clap_mangen::Man::new(page)
            .render(&mut buf)
            .unwrap_or_else(|e| panic!("failed to render man page for `{name}`: {e}"));
        fs::write(&path, buf).unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    }
}

/// `swhub` itself plus one `swhub-<sub>` page per visible subcommand.
fn man_pages(root: clap::Command) -> Vec<clap::Command> {
    let prefix = root.get_name().to_owned();
    let subs: Vec<clap::Command> = root
        .get_subcommands()
        .filter(|sub| !sub.is_hide_set())
        .map(|sub| sub.clone().name(format!("{prefix}-{}", sub.get_name())))
        .collect();

    let mut pages = vec![root];
    pages.extend(subs);
    pages
}
