//! Default command: log in, fetch the selected tables, print them.

use strum::IntoEnumIterator;
use tracing::debug;

use swhub_api::{Category, FetchRequest, RecoveringClient};
use swhub_config::Connection;

use crate::cli::{OutputOpts, Selection};
use crate::config::{build_client, retry_policy};
use crate::error::CliError;
use crate::output;

/// Expand the category flags into a fetch request. `--all` selects every
/// category plus traffic, and so does `--summary` when given on its own.
pub fn request_from(select: &Selection, summary: bool) -> FetchRequest {
    if select.all {
        return everything();
    }

    let flags = [
        (select.status, Category::Status),
        (select.port, Category::Port),
        (select.vlan, Category::Vlan),
        (select.mac, Category::Mac),
        (select.main, Category::Main),
    ];
    let categories: Vec<Category> = flags
        .into_iter()
        .filter_map(|(on, category)| on.then_some(category))
        .collect();
    if summary && categories.is_empty() && !select.traffic {
        return everything();
    }
    FetchRequest::from_categories(&categories, select.traffic)
}

fn everything() -> FetchRequest {
    let every: Vec<Category> = Category::iter().collect();
    FetchRequest::from_categories(&every, true)
}

pub async fn handle(
    request: &FetchRequest,
    conn: &Connection,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    let client = RecoveringClient::new(build_client(conn), retry_policy(conn));
    debug!(
        commands = ?request.commands,
        port_traffic = request.port_traffic,
        "fetching"
    );

    match client.fetch(request).await {
        Ok(result) => {
            let rendered = if opts.summary {
                output::render_summary(&result, output::should_color(opts.color))
            } else {
                output::render_json(&result, opts.pretty)?
            };
            output::print_output(&rendered);
            Ok(())
        }
        Err(err) => {
            if !opts.summary {
                output::print_output(&output::render_error(&err.to_string(), opts.pretty)?);
            }
            Err(err.into())
        }
    }
}
