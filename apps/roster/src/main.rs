use std::{num::NonZeroUsize, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{
    GraphqlPageSource, PageSource, PaginationController, StaticPageSource, WindowView,
};
use shared::domain::{Volunteer, VolunteerId};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, DEFAULT_CONFIG_PATH};

/// Browse the volunteer roster page by page.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// GraphQL endpoint; overrides the settings file and environment.
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    page_size: Option<NonZeroUsize>,
    /// Sort requests applied in order; repeating a key flips its direction.
    #[arg(long = "sort")]
    sorts: Vec<String>,
    /// Volunteer ids to toggle before browsing.
    #[arg(long = "toggle")]
    toggles: Vec<i64>,
    /// Serve an in-memory roster of this many volunteers instead of the endpoint.
    #[arg(long)]
    demo: Option<usize>,
    /// Zero-based pages to visit, in order.
    #[arg(default_values_t = [0usize])]
    pages: Vec<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint_url = endpoint;
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }

    let source: Arc<dyn PageSource<Volunteer>> = match args.demo {
        Some(count) => {
            info!(count, "roster: serving in-memory demo roster");
            Arc::new(
                StaticPageSource::new(demo_roster(count), settings.page_size.get())
                    .with_overlap(1),
            )
        }
        None => {
            info!(endpoint = %settings.endpoint_url, "roster: using graphql endpoint");
            Arc::new(GraphqlPageSource::with_timeout(
                &settings.endpoint_url,
                settings.request_timeout(),
            )?)
        }
    };
    let controller = PaginationController::new_with_shared_source(source, settings.page_size);

    if settings.sort_key != client_core::sort::DEFAULT_SORT_KEY {
        controller.set_sort(&settings.sort_key).await;
    }
    for key in &args.sorts {
        controller.set_sort(key).await;
    }
    for id in args.toggles {
        controller.toggle_select(VolunteerId(id)).await;
    }

    for page in args.pages {
        match controller.goto_page(page).await {
            Ok(()) => {
                let sort = controller.sort_state().await;
                let total_pages = controller.total_pages().await.unwrap_or(1);
                let view = controller.visible_window().await;
                println!(
                    "page {}/{total_pages} ({}) sorted by {} {:?}",
                    page + 1,
                    view.range_label(),
                    sort.key,
                    sort.direction,
                );
                print_window(&view);
            }
            Err(err) => {
                error!(page, "roster: navigation failed: {err}");
                println!("An error occurred while retrieving volunteers: {err}");
            }
        }
    }

    let selected = controller.selection().await;
    if !selected.is_empty() {
        let ids: Vec<String> = selected.iter().map(ToString::to_string).collect();
        println!("{} selected: {}", selected.len(), ids.join(", "));
    }

    Ok(())
}

fn print_window(view: &WindowView<Volunteer>) {
    for row in &view.rows {
        let mark = if row.selected { "[x]" } else { "[ ]" };
        println!(
            "  {mark} {:>6}  {:<32} {}",
            row.item.id.0,
            row.item.full_name(),
            row.item.email.as_deref().unwrap_or("-")
        );
    }
}

fn demo_roster(count: usize) -> Vec<Volunteer> {
    const FIRST: [&str; 6] = ["Ada", "Alan", "Grace", "Edsger", "Barbara", "Donald"];
    const LAST: [&str; 6] = ["Lovelace", "Turing", "Hopper", "Dijkstra", "Liskov", "Knuth"];
    (0..count)
        .map(|index| {
            let first = FIRST[index % FIRST.len()];
            let last = LAST[(index * 5 + 1) % LAST.len()];
            Volunteer {
                id: VolunteerId(index as i64 + 1),
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: Some(format!("{first}.{last}@example.org").to_ascii_lowercase()),
            }
        })
        .collect()
}
