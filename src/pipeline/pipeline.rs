// src/pipeline/pipeline.rs

use crate::error::Result;
use crate::utils::log::{header, step, summary};

use super::mirror::{Mirror, PostSource};

/// Run the full pipeline: list, scrape everything listed, rebuild the index.
pub async fn run_pipeline(mirror: &Mirror, skip_list: bool) -> Result<()> {
    let config = mirror.config();
    header(&format!("Mirroring space {}", config.server.space));

    let total_steps = if skip_list { 1 } else { 2 };
    let mut current_step = 1;

    if !skip_list {
        step(current_step, total_steps, "List - Collecting blog post ids");
        let listing = &config.listing;
        let report = mirror
            .list_posts(listing.start, listing.end, listing.merge)
            .await?;
        log::info!("Listed {} posts on {} page(s)", report.entries, report.pages);
        current_step += 1;
    }

    step(
        current_step,
        total_steps,
        "Scrape - Exporting posts and rebuilding index.html",
    );
    let batch = mirror.scrape_items(PostSource::DefaultIndex).await?;

    summary(
        "Pipeline",
        &[
            ("Root", mirror.storage().root().display().to_string()),
            ("Exported", batch.scraped.len().to_string()),
            ("Failed", (batch.failures.len() + batch.invalid.len()).to_string()),
        ],
    );

    Ok(())
}
