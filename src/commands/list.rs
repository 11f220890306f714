//! List published posts

use anyhow::Result;

use crate::content::PostSummary;
use crate::helpers::format_date;
use crate::listing::{ListingController, ListingState};
use crate::Blog;

/// Walk the listing page by page until the source runs out of cursors
pub async fn collect_posts(controller: &ListingController) -> Result<ListingState> {
    let mut listing = controller.first_page(None).await?;
    while listing.has_more() {
        listing = controller.load_more(&listing).await?;
    }
    Ok(listing)
}

fn describe(post: &PostSummary, blog: &Blog) -> String {
    let date = post
        .first_publication_date
        .as_ref()
        .map(|date| format_date(date, "YYYY-MM-DD", &blog.config.language, &blog.config.timezone))
        .unwrap_or_else(|| "----------".to_string());
    format!("  {} - {} [{}]", date, post.title, post.uid)
}

/// List every post the content source publishes
pub async fn run(blog: &Blog) -> Result<()> {
    let controller = ListingController::new(blog.content_source()?, blog.config.page_size());
    let listing = collect_posts(&controller).await?;

    println!("Posts ({}):", listing.posts().len());
    for post in listing.posts() {
        println!("{}", describe(post, blog));
    }

    Ok(())
}
