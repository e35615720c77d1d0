//! services/api/src/bin/browse.rs
//!
//! A terminal front end for the cats API. It scrolls through the "all cats"
//! feed, optionally toggles favourites, then shows the favourites tab.
//!
use api_lib::{client::CatsClient, error::ApiError};
use cats_core::{
    domain::PageRequest,
    ports::PortResult,
    views::{CatFeed, FavouritesView, Tab, Tabs, ToggleAction},
};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terminal front end for the cats API
#[derive(Parser, Debug)]
#[command(name = "browse", about = "Scroll through cats and manage favourites")]
struct Cli {
    /// Number of feed pages to load
    #[arg(default_value_t = 3)]
    pages: u32,

    /// Image id whose heart to click; may be repeated
    #[arg(long = "toggle", value_name = "IMAGE_ID")]
    toggles: Vec<String>,

    /// Base URL of the REST API
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:3000")]
    api_base_url: String,
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let client = CatsClient::new(args.api_base_url.trim_end_matches('/'))?;
    let session_id = client.welcome().await?;
    info!("Browsing as session {}", session_id);

    let mut tabs = Tabs::default();
    let mut feed = CatFeed::new();

    // --- All cats tab: first page, then keep "scrolling" ---
    if let Some(page) = feed.start() {
        load_page(&client, &mut feed, page).await;
    }
    for _ in 1..args.pages {
        match feed.on_last_card_visible() {
            Some(page) => load_page(&client, &mut feed, page).await,
            None => {
                info!("No more cats to load.");
                break;
            }
        }
    }
    for card in feed.cards() {
        let heart = if card.is_favorite { "♥" } else { "♡" };
        println!("{} {} {}", heart, card.id, card.url);
    }

    // --- Heart clicks ---
    for image_id in &args.toggles {
        if let Err(e) = toggle(&client, &mut feed, image_id).await {
            error!("Failed to toggle {}: {}", image_id, e);
        }
    }

    // --- Favourites tab ---
    let mut favourites = FavouritesView::default();
    if tabs.switch(Tab::Favourites) && favourites.on_tab_changed(tabs.active()) {
        match client.list_favourites().await {
            Ok(list) => favourites.replace(list),
            Err(e) => error!("Failed to fetch favourites: {}", e),
        }
    }
    if favourites.is_empty() {
        println!("No favourite cats yet.");
    }
    for fav in favourites.entries() {
        println!("#{} {} {} ({})", fav.id, fav.image_id, fav.url, fav.created_at);
    }

    Ok(())
}

async fn load_page(client: &CatsClient, feed: &mut CatFeed, page: PageRequest) {
    let result = async {
        let images = client.list_images(page).await?;
        let favourites = client.list_favourites().await?;
        PortResult::Ok((images, favourites))
    }
    .await;

    match result {
        Ok((images, favourites)) => {
            info!("Loaded page {} ({} images)", page.page, images.len());
            feed.apply_page(images, &favourites);
        }
        Err(e) => {
            error!("Error fetching cats or favourites: {}", e);
            feed.fail_page();
        }
    }
}

async fn toggle(client: &CatsClient, feed: &mut CatFeed, image_id: &str) -> PortResult<()> {
    match feed.toggle(image_id) {
        Some(ToggleAction::Add { image_id }) => {
            let favourite = client.add_favourite(&image_id).await?;
            feed.favourite_added(&image_id, favourite.id);
            println!("♥ {} added as #{}", image_id, favourite.id);
        }
        Some(ToggleAction::Remove { favourite_id }) => {
            client.remove_favourite(favourite_id).await?;
            feed.favourite_removed(image_id);
            println!("♡ {} removed", image_id);
        }
        None => warn!("{} is not a loaded cat, or its favourite id is unknown", image_id),
    }
    Ok(())
}
