//! crates/cats_core/src/views.rs
//!
//! Client-side state for the two browsing tabs: the endless "all cats" feed
//! and the favourites list. Nothing here performs I/O; callers run the
//! requests these types ask for and feed the results back in.

use crate::domain::{AnnotatedImage, Favourite, PageRequest, DEFAULT_LIMIT};
use std::collections::{HashMap, HashSet};

/// Page size requested by the feed. A shorter page marks the end of the list.
pub const PAGE_LIMIT: u32 = DEFAULT_LIMIT;

//=========================================================================================
// Tabs
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    AllCats,
    Favourites,
}

#[derive(Debug, Default)]
pub struct Tabs {
    active: Tab,
}

impl Tabs {
    pub fn active(&self) -> Tab {
        self.active
    }

    /// Activates `tab`. Returns `true` if the active tab changed.
    pub fn switch(&mut self, tab: Tab) -> bool {
        let changed = self.active != tab;
        self.active = tab;
        changed
    }
}

//=========================================================================================
// All Cats Feed
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatCard {
    pub id: String,
    pub url: String,
    pub is_favorite: bool,
    /// Row id of the favourite, needed to remove it again.
    pub favourite_id: Option<i64>,
}

/// What a heart click should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    Add { image_id: String },
    Remove { favourite_id: i64 },
}

#[derive(Debug)]
pub struct CatFeed {
    cards: Vec<CatCard>,
    seen: HashSet<String>,
    page: u32,
    loading: bool,
    has_more: bool,
}

impl Default for CatFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl CatFeed {
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            seen: HashSet::new(),
            page: 0,
            loading: false,
            has_more: true,
        }
    }

    pub fn cards(&self) -> &[CatCard] {
        &self.cards
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// The initial fetch, issued when the tab is first shown.
    pub fn start(&mut self) -> Option<PageRequest> {
        if self.loading {
            return None;
        }
        self.loading = true;
        Some(PageRequest::new(self.page, PAGE_LIMIT))
    }

    /// Called when the last rendered card scrolls into view.
    pub fn on_last_card_visible(&mut self) -> Option<PageRequest> {
        if self.loading || !self.has_more {
            return None;
        }
        self.page += 1;
        self.loading = true;
        Some(PageRequest::new(self.page, PAGE_LIMIT))
    }

    /// Merges a fetched page. `favourites` is the session's current favourites
    /// list, used to attach row ids to already-favourited images.
    pub fn apply_page(&mut self, images: Vec<AnnotatedImage>, favourites: &[Favourite]) {
        let fav_ids: HashMap<&str, i64> = favourites
            .iter()
            .map(|f| (f.image_id.as_str(), f.id))
            .collect();

        let received = images.len();
        for img in images {
            if !self.seen.insert(img.id.clone()) {
                continue;
            }
            let favourite_id = fav_ids.get(img.id.as_str()).copied();
            self.cards.push(CatCard {
                id: img.id,
                url: img.url,
                is_favorite: img.is_favorite,
                favourite_id,
            });
        }

        if received < PAGE_LIMIT as usize {
            self.has_more = false;
        }
        self.loading = false;
    }

    /// A failed fetch leaves the cards as they were.
    pub fn fail_page(&mut self) {
        self.loading = false;
    }

    pub fn toggle(&self, image_id: &str) -> Option<ToggleAction> {
        let card = self.cards.iter().find(|c| c.id == image_id)?;
        if card.is_favorite {
            card.favourite_id
                .map(|favourite_id| ToggleAction::Remove { favourite_id })
        } else {
            Some(ToggleAction::Add {
                image_id: card.id.clone(),
            })
        }
    }

    pub fn favourite_added(&mut self, image_id: &str, favourite_id: i64) {
        if let Some(card) = self.cards.iter_mut().find(|c| c.id == image_id) {
            card.is_favorite = true;
            card.favourite_id = Some(favourite_id);
        }
    }

    pub fn favourite_removed(&mut self, image_id: &str) {
        if let Some(card) = self.cards.iter_mut().find(|c| c.id == image_id) {
            card.is_favorite = false;
            card.favourite_id = None;
        }
    }
}

//=========================================================================================
// Favourites Tab
//=========================================================================================

#[derive(Debug, Default)]
pub struct FavouritesView {
    entries: Vec<Favourite>,
}

impl FavouritesView {
    pub fn entries(&self) -> &[Favourite] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` when the caller should refetch the list.
    pub fn on_tab_changed(&self, active: Tab) -> bool {
        active == Tab::Favourites
    }

    pub fn replace(&mut self, entries: Vec<Favourite>) {
        self.entries = entries;
    }

    /// Drops a row after the server confirmed its deletion.
    pub fn removed(&mut self, favourite_id: i64) {
        self.entries.retain(|f| f.id != favourite_id);
    }
}
