pub mod domain;
pub mod ports;
pub mod views;

pub use domain::{annotate, AnnotatedImage, CatImage, Favourite, PageRequest, Session};
pub use ports::{DatabaseService, ImageGateway, PortError, PortResult};
pub use views::{CatCard, CatFeed, FavouritesView, Tab, Tabs, ToggleAction, PAGE_LIMIT};
