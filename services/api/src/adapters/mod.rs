pub mod cat_api;
pub mod db;

pub use cat_api::CatApiAdapter;
pub use db::DbAdapter;
