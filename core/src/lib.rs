//! Core of the KinoClub desktop client: data model, API client, session,
//! catalog cache and the filter pipeline. No UI code lives here.

pub mod api;
pub mod cache;
pub mod embed;
pub mod error;
pub mod filter;
pub mod forms;
pub mod models;
pub mod oauth;
pub mod session;
pub mod upload;

pub use api::{ApiClient, DEFAULT_API_URL};
pub use cache::{Catalog, CatalogError, MovieSource, QueryCache, QueryKey};
pub use embed::{Backdrop, VideoEmbed};
pub use error::ApiError;
pub use filter::{available_genres, top_rated, CatalogFilter, SortKey};
pub use models::*;
pub use session::{Session, TokenStore};
