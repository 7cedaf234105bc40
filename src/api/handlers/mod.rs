//! HTTP request handlers.
//!
//! Handlers are generic over the [`LinkStore`](crate::domain::repositories::LinkStore)
//! behind [`AppState`](crate::state::AppState).

pub mod health;
pub mod links;
pub mod redirect;

pub use health::health_handler;
pub use links::{count_links_handler, create_link_handler, list_links_handler, update_status_handler};
pub use redirect::redirect_handler;
