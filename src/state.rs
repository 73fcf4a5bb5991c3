use std::sync::Arc;

use crate::config::Config;
use crate::mail::Mailer;
use crate::store::{CartStore, OrderStore, ProductStore, SearchStore, UserStore};

/// Shared application state: configuration plus the collaborator
/// interfaces every handler talks to.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub searches: Arc<dyn SearchStore>,
    pub mailer: Arc<dyn Mailer>,
}
