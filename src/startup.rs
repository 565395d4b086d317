//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;

use crate::application::presence::PresenceRegistry;
use crate::application::router::MessageRouter;
use crate::config::Settings;
use crate::domain::{FriendshipRepository, MessageRepository, UserRepository};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    PgFriendshipRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::tcp::listener;

/// Application state shared across sessions.
///
/// The persistence gateway is held as trait objects so tests can inject
/// in-memory implementations; the presence registry is owned here and
/// injected into every session, never a global.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub friendships: Arc<dyn FriendshipRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub registry: Arc<PresenceRegistry>,
    pub router: MessageRouter,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Assemble application state over a persistence gateway.
    pub fn new(
        users: Arc<dyn UserRepository>,
        friendships: Arc<dyn FriendshipRepository>,
        messages: Arc<dyn MessageRepository>,
        settings: Settings,
    ) -> Self {
        let registry = Arc::new(PresenceRegistry::new());
        let router = MessageRouter::new(messages.clone(), registry.clone());
        Self {
            users,
            friendships,
            messages,
            registry,
            router,
            settings: Arc::new(settings),
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application from settings: connect the database pool and
    /// bind the listener. A bind failure aborts startup.
    pub async fn build(settings: Settings) -> Result<Self> {
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        let state = AppState::new(
            Arc::new(PgUserRepository::new(db.clone())),
            Arc::new(PgFriendshipRepository::new(db.clone())),
            Arc::new(PgMessageRepository::new(db)),
            settings,
        );

        Self::bind(state).await
    }

    /// Bind the listener for an already-assembled state. Used directly by
    /// tests with in-memory gateways.
    pub async fn bind(state: AppState) -> Result<Self> {
        let addr = state.settings.server_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %addr, "Listening");

        Ok(Self { listener, state })
    }

    /// Run the accept loop until the process is terminated.
    pub async fn run_until_stopped(self) -> Result<()> {
        listener::run(self.listener, self.state).await;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
