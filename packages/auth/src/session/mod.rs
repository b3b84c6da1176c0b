// ABOUTME: Session module: the multi-account SessionManager and its collaborators
// ABOUTME: Includes provider traits, the HTTP identity client, snapshot cache, settings and clock

pub mod cache;
pub mod client;
pub mod clock;
pub mod manager;
pub mod provider;
pub mod settings;
pub mod types;

pub use cache::SessionCache;
pub use client::{HttpIdentityClient, IdentityClientConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{SessionManager, SessionManagerBuilder};
pub use provider::{ProfileService, TokenExchange};
pub use settings::SessionSettings;
pub use types::{
    AccountSummary, ActiveSession, RemoveOutcome, SessionSnapshot, SubscriberProfile, TokenGrant,
    TokenSet,
};
