// ABOUTME: dorxl session library: linked subscriber accounts and their live tokens
// ABOUTME: Token exchange, profile lookup, encrypted session snapshot, and the SessionManager

pub mod error;
pub mod session;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use session::{
    AccountSummary, ActiveSession, Clock, HttpIdentityClient, IdentityClientConfig, ManualClock,
    ProfileService, RemoveOutcome, SessionCache, SessionManager, SessionManagerBuilder,
    SessionSettings, SessionSnapshot, SubscriberProfile, SystemClock, TokenExchange, TokenGrant,
    TokenSet,
};
