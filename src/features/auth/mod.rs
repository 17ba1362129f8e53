//! Authentication: the auth backend seam and its GoTrue implementation, the
//! process-wide session store, credential flows and route gates.
//!
//! Only backend events move the [`state::SessionStore`]; callers of
//! [`gateway::AuthGateway`] observe the result through the store.

pub mod backend;
pub mod events;
pub mod gateway;
pub mod gotrue;
pub mod guards;
pub mod state;
pub mod types;

pub use backend::{AuthBackend, BackendError};
pub use events::{AuthChange, AuthChangeKind, AuthEvents};
pub use gateway::{AuthGateway, SignUpResult, SignedIn};
pub use gotrue::GoTrueBackend;
pub use guards::{AdminCheck, AdminGate, GateAction, GuardTask, SessionGate};
pub use state::{SessionState, SessionStore};
pub use types::{AuthMethod, Credentials, Session, User};
