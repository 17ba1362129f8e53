//! Composition root. [`App::bootstrap`] wires one storage, one auth backend
//! and one session store, attaches the store's single backend subscription
//! and restores the session before handing out any client. Everything else
//! receives clones of these handles.

use crate::{
    features::{
        auth::{
            gateway::AuthGateway,
            gotrue::GoTrueBackend,
            guards::AdminGate,
            state::{SessionStore, SessionSubscription},
            AuthBackend,
        },
        notice::NoticeBoard,
        prefs::Preferences,
        referrals::{types::LinkOutcome, ReferralLinker},
    },
    shared::{
        api::ApiClient,
        config::AppConfig,
        errors::AppError,
        storage::{FileStorage, Storage},
    },
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub type Gateway = AuthGateway<GoTrueBackend, ApiClient>;

pub struct App {
    config: Arc<AppConfig>,
    backend: Arc<GoTrueBackend>,
    session: SessionStore,
    api: ApiClient,
    linker: Arc<ReferralLinker<ApiClient>>,
    gateway: Gateway,
    prefs: Preferences,
    notices: NoticeBoard,
    _subscription: SessionSubscription,
}

impl App {
    /// Boots with the JSON file storage named by the configuration.
    ///
    /// # Errors
    /// Returns a config error if a client cannot be built.
    pub async fn bootstrap(config: AppConfig) -> Result<Self, AppError> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(&config.storage_path));
        Self::bootstrap_with_storage(config, storage).await
    }

    /// # Errors
    /// Returns a config error if a client cannot be built.
    #[instrument(skip_all, fields(mode = %config.mode))]
    pub async fn bootstrap_with_storage(
        config: AppConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let backend = Arc::new(GoTrueBackend::new(&config, Arc::clone(&storage))?);

        let session = SessionStore::new();
        let subscription = session.subscribe(backend.events(), |change| {
            info!(
                kind = ?change.kind,
                signed_in = change.session.is_some(),
                "auth state changed"
            );
        })?;
        session.initialize(backend.as_ref()).await;

        let api = ApiClient::new(Arc::clone(&config), session.clone())?;
        let linker = Arc::new(ReferralLinker::new(
            api.clone(),
            Arc::clone(&storage),
            session.clone(),
        ));
        let gateway = AuthGateway::new(
            Arc::clone(&backend),
            Arc::clone(&linker),
            Arc::clone(&config),
        );

        let app = Self {
            config,
            backend,
            session,
            api,
            linker,
            gateway,
            prefs: Preferences::new(storage),
            notices: NoticeBoard::new(),
            _subscription: subscription,
        };

        if app.session.session().is_some() {
            let outcome = app.linker.consume_pending().await;
            debug!(?outcome, "pending invite code after restore");
        }

        Ok(app)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> &GoTrueBackend {
        &self.backend
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn linker(&self) -> &ReferralLinker<ApiClient> {
        &self.linker
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// An admin gate checking through this app's API client.
    pub fn admin_gate(&self) -> Arc<AdminGate<ApiClient>> {
        Arc::new(AdminGate::new(self.api.clone()))
    }

    /// Applies a stored invite code now; used after flows that created a
    /// session outside the gateway, such as a confirmation link.
    pub async fn link_pending_referral(&self) -> LinkOutcome {
        self.linker.consume_pending().await
    }
}
