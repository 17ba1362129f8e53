use crate::{
    app::App,
    features::auth::{types::User, GateAction, SessionGate},
    shared::errors::{AppError, ErrorKind, Payload},
};
use tracing::debug;

/// Session gate for one-shot commands: anything but `Render` refuses.
pub(crate) fn require_session(app: &App) -> Result<User, AppError> {
    let snapshot = app.session().snapshot();
    match SessionGate::new().observe(&snapshot) {
        Some(GateAction::Render) => snapshot
            .session()
            .map(|session| session.user.clone())
            .ok_or_else(|| AppError::auth("Sign in to continue")),
        Some(GateAction::Wait) => Err(AppError::auth("Session is still loading")),
        _ => Err(AppError::auth("Sign in to continue")),
    }
}

/// Admin gate. A failed lookup rides along as the error payload.
pub(crate) async fn require_admin(app: &App) -> Result<(), AppError> {
    require_session(app)?;
    match app.admin_gate().evaluate(&app.session().snapshot()).await {
        GateAction::Render => Ok(()),
        GateAction::Deny { diagnostic } => {
            debug!(?diagnostic, "admin access denied");
            Err(admin_denied(diagnostic))
        }
        GateAction::Wait => Err(AppError::auth("Session is still loading")),
        GateAction::Redirect(_) => Err(AppError::auth("Sign in to continue")),
    }
}

fn admin_denied(diagnostic: Option<String>) -> AppError {
    AppError::new(ErrorKind::Authorization, "Admin access required")
        .with_payload(diagnostic.map(Payload::Raw))
}

/// Secondary detail of a refusal, shown under the primary message.
pub(crate) fn denial_detail(err: &AppError) -> Option<&str> {
    match (err.kind(), err.payload()) {
        (ErrorKind::Authorization, Some(Payload::Raw(detail))) => Some(detail),
        _ => None,
    }
}
