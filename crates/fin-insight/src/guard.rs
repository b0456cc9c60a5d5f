use serde::Serialize;
use tracing::debug;

use crate::identity::Session;

pub const LOGIN_PATH: &str = "/login";
pub const PROTECTED_PREFIXES: &[&str] = &["/loan-checker", "/segmentation-analysis"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    Redirect { location: &'static str },
}

/// Gates the prediction views behind a signed-in session.
///
/// Evaluated on every navigation; nothing is cached between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn is_protected(path: &str) -> bool {
        PROTECTED_PREFIXES.iter().any(|prefix| {
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    pub fn evaluate(path: &str, session: &Session) -> GuardDecision {
        if !Self::is_protected(path) || session.is_authenticated() {
            return GuardDecision::Allow;
        }
        debug!(%path, "unauthenticated navigation redirected");
        GuardDecision::Redirect {
            location: LOGIN_PATH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{SignInMethod, UserIdentity};
    use chrono::Utc;

    fn signed_in() -> Session {
        Session::for_user(UserIdentity {
            uid: "uid-1".to_string(),
            email: Some("ada@example.com".to_string()),
            display_name: None,
            method: SignInMethod::Password,
            signed_in_at: Utc::now(),
        })
    }

    #[test]
    fn anonymous_visitors_are_sent_to_login() {
        let session = Session::anonymous();
        for path in [
            "/loan-checker",
            "/loan-checker/submit",
            "/segmentation-analysis",
            "/segmentation-analysis/fields/income_annum",
        ] {
            assert_eq!(
                RouteGuard::evaluate(path, &session),
                GuardDecision::Redirect {
                    location: "/login"
                },
                "{path}"
            );
        }
    }

    #[test]
    fn public_paths_and_signed_in_users_pass() {
        let anonymous = Session::anonymous();
        for path in ["/", "/login", "/coming-soon", "/loan-checkerx", "/health"] {
            assert_eq!(RouteGuard::evaluate(path, &anonymous), GuardDecision::Allow);
        }
        assert_eq!(
            RouteGuard::evaluate("/loan-checker", &signed_in()),
            GuardDecision::Allow
        );
    }

    #[test]
    fn decision_tracks_the_current_session() {
        let mut session = signed_in();
        assert_eq!(
            RouteGuard::evaluate("/segmentation-analysis", &session),
            GuardDecision::Allow
        );
        session = Session::anonymous();
        assert!(matches!(
            RouteGuard::evaluate("/segmentation-analysis", &session),
            GuardDecision::Redirect { .. }
        ));
    }
}
