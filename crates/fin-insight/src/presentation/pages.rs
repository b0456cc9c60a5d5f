use serde::Serialize;

use crate::forms::{FieldKind, FormState};
use crate::identity::Session;
use crate::workflow::ResultState;

pub const APP_TITLE: &str = "FinInsight Platform";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionAction {
    Login { href: &'static str },
    Logout { href: &'static str, email: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub title: &'static str,
    pub links: Vec<NavLink>,
    pub session: SessionAction,
}

pub fn navigation(session: &Session) -> Navigation {
    let links = vec![
        NavLink { label: "Home", href: "/" },
        NavLink { label: "Loan Checker", href: "/loan-checker" },
        NavLink {
            label: "Segmentation Analysis",
            href: "/segmentation-analysis",
        },
        NavLink { label: "Coming Soon", href: "/coming-soon" },
    ];
    let session = if session.is_authenticated() {
        SessionAction::Logout {
            href: "/api/auth/logout",
            email: session.email().map(str::to_string),
        }
    } else {
        SessionAction::Login { href: "/login" }
    };
    Navigation {
        title: APP_TITLE,
        links,
        session,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

const fn feature(title: &'static str, description: &'static str) -> Feature {
    Feature { title, description }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeView {
    pub navigation: Navigation,
    pub headline: &'static str,
    pub summary: &'static str,
    pub steps: Vec<Feature>,
    pub highlights: Vec<Feature>,
}

pub fn home(session: &Session) -> HomeView {
    HomeView {
        navigation: navigation(session),
        headline: "Simplify Your Financial Decisions",
        summary: "Instantly check your loan eligibility with our Machine Learning powered system. Gain insights into your financial profile segment and make informed choices.",
        steps: vec![
            feature(
                "1. Enter Your Data",
                "Securely provide key financial details like income and asset values through our intuitive form.",
            ),
            feature(
                "2. Instant AI Analysis",
                "Our advanced Machine Learning models process your information in real-time.",
            ),
            feature(
                "3. Get Clear Results",
                "Receive your loan eligibility status (Approved/Rejected), probability, and your financial profile segment.",
            ),
        ],
        highlights: vec![
            feature(
                "Fast Eligibility Check",
                "Get your loan eligibility results almost instantly. No lengthy forms or waiting periods.",
            ),
            feature(
                "Accurate Predictions",
                "Our ML models provide precise eligibility assessments and probability scores based on your data.",
            ),
            feature(
                "Profile Segmentation",
                "Understand where your financial profile fits. Our system groups similar profiles, offering valuable context.",
            ),
            feature(
                "Secure & Confidential",
                "Your information is protected with robust security measures and kept strictly confidential.",
            ),
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComingSoonView {
    pub navigation: Navigation,
    pub headline: &'static str,
    pub summary: &'static str,
    pub features: Vec<Feature>,
}

pub fn coming_soon(session: &Session) -> ComingSoonView {
    ComingSoonView {
        navigation: navigation(session),
        headline: "Exciting Features Coming Soon!",
        summary: "We're working on something amazing. Stay tuned for new features that will revolutionize your loan management experience.",
        features: vec![
            feature(
                "Advanced Analytics",
                "Deep insights into your financial patterns and personalized recommendations",
            ),
            feature(
                "Smart Notifications",
                "Real-time alerts and updates about your loan status and opportunities",
            ),
            feature(
                "AI Predictions",
                "Machine learning powered forecasts for better financial planning",
            ),
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginView {
    pub navigation: Navigation,
    pub authenticated: bool,
    pub endpoints: Vec<NavLink>,
}

pub fn login(session: &Session) -> LoginView {
    LoginView {
        navigation: navigation(session),
        authenticated: session.is_authenticated(),
        endpoints: vec![
            NavLink { label: "Sign in", href: "/api/auth/login" },
            NavLink { label: "Create account", href: "/api/auth/signup" },
            NavLink {
                label: "Sign in with Google",
                href: "/api/auth/federated",
            },
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input: FieldKind,
    pub value: String,
}

/// A form page: its fields and whatever the result area shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormPage<V> {
    pub navigation: Navigation,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub fields: Vec<FieldView>,
    pub result: ResultState<V>,
    pub revision: u64,
}

impl<V> FormPage<V> {
    pub fn new(
        session: &Session,
        title: &'static str,
        subtitle: &'static str,
        form: &FormState,
        result: ResultState<V>,
        revision: u64,
    ) -> Self {
        let fields = form
            .entries()
            .map(|(spec, value)| FieldView {
                name: spec.name,
                label: spec.label,
                input: spec.kind,
                value: value.to_string(),
            })
            .collect();
        Self {
            navigation: navigation(session),
            title,
            subtitle,
            fields,
            result,
            revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::loan_form;
    use crate::identity::{SignInMethod, UserIdentity};
    use chrono::Utc;

    #[test]
    fn navigation_switches_login_for_logout() {
        let anonymous = navigation(&Session::anonymous());
        assert_eq!(anonymous.title, "FinInsight Platform");
        assert_eq!(anonymous.links.len(), 4);
        assert_eq!(anonymous.session, SessionAction::Login { href: "/login" });

        let signed_in = navigation(&Session::for_user(UserIdentity {
            uid: "u".to_string(),
            email: Some("ada@example.com".to_string()),
            display_name: None,
            method: SignInMethod::Password,
            signed_in_at: Utc::now(),
        }));
        assert!(matches!(
            signed_in.session,
            SessionAction::Logout { email: Some(ref email), .. } if email == "ada@example.com"
        ));
    }

    #[test]
    fn coming_soon_lists_three_features() {
        let view = coming_soon(&Session::anonymous());
        let titles: Vec<_> = view.features.iter().map(|feature| feature.title).collect();
        assert_eq!(
            titles,
            ["Advanced Analytics", "Smart Notifications", "AI Predictions"]
        );
    }

    #[test]
    fn form_page_lists_fields_in_schema_order() {
        let mut form = loan_form();
        form.set("education", "Graduate").expect("valid choice");
        let page: FormPage<()> = FormPage::new(
            &Session::anonymous(),
            "Loan Eligibility Checker",
            "",
            &form,
            ResultState::Absent,
            1,
        );
        assert_eq!(page.fields[0].name, "no_of_dependents");
        assert_eq!(page.fields[1].value, "Graduate");
        let json = serde_json::to_value(&page).expect("serializes");
        assert_eq!(json["fields"][1]["input"]["kind"], "choice");
        assert_eq!(json["result"]["state"], "absent");
    }
}
