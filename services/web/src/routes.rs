use crate::infra::AppState;
use axum::extract::{Path, Request};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use fin_insight::forms::{FormError, SegmentPayload};
use fin_insight::guard::{GuardDecision, RouteGuard, LOGIN_PATH};
use fin_insight::identity::{
    codes, FederatedCredential, GatewayError, PasswordCredential, Session, SignupRequest,
};
use fin_insight::inference::{LoanPrediction, SegmentAssignment};
use fin_insight::presentation::{self, FormPage, LoanOutcomeView, SegmentCatalog, SegmentResultView};
use fin_insight::workflow::{FormSnapshot, RegistryError, SubmissionError, Workspace};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub(crate) const SESSION_COOKIE: &str = "fin_session";
const DEFAULT_FEDERATED_PROVIDER: &str = "google.com";
const SIGNED_IN_REDIRECT: &str = "/loan-checker";

const LOAN_TITLE: &str = "Loan Eligibility Checker";
const LOAN_SUBTITLE: &str = "Fill in your details to check if you qualify for a loan";
const SEGMENT_TITLE: &str = "Financial Profile Segmentation";
const SEGMENT_SUBTITLE: &str = "Discover your financial segment and compare with market trends";

/// The workspace behind the request cookie, if the visitor is signed in.
#[derive(Clone)]
pub(crate) struct Visit(Option<Arc<Workspace>>);

impl Visit {
    fn session(&self) -> Session {
        self.0
            .as_ref()
            .map(|workspace| workspace.gateway().session())
            .unwrap_or_default()
    }

    fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|workspace| workspace.id())
    }
}

type Visitor = Extension<Arc<Workspace>>;

pub(crate) fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/loan-checker", get(loan_page))
        .route("/loan-checker/fields/:field", put(loan_edit))
        .route("/loan-checker/submit", post(loan_submit))
        .route("/loan-checker/reset", post(loan_reset))
        .route("/segmentation-analysis", get(segment_page))
        .route("/segmentation-analysis/fields/:field", put(segment_edit))
        .route("/segmentation-analysis/submit", post(segment_submit))
        .route("/segmentation-analysis/reset", post(segment_reset))
        .route_layer(middleware::from_fn(guard_protected));

    let visitor_routes = Router::new()
        .route("/", get(home_page))
        .route("/coming-soon", get(coming_soon_page))
        .route("/login", get(login_page))
        .route("/api/auth/login", post(login_endpoint))
        .route("/api/auth/signup", post(signup_endpoint))
        .route("/api/auth/federated", post(federated_endpoint))
        .route("/api/auth/logout", post(logout_endpoint))
        .merge(protected_routes)
        .layer(middleware::from_fn(attach_visit));

    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(visitor_routes)
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn visitor_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn expired_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Looks up the visitor's workspace without creating one. A cookie that no
/// longer resolves is cleared.
async fn attach_visit(
    Extension(state): Extension<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let known = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
    let workspace = state.workspaces.find(known);
    let stale = jar.get(SESSION_COOKIE).is_some() && workspace.is_none();
    request.extensions_mut().insert(Visit(workspace));

    let response = next.run(request).await;
    if stale && !response.headers().contains_key(header::SET_COOKIE) {
        return (jar.remove(expired_cookie()), response).into_response();
    }
    response
}

async fn guard_protected(
    Extension(visit): Extension<Visit>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match (RouteGuard::evaluate(&path, &visit.session()), visit.0) {
        (GuardDecision::Allow, Some(workspace)) => {
            request.extensions_mut().insert(workspace);
            next.run(request).await
        }
        (GuardDecision::Allow, None) => Redirect::to(LOGIN_PATH).into_response(),
        (GuardDecision::Redirect { location }, workspace) => {
            info!(
                %path,
                workspace = ?workspace.map(|workspace| workspace.id()),
                "redirecting to login"
            );
            Redirect::to(location).into_response()
        }
    }
}

async fn home_page(Extension(visit): Extension<Visit>) -> impl IntoResponse {
    Json(presentation::home(&visit.session()))
}

async fn coming_soon_page(Extension(visit): Extension<Visit>) -> impl IntoResponse {
    Json(presentation::coming_soon(&visit.session()))
}

async fn login_page(Extension(visit): Extension<Visit>) -> impl IntoResponse {
    Json(presentation::login(&visit.session()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignupBody {
    #[serde(default)]
    display_name: Option<String>,
    email: String,
    password: String,
    confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FederatedBody {
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

/// Swaps the visitor onto the freshly authenticated workspace under a new
/// cookie. The previous id, if any, stops resolving.
async fn signed_in(
    state: &AppState,
    jar: CookieJar,
    previous: Visit,
    workspace: Arc<Workspace>,
    outcome: Result<Session, GatewayError>,
) -> Response {
    let session = match outcome {
        Ok(session) => session,
        Err(err) => return auth_failure(err),
    };
    let replaced = previous.id();
    if let Err(err) = state.workspaces.admit(Arc::clone(&workspace), replaced) {
        return registry_full(err);
    }
    if let Some(old) = previous.0 {
        old.logout().await;
    }
    debug!(workspace = %workspace.id(), ?replaced, "session cookie issued");

    let payload = Json(json!({ "session": session, "redirect": SIGNED_IN_REDIRECT }));
    (jar.add(visitor_cookie(workspace.id())), payload).into_response()
}

fn registry_full(err: RegistryError) -> Response {
    warn!(error = %err, "sign-in refused");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "The service is busy. Please try again later." })),
    )
        .into_response()
}

fn auth_failure(err: GatewayError) -> Response {
    let status = match &err {
        GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GatewayError::Auth { source, .. } => match source.code.as_str() {
            codes::TOO_MANY_REQUESTS => StatusCode::TOO_MANY_REQUESTS,
            codes::EMAIL_IN_USE => StatusCode::CONFLICT,
            codes::WEAK_PASSWORD | codes::INVALID_EMAIL => StatusCode::UNPROCESSABLE_ENTITY,
            codes::NETWORK_FAILED => StatusCode::BAD_GATEWAY,
            _ => StatusCode::UNAUTHORIZED,
        },
    };
    let payload = json!({
        "error": err.user_message(),
        "code": err.auth_code(),
    });
    (status, Json(payload)).into_response()
}

async fn login_endpoint(
    Extension(state): Extension<AppState>,
    Extension(visit): Extension<Visit>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Response {
    let workspace = state.workspaces.open();
    let outcome = workspace
        .gateway()
        .login(PasswordCredential::new(body.email, body.password))
        .await;
    signed_in(&state, jar, visit, workspace, outcome).await
}

async fn signup_endpoint(
    Extension(state): Extension<AppState>,
    Extension(visit): Extension<Visit>,
    jar: CookieJar,
    Json(body): Json<SignupBody>,
) -> Response {
    let request = SignupRequest {
        display_name: body.display_name,
        email: body.email,
        password: SecretString::from(body.password),
        confirm_password: SecretString::from(body.confirm_password),
    };
    let workspace = state.workspaces.open();
    let outcome = workspace.gateway().signup(request).await;
    signed_in(&state, jar, visit, workspace, outcome).await
}

async fn federated_endpoint(
    Extension(state): Extension<AppState>,
    Extension(visit): Extension<Visit>,
    jar: CookieJar,
    Json(body): Json<FederatedBody>,
) -> Response {
    let credential = FederatedCredential {
        provider_id: body
            .provider
            .unwrap_or_else(|| DEFAULT_FEDERATED_PROVIDER.to_string()),
        id_token: body.id_token.map(SecretString::from),
    };
    let workspace = state.workspaces.open();
    let outcome = workspace
        .gateway()
        .login_with_federated_provider(credential)
        .await;
    signed_in(&state, jar, visit, workspace, outcome).await
}

async fn logout_endpoint(
    Extension(state): Extension<AppState>,
    Extension(visit): Extension<Visit>,
    jar: CookieJar,
) -> Response {
    if let Some(workspace) = visit.0 {
        workspace.logout().await;
        state.workspaces.discard(workspace.id());
    }
    let payload = Json(json!({ "session": Session::anonymous(), "redirect": "/" }));
    (jar.remove(expired_cookie()), payload).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldEdit {
    value: String,
}

fn loan_view(
    workspace: &Workspace,
    snapshot: FormSnapshot<LoanPrediction>,
) -> FormPage<LoanOutcomeView> {
    let FormSnapshot {
        form,
        result,
        revision,
    } = snapshot;
    FormPage::new(
        &workspace.gateway().session(),
        LOAN_TITLE,
        LOAN_SUBTITLE,
        &form,
        result.map(|prediction| LoanOutcomeView::from(&prediction)),
        revision,
    )
}

fn segment_view(
    workspace: &Workspace,
    catalog: &SegmentCatalog,
    snapshot: FormSnapshot<SegmentAssignment>,
) -> FormPage<SegmentResultView> {
    let FormSnapshot {
        form,
        result,
        revision,
    } = snapshot;
    let payload = SegmentPayload::from_form(&form);
    FormPage::new(
        &workspace.gateway().session(),
        SEGMENT_TITLE,
        SEGMENT_SUBTITLE,
        &form,
        result.map(|assignment| SegmentResultView::build(&payload, &assignment, catalog)),
        revision,
    )
}

fn form_rejected(err: FormError) -> Response {
    debug!(error = %err, "form edit rejected");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

fn submission_rejected(err: SubmissionError) -> Response {
    (StatusCode::CONFLICT, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn loan_page(Extension(workspace): Visitor) -> impl IntoResponse {
    Json(loan_view(&workspace, workspace.loan().snapshot()))
}

async fn loan_edit(
    Extension(workspace): Visitor,
    Path(field): Path<String>,
    Json(edit): Json<FieldEdit>,
) -> Response {
    match workspace.loan().edit(&field, &edit.value) {
        Ok(snapshot) => Json(loan_view(&workspace, snapshot)).into_response(),
        Err(err) => form_rejected(err),
    }
}

async fn loan_submit(Extension(workspace): Visitor) -> Response {
    match workspace.loan().submit().await {
        Ok(snapshot) => Json(loan_view(&workspace, snapshot)).into_response(),
        Err(err) => submission_rejected(err),
    }
}

async fn loan_reset(Extension(workspace): Visitor) -> impl IntoResponse {
    Json(loan_view(&workspace, workspace.loan().reset()))
}

async fn segment_page(
    Extension(state): Extension<AppState>,
    Extension(workspace): Visitor,
) -> impl IntoResponse {
    Json(segment_view(
        &workspace,
        &state.catalog,
        workspace.segment().snapshot(),
    ))
}

async fn segment_edit(
    Extension(state): Extension<AppState>,
    Extension(workspace): Visitor,
    Path(field): Path<String>,
    Json(edit): Json<FieldEdit>,
) -> Response {
    match workspace.segment().edit(&field, &edit.value) {
        Ok(snapshot) => Json(segment_view(&workspace, &state.catalog, snapshot)).into_response(),
        Err(err) => form_rejected(err),
    }
}

async fn segment_submit(
    Extension(state): Extension<AppState>,
    Extension(workspace): Visitor,
) -> Response {
    match workspace.segment().submit().await {
        Ok(snapshot) => Json(segment_view(&workspace, &state.catalog, snapshot)).into_response(),
        Err(err) => submission_rejected(err),
    }
}

async fn segment_reset(
    Extension(state): Extension<AppState>,
    Extension(workspace): Visitor,
) -> impl IntoResponse {
    Json(segment_view(
        &workspace,
        &state.catalog,
        workspace.segment().reset(),
    ))
}
