//! Form controller and workspace behaviour: result transitions, the single
//! in-flight rule and discarding of responses that arrive too late.

mod common {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use fin_insight::forms::{LoanPayload, SegmentPayload};
    use fin_insight::inference::{
        InferenceError, InferenceService, LoanDecision, LoanPrediction, SegmentAssignment,
    };
    use fin_insight::workflow::{FormController, FormKind, LoanCheck};
    use tokio::sync::Semaphore;

    /// Answers only after the test releases a permit.
    pub(super) struct GatedService {
        gate: Semaphore,
        calls: AtomicUsize,
        fail: bool,
    }

    impl GatedService {
        pub(super) fn open() -> Arc<Self> {
            Arc::new(Self {
                gate: Semaphore::new(Semaphore::MAX_PERMITS),
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        pub(super) fn closed() -> Arc<Self> {
            Arc::new(Self {
                gate: Semaphore::new(0),
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        pub(super) fn failing() -> Arc<Self> {
            Arc::new(Self {
                gate: Semaphore::new(Semaphore::MAX_PERMITS),
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        pub(super) fn release(&self) {
            self.gate.add_permits(1);
        }

        pub(super) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn wait(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.acquire().await.expect("gate open").forget();
        }
    }

    #[async_trait]
    impl InferenceService for GatedService {
        async fn predict_loan(
            &self,
            _payload: &LoanPayload,
        ) -> Result<LoanPrediction, InferenceError> {
            self.wait().await;
            if self.fail {
                return Err(InferenceError::Http {
                    status: 500,
                    message: "Request failed: 500 Internal Server Error".to_string(),
                });
            }
            Ok(LoanPrediction {
                status: "success".to_string(),
                prediction: LoanDecision::Approved,
                probability_approved: 0.82,
                probability_rejected: 0.18,
            })
        }

        async fn segment_profile(
            &self,
            _payload: &SegmentPayload,
        ) -> Result<SegmentAssignment, InferenceError> {
            self.wait().await;
            Ok(SegmentAssignment {
                kmeans_segment_pred: Some(1),
                kmeans_segment_name: Some("Low Value".to_string()),
                dbscan_segment_pred: Some(0),
                dbscan_segment_name: Some("Dense Core 1".to_string()),
                kmeans_prediction_error: None,
                dbscan_prediction_error: None,
                input_data: None,
            })
        }
    }

    pub(super) fn filled_loan(controller: &FormController<LoanCheck>) {
        controller.edit("education", "Graduate").expect("valid choice");
        controller.edit("self_employed", "Yes").expect("valid choice");
        controller.edit("income_annum", "9600000").expect("field");
    }

    pub(super) async fn wait_until_loading<K: FormKind>(controller: &FormController<K>) {
        while !controller.snapshot().result.is_loading() {
            tokio::task::yield_now().await;
        }
    }
}

mod transitions {
    use super::common::*;
    use fin_insight::workflow::{FormController, LoanCheck, ResultState, SegmentAnalysis};

    #[tokio::test]
    async fn success_then_edit_clears_result() {
        let service = GatedService::open();
        let controller = FormController::<LoanCheck>::new(service.clone());
        filled_loan(&controller);

        let snapshot = controller.submit().await.expect("accepted");
        let prediction = snapshot.result.success().expect("success state");
        assert_eq!(prediction.probability_approved, 0.82);
        assert!(snapshot.result.error().is_none());

        let edited = controller.edit("loan_term", "24").expect("field");
        assert_eq!(edited.result, ResultState::Absent);
        assert_eq!(edited.form.get("loan_term"), "24");
    }

    #[tokio::test]
    async fn failures_land_in_error_state() {
        let service = GatedService::failing();
        let controller = FormController::<LoanCheck>::new(service.clone());
        filled_loan(&controller);

        let snapshot = controller.submit().await.expect("accepted");
        assert_eq!(
            snapshot.result.error(),
            Some("Request failed: 500 Internal Server Error")
        );
        assert!(snapshot.result.success().is_none());

        let retried = controller.submit().await.expect("resubmission allowed");
        assert!(retried.result.error().is_some());
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn validation_errors_never_reach_the_network() {
        let service = GatedService::open();
        let controller = FormController::<LoanCheck>::new(service.clone());
        controller.edit("self_employed", "No").expect("valid choice");

        let snapshot = controller.submit().await.expect("handled in place");
        assert_eq!(
            snapshot.result.error(),
            Some("Please select a value for Education")
        );
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn segment_form_filters_keystrokes() {
        let service = GatedService::open();
        let controller = FormController::<SegmentAnalysis>::new(service);
        let snapshot = controller.edit("income_annum", "₹ 5,00,000").expect("field");
        assert_eq!(snapshot.form.get("income_annum"), "500000");

        let err = controller.edit("salary", "1").expect_err("unknown field");
        assert_eq!(err.to_string(), "unknown field `salary`");
    }
}

mod in_flight {
    use super::common::*;
    use fin_insight::workflow::{FormController, LoanCheck, ResultState, SubmissionError};
    use std::sync::Arc;

    #[tokio::test]
    async fn second_submit_is_rejected_while_pending() {
        let service = GatedService::closed();
        let controller = Arc::new(FormController::<LoanCheck>::new(service.clone()));
        filled_loan(&controller);

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.submit().await }
        });
        wait_until_loading(&controller).await;

        let err = controller.submit().await.expect_err("already pending");
        assert_eq!(err, SubmissionError::AlreadyPending { form: "loan" });

        service.release();
        let snapshot = first.await.expect("task joins").expect("accepted");
        assert!(snapshot.result.success().is_some());
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn edit_during_flight_discards_the_late_response() {
        let service = GatedService::closed();
        let controller = Arc::new(FormController::<LoanCheck>::new(service.clone()));
        filled_loan(&controller);

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.submit().await }
        });
        wait_until_loading(&controller).await;

        controller.edit("loan_amount", "100").expect("field");
        service.release();

        let snapshot = first.await.expect("task joins").expect("accepted");
        assert_eq!(snapshot.result, ResultState::Absent);
        assert_eq!(controller.snapshot().result, ResultState::Absent);
    }

    #[tokio::test]
    async fn reset_during_flight_frees_the_form() {
        let service = GatedService::closed();
        let controller = Arc::new(FormController::<LoanCheck>::new(service.clone()));
        filled_loan(&controller);

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.submit().await }
        });
        wait_until_loading(&controller).await;

        let reset = controller.reset();
        assert!(reset.form.is_blank());
        assert_eq!(reset.result, ResultState::Absent);

        filled_loan(&controller);
        let second = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.submit().await }
        });
        wait_until_loading(&controller).await;

        service.release();
        first.await.expect("task joins").expect("accepted");
        assert!(
            controller.snapshot().result.is_loading(),
            "superseded answer must not touch the newer request"
        );

        service.release();
        let snapshot = second.await.expect("task joins").expect("accepted");
        assert!(snapshot.result.success().is_some());
    }
}

mod workspaces {
    use super::common::*;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use fin_insight::identity::{
        AuthError, FederatedCredential, IdentityProvider, PasswordCredential, ProviderAccount,
    };
    use fin_insight::workflow::{RegistryError, ResultState, WorkspaceRegistry};
    use secrecy::SecretString;
    use std::sync::Arc;

    #[derive(Debug)]
    struct AcceptAll;

    #[async_trait]
    impl IdentityProvider for AcceptAll {
        fn name(&self) -> &str {
            "accept-all"
        }

        async fn sign_in_with_password(
            &self,
            credential: &PasswordCredential,
        ) -> Result<ProviderAccount, AuthError> {
            Ok(ProviderAccount {
                uid: "uid-1".to_string(),
                email: Some(credential.email.clone()),
                display_name: None,
                id_token: SecretString::from("token"),
            })
        }

        async fn sign_up(
            &self,
            credential: &PasswordCredential,
            _display_name: Option<&str>,
        ) -> Result<ProviderAccount, AuthError> {
            self.sign_in_with_password(credential).await
        }

        async fn sign_in_with_idp(
            &self,
            _credential: &FederatedCredential,
        ) -> Result<ProviderAccount, AuthError> {
            Err(AuthError::new("auth/operation-not-allowed", "disabled"))
        }

        async fn sign_out(&self, _uid: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    fn registry() -> WorkspaceRegistry {
        WorkspaceRegistry::new(Arc::new(AcceptAll), GatedService::open())
    }

    #[tokio::test]
    async fn only_admitted_workspaces_are_found() {
        let registry = registry();
        assert!(registry.find(None).is_none());

        let workspace = registry.open();
        assert!(registry.find(Some(workspace.id())).is_none(), "not yet admitted");
        assert!(registry.is_empty());

        registry.admit(workspace.clone(), None).expect("room");
        let found = registry.find(Some(workspace.id())).expect("admitted");
        assert_eq!(found.id(), workspace.id());
        assert!(registry.find(Some(uuid::Uuid::new_v4())).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn admitting_a_successor_retires_the_old_id() {
        let registry = registry();
        let first = registry.open();
        registry.admit(first.clone(), None).expect("room");

        let second = registry.open();
        assert_ne!(second.id(), first.id());
        registry
            .admit(second.clone(), Some(first.id()))
            .expect("room");

        assert!(registry.find(Some(first.id())).is_none());
        assert!(registry.find(Some(second.id())).is_some());
        assert_eq!(registry.len(), 1);

        assert!(registry.discard(second.id()).is_some());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn capacity_caps_live_workspaces() {
        let registry = registry().with_capacity(2);
        registry.admit(registry.open(), None).expect("first");
        let second = registry.open();
        registry.admit(second.clone(), None).expect("second");

        let err = registry
            .admit(registry.open(), None)
            .expect_err("registry is full");
        assert_eq!(err, RegistryError::Full { capacity: 2 });
        assert_eq!(registry.len(), 2);

        registry
            .admit(registry.open(), Some(second.id()))
            .expect("replacing frees a slot");
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn expired_workspaces_make_room_when_full() {
        let registry = registry()
            .with_capacity(1)
            .with_idle_ttl(Duration::zero());
        let stale = registry.open();
        registry.admit(stale.clone(), None).expect("first");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert!(registry.find(Some(stale.id())).is_none(), "expired");
        registry
            .admit(registry.open(), None)
            .expect("expired entry was pruned");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn idle_workspaces_expire() {
        let registry = registry().with_idle_ttl(Duration::minutes(5));
        registry.admit(registry.open(), None).expect("room");
        assert_eq!(registry.prune(Utc::now()), 0);
        assert_eq!(registry.prune(Utc::now() + Duration::minutes(6)), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn logout_clears_session_and_forms() {
        let registry = registry();
        let workspace = registry.open();
        workspace
            .gateway()
            .login(PasswordCredential::new("ada@example.com", "hunter22"))
            .await
            .expect("login");
        filled_loan(workspace.loan());
        workspace.loan().submit().await.expect("accepted");
        workspace.segment().edit("loan_amount", "42").expect("field");

        workspace.logout().await;

        assert!(!workspace.gateway().session().is_authenticated());
        let loan = workspace.loan().snapshot();
        assert!(loan.form.is_blank());
        assert_eq!(loan.result, ResultState::Absent);
        assert!(workspace.segment().snapshot().form.is_blank());
    }
}
