//! Recording doubles for the payment and notification seams
//!
//! Both keep every call so tests can assert on exactly what reached the
//! collaborator, and both can be told to fail.

use crate::notify::{NotificationKind, NotificationParams, Notifier, NotifyError};
use crate::payment::{AuthorizeRequest, DepositGateway, DepositHold, GatewayError, IntentStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Authorize { amount_minor: i64, currency: String },
    Capture(String),
    Void(String),
    Retrieve(String),
}

#[derive(Debug, Default)]
struct GatewayState {
    next_id: u32,
    intents: HashMap<String, IntentStatus>,
    calls: Vec<GatewayCall>,
    authorize_error: Option<GatewayError>,
    capture_error: Option<GatewayError>,
    void_error: Option<GatewayError>,
    status_errors: Option<(GatewayError, u32)>,
}

impl GatewayState {
    fn mint(&mut self) -> String {
        self.next_id += 1;
        let id = format!("pi_test_{}", self.next_id);
        self.intents.insert(id.clone(), IntentStatus::RequiresCapture);
        id
    }
}

/// In-process payment gateway with manual-capture semantics
#[derive(Debug, Default)]
pub struct RecordingGateway {
    state: Mutex<GatewayState>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// An authorized hold created out of band (no call recorded), as if
    /// the browser had completed it.
    pub fn place_hold(&self) -> String {
        self.state.lock().mint()
    }

    pub fn status_of(&self, intent_id: &str) -> Option<IntentStatus> {
        self.state.lock().intents.get(intent_id).copied()
    }

    pub fn set_status(&self, intent_id: &str, status: IntentStatus) {
        self.state.lock().intents.insert(intent_id.to_string(), status);
    }

    pub fn fail_authorize(&self, err: GatewayError) {
        self.state.lock().authorize_error = Some(err);
    }

    pub fn fail_capture(&self, err: GatewayError) {
        self.state.lock().capture_error = Some(err);
    }

    pub fn fail_void(&self, err: GatewayError) {
        self.state.lock().void_error = Some(err);
    }

    /// The next `times` status reads fail with `err`
    pub fn fail_next_status(&self, err: GatewayError, times: u32) {
        self.state.lock().status_errors = Some((err, times));
    }
}

#[async_trait]
impl DepositGateway for RecordingGateway {
    async fn authorize(&self, req: &AuthorizeRequest) -> Result<DepositHold, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::Authorize {
            amount_minor: req.amount_minor,
            currency: req.currency.clone(),
        });
        if let Some(err) = state.authorize_error.clone() {
            return Err(err);
        }
        let intent_id = state.mint();
        Ok(DepositHold {
            client_secret: format!("{intent_id}_secret"),
            intent_id,
            status: IntentStatus::RequiresCapture,
        })
    }

    async fn capture(&self, intent_id: &str) -> Result<IntentStatus, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::Capture(intent_id.to_string()));
        if let Some(err) = state.capture_error.clone() {
            return Err(err);
        }
        match state.intents.get_mut(intent_id) {
            None => Err(GatewayError::NotFound(intent_id.to_string())),
            Some(status) if *status != IntentStatus::RequiresCapture => Err(
                GatewayError::Request(format!("intent {intent_id} cannot be captured")),
            ),
            Some(status) => {
                *status = IntentStatus::Succeeded;
                Ok(IntentStatus::Succeeded)
            }
        }
    }

    async fn void(&self, intent_id: &str) -> Result<IntentStatus, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::Void(intent_id.to_string()));
        if let Some(err) = state.void_error.clone() {
            return Err(err);
        }
        match state.intents.get_mut(intent_id) {
            None => Err(GatewayError::NotFound(intent_id.to_string())),
            Some(status) => {
                *status = IntentStatus::Canceled;
                Ok(IntentStatus::Canceled)
            }
        }
    }

    async fn retrieve_status(&self, intent_id: &str) -> Result<IntentStatus, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::Retrieve(intent_id.to_string()));
        if let Some((err, remaining)) = state.status_errors.take() {
            if remaining > 1 {
                state.status_errors = Some((err.clone(), remaining - 1));
            }
            if remaining > 0 {
                return Err(err);
            }
        }
        state
            .intents
            .get(intent_id)
            .copied()
            .ok_or_else(|| GatewayError::NotFound(intent_id.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient: String,
    pub kind: NotificationKind,
    pub params: NotificationParams,
}

#[derive(Debug, Default)]
struct NotifierState {
    sent: Vec<SentNotification>,
    failing: bool,
}

/// Notifier that keeps what it was asked to send
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    state: Mutex<NotifierState>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successfully delivered notifications, oldest first
    pub fn sent(&self) -> Vec<SentNotification> {
        self.state.lock().sent.clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.state.lock().sent.iter().filter(|n| n.kind == kind).count()
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipient: &str,
        kind: NotificationKind,
        params: &NotificationParams,
    ) -> Result<(), NotifyError> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(NotifyError::Transport("mailbox unavailable".to_string()));
        }
        state.sent.push(SentNotification {
            recipient: recipient.to_string(),
            kind,
            params: params.clone(),
        });
        Ok(())
    }
}
