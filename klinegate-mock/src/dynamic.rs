use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use klinegate_core::{
    BasicProvider, Frequency, KlineError, KlineProvider, KlineRequest, RawFrame,
    RawVendorResponse, VendorConnector, VendorSchema, WindowPolicy,
};
use serde_json::Value;
use tokio::sync::Mutex;

/// Instruction for how a method should behave for a given input.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(KlineError),
    /// Hang indefinitely (simulate a stalled vendor).
    Hang,
}

#[derive(Default)]
struct InternalState {
    kline_rules: HashMap<String, MockBehavior<RawFrame>>,
    basic_rules: HashMap<String, MockBehavior<Value>>,
    requests: Vec<KlineRequest>,
    basic_requests: Vec<String>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior of `fetch` for a symbol.
    pub async fn set_kline_behavior(&self, symbol: &str, behavior: MockBehavior<RawFrame>) {
        let mut guard = self.state.lock().await;
        guard.kline_rules.insert(symbol.to_string(), behavior);
    }

    /// Set the behavior of `basic` for a code.
    pub async fn set_basic_behavior(&self, ts_code: &str, behavior: MockBehavior<Value>) {
        let mut guard = self.state.lock().await;
        guard.basic_rules.insert(ts_code.to_string(), behavior);
    }

    /// Every `fetch` request received so far, oldest first.
    pub async fn requests(&self) -> Vec<KlineRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Every `basic` code received so far, oldest first.
    pub async fn basic_requests(&self) -> Vec<String> {
        self.state.lock().await.basic_requests.clone()
    }

    /// Clear all configured behaviors and request logs.
    pub async fn clear_all(&self) {
        let mut guard = self.state.lock().await;
        *guard = InternalState::default();
    }
}

/// Scripted connector. Symbols without a rule answer `VendorDataEmpty`.
pub struct DynamicMockConnector {
    name: &'static str,
    supported: &'static [Frequency],
    policy: WindowPolicy,
    schema: VendorSchema,
    basic: bool,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    ///
    /// Defaults: every frequency, range windows, canonical column labels,
    /// no `/basic` capability.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Self, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Self {
            name,
            supported: Frequency::ALL,
            policy: WindowPolicy::Range,
            schema: VendorSchema::CANONICAL,
            basic: false,
            state,
        };
        (me, controller)
    }

    /// Restrict the advertised frequencies.
    #[must_use]
    pub const fn with_frequencies(mut self, supported: &'static [Frequency]) -> Self {
        self.supported = supported;
        self
    }

    /// Advertise a window policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Label scripted frames with this schema.
    #[must_use]
    pub const fn with_schema(mut self, schema: VendorSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Advertise the `/basic` capability.
    #[must_use]
    pub const fn with_basic(mut self) -> Self {
        self.basic = true;
        self
    }
}

#[async_trait]
impl KlineProvider for DynamicMockConnector {
    async fn fetch(&self, req: &KlineRequest) -> Result<RawVendorResponse, KlineError> {
        let rule = {
            let mut guard = self.state.lock().await;
            guard.requests.push(req.clone());
            guard.kline_rules.get(&req.symbol).cloned()
        };
        match rule {
            Some(MockBehavior::Return(frame)) => Ok(RawVendorResponse {
                vendor: self.name,
                request: req.clone(),
                schema: self.schema,
                frame,
            }),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(KlineError::empty(format!("{} {}", self.name, req.symbol))),
        }
    }

    fn supported_frequencies(&self) -> &'static [Frequency] {
        self.supported
    }

    fn window_policy(&self) -> WindowPolicy {
        self.policy
    }
}

#[async_trait]
impl BasicProvider for DynamicMockConnector {
    async fn basic(&self, ts_code: &str) -> Result<Value, KlineError> {
        let rule = {
            let mut guard = self.state.lock().await;
            guard.basic_requests.push(ts_code.to_string());
            guard.basic_rules.get(ts_code).cloned()
        };
        match rule {
            Some(MockBehavior::Return(v)) => Ok(v),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(KlineError::empty(format!("{} basic {ts_code}", self.name))),
        }
    }
}

impl VendorConnector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    fn as_kline_provider(&self) -> Option<&dyn KlineProvider> {
        Some(self as &dyn KlineProvider)
    }

    fn as_basic_provider(&self) -> Option<&dyn BasicProvider> {
        if self.basic {
            Some(self as &dyn BasicProvider)
        } else {
            None
        }
    }
}
