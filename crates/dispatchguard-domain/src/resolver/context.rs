//! Per-request values carried alongside a check through the resolver chain.

/// Identifies the RPC that started a check. Used only for telemetry labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcInfo {
    /// Fully qualified service name (e.g., "openfga.v1.OpenFGAService").
    pub service: String,
    /// Method name (e.g., "Check").
    pub method: String,
}

impl RpcInfo {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }
}

/// Request-scoped values that stages may consult but never mutate.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    dispatch_throttling_threshold: Option<u32>,
    rpc_info: RpcInfo,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the dispatch throttling threshold for this request.
    ///
    /// A value of 0 means "no override".
    pub fn with_dispatch_throttling_threshold(mut self, threshold: u32) -> Self {
        self.dispatch_throttling_threshold = Some(threshold);
        self
    }

    pub fn with_rpc_info(mut self, rpc_info: RpcInfo) -> Self {
        self.rpc_info = rpc_info;
        self
    }

    /// The per-request threshold override, if a positive one was set.
    pub fn dispatch_throttling_threshold(&self) -> Option<u32> {
        self.dispatch_throttling_threshold.filter(|t| *t > 0)
    }

    pub fn rpc_info(&self) -> &RpcInfo {
        &self.rpc_info
    }
}
