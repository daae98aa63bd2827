use uuid::Uuid;

/// Execution context a review arrives in.
///
/// The namespace comes from here, never from the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    namespace: Option<String>,
    request_id: Uuid,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            namespace: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Namespace carried by the context, `""` when none was set.
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
