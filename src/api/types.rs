//! Shared types for the invoice API layer.

use std::sync::Arc;

use crate::pipeline::InvoiceOrchestrator;

/// Shared context for all API routes.
///
/// The orchestrator is immutable and shared; every request gets its own run.
#[derive(Clone)]
pub struct ApiContext {
    pub orchestrator: Arc<InvoiceOrchestrator>,
}

impl ApiContext {
    pub fn new(orchestrator: Arc<InvoiceOrchestrator>) -> Self {
        Self { orchestrator }
    }
}
