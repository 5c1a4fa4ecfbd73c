use crate::use_cases::MatchRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Active matches, shared by every connection handler.
    pub registry: Arc<MatchRegistry>,
}
