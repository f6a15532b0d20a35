//! Application state for booking-cloud

use booking_engine::ReservationService;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReservationService>,
    /// Bearer token for `/api/cron/*`
    pub cron_secret: Arc<Zeroizing<String>>,
}

impl AppState {
    pub fn new(service: ReservationService, cron_secret: String) -> Self {
        Self {
            service: Arc::new(service),
            cron_secret: Arc::new(Zeroizing::new(cron_secret)),
        }
    }
}
