use std::sync::Arc;

use crate::domain::thermometer::ThermometerService;
use crate::monitoring::LifecycleController;

#[derive(Clone)]
pub struct AppState {
    pub thermometer_service: Arc<ThermometerService>,
    pub lifecycle: Arc<LifecycleController>,
}
