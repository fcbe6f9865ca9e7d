//! Navigation seam. The flow never mutates local state to "handle" a gated
//! failure — it navigates, and the destination page refetches the truth.

use tracing::info;

pub const LOGIN_ROUTE: &str = "/login";
pub const PLANS_ROUTE: &str = "/subscription/plans";

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Default navigator: records the intent in the log.
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        info!("navigating to {route}");
    }
}

#[cfg(test)]
pub struct RecordingNavigator {
    routes: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingNavigator {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            routes: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().expect("poisoned route log").clone()
    }
}

#[cfg(test)]
impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .expect("poisoned route log")
            .push(route.to_string());
    }
}
