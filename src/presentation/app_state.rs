// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::sandbox_service::SandboxService;
use crate::application::view_service::ViewService;

#[derive(Clone)]
pub struct AppState {
    pub view_service: ViewService,
    pub dashboard_service: DashboardService,
    pub sandbox_service: SandboxService,
}
