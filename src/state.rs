/*
 * Responsibility
 * - shared context handed to every handler (AppState)
 *   - the single form session and the notification log
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::form::EmployeeForm;
use crate::form::controller::SharedForm;
use crate::services::notify::RecordingNotifier;

#[derive(Clone)]
pub struct AppState {
    pub form: SharedForm,
    pub notices: Arc<RecordingNotifier>,
}

impl AppState {
    pub fn new(form: EmployeeForm, notices: Arc<RecordingNotifier>) -> Self {
        Self {
            form: Arc::new(Mutex::new(form)),
            notices,
        }
    }
}
