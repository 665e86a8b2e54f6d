/*
 * Responsibility
 * - EmployeeForm: hydrate, edit, cascade, choose avatar, submit
 * - collaborators are injected (Collaborators) and never read ambiently
 * - every async step has a synchronous begin/apply split so a host can
 *   release its lock while remote calls are in flight
 * - SharedForm runners put that split on a spawned task, so a dropped
 *   request never strands the form half-applied or busy
 */
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::form::cascade::{CascadeLevel, CascadeTicket, RegionCascade, RegionView};
use crate::form::date;
use crate::form::model::{
    EmployeeProfile, EmployeeRecord, EmployeeUpdatePayload, Field, PendingImage, Position, Region,
    RegionCode,
};
use crate::form::validation::{self, ValidationContext, ValidationState};
use crate::services::employee_api::{EmployeeApi, ImageUpload};
use crate::services::error::{ApiError, ApiResult};
use crate::services::identity::IdentityProvider;
use crate::services::notify::Notifier;
use crate::services::region_api::{RegionApi, RegionQuery};

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// The form session as handlers share it.
pub type SharedForm = Arc<Mutex<EmployeeForm>>;

/// External services the form talks to. Cheap to clone.
#[derive(Clone)]
pub struct Collaborators {
    pub employees: Arc<dyn EmployeeApi>,
    pub regions: Arc<dyn RegionApi>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("a submit is in progress")]
    Busy,
    #[error("reload was interrupted")]
    Interrupted,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submit is already in progress")]
    Busy,
    #[error("no signed-in employee")]
    MissingIdentity,
    #[error("{} field(s) need attention", .0.len())]
    Invalid(ValidationState),
    #[error("profile update failed: {0}")]
    Update(#[source] ApiError),
    #[error("avatar upload failed: {0}")]
    ImageUpload(#[source] ApiError),
    #[error("submit was interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    Updated,
    UpdatedWithImage,
}

/// Step 1 (update) then, only if it succeeded, step 2 (avatar upload).
#[derive(Debug)]
pub struct SubmitPlan {
    user_id: String,
    payload: EmployeeUpdatePayload,
    image: Option<PendingImage>,
}

impl SubmitPlan {
    pub async fn run(self, employees: &dyn EmployeeApi) -> Result<SubmitOutcome, SubmitError> {
        let ack = employees
            .update_employee_detail(&self.payload, &self.user_id)
            .await
            .map_err(SubmitError::Update)?;
        tracing::info!(user_id = %self.user_id, ack = ?ack.message, "profile updated");

        let Some(image) = self.image else {
            return Ok(SubmitOutcome::Updated);
        };

        employees
            .post_employee_image(ImageUpload {
                owner_id: self.user_id.clone(),
                file_name: image.file_name,
                content_type: image.content_type,
                bytes: image.bytes,
            })
            .await
            .map_err(SubmitError::ImageUpload)?;
        tracing::info!(user_id = %self.user_id, "avatar uploaded");

        Ok(SubmitOutcome::UpdatedWithImage)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub profile: EmployeeProfile,
    pub errors: ValidationState,
    pub positions: Vec<Position>,
    pub regions: RegionView,
    pub image_preview: Option<String>,
    pub has_pending_image: bool,
    pub busy: bool,
}

/// Remote reads behind `initialize`, gathered without touching the form.
pub struct InitialData {
    positions: ApiResult<Vec<Position>>,
    cities: ApiResult<Vec<Region>>,
    profile: ProfileLoad,
}

enum ProfileLoad {
    NoIdentity,
    Fetched {
        user_id: String,
        result: ApiResult<EmployeeRecord>,
    },
}

async fn fetch_reference_data(
    deps: &Collaborators,
) -> (ApiResult<Vec<Position>>, ApiResult<Vec<Region>>) {
    // independent of each other
    tokio::join!(
        deps.employees.get_all_positions(),
        deps.regions.get_regions(RegionQuery::Cities),
    )
}

/// Positions and cities, then the signed-in employee's record.
pub async fn fetch_initial(deps: &Collaborators) -> InitialData {
    let (positions, cities) = fetch_reference_data(deps).await;

    let profile = match deps.identity.user_id().await {
        Some(user_id) => {
            let result = deps.employees.get_employee_detail(&user_id).await;
            ProfileLoad::Fetched { user_id, result }
        }
        None => ProfileLoad::NoIdentity,
    };

    InitialData {
        positions,
        cities,
        profile,
    }
}

/// Which child list a ticket fetches.
pub fn query_for(ticket: &CascadeTicket) -> RegionQuery {
    match ticket.level {
        CascadeLevel::District => RegionQuery::Districts(ticket.parent),
        CascadeLevel::Ward => RegionQuery::Wards(ticket.parent),
    }
}

pub async fn fetch_children(regions: &dyn RegionApi, ticket: &CascadeTicket) -> ApiResult<Vec<Region>> {
    regions.get_regions(query_for(ticket)).await
}

pub struct EmployeeForm {
    deps: Collaborators,
    today: Clock,
    profile: EmployeeProfile,
    errors: ValidationState,
    positions: Vec<Position>,
    regions: RegionCascade,
    image_preview: Option<String>,
    pending_image: Option<PendingImage>,
    busy: bool,
}

impl EmployeeForm {
    pub fn new(deps: Collaborators) -> Self {
        Self {
            deps,
            today: Arc::new(|| Local::now().date_naive()),
            profile: EmployeeProfile::default(),
            errors: ValidationState::default(),
            positions: Vec::new(),
            regions: RegionCascade::default(),
            image_preview: None,
            pending_image: None,
            busy: false,
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.deps
    }

    pub fn errors(&self) -> &ValidationState {
        &self.errors
    }

    pub fn regions(&self) -> &RegionView {
        self.regions.view()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            profile: self.profile.clone(),
            errors: self.errors.clone(),
            positions: self.positions.clone(),
            regions: self.regions.view().clone(),
            image_preview: self.image_preview.clone(),
            has_pending_image: self.pending_image.is_some(),
            busy: self.busy,
        }
    }

    fn ctx(&self) -> ValidationContext {
        ValidationContext {
            today: (self.today)(),
        }
    }

    // ---- initialization ----

    /// Loads reference data, then the signed-in employee's profile.
    /// Failures are notified; whatever did load stays usable.
    pub async fn initialize(&mut self) {
        let data = fetch_initial(&self.deps).await;
        match self.apply_initial(data) {
            Ok(tickets) => self.replay_cascade(tickets).await,
            Err(err) => tracing::warn!(error = %err, "initialization results dropped"),
        }
    }

    fn apply_reference_data(
        &mut self,
        positions: ApiResult<Vec<Position>>,
        cities: ApiResult<Vec<Region>>,
    ) {
        match positions {
            Ok(p) => self.positions = p,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load positions");
                self.deps
                    .notifier
                    .error(format!("Could not load positions: {}", err.user_message()));
            }
        }

        match cities {
            Ok(c) => self.regions.set_cities(c),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load cities");
                self.deps
                    .notifier
                    .error(format!("Could not load cities: {}", err.user_message()));
            }
        }
    }

    /// Applies what `fetch_initial` gathered and returns the child-list
    /// fetches still needed to match the stored address.
    /// Refused while a submit is in flight.
    pub fn apply_initial(&mut self, data: InitialData) -> Result<Vec<CascadeTicket>, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        self.apply_reference_data(data.positions, data.cities);

        match data.profile {
            ProfileLoad::NoIdentity => {
                tracing::error!("no identity available, profile not loaded");
                self.deps
                    .notifier
                    .error("No signed-in employee found".to_string());
                Ok(Vec::new())
            }
            ProfileLoad::Fetched {
                result: Ok(record), ..
            } => Ok(self.hydrate(record)),
            ProfileLoad::Fetched {
                user_id,
                result: Err(err),
            } => {
                tracing::error!(%user_id, error = %err, "failed to fetch employee details");
                self.deps.notifier.error(format!(
                    "Error fetching employee details: {}",
                    err.user_message()
                ));
                Ok(Vec::new())
            }
        }
    }

    /// Populates the form from a stored record and selects its city,
    /// district and ward. The returned tickets fetch the matching option
    /// lists; see `replay_cascade`.
    pub fn hydrate(&mut self, record: EmployeeRecord) -> Vec<CascadeTicket> {
        self.profile = EmployeeProfile::from_record(&record);
        self.errors = ValidationState::default();

        let mut tickets = Vec::new();
        if let Some(address) = &record.employee_address {
            if let Some(city) = address.city_id {
                tickets.extend(self.select_city(Some(city)));
                if let Some(district) = address.district_id {
                    tickets.extend(self.select_district(Some(district)));
                }
            }
            self.regions.select_ward(address.ward.clone());
        }

        self.image_preview = self.profile.avatar.clone();
        self.pending_image = None;
        tickets
    }

    pub async fn replay_cascade(&mut self, tickets: Vec<CascadeTicket>) {
        for ticket in tickets {
            let result = fetch_children(self.deps.regions.as_ref(), &ticket).await;
            self.apply_regions(ticket, result);
        }
    }

    // ---- field edits ----

    /// Stores `value` and re-runs that field's rule only.
    pub fn change_field(&mut self, field: Field, value: String) -> Option<&str> {
        self.profile.set(field, value);
        let outcome = validation::validate(field, &self.profile.value(field), &self.ctx());
        self.errors = self.errors.with(field, outcome);
        self.errors.get(field)
    }

    // ---- region cascade ----

    pub fn select_city(&mut self, code: Option<RegionCode>) -> Option<CascadeTicket> {
        self.regions.select_city(code)
    }

    pub fn select_district(&mut self, code: Option<RegionCode>) -> Option<CascadeTicket> {
        self.regions.select_district(code)
    }

    pub fn select_ward(&mut self, name: Option<String>) {
        self.regions.select_ward(name);
    }

    /// Applies a child-list fetch. Stale tickets and failures leave the list empty.
    pub fn apply_regions(&mut self, ticket: CascadeTicket, result: ApiResult<Vec<Region>>) -> bool {
        match result {
            Ok(children) => self.regions.apply(ticket, children),
            Err(err) => {
                tracing::warn!(query = ?query_for(&ticket), error = %err, "region fetch failed");
                if self.regions.is_current(&ticket) {
                    self.deps
                        .notifier
                        .error(format!("Could not load regions: {}", err.user_message()));
                }
                false
            }
        }
    }

    // ---- avatar ----

    pub fn choose_image(&mut self, image: PendingImage) -> Result<(), FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        self.image_preview = Some(image.preview.clone());
        self.pending_image = Some(image);
        Ok(())
    }

    // ---- submit ----

    pub fn compose_payload(&self) -> Result<EmployeeUpdatePayload, date::DateFormatError> {
        let p = &self.profile;
        let view = self.regions.view();

        Ok(EmployeeUpdatePayload {
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
            phone_number: p.phone_number.clone(),
            gender: p.gender,
            date_of_birth: date::to_transport(&p.date_of_birth)?,
            salary: p.salary.trim().to_string(),
            position: p.position,
            avatar: p.avatar.clone(),
            city: self.regions.city_name(),
            city_id: view.selected_city,
            district: self.regions.district_name(),
            district_id: view.selected_district,
            ward: self.regions.ward_name(),
            street_name: p.address.street_name.clone(),
        })
    }

    /// Validates, composes the payload and raises the busy flag.
    /// `user_id` comes from the identity provider, read before locking.
    /// Nothing is sent when this fails.
    pub fn begin_submit(&mut self, user_id: Option<String>) -> Result<SubmitPlan, SubmitError> {
        if self.busy {
            return Err(SubmitError::Busy);
        }

        let errors = validation::validate_for_submit(&self.profile, &self.errors, &self.ctx());
        self.errors = errors;
        if !self.errors.is_valid() {
            tracing::debug!(fields = ?self.errors.fields().collect::<Vec<_>>(), "submit blocked");
            return Err(SubmitError::Invalid(self.errors.clone()));
        }

        let Some(user_id) = user_id else {
            self.deps
                .notifier
                .error("No signed-in employee found".to_string());
            return Err(SubmitError::MissingIdentity);
        };

        let payload = self.compose_payload().map_err(|e| {
            self.errors = self.errors.with(Field::DateOfBirth, Some(e.to_string()));
            SubmitError::Invalid(self.errors.clone())
        })?;

        self.busy = true;
        Ok(SubmitPlan {
            user_id,
            payload,
            image: self.pending_image.clone(),
        })
    }

    /// Lowers the busy flag and reports the result. Safe to call on any path.
    pub fn finish_submit(&mut self, result: &Result<SubmitOutcome, SubmitError>) {
        self.busy = false;

        match result {
            Ok(outcome) => {
                if *outcome == SubmitOutcome::UpdatedWithImage {
                    self.pending_image = None;
                }
                self.deps
                    .notifier
                    .success("Employee profile updated".to_string());
            }
            Err(
                err @ (SubmitError::Update(_)
                | SubmitError::ImageUpload(_)
                | SubmitError::Interrupted),
            ) => {
                tracing::warn!(error = %err, "submit failed");
                self.deps.notifier.error(err.to_string());
            }
            Err(_) => {}
        }
    }
}

/// Direct accessors and one-shot cascade steps for exercising the form
/// without a host.
#[cfg(test)]
impl EmployeeForm {
    pub fn with_clock(mut self, today: Clock) -> Self {
        self.today = today;
        self
    }

    pub fn profile(&self) -> &EmployeeProfile {
        &self.profile
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn image_preview(&self) -> Option<&str> {
        self.image_preview.as_deref()
    }

    pub fn pending_image(&self) -> Option<&PendingImage> {
        self.pending_image.as_ref()
    }

    pub async fn change_city(&mut self, code: Option<RegionCode>) {
        if let Some(ticket) = self.select_city(code) {
            let result = fetch_children(self.deps.regions.as_ref(), &ticket).await;
            self.apply_regions(ticket, result);
        }
    }

    pub async fn change_district(&mut self, code: Option<RegionCode>) {
        if let Some(ticket) = self.select_district(code) {
            let result = fetch_children(self.deps.regions.as_ref(), &ticket).await;
            self.apply_regions(ticket, result);
        }
    }
}

/// `initialize` against a shared form. The lock is held only while results
/// are applied, and the work runs on its own task so it completes even if
/// the caller goes away.
pub async fn initialize_shared(form: SharedForm) -> Result<(), FormError> {
    let deps = {
        let form = form.lock().await;
        if form.is_busy() {
            return Err(FormError::Busy);
        }
        form.collaborators().clone()
    };

    let task = tokio::spawn(async move {
        let data = fetch_initial(&deps).await;
        let tickets = form.lock().await.apply_initial(data)?;
        for ticket in tickets {
            let result = fetch_children(deps.regions.as_ref(), &ticket).await;
            form.lock().await.apply_regions(ticket, result);
        }
        Ok::<(), FormError>(())
    });

    task.await.unwrap_or_else(|err| {
        tracing::error!(error = %err, "reload task failed");
        Err(FormError::Interrupted)
    })
}

/// `submit` against a shared form. The lock is released while the plan runs.
/// `finish_submit` always follows a successful `begin_submit`: the run is on
/// its own task, so dropping the caller cannot leave the form busy.
pub async fn submit_shared(form: SharedForm) -> Result<SubmitOutcome, SubmitError> {
    let deps = form.lock().await.collaborators().clone();
    let user_id = deps.identity.user_id().await;
    let plan = form.lock().await.begin_submit(user_id)?;

    let task = tokio::spawn({
        let form = Arc::clone(&form);
        async move {
            let result = plan.run(deps.employees.as_ref()).await;
            form.lock().await.finish_submit(&result);
            result
        }
    });

    match task.await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "submit task failed");
            let result = Err(SubmitError::Interrupted);
            form.lock().await.finish_submit(&result);
            result
        }
    }
}
