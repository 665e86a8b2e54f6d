/*
 * Responsibility
 * - /me handlers: snapshot, reload, field edits, region cascade, avatar, submit
 * - the form lock is released while upstream calls are in flight;
 *   cascade tickets and the busy flag keep ordering sane
 * - reload and submit run detached from the request, so a dropped
 *   connection or timeout cannot strand the form
 */
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, header},
};

use crate::{
    api::v1::dto::me::{
        FieldChangeRequest, FieldChangeResponse, ImageQuery, ImageUploadRequest,
        RegionChangeResponse, RegionCodeRequest, SubmitResponse, WardRequest,
    },
    error::AppError,
    form::{
        EmployeeForm,
        cascade::CascadeTicket,
        controller::{FormSnapshot, fetch_children, initialize_shared, submit_shared},
        model::PendingImage,
    },
    services::notify::Notice,
    state::AppState,
};

pub async fn get_me(State(state): State<AppState>) -> Json<FormSnapshot> {
    Json(state.form.lock().await.snapshot())
}

pub async fn reload(State(state): State<AppState>) -> Result<Json<FormSnapshot>, AppError> {
    initialize_shared(state.form.clone()).await?;
    Ok(Json(state.form.lock().await.snapshot()))
}

pub async fn change_field(
    State(state): State<AppState>,
    Json(req): Json<FieldChangeRequest>,
) -> Json<FieldChangeResponse> {
    let mut form = state.form.lock().await;
    let error = form.change_field(req.field, req.value).map(str::to_string);

    Json(FieldChangeResponse {
        field: req.field,
        error,
        errors: form.errors().clone(),
    })
}

async fn cascade(
    state: &AppState,
    select: impl FnOnce(&mut EmployeeForm) -> Option<CascadeTicket>,
) -> RegionChangeResponse {
    let (ticket, regions) = {
        let mut form = state.form.lock().await;
        (select(&mut *form), form.collaborators().regions.clone())
    };

    let applied = match ticket {
        Some(ticket) => {
            let result = fetch_children(regions.as_ref(), &ticket).await;
            state.form.lock().await.apply_regions(ticket, result)
        }
        None => true,
    };

    let form = state.form.lock().await;
    RegionChangeResponse {
        applied,
        regions: form.regions().clone(),
    }
}

pub async fn select_city(
    State(state): State<AppState>,
    Json(req): Json<RegionCodeRequest>,
) -> Json<RegionChangeResponse> {
    Json(cascade(&state, |form| form.select_city(req.code)).await)
}

pub async fn select_district(
    State(state): State<AppState>,
    Json(req): Json<RegionCodeRequest>,
) -> Json<RegionChangeResponse> {
    Json(cascade(&state, |form| form.select_district(req.code)).await)
}

pub async fn select_ward(
    State(state): State<AppState>,
    Json(req): Json<WardRequest>,
) -> Json<RegionChangeResponse> {
    let mut form = state.form.lock().await;
    form.select_ward(req.name);
    Json(RegionChangeResponse {
        applied: true,
        regions: form.regions().clone(),
    })
}

pub async fn put_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FormSnapshot>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    ImageUploadRequest {
        file_name: query.file_name.as_deref(),
        content_type,
        len: body.len(),
    }
    .validate()
    .map_err(|m| AppError::bad_request("INVALID_IMAGE", m))?;

    let image = PendingImage::new(
        query.file_name.as_deref().unwrap_or("avatar"),
        content_type,
        body.to_vec(),
    );

    let mut form = state.form.lock().await;
    form.choose_image(image)?;
    Ok(Json(form.snapshot()))
}

pub async fn submit(State(state): State<AppState>) -> Result<Json<SubmitResponse>, AppError> {
    let outcome = submit_shared(state.form.clone()).await?;
    Ok(Json(SubmitResponse { outcome }))
}

pub async fn notifications(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.notices.recent())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::api;
    use crate::form::fakes::{Call, FakeEmployeeApi, FakeRegionApi, fixed_today, sample_record};
    use crate::form::{Collaborators, EmployeeForm};
    use crate::services::identity::StaticIdentity;
    use crate::services::notify::{NoticeLevel, RecordingNotifier};
    use crate::state::AppState;

    struct TestApp {
        router: Router,
        state: AppState,
        employees: Arc<FakeEmployeeApi>,
    }

    async fn test_app(signed_in: bool) -> TestApp {
        let employees = Arc::new(FakeEmployeeApi::with_record(sample_record()));
        let notices = Arc::new(RecordingNotifier::new(10));
        let identity = if signed_in {
            StaticIdentity::new("7")
        } else {
            StaticIdentity::anonymous()
        };
        let deps = Collaborators {
            employees: employees.clone(),
            regions: Arc::new(FakeRegionApi::sample()),
            identity: Arc::new(identity),
            notifier: notices.clone(),
        };
        let mut form = EmployeeForm::new(deps).with_clock(fixed_today());
        form.initialize().await;

        let state = AppState::new(form, notices);
        let router = api::v1::routes().with_state(state.clone());
        TestApp {
            router,
            state,
            employees,
        }
    }

    async fn app(signed_in: bool) -> (Router, Arc<FakeEmployeeApi>) {
        let t = test_app(signed_in).await;
        (t.router, t.employees)
    }

    async fn wait_until_idle(state: &AppState) {
        for _ in 0..100 {
            if !state.form.lock().await.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("form still busy");
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn snapshot_reflects_hydrated_profile() {
        let (router, _) = app(true).await;
        let (status, body) = send(&router, Method::GET, "/me", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["first_name"], "Lan");
        assert_eq!(body["regions"]["selected_city"], 1);
        assert_eq!(body["busy"], false);
    }

    #[tokio::test]
    async fn empty_form_submit_is_422_with_every_field() {
        let (router, employees) = app(false).await;
        let (status, body) = send(&router, Method::POST, "/me/submit", None).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(body["error"]["fields"].as_object().unwrap().len(), 7);
        assert!(!employees.calls().iter().any(|c| matches!(c, Call::Update(..))));
    }

    #[tokio::test]
    async fn city_change_returns_new_districts() {
        let (router, _) = app(true).await;
        let (status, body) =
            send(&router, Method::PUT, "/me/region/city", Some(json!({ "code": 79 }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], true);
        assert_eq!(body["regions"]["districts"][0]["name"], "Quận 1");
        assert_eq!(body["regions"]["selected_district"], Value::Null);
        assert_eq!(body["regions"]["wards"], json!([]));
    }

    #[tokio::test]
    async fn field_edit_reports_error() {
        let (router, _) = app(true).await;
        let (status, body) = send(
            &router,
            Method::PATCH,
            "/me/fields",
            Some(json!({ "field": "phone_number", "value": "12345" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].is_string());
        assert!(body["errors"]["phone_number"].is_string());
    }

    #[tokio::test]
    async fn hydrated_submit_succeeds() {
        let (router, employees) = app(true).await;
        let (status, body) = send(&router, Method::POST, "/me/submit", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "updated");
        let (_, notices) = send(&router, Method::GET, "/notifications", None).await;
        assert_eq!(notices.as_array().unwrap().last().unwrap()["level"], "success");
        assert!(employees.calls().iter().any(|c| matches!(c, Call::Update(..))));
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let (router, _) = app(true).await;
        let req = Request::builder()
            .method(Method::PUT)
            .uri("/me/image?file_name=cv.pdf")
            .header("content-type", "application/pdf")
            .body(Body::from(vec![1u8, 2, 3]))
            .unwrap();
        let res = router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn abandoned_submit_still_finishes_and_frees_the_form() {
        let t = test_app(true).await;
        t.employees.update_gate.close();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            send(&t.router, Method::POST, "/me/submit", None),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(t.state.form.lock().await.is_busy());

        t.employees.update_gate.open();
        wait_until_idle(&t.state).await;
        assert_eq!(
            t.state.notices.recent().last().unwrap().level,
            NoticeLevel::Success
        );

        let (status, body) = send(&t.router, Method::POST, "/me/submit", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "updated");
    }

    #[tokio::test]
    async fn reload_does_not_hold_the_form_while_fetching() {
        let t = test_app(true).await;
        let (_, before) = send(&t.router, Method::PUT, "/me/region/city", Some(json!({ "code": 79 }))).await;
        assert_eq!(before["regions"]["selected_city"], 79);
        t.employees.detail_gate.close();

        let reload = tokio::spawn({
            let router = t.router.clone();
            async move { send(&router, Method::POST, "/me/reload", None).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let snapshot = tokio::time::timeout(
            Duration::from_secs(1),
            send(&t.router, Method::GET, "/me", None),
        )
        .await
        .expect("snapshot blocked by reload");
        assert_eq!(snapshot.0, StatusCode::OK);

        t.employees.detail_gate.open();
        let (status, body) = reload.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["regions"]["selected_city"], 1);
        assert_eq!(body["regions"]["selected_district"], 1);
        assert_eq!(body["regions"]["selected_ward"], "Phường Phúc Xá");
        assert_eq!(body["regions"]["wards"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reload_is_refused_while_submitting() {
        let t = test_app(true).await;
        t.employees.update_gate.close();
        let submit = tokio::spawn({
            let router = t.router.clone();
            async move { send(&router, Method::POST, "/me/submit", None).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (status, body) = send(&t.router, Method::POST, "/me/reload", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "BUSY");

        t.employees.update_gate.open();
        assert_eq!(submit.await.unwrap().0, StatusCode::OK);
    }
}
