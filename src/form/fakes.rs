//! In-memory collaborators for controller and handler tests.
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Notify;

use crate::form::controller::Clock;
use crate::form::model::{EmployeeRecord, EmployeeUpdatePayload, Position, Region, RegionCode};
use crate::services::employee_api::{Ack, EmployeeApi, ImageUpload};
use crate::services::error::{ApiError, ApiResult};
use crate::services::region_api::{RegionApi, RegionQuery};

pub fn fixed_today() -> Clock {
    Arc::new(|| NaiveDate::from_ymd_opt(2024, 6, 10).unwrap())
}

pub fn sample_record() -> EmployeeRecord {
    serde_json::from_value(serde_json::json!({
        "first_name": "Lan",
        "last_name": "Nguyen",
        "email": "lan.nguyen@moe.vn",
        "phone_number": "0912345678",
        "gender": "Nữ",
        "date_of_birth": "04/07/1995 | 00:00:00",
        "salaries": 15000000,
        "position": { "id": 2, "name": "Staff" },
        "avatar": "https://cdn.moe.vn/avatar/7.png",
        "employee_address": {
            "city": "Thành phố Hà Nội", "cityId": 1,
            "district": "Quận Ba Đình", "districtId": 1,
            "ward": "Phường Phúc Xá", "streetName": "Hoàng Hoa Thám"
        }
    }))
    .unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Positions,
    Detail(String),
    Update(String, EmployeeUpdatePayload),
    Image { owner_id: String, file_name: String },
}

/// Holds calls that reach it while closed, until `open`.
#[derive(Default)]
pub struct Gate {
    closed: AtomicBool,
    opened: Notify,
}

impl Gate {
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn open(&self) {
        self.closed.store(false, Ordering::SeqCst);
        // stores a permit if nobody is waiting yet
        self.opened.notify_one();
    }

    async fn pass(&self) {
        if self.closed.load(Ordering::SeqCst) {
            self.opened.notified().await;
        }
    }
}

#[derive(Default)]
pub struct FakeEmployeeApi {
    record: Mutex<Option<EmployeeRecord>>,
    calls: Mutex<Vec<Call>>,
    fail_update: AtomicBool,
    fail_upload: AtomicBool,
    pub detail_gate: Gate,
    pub update_gate: Gate,
}

impl FakeEmployeeApi {
    pub fn with_record(record: EmployeeRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            ..Default::default()
        }
    }

    pub fn clear_record(&self) {
        *self.record.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upload(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn server_error() -> ApiError {
    ApiError::Upstream {
        status: 500,
        message: "boom".into(),
    }
}

#[async_trait]
impl EmployeeApi for FakeEmployeeApi {
    async fn get_employee_detail(&self, id: &str) -> ApiResult<EmployeeRecord> {
        self.record_call(Call::Detail(id.to_string()));
        self.detail_gate.pass().await;
        self.record
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::NotFound(format!("employee {id}")))
    }

    async fn update_employee_detail(
        &self,
        payload: &EmployeeUpdatePayload,
        id: &str,
    ) -> ApiResult<Ack> {
        self.record_call(Call::Update(id.to_string(), payload.clone()));
        self.update_gate.pass().await;
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(Ack {
            message: Some("updated".into()),
        })
    }

    async fn post_employee_image(&self, upload: ImageUpload) -> ApiResult<Ack> {
        self.record_call(Call::Image {
            owner_id: upload.owner_id,
            file_name: upload.file_name,
        });
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(Ack::default())
    }

    async fn get_all_positions(&self) -> ApiResult<Vec<Position>> {
        self.record_call(Call::Positions);
        Ok(vec![
            Position {
                id: 1,
                name: "Manager".into(),
            },
            Position {
                id: 2,
                name: "Staff".into(),
            },
        ])
    }
}

fn region(code: RegionCode, name: &str) -> Region {
    Region {
        code,
        name: name.to_string(),
        codename: None,
        division_type: None,
    }
}

pub struct FakeRegionApi {
    cities: Vec<Region>,
    districts: HashMap<RegionCode, Vec<Region>>,
    wards: HashMap<RegionCode, Vec<Region>>,
    queries: Mutex<Vec<RegionQuery>>,
}

impl FakeRegionApi {
    /// Hà Nội (1) and Hồ Chí Minh (79). District codes are unique across cities.
    pub fn sample() -> Self {
        let cities = vec![
            region(1, "Thành phố Hà Nội"),
            region(79, "Thành phố Hồ Chí Minh"),
        ];
        let districts = HashMap::from([
            (1, vec![region(1, "Quận Ba Đình"), region(2, "Quận Hoàn Kiếm")]),
            (79, vec![region(760, "Quận 1"), region(770, "Quận 3")]),
        ]);
        let wards = HashMap::from([
            (1, vec![region(1, "Phường Phúc Xá"), region(4, "Phường Trúc Bạch")]),
            (2, vec![region(37, "Phường Phúc Tân")]),
            (760, vec![region(26734, "Phường Tân Định")]),
        ]);
        Self {
            cities,
            districts,
            wards,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<RegionQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegionApi for FakeRegionApi {
    async fn get_regions(&self, query: RegionQuery) -> ApiResult<Vec<Region>> {
        self.queries.lock().unwrap().push(query);
        let found = match query {
            RegionQuery::Cities => Some(self.cities.clone()),
            RegionQuery::Districts(city) => self.districts.get(&city).cloned(),
            RegionQuery::Wards(district) => self.wards.get(&district).cloned(),
        };
        found.ok_or_else(|| ApiError::NotFound(format!("{query:?}")))
    }
}
