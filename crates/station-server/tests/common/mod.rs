use async_trait::async_trait;
use serde_json::{json, Value};
use station_client::{LoginResponse, StationDevice};
use station_core::{Result, StationError};
use station_types::TelemetryDocument;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// 脚本化的设备：记录调用顺序，可按开关注入失败和延迟
#[derive(Default)]
pub struct FakeDevice {
    pub calls: Mutex<Vec<&'static str>>,
    pub reject_login: AtomicBool,
    pub fail_docsis: AtomicBool,
    pub fail_logout: AtomicBool,
    pub login_delay: Mutex<Duration>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

fn document(value: Value) -> TelemetryDocument {
    serde_json::from_value(value).unwrap()
}

#[async_trait]
impl StationDevice for FakeDevice {
    async fn login(&self, _base_url: &str, password: &str) -> Result<LoginResponse> {
        self.record("login");
        let delay = *self.login_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.reject_login.load(Ordering::SeqCst) || password != "secret" {
            return Err(StationError::Authentication("wrong password".into()));
        }
        Ok(serde_json::from_value(json!({ "error": "ok" })).unwrap())
    }

    async fn get_station_status(&self) -> Result<TelemetryDocument> {
        self.record("status");
        Ok(document(json!({
            "error": "ok",
            "data": { "firmwareversion": "AR01.02.068", "uptime": "3600 s" }
        })))
    }

    async fn get_docsis_status(&self) -> Result<TelemetryDocument> {
        self.record("docsis");
        if self.fail_docsis.load(Ordering::SeqCst) {
            return Err(StationError::Internal("connection reset".into()));
        }
        Ok(document(json!({
            "error": "ok",
            "data": {
                "downstream": [
                    { "__id": "1", "power": "5 dBmV" },
                    { "__id": "2", "power": "6 dBmV" }
                ]
            }
        })))
    }

    async fn get_about(&self) -> Result<TelemetryDocument> {
        self.record("about");
        Ok(document(json!({ "data": { "model": "TG3442DE" } })))
    }

    async fn restart(&self) -> Result<Value> {
        self.record("restart");
        Ok(Value::Null)
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout");
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(StationError::Internal("host unreachable".into()));
        }
        Ok(())
    }
}
