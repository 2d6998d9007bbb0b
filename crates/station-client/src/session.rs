use crate::credential::derive_login_password;
use crate::types::{ClientConfig, LoginResponse, SaltPair};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use station_core::{is_success_marker, Result, StationError};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const ADMIN_USER: &str = "admin";

/// 请求盐值时使用的占位密码
const SALT_REQUEST_PASSWORD: &str = "seeksalthash";

const API_PREFIX: &str = "/api/v1/";

/// 设备 Web 管理接口的会话客户端
///
/// 同一个实例内的 Cookie 在所有请求之间保持；重新登录会复用同一个
/// Cookie 容器，由设备下发的新 Cookie 覆盖旧会话。
/// 客户端内部不做重试，重试策略由调用方决定。
pub struct SessionClient {
    http: Client,
    base_url: RwLock<Url>,
    last_cache_token: AtomicI64,
}

impl SessionClient {
    /// 创建新的会话客户端
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let http = Client::builder()
            .cookie_provider(jar)
            .default_headers(headers)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: RwLock::new(parse_base_url(&config.base_url)?),
            last_cache_token: AtomicI64::new(0),
        })
    }

    /// 当前设备地址
    pub async fn base_url(&self) -> Url {
        self.base_url.read().await.clone()
    }

    /// 登录设备
    ///
    /// 1. 访问根路径获取初始 Cookie
    /// 2. 以占位密码请求一次性盐值
    /// 3. 派生真实密码并登录
    /// 4. 访问 `session/menu` 预热会话
    pub async fn login(&self, base_url: &str, password: &str) -> Result<LoginResponse> {
        let base = parse_base_url(base_url)?;
        *self.base_url.write().await = base.clone();

        debug!(base_url = %base, "Priming session cookies");
        self.with_referer(self.http.get(base.clone()), &base)
            .send()
            .await?
            .error_for_status()?;

        let salts = self.fetch_salts(&base).await?;
        let derived = derive_login_password(password, &salts.salt, &salts.salt_web_ui);

        let body = self
            .post_form(
                &base,
                "session/login",
                &[("username", ADMIN_USER), ("password", derived.as_str())],
            )
            .await?;
        if !is_success_marker(&body) {
            let reason = body
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| body.get("error").and_then(Value::as_str))
                .unwrap_or("missing success marker");
            warn!(base_url = %base, reason = %reason, "Login rejected by device");
            return Err(StationError::Authentication(format!(
                "Login failed: {}",
                reason
            )));
        }
        let response = login_response(body)?;

        self.api_get("session/menu").await?;

        info!(base_url = %base, "Logged in to station");
        Ok(response)
    }

    /// 请求盐值对
    async fn fetch_salts(&self, base: &Url) -> Result<SaltPair> {
        let body = self
            .post_form(
                base,
                "session/login",
                &[
                    ("username", ADMIN_USER),
                    ("password", SALT_REQUEST_PASSWORD),
                    ("logout", "true"),
                ],
            )
            .await?;
        if !is_success_marker(&body) {
            return Err(StationError::Authentication(
                "Failed to get salts".to_string(),
            ));
        }

        login_response(body)?.salt_pair().ok_or_else(|| {
            StationError::Authentication("Salt response is missing salt fields".to_string())
        })
    }

    /// 登出
    pub async fn logout(&self) -> Result<()> {
        let body = self.api_post("session/logout", &[]).await?;
        if is_success_marker(&body) {
            info!("Logged out from station");
            Ok(())
        } else {
            Err(StationError::Logout("Failed to logout".to_string()))
        }
    }

    /// GET `/api/v1/<path>?_=<token>`
    pub async fn api_get(&self, path: &str) -> Result<Value> {
        let base = self.base_url().await;
        let url = api_url(&base, path)?;
        let token = self.next_cache_token();

        debug!(path = %path, token = %token, "GET station API");
        let response = self
            .with_referer(self.http.get(url), &base)
            .query(&[("_", token)])
            .send()
            .await?;

        decode_body(response).await
    }

    /// POST `/api/v1/<path>`，参数以 URL 编码表单发送（为空时不带请求体）
    pub async fn api_post(&self, path: &str, form: &[(&str, &str)]) -> Result<Value> {
        let base = self.base_url().await;
        self.post_form(&base, path, form).await
    }

    async fn post_form(&self, base: &Url, path: &str, form: &[(&str, &str)]) -> Result<Value> {
        let url = api_url(base, path)?;

        debug!(path = %path, "POST station API");
        let mut request = self.with_referer(self.http.post(url), base);
        if !form.is_empty() {
            request = request.form(form);
        }

        decode_body(request.send().await?).await
    }

    fn with_referer(&self, request: RequestBuilder, base: &Url) -> RequestBuilder {
        request.header(REFERER, base.as_str().trim_end_matches('/'))
    }

    /// 防缓存参数：当前毫秒时间戳，同一实例内严格递增
    fn next_cache_token(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = self.last_cache_token.load(Ordering::Acquire);
        loop {
            let next = now.max(last + 1);
            match self.last_cache_token.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

/// 解析设备地址，裸主机名补全为 `http://`
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    Url::parse(&candidate)
        .map_err(|e| StationError::Config(format!("Invalid device address {}: {}", raw, e)))
}

fn api_url(base: &Url, path: &str) -> Result<Url> {
    let path = format!("{}{}", API_PREFIX, path.trim_start_matches('/'));
    base.join(&path)
        .map_err(|e| StationError::Internal(format!("Invalid API path {}: {}", path, e)))
}

/// 已带成功标记的登录响应，字段类型不符同样按认证失败处理
fn login_response(body: Value) -> Result<LoginResponse> {
    serde_json::from_value(body)
        .map_err(|e| StationError::Authentication(format!("Malformed login response: {}", e)))
}

async fn decode_body(response: Response) -> Result<Value> {
    let response = response.error_for_status()?;
    let text = response.text().await?;

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url() {
        let url = parse_base_url("192.168.100.1").unwrap();
        assert_eq!(url.as_str(), "http://192.168.100.1/");

        let url = parse_base_url("https://modem.local:8443").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.port(), Some(8443));

        assert!(matches!(parse_base_url("http://"), Err(StationError::Config(_))));
    }

    #[test]
    fn test_api_url() {
        let base = parse_base_url("http://192.168.100.1").unwrap();
        assert_eq!(
            api_url(&base, "sta_status").unwrap().as_str(),
            "http://192.168.100.1/api/v1/sta_status"
        );
        assert_eq!(
            api_url(&base, "/session/login").unwrap().as_str(),
            "http://192.168.100.1/api/v1/session/login"
        );
    }

    #[test]
    fn test_login_response_type_mismatch() {
        let err = login_response(serde_json::json!({ "error": "ok", "salt": 7 })).unwrap_err();
        assert!(matches!(err, StationError::Authentication(_)));
    }

    #[test]
    fn test_cache_token_strictly_increasing() {
        let client = SessionClient::new(&ClientConfig::default()).unwrap();
        let mut previous = client.next_cache_token();
        for _ in 0..100 {
            let token = client.next_cache_token();
            assert!(token > previous);
            previous = token;
        }
    }
}
