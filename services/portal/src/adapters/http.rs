//! services/portal/src/adapters/http.rs
//!
//! This module contains the REST backend adapter, the concrete implementation
//! of the `AuthService` and `BookingService` ports from the `core` crate.
//! Every authenticated call carries `Authorization: Bearer <token>`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use padho_likho_core::domain::{
    AuthGrant, Booking, BookingRequest, BookingStatus, ProfileUpdate, Registration, Viewer,
};
use padho_likho_core::ports::{AuthService, BookingService, PortError, PortResult};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A client for the portal's REST backend.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

/// Whether a request was made on behalf of a signed-in viewer.
#[derive(Clone, Copy)]
enum Caller<'a> {
    Anonymous,
    Bearer(&'a str),
}

impl BackendClient {
    /// Creates a new `BackendClient` rooted at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, builder: RequestBuilder, caller: Caller<'_>) -> PortResult<Response> {
        let builder = match caller {
            Caller::Anonymous => builder,
            Caller::Bearer(token) => builder.bearer_auth(token),
        };
        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or_else(|| status.to_string());
        debug!("Backend answered {}: {}", status, message);

        Err(match (status, caller) {
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, Caller::Bearer(_)) => {
                PortError::Unauthorized
            }
            (StatusCode::NOT_FOUND, _) => PortError::NotFound(message),
            _ => PortError::Rejected(message),
        })
    }

    async fn read<T: DeserializeOwned>(response: Response) -> PortResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Unreadable backend response: {}", e)))
    }
}

//=========================================================================================
// Wire Structs
//=========================================================================================

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct UserRecord {
    #[serde(alias = "_id")]
    id: String,
    role: String,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

impl UserRecord {
    fn into_domain(self) -> PortResult<Viewer> {
        let role = self
            .role
            .parse()
            .map_err(|e| PortError::Unexpected(format!("Backend sent a user with {}", e)))?;
        let display_name = self
            .name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.clone());
        Ok(Viewer {
            id: self.id,
            role,
            display_name,
            email: self.email,
            phone: self.phone,
        })
    }
}

/// Some endpoints wrap the user as `{ "user": {...} }`, others don't.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: UserRecord },
    Bare(UserRecord),
}

impl UserEnvelope {
    fn into_user(self) -> UserRecord {
        match self {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user,
        }
    }
}

#[derive(Deserialize)]
struct AuthRecord {
    token: String,
    user: UserRecord,
}

impl AuthRecord {
    fn into_domain(self) -> PortResult<AuthGrant> {
        Ok(AuthGrant {
            token: self.token,
            user: self.user.into_domain()?,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRecord {
    #[serde(alias = "_id")]
    id: String,
    status: Option<BookingStatus>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BookingEnvelope {
    Wrapped { booking: BookingRecord },
    Bare(BookingRecord),
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl AuthService for BackendClient {
    async fn login(&self, email: &str, password: &str) -> PortResult<AuthGrant> {
        let request = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request, Caller::Anonymous).await?;
        Self::read::<AuthRecord>(response).await?.into_domain()
    }

    async fn register(&self, registration: &Registration) -> PortResult<AuthGrant> {
        let request = self.http.post(self.url("/api/auth/register")).json(&json!({
            "name": registration.name,
            "email": registration.email,
            "password": registration.password,
            "role": registration.role,
            "phone": registration.phone,
        }));
        let response = self.send(request, Caller::Anonymous).await?;
        Self::read::<AuthRecord>(response).await?.into_domain()
    }

    async fn current_user(&self, token: &str) -> PortResult<Viewer> {
        let request = self.http.get(self.url("/api/auth/me"));
        let response = self.send(request, Caller::Bearer(token)).await?;
        Self::read::<UserEnvelope>(response)
            .await?
            .into_user()
            .into_domain()
    }

    async fn forgot_password(&self, email: &str) -> PortResult<()> {
        let request = self
            .http
            .post(self.url("/api/auth/forgot-password"))
            .json(&json!({ "email": email }));
        self.send(request, Caller::Anonymous).await?;
        Ok(())
    }

    async fn reset_password(&self, reset_token: &str, new_password: &str) -> PortResult<()> {
        let request = self
            .http
            .post(self.url("/api/auth/reset-password"))
            .json(&json!({ "token": reset_token, "password": new_password }));
        self.send(request, Caller::Anonymous).await?;
        Ok(())
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> PortResult<Viewer> {
        let request = self.http.put(self.url("/api/users/profile")).json(update);
        let response = self.send(request, Caller::Bearer(token)).await?;
        Self::read::<UserEnvelope>(response)
            .await?
            .into_user()
            .into_domain()
    }
}

#[async_trait]
impl BookingService for BackendClient {
    async fn submit_booking(&self, token: &str, request: &BookingRequest) -> PortResult<Booking> {
        let builder = self.http.post(self.url("/api/bookings")).json(request);
        let response = self.send(builder, Caller::Bearer(token)).await?;
        let record = match Self::read::<BookingEnvelope>(response).await? {
            BookingEnvelope::Wrapped { booking } | BookingEnvelope::Bare(booking) => booking,
        };
        Ok(Booking {
            id: record.id,
            request: request.clone(),
            status: record.status.unwrap_or(BookingStatus::Pending),
            created_at: record.created_at.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, HeaderMap},
        routing::{get, post, put},
        Json, Router,
    };
    use chrono::NaiveDate;
    use padho_likho_core::domain::{LessonDuration, Role};
    use serde_json::Value;

    const GOOD_TOKEN: &str = "good-token";

    fn bearer_ok(headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some("Bearer good-token")
    }

    fn asha() -> Value {
        json!({"_id": "64f0c2", "name": "Asha", "email": "asha@example.com", "role": "student"})
    }

    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "secret" {
            (StatusCode::OK, Json(json!({"token": GOOD_TOKEN, "user": asha()})))
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"})))
        }
    }

    async fn me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        if bearer_ok(&headers) {
            (StatusCode::OK, Json(json!({"user": asha()})))
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token is not valid"})))
        }
    }

    async fn profile(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if !bearer_ok(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({})));
        }
        let mut user = asha();
        user["name"] = body["name"].clone();
        (StatusCode::OK, Json(user))
    }

    async fn bookings(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if !bearer_ok(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({})));
        }
        if body["durationMinutes"] != 90 || body["date"] != "2026-03-14" {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad booking payload"})));
        }
        (
            StatusCode::CREATED,
            Json(json!({"booking": {"_id": "bk-1", "status": "confirmed", "createdAt": "2026-03-01T10:00:00Z"}})),
        )
    }

    async fn forgot(Json(body): Json<Value>) -> StatusCode {
        if body["email"] == "asha@example.com" {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        }
    }

    async fn stub_backend() -> BackendClient {
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/me", get(me))
            .route("/api/auth/forgot-password", post(forgot))
            .route("/api/users/profile", put(profile))
            .route("/api/bookings", post(bookings));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        BackendClient::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap()
    }

    fn request() -> BookingRequest {
        BookingRequest {
            teacher_id: "t-1".to_string(),
            subject: "Physics".to_string(),
            class: "12".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            time: "4:00 PM".to_string(),
            duration_minutes: LessonDuration::NinetyMinutes,
            topic: "Optics".to_string(),
            notes: None,
            total_amount: 900.0,
        }
    }

    #[tokio::test]
    async fn login_returns_token_and_viewer() {
        let client = stub_backend().await;

        let grant = client.login("asha@example.com", "secret").await.unwrap();

        assert_eq!(grant.token, GOOD_TOKEN);
        assert_eq!(grant.user.id, "64f0c2");
        assert_eq!(grant.user.role, Role::Student);
        assert_eq!(grant.user.display_name, "Asha");
    }

    #[tokio::test]
    async fn bad_password_is_rejected_with_backend_message() {
        let client = stub_backend().await;

        let result = client.login("asha@example.com", "nope").await;

        assert_eq!(result.unwrap_err(), PortError::Rejected("Invalid credentials".to_string()));
    }

    #[tokio::test]
    async fn current_user_sends_bearer_token() {
        let client = stub_backend().await;

        assert_eq!(client.current_user(GOOD_TOKEN).await.unwrap().role, Role::Student);
        assert_eq!(client.current_user("expired").await.unwrap_err(), PortError::Unauthorized);
    }

    #[tokio::test]
    async fn profile_update_returns_fresh_viewer() {
        let client = stub_backend().await;
        let update = ProfileUpdate {
            name: Some("Asha Rao".to_string()),
            ..Default::default()
        };

        let viewer = client.update_profile(GOOD_TOKEN, &update).await.unwrap();

        assert_eq!(viewer.display_name, "Asha Rao");
    }

    #[tokio::test]
    async fn booking_is_posted_with_camel_case_fields() {
        let client = stub_backend().await;

        let booking = client.submit_booking(GOOD_TOKEN, &request()).await.unwrap();

        assert_eq!(booking.id, "bk-1");
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.request, request());
    }

    #[tokio::test]
    async fn unknown_email_maps_to_not_found() {
        let client = stub_backend().await;

        assert!(client.forgot_password("asha@example.com").await.is_ok());
        assert!(matches!(
            client.forgot_password("ghost@example.com").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_unexpected() {
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();

        assert!(matches!(
            client.current_user(GOOD_TOKEN).await,
            Err(PortError::Unexpected(_))
        ));
    }
}
