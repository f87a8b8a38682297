use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::{ApplicationError, Identity, LoginRequest, RegisterRequest, SendMessageRequest};
use domain::{ChatRoom, Message, User};

use crate::{
    auth::{optional_auth, require_auth},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct ValidateTokenPayload {
    token: String,
}

#[derive(Debug, Deserialize)]
struct CreateRoomPayload {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    content: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    user: User,
    token: String,
}

#[derive(Debug, Serialize)]
struct ValidateTokenResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

#[derive(Debug, Serialize)]
struct RoomResponse {
    room: ChatRoom,
}

#[derive(Debug, Serialize)]
struct RoomsResponse {
    rooms: Vec<ChatRoom>,
}

#[derive(Debug, Serialize)]
struct JoinRoomResponse {
    success: bool,
    room_id: Uuid,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: Message,
}

#[derive(Debug, Serialize)]
struct MessagesResponse {
    messages: Vec<Message>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    let required = || from_fn_with_state(state.clone(), require_auth);
    let optional = || from_fn_with_state(state.clone(), optional_auth);

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/validate", post(validate_token))
        .route("/auth/profile", get(profile).route_layer(required()))
        .route(
            "/rooms",
            get(list_rooms)
                .route_layer(optional())
                .merge(post(create_room).route_layer(required())),
        )
        .route("/rooms/{room_id}/join", post(join_room).route_layer(required()))
        .route(
            "/rooms/{room_id}/messages",
            get(get_messages)
                .route_layer(optional())
                .merge(post(send_message).route_layer(required())),
        )
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "roomcast",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let session = state
        .auth_service
        .register(RegisterRequest {
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: session.user,
            token: session.token,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let session = state
        .auth_service
        .login(LoginRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(AuthResponse {
        user: session.user,
        token: session.token,
    }))
}

async fn validate_token(
    State(state): State<AppState>,
    Json(payload): Json<ValidateTokenPayload>,
) -> Result<Json<ValidateTokenResponse>, ApiError> {
    if payload.token.is_empty() {
        return Err(ApiError::bad_request("token is required"));
    }

    let response = match state.auth_service.validate_token(&payload.token) {
        Ok(identity) => ValidateTokenResponse {
            valid: true,
            user_id: Some(identity.user_id.into()),
            username: Some(identity.username),
        },
        Err(ApplicationError::InvalidToken | ApplicationError::ExpiredToken) => {
            ValidateTokenResponse {
                valid: false,
                user_id: None,
                username: None,
            }
        }
        Err(err) => return Err(err.into()),
    };
    Ok(Json(response))
}

async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<User>, ApiError> {
    let user = state.auth_service.get_user(identity.user_id).await?;
    Ok(Json(user))
}

async fn list_rooms(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Result<Json<RoomsResponse>, ApiError> {
    if let Some(Extension(identity)) = identity {
        tracing::debug!(user_id = %identity.user_id, "listing rooms");
    }
    let rooms = state.chat_service.list_rooms().await?;
    Ok(Json(RoomsResponse { rooms }))
}

async fn create_room(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<(StatusCode, Json<RoomResponse>), ApiError> {
    let room = state
        .chat_service
        .create_room(payload.name, payload.description, identity.user_id.into())
        .await?;

    Ok((StatusCode::CREATED, Json(RoomResponse { room })))
}

async fn join_room(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<JoinRoomResponse>, ApiError> {
    state
        .chat_service
        .join_room(room_id, identity.user_id.into())
        .await?;

    Ok(Json(JoinRoomResponse {
        success: true,
        room_id,
    }))
}

async fn send_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let message = state
        .chat_service
        .send_message(SendMessageRequest {
            room_id,
            user_id: identity.user_id.into(),
            username: identity.username,
            content: payload.content,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

async fn get_messages(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let messages = state
        .chat_service
        .get_room_messages(room_id, query.limit.unwrap_or(0))
        .await?;

    Ok(Json(MessagesResponse { messages }))
}
