use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    accounts::{
        dto::{LoginRequest, MessageResponse, PublicAccount, RegisterRequest, UpdateAccountRequest},
        errors::AccountError,
        services::AccountService,
        tokens::TokenPair,
    },
    state::AppState,
};

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/account/:id", get(get_account))
        .route("/user/:id", put(update_account).delete(delete_account))
}

fn bad_body(rejection: JsonRejection) -> AccountError {
    warn!(error = %rejection, "malformed request body");
    AccountError::BadInput(rejection.body_text())
}

fn decode_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AccountError> {
    payload.map(|Json(body)| body).map_err(bad_body)
}

// No account can have an id that is not a UUID.
fn parse_id(raw: &str) -> Result<Uuid, AccountError> {
    raw.parse().map_err(|_| AccountError::NotFound)
}

#[instrument(skip(accounts, payload))]
pub async fn register(
    State(accounts): State<AccountService>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AccountError> {
    let req = decode_body(payload)?;
    accounts.register(req).await.map(Json)
}

#[instrument(skip(accounts, payload))]
pub async fn login(
    State(accounts): State<AccountService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AccountError> {
    let req = decode_body(payload)?;
    accounts.login(req).await.map(Json)
}

#[instrument(skip(accounts))]
pub async fn get_account(
    State(accounts): State<AccountService>,
    Path(id): Path<String>,
) -> Result<Json<PublicAccount>, AccountError> {
    let id = parse_id(&id)?;
    accounts.get_account(id).await.map(Json)
}

#[instrument(skip(accounts, payload))]
pub async fn update_account(
    State(accounts): State<AccountService>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<PublicAccount>, AccountError> {
    let id = parse_id(&id)?;
    let changes = match payload {
        Ok(Json(changes)) => changes,
        Err(rejection) => {
            // a missing account is reported before a bad body
            accounts.get_account(id).await?;
            return Err(bad_body(rejection));
        }
    };
    accounts.update_account(id, changes).await.map(Json)
}

#[instrument(skip(accounts))]
pub async fn delete_account(
    State(accounts): State<AccountService>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AccountError> {
    let id = parse_id(&id)?;
    accounts.delete_account(id).await?;
    Ok(Json(MessageResponse {
        message: "account deleted successfully".into(),
    }))
}
