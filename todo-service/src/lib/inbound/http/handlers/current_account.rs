use axum::extract::State;
use axum::http::StatusCode;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::middleware::AuthenticatedAccount;
use crate::inbound::http::router::AppState;

pub async fn get_current_account<AS: AccountServicePort>(
    State(state): State<AppState<AS>>,
    caller: AuthenticatedAccount,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    state
        .account_service
        .get_account(&caller.account_id)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}
