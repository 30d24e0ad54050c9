//! Loan and reservation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        loan::{LoanDetails, LoanStatus},
        reservation::Reservation,
    },
};

use super::AuthenticatedUser;

/// Create loan request
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    /// Book ID to borrow
    pub book_id: i32,
}

/// Update loan status request
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLoanStatusRequest {
    /// Target status
    pub status: LoanStatus,
    /// Librarian notes
    pub notes: Option<String>,
}

/// Reserve request
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReserveRequest {
    /// Book ID to reserve
    pub book_id: i32,
}

/// Single loan envelope
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub loan: LoanDetails,
}

/// Loan list envelope
#[derive(Serialize, ToSchema)]
pub struct LoansResponse {
    pub loans: Vec<LoanDetails>,
}

/// Fine list envelope
#[derive(Serialize, ToSchema)]
pub struct FinesResponse {
    pub fines: Vec<LoanDetails>,
}

/// Single reservation envelope
#[derive(Serialize, ToSchema)]
pub struct ReserveResponse {
    pub reserve: Reservation,
}

/// Reservation queue envelope
#[derive(Serialize, ToSchema)]
pub struct ReservationsResponse {
    pub reservations: Vec<Reservation>,
}

/// Create a new loan for the authenticated user
#[utoipa::path(
    post,
    path = "/loans/create",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = LoanResponse),
        (status = 400, description = "No copies available"),
        (status = 403, description = "Borrowing frozen by an overdue loan"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Active loan for this book already exists")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let loan = state
        .services
        .loans
        .create_loan(claims.sub, request.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(LoanResponse { loan })))
}

/// Update a loan's status. RETURNED settles the loan and reallocates the copy.
#[utoipa::path(
    patch,
    path = "/loans/{id}/status",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = UpdateLoanStatusRequest,
    responses(
        (status = 200, description = "Loan updated", body = LoanResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn update_loan_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
    Json(request): Json<UpdateLoanStatusRequest>,
) -> AppResult<Json<LoanResponse>> {
    claims.require_staff()?;

    let loan = state
        .services
        .loans
        .update_loan_status(loan_id, request.status, request.notes.as_deref())
        .await?;

    Ok(Json(LoanResponse { loan }))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/loans/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan renewed", body = LoanResponse),
        (status = 403, description = "Not the loan holder"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Overdue, returned, or renewal limit reached")
    )
)]
pub async fn renew_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanResponse>> {
    let loan = state.services.loans.renew_loan(loan_id, claims.sub).await?;
    Ok(Json(LoanResponse { loan }))
}

/// Join the reservation queue for a book
#[utoipa::path(
    post,
    path = "/loans/reserve",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateReserveRequest,
    responses(
        (status = 201, description = "Reservation created", body = ReserveResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReserveRequest>,
) -> AppResult<(StatusCode, Json<ReserveResponse>)> {
    let reserve = state
        .services
        .reservations
        .reserve(claims.sub, request.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ReserveResponse { reserve })))
}

/// Cancel an active reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = ReserveResponse),
        (status = 403, description = "Not the reservation holder"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation no longer active")
    )
)]
pub async fn cancel_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reservation_id): Path<i32>,
) -> AppResult<Json<ReserveResponse>> {
    let reserve = state
        .services
        .reservations
        .cancel(reservation_id, &claims)
        .await?;

    Ok(Json(ReserveResponse { reserve }))
}

/// Active reservation queue for a book, head first
#[utoipa::path(
    get,
    path = "/books/{id}/reservations",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Reservation queue", body = ReservationsResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<ReservationsResponse>> {
    claims.require_staff()?;

    let reservations = state.services.reservations.queue_for_book(book_id).await?;
    Ok(Json(ReservationsResponse { reservations }))
}

/// List all loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All loans", body = LoansResponse)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LoansResponse>> {
    claims.require_staff()?;

    let loans = state.services.loans.list_loans().await?;
    Ok(Json(LoansResponse { loans }))
}

/// Loans of the authenticated user
#[utoipa::path(
    get,
    path = "/loans/me",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Your loans", body = LoansResponse)
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LoansResponse>> {
    let loans = state.services.loans.get_user_loans(claims.sub).await?;
    Ok(Json(LoansResponse { loans }))
}

/// Loans carrying a fine
#[utoipa::path(
    get,
    path = "/loans/fines",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loans with fines", body = FinesResponse)
    )
)]
pub async fn list_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FinesResponse>> {
    claims.require_staff()?;

    let fines = state.services.loans.list_fines().await?;
    Ok(Json(FinesResponse { fines }))
}

/// Administrative loan deletion
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn delete_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.loans.delete_loan(loan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
