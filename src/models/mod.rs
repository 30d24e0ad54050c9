//! Data models for the Biblioteca server

pub mod book;
pub mod loan;
pub mod reservation;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookStatus, BookSummary};
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use reservation::{Reservation, ReservationStatus};
pub use user::{Role, User, UserClaims, UserSummary};
