//! Data models for the library service

pub mod book;
pub mod borrowing;
pub mod notification;
pub mod user;

// Re-export commonly used types
pub use book::{Book, CoverType};
pub use borrowing::{Borrowing, BorrowingDetails, BorrowingShort};
pub use notification::NotificationTarget;
pub use user::{User, UserClaims, UserShort};
