mod error;
mod handler;
mod router;

pub use error::*;
pub use handler::{ApiResponse, USER_EMAIL_HEADER, USER_ID_HEADER};
pub use router::{INTERNAL_SERVICE_HEADER, routes};
