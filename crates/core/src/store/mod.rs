mod error;
mod traits;
mod types;

pub use error::{backend_error_status, BackendError, Result};
pub use traits::Backend;
pub use types::{row_id, Query, Row, ID_COLUMN};
