pub mod clock;
pub mod errors;
pub mod retry;
pub mod shutdown;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use errors::{DomainError, InfraError};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
