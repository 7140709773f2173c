pub mod clock;
pub mod debug_logger;
pub mod http_client;
pub mod storage;
pub mod types;

// Re-export commonly used items
pub use clock::{ClockTrait, SystemClock};
pub use debug_logger::{get_debug_logger, EnhancedDebugLogger};
pub use http_client::{
    default_http_client, HttpClientTrait, HttpMethod, HttpRequest, HttpResponse, OfflineHttpClient,
};
pub use storage::{LocalStore, StoredState};
pub use types::*;
