pub mod cleanup_service;
pub mod connection_service;
pub mod exchange_service;
pub mod session_service;

pub use cleanup_service::CleanupService;
pub use connection_service::ConnectionService;
pub use exchange_service::ExchangeService;
pub use session_service::SessionClient;
