pub mod actuator;
pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod knowledge;
pub mod pipeline;
pub mod router;
pub mod session;
pub mod transcript;

pub use bus::EventBus;
pub use config::Config;
pub use pipeline::CommandLoop;
pub use router::IntentRouter;
pub use session::SessionMonitor;
