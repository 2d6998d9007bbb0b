pub mod credential;
pub mod device;
pub mod session;
pub mod telemetry;
pub mod types;

pub use credential::derive_login_password;
pub use device::StationDevice;
pub use session::SessionClient;
pub use telemetry::StationClient;
pub use types::{ClientConfig, LoginResponse, SaltPair};
