pub mod object;
pub mod telemetry;

pub use object::{ChannelCommon, DataType, ObjectDescriptor, StateCommon, StoredState};
pub use telemetry::{TelemetryDocument, CHANNEL_ID_FIELD};
