mod consumption;
mod user;

pub use consumption::{ConsumptionKind, ConsumptionRecord, UnknownKind};
pub use user::User;
