mod notification;
mod status;

pub use crate::notification::api::*;
pub use crate::status::api::*;
