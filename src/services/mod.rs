//! Third-party integrations: mail delivery, payment provider callbacks and
//! video hosting.

mod error;
pub use error::{ServiceError, ServiceResult};

pub mod magic_link;
pub mod mail;
pub mod payments;
pub mod signature;
pub mod video;
