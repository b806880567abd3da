pub mod mrz;

pub use mrz::{MrzAdapter, MrzValidation, RejectionReason};
