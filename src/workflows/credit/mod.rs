pub mod applications;

pub use applications::{CreditApplicationService, ServiceError, WorkflowPolicy};
