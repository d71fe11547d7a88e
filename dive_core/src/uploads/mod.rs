pub mod category;
pub mod models;
pub mod sniff;
pub mod store;
pub mod validator;

pub use category::{all_rules, category_names, rule_for, CategoryRule};
pub use models::{StagedUpload, StoredUpload, UploadRequest};
pub use store::UploadStore;
pub use validator::{validate, Outcome, UploadRejection};
