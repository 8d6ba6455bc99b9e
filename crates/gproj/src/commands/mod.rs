pub mod apply;
pub mod available;
pub mod delete;
pub mod gcloud;
