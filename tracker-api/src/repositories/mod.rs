mod repo_error;
mod work_item_type_repo;

pub use repo_error::RepositoryError;
pub use work_item_type_repo::*;
