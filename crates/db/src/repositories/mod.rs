mod artwork_repo;
mod import_run_repo;

pub use artwork_repo::ArtworkRepo;
pub use import_run_repo::ImportRunRepo;
