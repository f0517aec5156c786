pub mod cached;
pub mod result_repo;
pub mod test_repo;
