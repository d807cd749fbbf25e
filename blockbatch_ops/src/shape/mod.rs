pub mod pad;
pub mod space_to_batch;
