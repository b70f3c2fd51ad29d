pub mod encoder;
pub mod errors;
pub mod region;

pub use encoder::{DEFAULT_INPUT_SIZE, TensorEncoder, as_native_bytes};
pub use errors::PreprocessError;
pub use region::{Region, RegionPair, RegionPartitioner};
