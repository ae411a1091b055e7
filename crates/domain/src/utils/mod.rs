//! Pure helper functions operating on domain data.

pub mod normalize;
