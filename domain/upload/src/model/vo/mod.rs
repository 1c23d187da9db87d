mod chunk;
mod fingerprint;

#[rustfmt::skip]
pub use {
    chunk::*,
    fingerprint::*,
};
