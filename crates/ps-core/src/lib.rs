//! Foundational primitives for plane rescaling.
//!
//! ## Planes and Stride
//! A plane holds `channels` interleaved samples per pixel (1 to 4). `width`
//! counts pixels, while `stride` is the distance, in samples, between
//! adjacent row starts. `stride` may be greater than `width * channels`, which
//! allows borrowed views over padded buffers and subviews.
//!
//! ## Textures
//! A [`Texture`] is a read-only plane with an [`AddressMode`] and the fetch
//! rules of a hardware texture unit in unnormalized coordinates: texel `i`
//! has its center at `i + 0.5`, bilinear weights are quantized to 8
//! fractional bits, and integer samples are returned per channel.

mod address;
mod error;
mod plane;
mod sample;
mod texture;

pub use address::{AddressMode, map_index};
pub use error::Error;
pub use plane::{Plane, PlaneView, PlaneViewMut};
pub use sample::Sample;
pub use texture::{FILTER_FRAC_BITS, Texture};
