//! Superpixel partitioning for annotation overlays.
//!
//! - **SLIC**: grid-seeded local clustering in CIELAB + image space
//! - **Connectivity**: fragments below the minimum size merge into a neighbor
//! - **Encoding**: 24-bit labels stored across three 8-bit channels
//! - **Biased**: legacy variant, denser inside a lesion contour
//! - **Overlay**: per-label values painted back onto pixels

pub mod biased;
pub mod cielab;
mod connectivity;
pub mod encoding;
pub mod overlay;
pub mod slic;

pub use biased::{partition_with_contour, BiasedConfig, BiasedPartition, Relabel, Side};
pub use encoding::{decode_label, decode_labels, encode_label, encode_labels, MAX_LABEL};
pub use overlay::{overlay_intensity, overlay_mask};
pub use slic::{partition, partition_with_config, SlicConfig};
