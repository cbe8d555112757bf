//! Entity metadata model: descriptors, registry, navigation, key identity

pub mod descriptor;
pub mod keys;
pub mod navigation;
pub mod registry;

pub use descriptor::{
    DescriptorBuilder, EntityDescriptor, MediaDescriptor, Multiplicity, NavigationDescriptor,
    PropertyDescriptor, canonical_name,
};
pub use keys::{key_match, key_match_map, key_values, set_key_values};
pub use navigation::{NavInfo, canonical_association, resolve};
pub use registry::ModelRegistry;
