//! Minimal entity interface shared by the domain types.

/// Something with a stable, strongly-typed identity.
///
/// Implemented by every persisted domain type so stores can be written
/// generically over the id.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
