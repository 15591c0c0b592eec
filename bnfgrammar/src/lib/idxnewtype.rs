// This macro generates a newtype struct over a fixed-width unsigned integer,
// so that the different kinds of index floating around a grammar can't be
// mixed up with each other.

macro_rules! IdxNewtype {
    ($(#[$attr:meta])* $n: ident, $storage: ty) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $n(pub $storage);

        impl From<$n> for usize {
            fn from(idx: $n) -> Self {
                idx.0 as usize
            }
        }

        impl From<$n> for u32 {
            fn from(idx: $n) -> Self {
                u32::from(idx.0)
            }
        }
    };
}

IdxNewtype!(
    /// A type specifically for production indices. The production at index 0
    /// is always the augmented start production; its wire number is its index
    /// plus one, since 0 is reserved for empty ACTION table cells.
    PIdx,
    u16
);
