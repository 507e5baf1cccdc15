//! Map type shared by error sets and graft bookkeeping: `hashbrown` by
//! default, `std` with the `std-hash` feature.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::HashMap;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::HashMap;
}
