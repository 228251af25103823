//! The Thornmere realm server: a thin facade over
//! [`thornmere_server`](thornmere_server) that wires the tick loop to a
//! network accept loop. Grounded on `valence`'s own root crate, which
//! re-exports its `crates/valence` implementation behind a single facade so
//! embedders depend on one crate.

pub use thornmere_protocol as protocol;
pub use thornmere_server as server;

pub mod net;

pub use server::config::ServerConfig;
pub use server::world::World;

#[cfg(test)]
mod tests;
