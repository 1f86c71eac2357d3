// tessera-common: shared types for the Tessera workspace

pub mod protocol;
pub mod types;
