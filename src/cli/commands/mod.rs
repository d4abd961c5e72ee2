pub mod fingerprint;
pub mod migrate;
pub mod rescore;
pub mod seed;
pub mod user;
