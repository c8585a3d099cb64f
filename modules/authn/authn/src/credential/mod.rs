pub mod hash;
pub mod matcher;

pub use hash::{Hash, HashAlgorithm, HashRequest, HashService, MODULAR_PREFIX};
pub use matcher::{HashedCredentialsMatcher, ModularCryptMatcher, SimpleCredentialsMatcher};
