//! Utility modules for filesystem and external tool operations.

pub mod fs;
pub mod openssl;
pub mod path;
