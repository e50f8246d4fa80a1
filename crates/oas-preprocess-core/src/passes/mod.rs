//! Rewrite pass modules.
//!
//! Each pass handles one concern for one visited schema and one target.
//! The visitor runs them in order (0-2) for every node the walker reaches.

pub mod p0_serializers;
pub mod p1_readonly;
pub mod p2_discriminator;
