//! Backend operation and visibility bitmasks.
//!
//! These mirror the bit values reported by the backend in parameter
//! descriptions.

pub const OPERATION_NONE: u32 = 0;
pub const OPERATION_READ: u32 = 1;
pub const OPERATION_WRITE: u32 = 2;
pub const OPERATION_EVENT: u32 = 4;

pub const FLAG_VISIBLE: u32 = 1;
pub const FLAG_INTERNAL: u32 = 2;
pub const FLAG_TRANSFORM: u32 = 4;
pub const FLAG_SERVICE: u32 = 8;
/// Observed on real firmware as 10, not the 0x10 the vendor
/// documentation claims.
pub const FLAG_STICKY: u32 = 10;
