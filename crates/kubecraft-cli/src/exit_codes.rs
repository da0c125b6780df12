//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Validation error - app spec or manifest validation failed
pub const VALIDATION_ERROR: u8 = 2;

/// Template error - template or values could not be loaded
pub const TEMPLATE_ERROR: u8 = 3;

/// Chart error - invalid chart metadata or output location
pub const CHART_ERROR: u8 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: u8 = 5;
