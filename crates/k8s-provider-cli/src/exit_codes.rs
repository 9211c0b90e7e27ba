//! Exit codes of the `k8s-provider` binary
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - configuration rejected by the unit schema
pub const VALIDATION_ERROR: i32 = 2;

/// Provider error - an operation returned error diagnostics
pub const PROVIDER_ERROR: i32 = 3;

/// CRD error - a CRD file could not be loaded
pub const CRD_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - unknown type name or invalid arguments (sysexits.h)
pub const USAGE_ERROR: i32 = 64;
