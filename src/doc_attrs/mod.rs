//! Documentation support for instrument drivers: recovers the values of
//! attributes that are only created when a driver is constructed.

pub mod attr_hook;
pub mod class_model;
pub mod source_scan;
