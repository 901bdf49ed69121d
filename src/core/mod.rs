// Core modules implementing envelope handling, save routing, and error modeling.
pub mod dispatch;
pub mod error;
pub mod hal;
