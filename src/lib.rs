//! Scroll-aware element location, form filling and dropdown selection for
//! Flutter apps on Android, driven through Appium.

pub mod cli;
pub mod driver;
pub mod error;
pub mod locator;
pub mod logging;
pub mod report;
pub mod spec;
pub mod trace;
