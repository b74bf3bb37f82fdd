mod browser;

pub use browser::{BrowserLauncher, BrowserSession, ChromeLauncher};
