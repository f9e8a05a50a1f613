#[cfg(feature = "browser")]
pub mod browser_source;
pub mod html_source;
pub mod json_export;
pub mod ntfy;
pub mod selectors;

#[cfg(feature = "browser")]
pub use browser_source::BrowserRecordSource;
pub use html_source::HtmlRecordSource;
pub use json_export::JsonFileExporter;
pub use ntfy::NtfyNotifier;
