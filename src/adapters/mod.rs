pub mod file_directory;
pub mod http_directory;
pub mod static_directory;

/// Re-export commonly used types from adapters
pub use file_directory::FileDirectory;
pub use http_directory::HttpDirectory;
pub use static_directory::StaticDirectory;
