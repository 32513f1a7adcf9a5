pub mod directory;

pub use directory::{
    DirectoryError, DirectoryResult, DirectoryWatch, DomainDirectory, ServiceDirectory,
};
