pub use client::CloudClient;
pub use error::{Result, ShellError};
pub use extractor::{DEFAULT_MODEL, ExtractError, Extractor};
pub use shell::{CloudStatus, Shell};

mod client;
mod error;
mod export;
mod extractor;
mod shell;
