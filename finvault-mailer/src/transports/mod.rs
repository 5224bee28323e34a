mod file;
pub mod smtp;

pub use file::FileTransport;
pub use smtp::SmtpTransport;
