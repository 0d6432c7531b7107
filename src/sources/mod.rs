//! Track metadata backends.

pub mod ytdlp;

pub use ytdlp::YtDlpResolver;
