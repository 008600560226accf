mod handler;

pub use handler::download_version;
