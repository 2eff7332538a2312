mod file;

pub use file::FileItem;
