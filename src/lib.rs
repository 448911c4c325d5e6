pub mod sax;
