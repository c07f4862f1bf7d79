mod xlsx_parser;

pub use xlsx_parser::XlsxParser;
