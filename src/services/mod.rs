pub mod order_code;
pub mod records;
pub mod sanitizer;
pub mod xlsx_codec;
pub mod xml_codec;

pub use order_code::{parse_order, parse_order_lenient};
pub use sanitizer::sanitize;
pub use xlsx_codec::XlsxCodec;
pub use xml_codec::XmlCodec;
