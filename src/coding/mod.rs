pub mod bit_packing;
pub mod lzw;
