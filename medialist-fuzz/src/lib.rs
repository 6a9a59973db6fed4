//! Fuzz entry points for medialist-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Wrap `fuzz_load` or `fuzz_decode_graph` in a `fuzz_target!`

use medialist_core::{decoder, media, ItemCodec};

/// Tolerant load against the media catalog; must never panic
pub fn fuzz_load(data: &[u8]) {
    let _ = ItemCodec::new(media::catalog()).load(data);
}

/// Strict graph decode against the media catalog; must never panic
pub fn fuzz_decode_graph(data: &[u8]) {
    let _ = decoder::decode_graph_strict(data, media::catalog());
}

#[cfg(test)]
mod tests {
    use super::*;
    use medialist_core::{Record, Value};

    fn valid_stream() -> Vec<u8> {
        let ty = media::catalog()
            .lookup("application.formats.mp3", "MP3File")
            .unwrap();
        let record = Record::from_fields(ty, [("title", Value::from("x"))]).unwrap();
        ItemCodec::new(media::catalog())
            .dump(&[record])
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_fuzz_load_empty() {
        fuzz_load(&[]);
    }

    #[test]
    fn test_fuzz_load_random() {
        fuzz_load(&[0x12, 0x34, 0x56, 0x78]);
        fuzz_load(&[0xFF; 1024]);
    }

    #[test]
    fn test_fuzz_decode_huge_lengths() {
        // Header, list with u32::MAX items, no body
        fuzz_decode_graph(b"MLPK\x02\x00L\xFF\xFF\xFF\xFF");
        fuzz_decode_graph(b"MLPK\x02\x00S\xFF\xFF\xFF\xFF");
    }

    #[test]
    fn test_fuzz_deep_nesting() {
        let mut data = b"MLPK\x02\x00".to_vec();
        for _ in 0..10_000 {
            data.extend_from_slice(b"L\x00\x00\x00\x01");
        }
        fuzz_decode_graph(&data);
        fuzz_load(&data);
    }

    #[test]
    fn test_fuzz_every_truncation() {
        let data = valid_stream();
        for len in 0..data.len() {
            fuzz_load(&data[..len]);
            fuzz_decode_graph(&data[..len]);
        }
    }

    #[test]
    fn test_fuzz_every_bit_flip() {
        let data = valid_stream();
        for i in 0..data.len() {
            for bit in 0..8 {
                let mut mutated = data.clone();
                mutated[i] ^= 1 << bit;
                fuzz_load(&mutated);
            }
        }
    }
}
