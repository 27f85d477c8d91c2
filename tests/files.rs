use std::fs;

use adaptive_huffman::bitstream::container::BitFormat;
use adaptive_huffman::compression::{compress::compress, decompress};
use adaptive_huffman::compression::header::ImageShape;
use adaptive_huffman::tools::cli::{AhOpts, Mode};
use adaptive_huffman::Error;

fn opts_for(file: &std::path::Path, mode: Mode) -> AhOpts {
    AhOpts {
        file: Some(file.to_string_lossy().into_owned()),
        op_mode: mode,
        ..AhOpts::new()
    }
}

#[test]
fn packed_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    let text = b"she sells sea shells by the sea shore".repeat(20);
    fs::write(&input, &text).unwrap();

    compress(&opts_for(&input, Mode::Zip)).unwrap();
    let packed = dir.path().join("notes.txt.ahc");
    assert!(packed.exists());
    assert!(fs::metadata(&packed).unwrap().len() < text.len() as u64);

    decompress::test(&opts_for(&packed, Mode::Test)).unwrap();

    fs::remove_file(&input).unwrap();
    decompress::decompress(&opts_for(&packed, Mode::Unzip)).unwrap();
    assert_eq!(fs::read(&input).unwrap(), text);
}

#[test]
fn ascii_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data.bin");
    let data: Vec<u8> = (0..300u32).map(|i| (i * i % 17) as u8).collect();
    fs::write(&input, &data).unwrap();

    let mut opts = opts_for(&input, Mode::Zip);
    opts.format = BitFormat::Ascii;
    compress(&opts).unwrap();

    let ascii = dir.path().join("data.bin.ahc");
    let body = fs::read(&ascii).unwrap();
    assert!(body.iter().all(|&c| c == b'0' || c == b'1'));

    let mut opts = opts_for(&ascii, Mode::Unzip);
    opts.format = BitFormat::Ascii;
    opts.output_file = Some(dir.path().join("restored").to_string_lossy().into_owned());
    decompress::decompress(&opts).unwrap();
    assert_eq!(fs::read(dir.path().join("restored")).unwrap(), data);
}

#[test]
fn image_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pixels.raw");
    let shape = ImageShape {
        width: 12,
        height: 4,
        three_channel: true,
    };
    let data: Vec<u8> = (0..shape.byte_count().unwrap())
        .map(|i| (i / 3 % 5) as u8 * 40)
        .collect();
    fs::write(&input, &data).unwrap();

    let mut opts = opts_for(&input, Mode::Zip);
    opts.image = Some(shape);
    compress(&opts).unwrap();

    let mut opts = opts_for(&dir.path().join("pixels.raw.ahc"), Mode::Unzip);
    opts.force_overwrite = true;
    decompress::decompress(&opts).unwrap();
    assert_eq!(fs::read(&input).unwrap(), data);
}

#[test]
fn existing_output_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.txt");
    fs::write(&input, b"aaaa").unwrap();
    let packed = dir.path().join("a.txt.ahc");
    fs::write(&packed, b"keep me").unwrap();

    assert!(matches!(
        compress(&opts_for(&input, Mode::Zip)),
        Err(Error::Io(_))
    ));
    assert_eq!(fs::read(&packed).unwrap(), b"keep me");
}

#[test]
fn mismatched_alphabet_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("wide.bin");
    fs::write(&input, [0u8, 1, 2, 200]).unwrap();
    let mut opts = opts_for(&input, Mode::Zip);
    opts.alphabet = 16;
    assert!(matches!(
        compress(&opts),
        Err(Error::SymbolOutOfAlphabet {
            symbol: 200,
            alphabet: 16
        })
    ));
}

#[test]
fn corrupt_container_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.ahc");
    fs::write(&bad, [9u8, 0xff]).unwrap();
    assert!(matches!(
        decompress::test(&opts_for(&bad, Mode::Test)),
        Err(Error::InvalidContainer(_))
    ));
}
