//! Dump a small library and load it back

use medialist_core::{dump_media_items, load_media_items, media, Record, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Medialist Basic Round Trip Example\n");

    let catalog = media::catalog();
    let mp3 = catalog.lookup_qualified("application.formats.mp3.MP3File")?;
    let flac = catalog.lookup_qualified("application.formats.xiph.FLACFile")?;

    let library = vec![
        Record::from_fields(
            mp3,
            [
                ("title", Value::from("Opening")),
                ("artist", Value::from("The Examples")),
                ("~filename", Value::from("/music/opening.mp3")),
                ("~#length", Value::Int(212)),
            ],
        )?,
        Record::from_fields(
            flac,
            [
                ("title", Value::from("Closing")),
                ("~#rating", Value::Float(0.75)),
            ],
        )?,
    ];

    let data = dump_media_items(&library)?;
    println!("Encoded {} items into {} bytes", library.len(), data.len());
    println!("Hex: {}", hex::encode(&data));
    println!();

    let loaded = load_media_items(&data)?;
    for (i, item) in loaded.iter().enumerate() {
        println!("#{} {}", i, item.ty().qualified_name());
        for (key, value) in item.fields().iter() {
            println!("    {} = {:?}", key, value);
        }
    }

    assert_eq!(loaded, library);
    println!("\n✓ Loaded items match the originals");

    Ok(())
}

