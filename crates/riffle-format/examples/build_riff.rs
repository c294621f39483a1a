//! Example: Build a WAVE file as a chunk tree.
//!
//! Generates a short sine tone, wraps it in `fmt `/`data` chunks with an
//! `INFO` list, and writes the result to disk.

use std::f32::consts::PI;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use riffle_format::{Chunk, FourCC};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sample_rate = 44100u32;
    let channels = 1u16;

    // 16-bit PCM format block
    let mut fmt = Vec::with_capacity(16);
    fmt.write_u16::<LittleEndian>(1)?;
    fmt.write_u16::<LittleEndian>(channels)?;
    fmt.write_u32::<LittleEndian>(sample_rate)?;
    fmt.write_u32::<LittleEndian>(sample_rate * 2 * channels as u32)?;
    fmt.write_u16::<LittleEndian>(2 * channels)?;
    fmt.write_u16::<LittleEndian>(16)?;

    let mut data = Vec::with_capacity(sample_rate as usize * 2);
    for i in 0..sample_rate {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * PI * 440.0 * t).sin() * 0.5;
        data.write_i16::<LittleEndian>((sample * i16::MAX as f32) as i16)?;
    }

    let mut info = Chunk::list(FourCC::from_bytes(*b"INFO"));
    info.push(Chunk::local(FourCC::from_bytes(*b"INAM"), b"A440\0".to_vec()));
    info.push(Chunk::local(
        FourCC::from_bytes(*b"ISFT"),
        b"riffle-format\0".to_vec(),
    ));

    let wave = Chunk::riff(FourCC::from_bytes(*b"WAVE"))
        .with_child(Chunk::local(FourCC::from_bytes(*b"fmt "), fmt))
        .with_child(Chunk::local(FourCC::from_bytes(*b"data"), data))
        .with_child(info);

    let output_path = Path::new("example_output.wav");
    let mut out = BufWriter::new(File::create(output_path)?);
    wave.write(&mut out)?;

    println!("Created: {}", output_path.display());
    println!("  Tone:  440 Hz, 1s, {} Hz mono", sample_rate);
    println!("  Size:  {} bytes", wave.encoded_size());
    for child in wave.children() {
        println!(
            "  {:<6} {:>8} bytes",
            child.sub_type().unwrap_or(child.id()).to_string(),
            child.encoded_size()
        );
    }

    Ok(())
}
