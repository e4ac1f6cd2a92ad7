//! Generate seed corpus for fuzzing

use std::fs;
use std::path::Path;
use zstdwcx::{pack_file, CompressionLevel, PackOptions, ProgressGate};

fn seed(corpus_dir: &Path, name: &str, data: &[u8], level: i64) -> Result<(), Box<dyn std::error::Error>> {
    let scratch = tempfile::tempdir()?;
    fs::write(scratch.path().join(name), data)?;

    let archive = corpus_dir.join(format!("seed_{}.zst", name));
    if archive.exists() {
        fs::remove_file(&archive)?;
    }
    pack_file(
        &archive,
        scratch.path(),
        &[name],
        &PackOptions::with_level(CompressionLevel::clamped(level)),
        &mut ProgressGate::always_continue(),
    )?;
    println!("✓ Generated: {}", archive.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = Path::new("fuzz/corpus/fuzz_archive_decode");
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    seed(corpus_dir, "empty", b"", 3)?;
    seed(corpus_dir, "small", b"Hello, World!", 3)?;
    seed(corpus_dir, "repetitive", &b"This is test data for compression. ".repeat(1000), 19)?;
    seed(corpus_dir, "binary", &(0..=255).collect::<Vec<u8>>(), 1)?;

    // Multi-frame: two frames back to back
    let mut joined = fs::read(corpus_dir.join("seed_small.zst"))?;
    joined.extend(fs::read(corpus_dir.join("seed_binary.zst"))?);
    fs::write(corpus_dir.join("seed_joined.zst"), joined)?;
    println!("✓ Generated: seed_joined.zst");

    println!("\nGenerated 5 seed files in {}", corpus_dir.display());
    Ok(())
}
