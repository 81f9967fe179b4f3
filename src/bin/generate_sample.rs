use std::fs;
use std::path::Path;

/// Rows written to the sample CSV: (title, image path, score cell).
/// One backslashed path, one zero score, and one empty score cell, so the
/// main binary has something to clean up.
const SAMPLE_ROWS: &[(&str, &str, &str)] = &[
    ("Heat", "poster_images/Heat.jpg", "8.3"),
    ("Sharknado", "poster_images\\Sharknado.jpg", "3.3"),
    ("Unscored Pilot", "poster_images/Unscored_Pilot.jpg", ""),
    ("Zero Day Screener", "poster_images/Zero_Day_Screener.jpg", "0"),
    ("Lost Reel", "poster_images/Lost_Reel.jpg", "6.4"),
];

/// Paths that actually get a file on disk; the rest stay missing.
const PRESENT: &[&str] = &["poster_images/Heat.jpg", "poster_images/Sharknado.jpg"];

fn main() {
    fs::create_dir_all("poster_images").expect("Failed to create poster_images directory");

    for rel in PRESENT {
        fs::write(Path::new(rel), b"sample poster bytes").expect("Failed to write poster file");
    }

    let output_path = "sample_posters.csv";
    let mut writer =
        csv::Writer::from_path(output_path).expect("Failed to create sample CSV");
    writer
        .write_record(["title", "image_path", "imdb_score"])
        .expect("Failed to write header");
    for (title, image_path, score) in SAMPLE_ROWS {
        writer
            .write_record([*title, *image_path, *score])
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush sample CSV");

    println!(
        "Wrote {} rows to {output_path} ({} poster files on disk)",
        SAMPLE_ROWS.len(),
        PRESENT.len()
    );
}
