use hotspot_forecast_backend::{
    config::DEFAULT_PREDICTIONS_DIR,
    geojson::{point_coordinates, FeatureCollection},
    models::coerce_probability,
    week::IsoWeek,
};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{exit, Command};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "check-data" => {
            let dir = args.get(2).map(String::as_str).unwrap_or(DEFAULT_PREDICTIONS_DIR);
            if !check_data(Path::new(dir)) {
                exit(1);
            }
        }
        "test" => run_tests(),
        "dev" => dev_server(),
        "help" | "--help" | "-h" => print_help(),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_help();
            exit(1);
        }
    }
}

fn print_help() {
    println!("Hotspot Forecast Backend - Development Tasks");
    println!();
    println!("Usage: cargo run --bin xtask <COMMAND>");
    println!();
    println!("Commands:");
    println!("  check-data [DIR]  Validate weekly prediction exports (default: {DEFAULT_PREDICTIONS_DIR})");
    println!("  test              Validate exports, then run tests");
    println!("  dev               Validate exports, then start the local server");
    println!("  help              Show this help");
}

/// Parse every `<week>.geojson` export the server would read and report
/// anything it would have to coerce or skip. `false` when an export is
/// unusable; a missing directory only means nothing has been exported yet.
fn check_data(dir: &Path) -> bool {
    println!("🔎 Checking prediction exports in {}...", dir.display());

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            println!("⚠️  {} does not exist, no weekly exports yet", dir.display());
            return true;
        }
        Err(e) => {
            eprintln!("❌ Cannot read {}: {}", dir.display(), e);
            return false;
        }
    };

    let mut weeks = 0;
    let mut failures = 0;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("geojson") {
            continue;
        }

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if let Err(e) = stem.parse::<IsoWeek>() {
            println!("⚠️  {} skipped: {}", path.display(), e);
            continue;
        }
        weeks += 1;

        let parsed = fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_slice::<FeatureCollection>(&raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(fc) => {
                let unplaced = fc.features.iter().filter(|f| point_coordinates(f).is_none()).count();
                let coerced = fc
                    .features
                    .iter()
                    .filter(|f| {
                        let p = f.get("properties").and_then(|props| props.get("p"));
                        p.and_then(|v| v.as_f64()) != Some(coerce_probability(p))
                    })
                    .count();
                println!(
                    "   {stem}: {} features, {coerced} with missing or out-of-range p, {unplaced} without coordinates",
                    fc.features.len()
                );
            }
            Err(e) => {
                eprintln!("❌ {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        eprintln!("❌ {failures} of {weeks} exports are unusable");
        return false;
    }

    println!("✅ {weeks} weekly exports ready");
    true
}

fn run_tests() {
    if !check_data(Path::new(DEFAULT_PREDICTIONS_DIR)) {
        exit(1);
    }

    println!("🧪 Running tests...");

    let status = Command::new("cargo")
        .arg("test")
        .status()
        .unwrap_or_else(|e| {
            eprintln!("❌ Failed to run cargo test: {e}");
            exit(1);
        });

    if !status.success() {
        eprintln!("❌ Tests failed");
        exit(1);
    }

    println!("✅ All tests passed");
}

fn dev_server() {
    if !check_data(Path::new(DEFAULT_PREDICTIONS_DIR)) {
        exit(1);
    }

    println!("🚀 Starting development server...");

    let status = Command::new("shuttle")
        .arg("run")
        .status()
        .unwrap_or_else(|e| {
            eprintln!("❌ Failed to start shuttle: {e}");
            exit(1);
        });

    if !status.success() {
        eprintln!("❌ Server failed to start");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_directory_is_not_a_failure() {
        let dir = TempDir::new().unwrap();
        assert!(check_data(&dir.path().join("predictions")));
    }

    #[test]
    fn corrupt_export_fails_the_check() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2024-W30.geojson"), "{ truncated").unwrap();
        assert!(!check_data(dir.path()));
    }

    #[test]
    fn lenient_exports_pass_the_check() {
        let dir = TempDir::new().unwrap();
        let raw = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-77.5,-12.3,null]},"properties":{"p":0.4}},
            {"type":"Feature","geometry":null,"properties":{"p":2}}
        ]}"#;
        fs::write(dir.path().join("2024-W30.geojson"), raw).unwrap();
        assert!(check_data(dir.path()));
    }
}
