use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let sdkconfig_defaults = PathBuf::from(&manifest_dir).join("sdkconfig.defaults");

    println!("cargo:rerun-if-changed=sdkconfig.defaults");

    if env::var("ESP_IDF_SDKCONFIG_DEFAULTS").is_err() {
        eprintln!("WARNING: ESP_IDF_SDKCONFIG_DEFAULTS not set! Stack size may be wrong.");
        eprintln!("Build with: export ESP_IDF_SDKCONFIG_DEFAULTS=crates/gameclock-firmware/sdkconfig.defaults");
    }

    // A cached sdkconfig older than the defaults would silently win.
    let target_dir = PathBuf::from(&manifest_dir).join("target");
    if let Ok(entries) = fs::read_dir(&target_dir) {
        for entry in entries.flatten() {
            let build_dir = entry.path().join("build");
            if build_dir.is_dir() {
                invalidate_stale_sdkconfig(&build_dir, &sdkconfig_defaults);
            }
        }
    }

    embuild::espidf::sysenv::output();
}

fn invalidate_stale_sdkconfig(build_dir: &Path, defaults: &Path) {
    let Ok(entries) = fs::read_dir(build_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let build_path = entry.path();
        if !build_path.to_string_lossy().contains("esp-idf-sys") {
            continue;
        }
        let sdkconfig = build_path.join("out/esp-idf/sdkconfig");
        let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
        if let (Some(sdk_time), Some(defaults_time)) = (modified(&sdkconfig), modified(defaults)) {
            if defaults_time > sdk_time {
                eprintln!("sdkconfig.defaults changed! Forcing regeneration...");
                let _ = fs::remove_file(&sdkconfig);
                let _ = fs::remove_dir_all(build_path.join("out/esp-idf/sdkconfig.d"));
            }
        }
    }
}
