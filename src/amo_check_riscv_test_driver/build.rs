use std::{env, fmt::Write, fs, path::Path};

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rerun-if-env-changed=AMO_CHECK_LINK_SEARCH");
    if let Ok(link_search) = env::var("AMO_CHECK_LINK_SEARCH") {
        // The caller supplies its own `memory.x`
        println!("cargo:rustc-link-search={link_search}");
    } else if let Some(memory_x) = board_memory_x() {
        println!("cargo:rerun-if-changed={memory_x}");
        fs::copy(memory_x, Path::new(&out_dir).join("memory.x")).unwrap();
        println!("cargo:rustc-link-search={}", out_dir.to_str().unwrap());
    }

    if env::var_os("CARGO_FEATURE_RUN").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
    }

    let mut generated_code = String::new();

    let base = integer_var("AMO_CHECK_BASE", 0x30000);
    let end = integer_var("AMO_CHECK_END", 0x3ffff);
    let step = integer_var("AMO_CHECK_STEP", 0x1000);
    let max_sc_attempts = integer_var("AMO_CHECK_MAX_SC_ATTEMPTS", 1);
    writeln!(generated_code, "pub const BASE: usize = {base:#x};").unwrap();
    writeln!(generated_code, "pub const END: usize = {end:#x};").unwrap();
    writeln!(generated_code, "pub const STEP: usize = {step:#x};").unwrap();
    writeln!(
        generated_code,
        "pub const MAX_SC_ATTEMPTS: u32 = {};",
        u32::try_from(max_sc_attempts).expect("AMO_CHECK_MAX_SC_ATTEMPTS is too large")
    )
    .unwrap();

    let width = match string_var("AMO_CHECK_WIDTH").as_deref() {
        None | Some("word" | "w" | "32") => "Word",
        Some("double" | "d" | "64") => "Double",
        Some(other) => panic!("AMO_CHECK_WIDTH: unknown access width: {other:?}"),
    };
    writeln!(
        generated_code,
        "pub const WIDTH: amo_check::Width = amo_check::Width::{width};"
    )
    .unwrap();

    let log_level = match string_var("AMO_CHECK_LOG_LEVEL")
        .map(|x| x.to_ascii_lowercase())
        .as_deref()
    {
        Some("off") => "Off",
        Some("error") => "Error",
        Some("warn") => "Warn",
        None | Some("info") => "Info",
        Some("debug") => "Debug",
        Some("trace") => "Trace",
        Some(other) => panic!("AMO_CHECK_LOG_LEVEL: unknown log level: {other:?}"),
    };
    writeln!(
        generated_code,
        "#[allow(dead_code)] pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::{log_level};"
    )
    .unwrap();

    let out_generated_code_path = Path::new(&out_dir).join("gen.rs");
    fs::write(&out_generated_code_path, &generated_code).unwrap();
}

fn board_memory_x() -> Option<&'static str> {
    if env::var_os("CARGO_FEATURE_BOARD_U540_QEMU").is_some() {
        Some("memory/u540_qemu.x")
    } else if env::var_os("CARGO_FEATURE_BOARD_E310X_QEMU").is_some()
        || env::var_os("CARGO_FEATURE_BOARD_E310X_RED_V").is_some()
    {
        Some("memory/e310x.x")
    } else {
        None
    }
}

fn string_var(name: &str) -> Option<String> {
    println!("cargo:rerun-if-env-changed={name}");
    match env::var(name) {
        Ok(x) if x.is_empty() => None,
        Ok(x) => Some(x),
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(_)) => {
            panic!("{name} is not a valid UTF-8 string");
        }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer. Underscores are
/// ignored.
fn integer_var(name: &str, default: u64) -> u64 {
    let Some(text) = string_var(name) else {
        return default;
    };
    let digits = text.replace('_', "");
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse(),
    };
    parsed.unwrap_or_else(|e| panic!("{name}: invalid integer {text:?}: {e}"))
}
