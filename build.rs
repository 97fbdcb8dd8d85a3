fn main() {
    // Expose the build timestamp to version_string()
    let build_date = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_DATE={build_date}");
}
