// Stages static assets into `dist/` so the preview bundle is self-contained.
use std::{fs, path::Path};

fn main() {
    let out_dir = Path::new("dist");
    if out_dir.exists() {
        fs::remove_dir_all(out_dir).ok();
    }
    fs::create_dir_all(out_dir).ok();

    let static_dir = Path::new("static");
    if static_dir.exists() {
        let opts = fs_extra::dir::CopyOptions::new().content_only(true);
        if fs_extra::dir::copy(static_dir, out_dir, &opts).is_err() {
            println!("cargo:warning=failed to stage static assets");
        }
    }
    println!("cargo:rerun-if-changed=static");
}
