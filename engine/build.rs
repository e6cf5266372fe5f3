use std::{env, fs::File, io::Write, path::Path};

fn main() {
    // write build time info
    built::write_built_file().expect("Failed to acquire build-time information");

    // Allows overriding the default node visit budget of matrix queries through an env var.
    // If the env var is set, we enable a cfg flag and the matrix config module includes the file created here.
    let out_dir = env::var("OUT_DIR").unwrap();

    if let Ok(val) = env::var("CORE_MATRIX_MAX_VISITED_NODES") {
        let dest_path = Path::new(&out_dir).join("CORE_MATRIX_MAX_VISITED_NODES");
        let mut f = File::create(&dest_path).unwrap();
        f.write_all(val.as_bytes()).unwrap();
        println!("cargo:rustc-cfg=override_max_visited_nodes");
    }
    println!("cargo:rerun-if-env-changed=CORE_MATRIX_MAX_VISITED_NODES");
    println!("cargo:rustc-check-cfg=cfg(override_max_visited_nodes)");
}
