use gl_generator::{Api, Fallbacks, Profile, Registry, StructGenerator};
use std::env;
use std::fs::File;
use std::path::Path;

fn main() {
    let dest = env::var("OUT_DIR").unwrap();
    let mut file = File::create(Path::new(&dest).join("gl_bindings.rs")).unwrap();

    // The compatibility profile keeps the fixed-function entry points (lights, materials,
    // client arrays, attrib stacks) that the core profile drops.
    Registry::new(Api::Gl, (4, 5), Profile::Compatibility, Fallbacks::All, [])
        .write_bindings(StructGenerator, &mut file)
        .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}
