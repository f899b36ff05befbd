use std::env;

fn main() -> nih_plug_xtask::Result<()> {
    let mut args = env::args().collect::<Vec<_>>();

    // `cargo xtask bundle simple_eq --target <triple>` keeps each target's artifacts apart
    if let Some(pos) = args.iter().position(|a| a == "--target") {
        if let Some(target) = args.get(pos + 1).cloned() {
            args.drain(pos..=pos + 1);
            env::set_var("CARGO_TARGET_DIR", format!("target/{target}"));
        }
    }

    nih_plug_xtask::main_with_args("cargo xtask", args.into_iter().skip(1))
}
