/// Native log sink driven by `RUST_LOG`, e.g. `RUST_LOG=debug cargo run --bin signal_demo`.
///
/// Mirrors `abstutil::logger::setup`'s native branch; this crate ships no
/// wasm target, so there's no console_log counterpart to wire up.
pub fn init() {
    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("info")).init();
}
